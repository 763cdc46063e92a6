//! # Consent State
//!
//! Keeps one authoritative consent value per consent instance id and syncs
//! it with a durable key/value store:
//! - **instance**: merge, write dedup, store reconciliation, update requests
//! - **manager**: instance registry, readiness, state-change observers
//! - **transport**: the update request contract
//! - **config**: per-instance configuration
//! - **error**: common error types
//! - **tracing**: logging setup
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use consent_core::{ConsentState, MemoryStore};
//! use consent_state::{ConsentStateManager, InstanceConfig, NoopTransport};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let manager = ConsentStateManager::new(Arc::new(MemoryStore::new()), Arc::new(NoopTransport));
//! manager.register_consent_instance("cmp", InstanceConfig::default()).unwrap();
//! manager.update_consent_instance_state("cmp", ConsentState::Accepted, None).unwrap();
//!
//! let info = manager.get_consent_instance_info("cmp").await.unwrap();
//! assert_eq!(info.consent_state, ConsentState::Accepted);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod instance;
pub mod manager;
pub mod tracing;
pub mod transport;

// Re-export commonly used items at crate root
pub use config::InstanceConfig;
pub use error::{ConsentError, Result};
pub use instance::{storage_key, ConsentInstance, UpdateHandle, STORAGE_KEY_PREFIX};
pub use manager::{ConsentStateHandler, ConsentStateManager, SubscriptionId};
pub use transport::{
    ConsentTransport, Credentials, Method, NoopTransport, RequestInit, SharedTransport,
    TransportError, UpdateRequestBody,
};
