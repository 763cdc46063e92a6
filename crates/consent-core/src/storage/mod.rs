//! Durable key/value store contract
//!
//! Consent values are persisted through the [`ConsentStore`] trait so the
//! state engine never depends on a concrete backend. Implementations exist
//! for:
//!
//! - **Memory**: in-memory storage for testing (`MemoryStore`)
//!
//! Browser local storage and on-disk backends live with the embedding
//! application and implement the same trait.
//!
//! # Example
//!
//! ```rust
//! use consent_core::storage::{ConsentStore, MemoryStore};
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let store = MemoryStore::new();
//! store.set_non_boolean("amp-consent:demo", json!({"consentState": 1})).await.unwrap();
//! let value = store.get("amp-consent:demo").await.unwrap();
//! assert_eq!(value, Some(json!({"consentState": 1})));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{ConsentStore, SharedStore};
