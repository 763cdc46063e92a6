//! Consent Core
//!
//! The value model behind consent state synchronization: state codes, the
//! merge rules that decide which observation wins, and the encoding used to
//! persist values in a durable key/value store.
//!
//! # Example
//!
//! ```rust
//! use consent_core::{compose, decompose, merge, ConsentInfo, ConsentState};
//!
//! let held = ConsentInfo::new(ConsentState::Accepted, Some("s1".to_string()));
//! let observed = ConsentInfo::new(ConsentState::Dismissed, None);
//!
//! // Dismissal cannot downgrade an accepted decision, and no string was seen.
//! let merged = merge(&observed, &held);
//! assert_eq!(merged, held);
//! assert!(!merged.is_dirty);
//!
//! let stored = compose(&merged);
//! assert_eq!(decompose(Some(&stored)).unwrap(), merged);
//! ```

pub mod info;
pub mod storage;

// Re-export main types at crate root
pub use info::{compose, decompose, merge, ConsentInfo, ConsentState, DecodeError};
pub use storage::{ConsentStore, MemoryStore, SharedStore, StoreError, StoreResult};
