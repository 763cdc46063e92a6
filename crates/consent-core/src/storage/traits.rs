//! Storage trait definitions

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::storage::error::StoreResult;

/// Durable key/value storage for consent values.
///
/// Values are JSON. Reads of a missing key return `Ok(None)`.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Store a non-boolean value under `key`, replacing any previous value.
    ///
    /// Booleans are reserved for the legacy encoding and are only ever read.
    async fn set_non_boolean(&self, key: &str, value: Value) -> StoreResult<()>;
}

pub type SharedStore = Arc<dyn ConsentStore>;
