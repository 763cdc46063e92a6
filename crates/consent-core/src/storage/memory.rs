//! In-memory storage backend
//!
//! A simple HashMap-based implementation for testing and development.
//! Not suitable for production use due to lack of persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::ConsentStore;

/// In-memory consent store.
///
/// Besides the values, it keeps a log of every read key and every write so
/// tests can assert on store traffic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<(String, Value)>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store with initial values. Boolean values are allowed
    /// here to seed the legacy encoding.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.values.lock();
            for (key, value) in values {
                map.insert(key.into(), value);
            }
        }
        store
    }

    /// Overwrite a value directly, bypassing the write log (for testing).
    pub fn seed(&self, key: impl Into<String>, value: Value) {
        self.values.lock().insert(key.into(), value);
    }

    /// Current value under `key` without recording a read.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    /// Keys passed to `get`, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().clone()
    }

    /// Writes passed to `set_non_boolean`, in call order.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().clone()
    }

    /// Forget the read and write logs, keeping the values.
    pub fn clear_history(&self) {
        self.reads.lock().clear();
        self.writes.lock().clear();
    }
}

#[async_trait]
impl ConsentStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.reads.lock().push(key.to_string());
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set_non_boolean(&self, key: &str, value: Value) -> StoreResult<()> {
        if value.is_boolean() {
            return Err(StoreError::Unsupported {
                key: key.to_string(),
                reason: "boolean values must use the legacy setter".to_string(),
            });
        }
        self.writes.lock().push((key.to_string(), value.clone()));
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert_eq!(store.get("amp-consent:a").await.unwrap(), None);
        assert_eq!(store.reads(), vec!["amp-consent:a".to_string()]);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store
            .set_non_boolean("k", json!({"consentState": 2}))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"consentState": 2})));
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_set_boolean_rejected() {
        let store = MemoryStore::new();
        let result = store.set_non_boolean("k", json!(true)).await;
        assert!(matches!(result, Err(StoreError::Unsupported { .. })));
        assert!(store.writes().is_empty());
        assert_eq!(store.peek("k"), None);
    }

    #[tokio::test]
    async fn test_seeded_legacy_value() {
        let store = MemoryStore::with_values([("k", json!(true))]);
        assert_eq!(store.get("k").await.unwrap(), Some(json!(true)));
        assert!(store.writes().is_empty());
    }
}
