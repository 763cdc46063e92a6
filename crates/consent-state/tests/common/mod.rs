//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use consent_core::{ConsentState, ConsentStore, MemoryStore, StoreError, StoreResult};
use consent_state::{ConsentTransport, RequestInit, TransportError, UpdateRequestBody};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::timeout;

pub const UPDATE_HREF: &str = "//updateHref";

/// Route engine logs through the test harness.
pub fn init_logging() {
    consent_state::tracing::try_init("debug");
}

/// Give spawned tasks a few scheduling turns, for asserting that something
/// did not happen.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Yield until `condition` holds, failing the test after one second.
pub async fn eventually(condition: impl Fn() -> bool) {
    let reached = timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(reached.is_ok(), "condition not reached within 1s");
}

/// Records every request instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<(String, RequestInit)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<(String, RequestInit)> {
        self.requests.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_body(&self) -> Option<UpdateRequestBody> {
        self.requests.lock().last().map(|(_, init)| init.body.clone())
    }
}

#[async_trait]
impl ConsentTransport for RecordingTransport {
    async fn post(&self, url: &str, init: RequestInit) -> Result<(), TransportError> {
        self.requests.lock().push((url.to_string(), init));
        Ok(())
    }
}

/// Fails every request.
pub struct FailingTransport;

#[async_trait]
impl ConsentTransport for FailingTransport {
    async fn post(&self, url: &str, _init: RequestInit) -> Result<(), TransportError> {
        Err(TransportError::Status {
            url: url.to_string(),
            status: 503,
        })
    }
}

/// Memory store whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConsentStore for FlakyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("intentional".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set_non_boolean(&self, key: &str, value: Value) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("quota exceeded".to_string()));
        }
        self.inner.set_non_boolean(key, value).await
    }
}

/// Memory store whose reads and writes block until released, to hold
/// operations in flight.
pub struct GatedStore {
    pub inner: MemoryStore,
    reads: Semaphore,
    writes: Semaphore,
}

impl GatedStore {
    pub fn new(inner: MemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: Semaphore::new(0),
            writes: Semaphore::new(0),
        })
    }

    pub fn release_reads(&self, n: usize) {
        self.reads.add_permits(n);
    }

    pub fn release_writes(&self, n: usize) {
        self.writes.add_permits(n);
    }
}

#[async_trait]
impl ConsentStore for GatedStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.reads
            .acquire()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .forget();
        self.inner.get(key).await
    }

    async fn set_non_boolean(&self, key: &str, value: Value) -> StoreResult<()> {
        self.writes
            .acquire()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .forget();
        self.inner.set_non_boolean(key, value).await
    }
}

/// A handler that appends every state it receives to a shared list.
pub fn recorder() -> (
    Arc<Mutex<Vec<ConsentState>>>,
    impl Fn(ConsentState) + Send + Sync + 'static,
) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    (calls, move |state| sink.lock().push(state))
}
