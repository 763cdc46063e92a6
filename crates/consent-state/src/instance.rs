//! One consent instance: in-memory value, store reconciliation, write
//! dedup and update requests.
//!
//! The in-memory value is updated synchronously by [`ConsentInstance::update`]
//! so a read issued right after an update observes it, even while the write
//! is still in flight. Persistence runs on spawned tasks that pass through a
//! per-instance queue; each task persists whatever the in-memory value is
//! when its turn comes, so a burst of updates collapses into one write of the
//! latest value.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use consent_core::{compose, decompose, merge, ConsentInfo, ConsentState, SharedStore};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::InstanceConfig;
use crate::tracing::prefix;
use crate::transport::{should_notify, RequestInit, SharedTransport, UpdateRequestBody};

/// Namespace for consent values in the durable store.
pub const STORAGE_KEY_PREFIX: &str = "amp-consent:";

/// Store key for an instance id.
pub fn storage_key(instance_id: &str) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, instance_id)
}

#[derive(Debug, Default)]
struct InstanceState {
    /// Best-known value. `None` until the first update or store read.
    local: Option<ConsentInfo>,
    /// Last value known to be in the store.
    saved: Option<ConsentInfo>,
}

impl InstanceState {
    fn refresh_dirty(&mut self) {
        let saved = &self.saved;
        if let Some(local) = self.local.as_mut() {
            local.is_dirty = !saved.as_ref().is_some_and(|s| s.equals(local));
        }
    }
}

struct Inner {
    id: String,
    storage_key: String,
    config: InstanceConfig,
    store: SharedStore,
    transport: SharedTransport,
    state: Mutex<InstanceState>,
    /// Serializes persistence tasks.
    write_queue: tokio::sync::Mutex<()>,
}

/// Consent value lifecycle for a single instance id.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct ConsentInstance {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConsentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentInstance")
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .field("local", &self.inner.state.lock().local)
            .finish()
    }
}

impl ConsentInstance {
    pub fn new(
        id: impl Into<String>,
        config: InstanceConfig,
        store: SharedStore,
        transport: SharedTransport,
    ) -> Self {
        let id = id.into();
        Self {
            inner: Arc::new(Inner {
                storage_key: storage_key(&id),
                id,
                config,
                store,
                transport,
                state: Mutex::new(InstanceState::default()),
                write_queue: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.inner.config
    }

    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// The in-memory value, without consulting the store.
    pub fn local_value(&self) -> Option<ConsentInfo> {
        self.inner.state.lock().local.clone()
    }

    /// Merge a new observation into the in-memory value.
    ///
    /// The in-memory value changes before this returns. If the merge changed
    /// it, or the store has not been read yet, a persistence task is spawned
    /// and the returned handle completes when that task has written (and
    /// notified, if needed). Otherwise the handle is already complete and
    /// nothing is written or sent.
    ///
    /// Outside a Tokio runtime the in-memory value is still updated; the
    /// failure to schedule persistence is logged and the next update made
    /// within a runtime writes the latest value.
    pub fn update(
        &self,
        state: impl Into<ConsentState>,
        consent_string: Option<String>,
    ) -> UpdateHandle {
        let candidate = ConsentInfo::new(state, consent_string);

        {
            let mut st = self.inner.state.lock();
            let current = st.local.clone().unwrap_or_default();
            let merged = merge(&candidate, &current);
            // Without a store read the change is judged against the stored
            // value inside the persistence task.
            let unreconciled = st.saved.is_none();
            if !merged.is_dirty && !unreconciled {
                debug!(
                    instance = %self.inner.id,
                    state = %candidate.consent_state,
                    "update is not a change, skipping persistence"
                );
                return UpdateHandle::ready();
            }
            st.local = Some(merged);
            st.refresh_dirty();
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(
                    "{} cannot schedule persistence for {}: {}",
                    prefix::STORE,
                    self.inner.id,
                    e
                );
                return UpdateHandle::ready();
            }
        };
        let instance = self.clone();
        UpdateHandle::spawned(runtime.spawn(async move { instance.persist().await }))
    }

    /// Best-known value after reconciling with the store.
    ///
    /// The stored value is merged under the in-memory one, so local activity
    /// wins on conflicts. Store failures and malformed values are logged and
    /// read as unknown.
    pub async fn get(&self) -> ConsentInfo {
        let stored = self.read_stored().await;
        self.reconcile(stored)
    }

    async fn read_stored(&self) -> Option<ConsentInfo> {
        let value = match self.inner.store.get(&self.inner.storage_key).await {
            Ok(value) => value,
            Err(e) => {
                error!(
                    "{} failed to read consent value for {}: {}",
                    prefix::STORE,
                    self.inner.id,
                    e
                );
                return None;
            }
        };

        match decompose(value.as_ref()) {
            Ok(info) => Some(info),
            Err(e) => {
                error!("{} {} (instance {})", prefix::STORE, e, self.inner.id);
                None
            }
        }
    }

    /// Merge a store read (`None` when it failed) against the current
    /// in-memory value, as of now rather than when the read started.
    fn reconcile(&self, stored: Option<ConsentInfo>) -> ConsentInfo {
        let mut st = self.inner.state.lock();

        let merged = match (&st.local, &stored) {
            (Some(local), Some(stored)) => merge(local, stored),
            (Some(local), None) => local.clone(),
            (None, Some(stored)) => stored.clone(),
            (None, None) => return ConsentInfo::unknown(),
        };

        if st.saved.is_none() {
            st.saved = stored;
        }
        st.local = Some(merged);
        st.refresh_dirty();
        st.local.clone().unwrap_or_default()
    }

    async fn persist(self) {
        let (previous, next) = {
            let _turn = self.inner.write_queue.lock().await;

            // Nothing known durable yet: see what the store holds so a
            // non-decisive local value does not overwrite a stored decision.
            let needs_load = self.inner.state.lock().saved.is_none();
            if needs_load {
                let stored = self.read_stored().await;
                self.reconcile(stored);
            }

            let (previous, next) = {
                let mut st = self.inner.state.lock();
                let Some(next) = st.local.clone() else {
                    return;
                };
                if st.saved.as_ref().is_some_and(|saved| saved.equals(&next)) {
                    debug!(instance = %self.inner.id, "value already stored, skipping write");
                    return;
                }
                let previous = st.saved.replace(next.clone());
                (previous, next)
            };

            let value = compose(&next);
            if let Err(e) = self
                .inner
                .store
                .set_non_boolean(&self.inner.storage_key, value)
                .await
            {
                error!(
                    "{} failed to store consent value for {}: {}",
                    prefix::STORE,
                    self.inner.id,
                    e
                );
                let mut st = self.inner.state.lock();
                st.saved = previous;
                st.refresh_dirty();
                return;
            }

            info!(
                "{} stored consent for {}: state={} string={:?}",
                prefix::STORE,
                self.inner.id,
                next.consent_state,
                next.consent_string
            );
            self.inner.state.lock().refresh_dirty();
            (previous, next)
        };

        self.send_update_request(&previous.unwrap_or_default(), &next)
            .await;
    }

    async fn send_update_request(&self, previous: &ConsentInfo, next: &ConsentInfo) {
        let Some(href) = self.inner.config.on_update_href.as_deref() else {
            return;
        };
        if !should_notify(previous, next) {
            debug!(instance = %self.inner.id, "decision unchanged, no update request");
            return;
        }

        let init = RequestInit::post(UpdateRequestBody::from_info(&self.inner.id, next));
        debug!(
            "{} sending update request for {} to {}",
            prefix::REQUEST,
            self.inner.id,
            href
        );
        if let Err(e) = self.inner.transport.post(href, init).await {
            warn!("{} update request failed: {}", prefix::REQUEST, e);
        }
    }
}

/// Completion of an update's persistence. Dropping it detaches the task.
#[derive(Debug)]
pub struct UpdateHandle {
    task: Option<JoinHandle<()>>,
}

impl UpdateHandle {
    fn ready() -> Self {
        Self { task: None }
    }

    fn spawned(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Whether the update scheduled any persistence at all.
    pub fn scheduled_write(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Future for UpdateHandle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let Some(task) = self.task.as_mut() else {
            return Poll::Ready(());
        };
        match Pin::new(task).poll(cx) {
            Poll::Ready(result) => {
                self.task = None;
                if let Err(e) = result {
                    error!("consent persistence task failed: {}", e);
                }
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
