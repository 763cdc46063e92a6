//! Registry of consent instances and state-change observers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use consent_core::{ConsentInfo, ConsentState, SharedStore};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::InstanceConfig;
use crate::error::{ConsentError, Result};
use crate::instance::ConsentInstance;
use crate::tracing::prefix;
use crate::transport::SharedTransport;

/// Callback receiving raw consent state codes.
pub type ConsentStateHandler = Arc<dyn Fn(ConsentState) + Send + Sync>;

/// Identifies one registered handler, for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    handler: ConsentStateHandler,
}

type HandlerMap = HashMap<String, Vec<Subscription>>;

/// Owns every consent instance of a page and fans out state changes.
///
/// Observers receive the state code passed to
/// [`update_consent_instance_state`](Self::update_consent_instance_state)
/// as-is, before any merge. Under rapid updates an observer can therefore
/// see a code that the instance then coalesces or refuses (for example a
/// dismissal after an acceptance).
pub struct ConsentStateManager {
    store: SharedStore,
    transport: SharedTransport,
    instances: RwLock<HashMap<String, ConsentInstance>>,
    handlers: Arc<Mutex<HandlerMap>>,
    ready: Mutex<HashMap<String, watch::Sender<bool>>>,
    next_subscription: AtomicU64,
}

impl ConsentStateManager {
    pub fn new(store: SharedStore, transport: SharedTransport) -> Self {
        Self {
            store,
            transport,
            instances: RwLock::new(HashMap::new()),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            ready: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Create the instance for `id` and release `when_consent_ready` waiters.
    ///
    /// Registering an id twice is an error; the existing instance is kept.
    pub fn register_consent_instance(&self, id: &str, config: InstanceConfig) -> Result<()> {
        {
            let mut instances = self.instances.write();
            if instances.contains_key(id) {
                error!("consent instance already registered: {}", id);
                return Err(ConsentError::AlreadyRegistered(id.to_string()));
            }
            let instance = ConsentInstance::new(
                id,
                config,
                Arc::clone(&self.store),
                Arc::clone(&self.transport),
            );
            instances.insert(id.to_string(), instance);
        }
        info!("registered consent instance {}", id);

        self.with_ready_flag(id, |flag| {
            flag.send_replace(true);
        });
        Ok(())
    }

    /// Resolves once `id` is registered. May be awaited before registration.
    pub async fn when_consent_ready(&self, id: &str) {
        let mut rx = self.with_ready_flag(id, |flag| flag.subscribe());
        // The sender lives as long as the manager, which outlives this borrow.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn with_ready_flag<R>(&self, id: &str, f: impl FnOnce(&watch::Sender<bool>) -> R) -> R {
        let mut ready = self.ready.lock();
        let flag = ready
            .entry(id.to_string())
            .or_insert_with(|| watch::channel(false).0);
        f(flag)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.instances.read().contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn instance_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.instances.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn instance(&self, id: &str) -> Option<ConsentInstance> {
        self.instances.read().get(id).cloned()
    }

    fn require_instance(&self, id: &str) -> Result<ConsentInstance> {
        self.instance(id)
            .ok_or_else(|| ConsentError::NotRegistered(id.to_string()))
    }

    /// Apply an update to `id` and tell its observers.
    ///
    /// Persistence runs in the background; observers are called before this
    /// returns, with the unmerged `state`.
    pub fn update_consent_instance_state(
        &self,
        id: &str,
        state: impl Into<ConsentState>,
        consent_string: Option<String>,
    ) -> Result<()> {
        let instance = self.require_instance(id)?;
        let state = state.into();

        // Detached: persistence completes on its own.
        drop(instance.update(state, consent_string));
        self.dispatch(id, state);
        Ok(())
    }

    /// Best-known value for `id`, reconciled with the store.
    pub async fn get_consent_instance_info(&self, id: &str) -> Result<ConsentInfo> {
        let instance = self.require_instance(id)?;
        Ok(instance.get().await)
    }

    /// Observe raw state changes for `id`.
    ///
    /// The handler is first called with the instance's current state on a
    /// later scheduling turn, never from inside this call, and then once per
    /// `update_consent_instance_state` call for `id`. Outside a Tokio runtime
    /// the replay is skipped (and logged); later updates are still delivered.
    pub fn on_consent_state_change<F>(&self, id: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(ConsentState) + Send + Sync + 'static,
    {
        let instance = self.require_instance(id)?;
        let subscription = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let handler: ConsentStateHandler = Arc::new(handler);

        self.handlers
            .lock()
            .entry(id.to_string())
            .or_default()
            .push(Subscription {
                id: subscription,
                handler: Arc::clone(&handler),
            });

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(
                    "{} cannot schedule state replay for {}: {}",
                    prefix::OBSERVE,
                    id,
                    e
                );
                return Ok(subscription);
            }
        };
        let handlers = Arc::clone(&self.handlers);
        let id = id.to_string();
        runtime.spawn(async move {
            let info = instance.get().await;
            let subscribed = handlers
                .lock()
                .get(&id)
                .is_some_and(|subs| subs.iter().any(|s| s.id == subscription));
            if subscribed {
                debug!(
                    "{} replaying state {} for {}",
                    prefix::OBSERVE,
                    info.consent_state,
                    id
                );
                handler(info.consent_state);
            }
        });

        Ok(subscription)
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn remove_consent_state_handler(&self, id: &str, subscription: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(subs) = handlers.get_mut(id) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.id != subscription);
        before != subs.len()
    }

    fn dispatch(&self, id: &str, state: ConsentState) {
        // Call outside the lock so handlers may re-enter the manager.
        let handlers: Vec<ConsentStateHandler> = self
            .handlers
            .lock()
            .get(id)
            .map(|subs| subs.iter().map(|s| Arc::clone(&s.handler)).collect())
            .unwrap_or_default();

        if !handlers.is_empty() {
            debug!(
                "{} dispatching state {} for {} to {} handler(s)",
                prefix::OBSERVE,
                state,
                id,
                handlers.len()
            );
        }
        for handler in handlers {
            handler(state);
        }
    }
}
