//! SessionStore - the single current ConnectionState, shared with observers.
//!
//! Construct one per process and hand out clones; clones share the same state
//! and subscriber list. Notification is synchronous and in registration order,
//! so once `set_wallet_state` returns every observer has seen the new value.
//! A failing observer (error or panic) is logged and skipped.
//!
//! Writers are serialized: a state change and its notifications finish before
//! the next change starts, so every observer sees changes in store order and
//! its last notification is the stored state. Observers may read the store but
//! must not call `set_wallet_state` or `subscribe` from inside a callback.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::wallet::ConnectionState;

pub type StateCallback = dyn Fn(&ConnectionState) -> anyhow::Result<()> + Send + Sync;

struct Subscriber {
    id: u64,
    callback: Arc<StateCallback>,
}

struct StoreInner {
    state: RwLock<ConnectionState>,
    subscribers: Mutex<Vec<Subscriber>>,
    dispatch: Mutex<()>,
    next_id: AtomicU64,
}

impl StoreInner {
    fn remove(&self, id: u64) -> bool {
        let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    /// Fresh store, starting disconnected.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(ConnectionState::Disconnected),
                subscribers: Mutex::new(Vec::new()),
                dispatch: Mutex::new(()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Copy of the current state.
    pub fn get_wallet_state(&self) -> ConnectionState {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the state and notify every current subscriber before returning.
    pub fn set_wallet_state(&self, state: ConnectionState) {
        let _dispatching = self.inner.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut current = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            *current = state.clone();
        }
        let subscribers: Vec<(u64, Arc<StateCallback>)> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| (s.id, s.callback.clone()))
            .collect();
        tracing::debug!(connected = state.is_connected(), subscribers = subscribers.len(), "wallet state replaced");
        for (id, callback) in subscribers {
            dispatch(id, callback.as_ref(), &state);
        }
    }

    /// Register `callback` and call it once, right away, with the current state.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConnectionState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let _dispatching = self.inner.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Arc<StateCallback> = Arc::new(callback);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { id, callback: callback.clone() });
        dispatch(id, callback.as_ref(), &self.get_wallet_state());
        Subscription { id, store: Arc::downgrade(&self.inner) }
    }

    /// Remove a subscriber by id. Returns false when it was already gone.
    pub fn unsubscribe(&self, id: u64) -> bool {
        self.inner.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn dispatch(id: u64, callback: &StateCallback, state: &ConnectionState) {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(state))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(subscriber = id, error = %e, "Error in state subscriber"),
        Err(_) => tracing::warn!(subscriber = id, "State subscriber panicked"),
    }
}

/// Registration token returned by [`SessionStore::subscribe`].
///
/// Dropping it keeps the subscription alive; call [`Subscription::unsubscribe`].
#[must_use = "dropping the token leaves no way to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 { self.id }

    pub fn unsubscribe(self) -> bool {
        match self.store.upgrade() {
            Some(inner) => inner.remove(self.id),
            None => false,
        }
    }
}
