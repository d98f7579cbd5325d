//! Fan-out table mapping resource keys to subscriber callbacks.
//!
//! The hub only tracks who listens to what; subscription lifecycle (cold
//! start fetches, cancelling the poll task on last unsubscribe) is driven by
//! the scheduler, which owns the hub.

use parking_lot::RwLock;
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        Arc,
        atomic::{
            AtomicU64,
            Ordering,
        },
    },
};
use tracing::trace;

use crate::entry::{
    ResourceEntry,
    ResourceKey,
};

/// Callback invoked with an entry snapshot on every cache update.
pub(crate) type Callback = Arc<dyn Fn(&ResourceEntry) + Send + Sync + 'static>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

/// Subscriber registry with per-key fan-out.
#[derive(Default)]
pub struct SubscriptionHub {
    subscribers: RwLock<HashMap<ResourceKey, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `key`. Returns the subscriber id and the
    /// number of subscribers for the key after insertion.
    pub(crate) fn insert(&self, key: &ResourceKey, callback: Callback) -> (u64, usize) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.write();
        let entry = subscribers.entry(key.clone()).or_default();
        entry.push(Subscriber { id, callback });
        trace!(key = %key, id, count = entry.len(), "subscriber added");
        (id, entry.len())
    }

    /// Remove subscriber `id` from `key`, returning how many remain. Safe to
    /// call for an id that was already removed.
    pub(crate) fn remove(&self, key: &ResourceKey, id: u64) -> usize {
        let mut subscribers = self.subscribers.write();
        let Some(entry) = subscribers.get_mut(key) else {
            return 0;
        };
        entry.retain(|s| s.id != id);
        let remaining = entry.len();
        if remaining == 0 {
            subscribers.remove(key);
        }
        trace!(key = %key, id, remaining, "subscriber removed");
        remaining
    }

    /// Number of active subscribers for `key`.
    pub fn subscriber_count(&self, key: &ResourceKey) -> usize {
        self.subscribers.read().get(key).map_or(0, Vec::len)
    }

    /// Keys with at least one active subscriber.
    pub fn active_keys(&self) -> HashSet<ResourceKey> {
        self.subscribers.read().keys().cloned().collect()
    }

    /// Push an updated entry to every subscriber of its key.
    ///
    /// Callbacks are cloned out of the lock before they run, so a callback
    /// may re-enter the hub (e.g. unsubscribe itself) without deadlocking.
    pub(crate) fn notify(&self, entry: &ResourceEntry) {
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .get(&entry.key)
            .map(|subs| subs.iter().map(|s| Arc::clone(&s.callback)).collect())
            .unwrap_or_default();

        for callback in callbacks {
            callback(entry);
        }
    }
}

impl std::fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("keys", &self.subscribers.read().len())
            .finish()
    }
}
