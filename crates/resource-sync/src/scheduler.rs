//! Poll scheduler: one cancellable poll task per subscribed resource key.
//!
//! A key has exactly one poll task, and that task awaits its fetch inline,
//! so at most one fetch is ever in flight per key by construction. The first
//! subscriber triggers an immediate fetch instead of waiting a full
//! interval; the last unsubscribe cancels the task but leaves the cache
//! entry for the periodic eviction sweep.

use parking_lot::{
    Mutex,
    RwLock,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Weak,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
    time::Duration,
};
use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    trace,
    warn,
};

use crate::{
    cache::ResourceCache,
    config::PollConfig,
    entry::{
        ResourceEntry,
        ResourceKey,
        ResourceStatus,
    },
    error::{
        FetchError,
        Result,
        SyncError,
    },
    fetcher::{
        Fetcher,
        RequestSpec,
    },
    hub::SubscriptionHub,
};

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct Registration {
    spec: RequestSpec,
    config: PollConfig,
}

struct PollTask {
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    /// True while the task is parked in its inter-fetch delay, i.e. a
    /// refresh signal would actually be observed.
    parked: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct Inner {
    cache: Arc<ResourceCache>,
    hub: SubscriptionHub,
    fetcher: Arc<dyn Fetcher>,
    resources: RwLock<HashMap<ResourceKey, Registration>>,
    tasks: Mutex<HashMap<ResourceKey, PollTask>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    sweep_interval: Duration,
    shutdown: CancellationToken,
}

/// Shared poll scheduler for every portal resource.
///
/// Cheap to clone; all clones drive the same cache, subscriber table, and
/// poll tasks.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<Inner>,
}

impl PollScheduler {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_sweep_interval(fetcher, DEFAULT_SWEEP_INTERVAL)
    }

    /// Like [`PollScheduler::new`] with a custom eviction sweep cadence.
    pub fn with_sweep_interval(fetcher: Arc<dyn Fetcher>, sweep_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: Arc::new(ResourceCache::new()),
                hub: SubscriptionHub::new(),
                fetcher,
                resources: RwLock::new(HashMap::new()),
                tasks: Mutex::new(HashMap::new()),
                sweeper: Mutex::new(None),
                sweep_interval,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Declare a pollable resource. Must happen before anyone subscribes to
    /// the key.
    pub fn register(
        &self,
        key: impl Into<ResourceKey>,
        spec: RequestSpec,
        config: PollConfig,
    ) -> Result<()> {
        if self.inner.shutdown.is_cancelled() {
            return Err(SyncError::ShutDown);
        }
        config.validate()?;

        let key = key.into();
        let mut resources = self.inner.resources.write();
        if resources.contains_key(&key) {
            return Err(SyncError::DuplicateResource(key));
        }
        debug!(key = %key, interval = ?config.interval, "resource registered");
        resources.insert(key, Registration { spec, config });
        Ok(())
    }

    /// Subscribe to updates for `key`.
    ///
    /// The callback fires synchronously once with the current cached entry
    /// (possibly `Idle`) before this call returns, then again on every cache
    /// update for the key. The first subscriber of a key starts its poll
    /// task with an immediate fetch. Dropping the returned [`Subscription`]
    /// unsubscribes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(
        &self,
        key: &ResourceKey,
        callback: impl Fn(&ResourceEntry) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        if self.inner.shutdown.is_cancelled() {
            return Err(SyncError::ShutDown);
        }
        let registration = self
            .inner
            .resources
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| SyncError::UnknownResource(key.clone()))?;

        let callback: Arc<dyn Fn(&ResourceEntry) + Send + Sync> = Arc::new(callback);
        let (id, count) = self.inner.hub.insert(key, Arc::clone(&callback));

        // Initial synchronous delivery, before any fetch for this
        // subscription can have completed.
        let entry = self.inner.cache.ensure(key);
        callback(&entry);

        if count == 1 {
            self.inner.spawn_poll_task(key.clone(), registration);
        }
        self.inner.ensure_sweeper();

        Ok(Subscription {
            inner: Arc::downgrade(&self.inner),
            key: key.clone(),
            id,
            active: AtomicBool::new(true),
        })
    }

    /// Snapshot of the cached entry for `key`. Never blocks.
    pub fn get(&self, key: &ResourceKey) -> ResourceEntry {
        self.inner.cache.get(key)
    }

    /// Skip the current delay and fetch `key` now. A no-op while a fetch for
    /// the key is already in flight (at-most-one-in-flight) or while the key
    /// has no active poll task.
    pub fn force_refresh(&self, key: &ResourceKey) -> Result<()> {
        if !self.inner.resources.read().contains_key(key) {
            return Err(SyncError::UnknownResource(key.clone()));
        }
        let tasks = self.inner.tasks.lock();
        if let Some(task) = tasks.get(key) {
            if task.parked.load(Ordering::Acquire) {
                trace!(key = %key, "refresh requested");
                task.refresh.notify_one();
            }
        }
        Ok(())
    }

    /// Whether a poll task is currently running for `key`.
    pub fn is_polling(&self, key: &ResourceKey) -> bool {
        self.inner.tasks.lock().contains_key(key)
    }

    /// Subscriber count for `key`.
    pub fn subscriber_count(&self, key: &ResourceKey) -> usize {
        self.inner.hub.subscriber_count(key)
    }

    /// Number of keys currently held in the cache.
    pub fn cached_entries(&self) -> usize {
        self.inner.cache.len()
    }

    /// Cancel every poll task and the eviction sweep, then wait for them to
    /// finish. No subscriber callback fires after this returns; in-flight
    /// fetches are abandoned and their results discarded.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let tasks: Vec<PollTask> = {
            let mut guard = self.inner.tasks.lock();
            guard.drain().map(|(_, task)| task).collect()
        };
        for task in tasks {
            let _ = task.handle.await;
        }

        let sweeper = self.inner.sweeper.lock().take();
        if let Some(handle) = sweeper {
            let _ = handle.await;
        }
        debug!("poll scheduler shut down");
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("resources", &self.inner.resources.read().len())
            .field("active_tasks", &self.inner.tasks.lock().len())
            .finish()
    }
}

impl Inner {
    fn spawn_poll_task(self: &Arc<Self>, key: ResourceKey, registration: Registration) {
        let cancel = self.shutdown.child_token();
        let refresh = Arc::new(Notify::new());
        let parked = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(poll_loop(
            Arc::clone(self),
            key.clone(),
            registration,
            cancel.clone(),
            Arc::clone(&refresh),
            Arc::clone(&parked),
        ));

        let mut tasks = self.tasks.lock();
        if let Some(stale) = tasks.insert(
            key,
            PollTask {
                cancel,
                refresh,
                parked,
                handle,
            },
        ) {
            // A task from a previous subscriber generation that was not
            // cleaned up yet; make sure it stops.
            stale.cancel.cancel();
        }
    }

    /// Called by [`Subscription`] on unsubscribe/drop.
    fn release(&self, key: &ResourceKey, id: u64) {
        let remaining = self.hub.remove(key, id);
        if remaining == 0 {
            if let Some(task) = self.tasks.lock().remove(key) {
                debug!(key = %key, "last subscriber gone, stopping poll task");
                task.cancel.cancel();
            }
        }
    }

    fn ensure_sweeper(self: &Arc<Self>) {
        let mut guard = self.sweeper.lock();
        if guard.is_some() || self.shutdown.is_cancelled() {
            return;
        }

        let inner = Arc::clone(self);
        let cancel = self.shutdown.clone();
        *guard = Some(tokio::spawn(async move {
            let mut ticker = time::interval(inner.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh scheduler
            // does not sweep before anything happened.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let referenced = inner.hub.active_keys();
                        let evicted = inner.cache.evict_unreferenced(&referenced);
                        if evicted > 0 {
                            debug!(evicted, "evicted unreferenced cache entries");
                        }
                    }
                }
            }
        }));
    }
}

/// Drive fetches for one key until cancelled.
async fn poll_loop(
    inner: Arc<Inner>,
    key: ResourceKey,
    registration: Registration,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    parked: Arc<AtomicBool>,
) {
    let Registration { spec, config } = registration;
    debug!(key = %key, "poll task started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        inner.cache.mark_fetching(&key);
        let outcome = tokio::select! {
            () = cancel.cancelled() => {
                debug!(key = %key, "cancelled mid-fetch, dropping request");
                return;
            }
            result = time::timeout(config.timeout, inner.fetcher.fetch(&key, &spec)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_elapsed) => Err(FetchError::Timeout),
                }
            }
        };

        // A cancellation that raced the fetch completion: the scheduler for
        // this key is gone, so the late result must not be applied.
        if cancel.is_cancelled() {
            debug!(key = %key, "discarding orphaned fetch result");
            return;
        }

        let entry = inner.cache.apply(&key, outcome);
        match entry.status {
            ResourceStatus::Fresh => {
                trace!(key = %key, "fetch succeeded");
            }
            _ => {
                warn!(
                    key = %key,
                    error = ?entry.last_error,
                    consecutive_failures = entry.consecutive_failures,
                    "fetch failed, backing off"
                );
            }
        }
        inner.hub.notify(&entry);

        let delay = config.next_delay(entry.consecutive_failures);
        parked.store(true, Ordering::Release);
        tokio::select! {
            () = cancel.cancelled() => break,
            () = refresh.notified() => {
                debug!(key = %key, "refresh requested, skipping delay");
            }
            () = time::sleep(delay) => {}
        }
        parked.store(false, Ordering::Release);
    }

    debug!(key = %key, "poll task stopped");
}

/// Handle for one subscriber of one resource key.
///
/// Unsubscribing is idempotent and also happens on drop. When the last
/// subscriber of a key goes away its poll task is cancelled; the cache
/// entry survives until the next eviction sweep.
pub struct Subscription {
    inner: Weak<Inner>,
    key: ResourceKey,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Stop receiving updates. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(inner) = self.inner.upgrade() {
                inner.release(&self.key, self.id);
            }
        }
    }

    /// Whether this subscription still receives updates.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::entry::Payload;

    struct NullFetcher;

    #[async_trait]
    impl Fetcher for NullFetcher {
        async fn fetch(
            &self,
            _key: &ResourceKey,
            _spec: &RequestSpec,
        ) -> std::result::Result<Payload, FetchError> {
            Ok(json!(null))
        }
    }

    fn scheduler() -> PollScheduler {
        PollScheduler::new(Arc::new(NullFetcher))
    }

    fn valid_config() -> PollConfig {
        PollConfig::default()
            .with_interval(Duration::from_millis(100))
            .with_timeout(Duration::from_millis(50))
            .with_jitter_ratio(0.0)
    }

    #[test]
    fn register_rejects_duplicate_keys() {
        let scheduler = scheduler();
        scheduler
            .register("jobs", RequestSpec::get("/api/jobs"), valid_config())
            .unwrap();

        let err = scheduler
            .register("jobs", RequestSpec::get("/api/jobs"), valid_config())
            .unwrap_err();
        assert_matches!(err, SyncError::DuplicateResource(key) if key.as_str() == "jobs");
    }

    #[test]
    fn register_validates_the_config() {
        let scheduler = scheduler();
        let config = PollConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_millis(10));

        let err = scheduler
            .register("jobs", RequestSpec::get("/api/jobs"), config)
            .unwrap_err();
        assert_matches!(err, SyncError::InvalidConfig(_));
    }

    #[tokio::test]
    async fn subscribe_requires_a_registered_key() {
        let scheduler = scheduler();
        let err = scheduler
            .subscribe(&ResourceKey::from("jobs"), |_entry| {})
            .unwrap_err();
        assert_matches!(err, SyncError::UnknownResource(_));
    }

    #[test]
    fn force_refresh_requires_a_registered_key() {
        let scheduler = scheduler();
        let err = scheduler
            .force_refresh(&ResourceKey::from("jobs"))
            .unwrap_err();
        assert_matches!(err, SyncError::UnknownResource(_));
    }

    #[tokio::test]
    async fn operations_fail_after_shutdown() {
        let scheduler = scheduler();
        scheduler
            .register("jobs", RequestSpec::get("/api/jobs"), valid_config())
            .unwrap();
        scheduler.shutdown().await;

        assert_matches!(
            scheduler.register("datasets", RequestSpec::get("/api/datasets"), valid_config()),
            Err(SyncError::ShutDown)
        );
        assert_matches!(
            scheduler.subscribe(&ResourceKey::from("jobs"), |_entry| {}),
            Err(SyncError::ShutDown)
        );
    }
}
