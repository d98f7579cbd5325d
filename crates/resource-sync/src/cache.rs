//! Keyed store of the latest fetch outcome per resource.
//!
//! The cache is the single source of truth consumers read. It is shared
//! behind an `Arc` and guarded by a `parking_lot::RwLock`; every mutation
//! happens atomically under the write lock, so readers always observe a
//! consistent entry. Mutation is restricted to the scheduler — the public
//! surface is read-only.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{
    HashMap,
    HashSet,
};
use tracing::trace;

use crate::{
    entry::{
        Payload,
        ResourceEntry,
        ResourceKey,
        ResourceStatus,
    },
    error::FetchError,
};

/// Latest-known state for every tracked resource key.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<ResourceKey, ResourceEntry>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entry for `key`. Never blocks on fetch activity;
    /// unknown keys yield an `Idle` entry.
    pub fn get(&self, key: &ResourceKey) -> ResourceEntry {
        self.entries
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| ResourceEntry::idle(key.clone()))
    }

    /// Whether the cache currently tracks `key`.
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Create the entry for `key` if it does not exist yet and return a
    /// snapshot. Called on first subscribe.
    pub(crate) fn ensure(&self, key: &ResourceKey) -> ResourceEntry {
        self.entries
            .write()
            .entry(key.clone())
            .or_insert_with(|| ResourceEntry::idle(key.clone()))
            .clone()
    }

    /// Flag `key` as having a fetch in flight. An entry with a previous
    /// value shows `Stale` (the old value keeps being served while it is
    /// revalidated); one without shows `Fetching`.
    pub(crate) fn mark_fetching(&self, key: &ResourceKey) -> ResourceEntry {
        let mut entries = self.entries.write();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| ResourceEntry::idle(key.clone()));
        entry.status = if entry.value.is_some() {
            ResourceStatus::Stale
        } else {
            ResourceStatus::Fetching
        };
        entry.clone()
    }

    /// Apply one fetch outcome atomically and return the updated snapshot.
    ///
    /// Success replaces the value, stamps `last_success_at`, and resets the
    /// failure streak. Failure records the error and increments the streak
    /// but retains the previous value, so consumers keep rendering the last
    /// good payload through an outage.
    pub(crate) fn apply(
        &self,
        key: &ResourceKey,
        outcome: std::result::Result<Payload, FetchError>,
    ) -> ResourceEntry {
        let mut entries = self.entries.write();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| ResourceEntry::idle(key.clone()));

        match outcome {
            Ok(value) => {
                entry.status = ResourceStatus::Fresh;
                entry.value = Some(value);
                entry.last_success_at = Some(Utc::now());
                entry.consecutive_failures = 0;
                entry.last_error = None;
            }
            Err(error) => {
                entry.status = ResourceStatus::Failed;
                entry.last_error = Some(error);
                entry.last_error_at = Some(Utc::now());
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
            }
        }

        trace!(
            key = %key,
            status = ?entry.status,
            consecutive_failures = entry.consecutive_failures,
            "applied fetch outcome"
        );
        entry.clone()
    }

    /// Drop every entry whose key is not in `referenced`. Returns the number
    /// of evicted entries. Driven by the scheduler's periodic sweep.
    pub(crate) fn evict_unreferenced(&self, referenced: &HashSet<ResourceKey>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| referenced.contains(key));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(name: &str) -> ResourceKey {
        ResourceKey::from(name)
    }

    #[test]
    fn unknown_key_reads_as_idle() {
        let cache = ResourceCache::new();
        let entry = cache.get(&key("jobs"));

        assert_eq!(entry.status, ResourceStatus::Idle);
        assert!(entry.value.is_none());
        // A plain read does not materialize the entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn ensure_materializes_the_entry_once() {
        let cache = ResourceCache::new();
        cache.ensure(&key("jobs"));
        cache.ensure(&key("jobs"));

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key("jobs")));
    }

    #[test]
    fn success_sets_fresh_and_resets_failures() {
        let cache = ResourceCache::new();
        let k = key("jobs");

        cache.apply(&k, Err(FetchError::Timeout));
        cache.apply(&k, Err(FetchError::Timeout));
        let entry = cache.apply(&k, Ok(json!([{"id": "1"}])));

        assert_eq!(entry.status, ResourceStatus::Fresh);
        assert_eq!(entry.value, Some(json!([{"id": "1"}])));
        assert_eq!(entry.consecutive_failures, 0);
        assert!(entry.last_success_at.is_some());
        assert!(entry.last_error.is_none());
        // Error timestamp keeps its history.
        assert!(entry.last_error_at.is_some());
    }

    #[test]
    fn failure_retains_previous_value() {
        let cache = ResourceCache::new();
        let k = key("datasets");

        cache.apply(&k, Ok(json!({"rows": 42})));
        let entry = cache.apply(&k, Err(FetchError::Http { status: 502 }));

        assert_eq!(entry.status, ResourceStatus::Failed);
        assert_eq!(entry.value, Some(json!({"rows": 42})));
        assert_eq!(entry.last_error, Some(FetchError::Http { status: 502 }));
        assert_eq!(entry.consecutive_failures, 1);
    }

    #[test]
    fn failure_streak_counts_up() {
        let cache = ResourceCache::new();
        let k = key("health");

        for expected in 1..=4 {
            let entry = cache.apply(&k, Err(FetchError::Network("down".to_string())));
            assert_eq!(entry.consecutive_failures, expected);
        }
    }

    #[test]
    fn mark_fetching_distinguishes_first_fetch_from_revalidation() {
        let cache = ResourceCache::new();
        let k = key("uploads");

        let entry = cache.mark_fetching(&k);
        assert_eq!(entry.status, ResourceStatus::Fetching);

        cache.apply(&k, Ok(json!([])));
        let entry = cache.mark_fetching(&k);
        assert_eq!(entry.status, ResourceStatus::Stale);
        assert_eq!(entry.value, Some(json!([])));
    }

    #[test]
    fn eviction_only_touches_unreferenced_keys() {
        let cache = ResourceCache::new();
        cache.apply(&key("jobs"), Ok(json!(1)));
        cache.apply(&key("datasets"), Ok(json!(2)));
        cache.apply(&key("health"), Ok(json!(3)));

        let referenced: HashSet<ResourceKey> = [key("jobs")].into_iter().collect();
        let evicted = cache.evict_unreferenced(&referenced);

        assert_eq!(evicted, 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("jobs")).value, Some(json!(1)));
        assert_eq!(cache.get(&key("datasets")).status, ResourceStatus::Idle);
    }
}
