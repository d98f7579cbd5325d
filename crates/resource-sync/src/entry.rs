//! Plain-data types describing one pollable resource and its cached state.

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

use crate::error::FetchError;

/// Opaque payload returned by a fetch. The sync layer never interprets it;
/// typed decoding belongs to whichever consumer subscribes to the key.
pub type Payload = serde_json::Value;

/// Identifier for one pollable remote data source, e.g. `jobs` or
/// `catalog:sales_orders`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Fetch status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Known key, nothing fetched yet.
    Idle,
    /// First fetch in flight, no previous value to serve.
    Fetching,
    /// Latest fetch succeeded; the value is current.
    Fresh,
    /// A previous value is being revalidated by an in-flight fetch.
    Stale,
    /// Latest fetch failed. A previous value, if any, is still served.
    Failed,
}

/// Latest known state of one resource key.
///
/// Entries are mutated only by the scheduler; everything handed to
/// subscribers or returned from `get` is a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEntry {
    pub key: ResourceKey,
    pub value: Option<Payload>,
    pub status: ResourceStatus,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error: Option<FetchError>,
    pub consecutive_failures: u32,
}

impl ResourceEntry {
    /// A never-fetched entry for `key`.
    pub fn idle(key: ResourceKey) -> Self {
        Self {
            key,
            value: None,
            status: ResourceStatus::Idle,
            last_success_at: None,
            last_error_at: None,
            last_error: None,
            consecutive_failures: 0,
        }
    }

    /// Whether a value is available to render, fresh or stale.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the latest completed fetch for this key failed.
    pub fn is_failed(&self) -> bool {
        self.status == ResourceStatus::Failed
    }
}
