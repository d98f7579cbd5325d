//! Error types for the resource synchronization layer.

use thiserror::Error;

use crate::entry::ResourceKey;

/// Classified outcome of a failed fetch.
///
/// Stored verbatim in [`crate::ResourceEntry::last_error`], so it is cheap
/// to clone and carries no live handles into the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FetchError {
    /// The configured deadline elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// The request never produced an HTTP response (DNS, connect, TLS, ...).
    #[error("transport failure: {0}")]
    Network(String),

    /// The server answered with a non-success status code.
    #[error("server returned HTTP {status}")]
    Http { status: u16 },

    /// The response body could not be decoded as JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

/// Errors returned by the scheduler's own API surface.
///
/// Fetch failures are deliberately not represented here: they are written
/// into the cache and observed through entry status, never thrown at the
/// caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The key was never registered with the scheduler.
    #[error("resource '{0}' is not registered")]
    UnknownResource(ResourceKey),

    /// The key is already registered.
    #[error("resource '{0}' is already registered")]
    DuplicateResource(ResourceKey),

    /// A poll config violated one of its invariants.
    #[error("invalid poll config: {0}")]
    InvalidConfig(String),

    /// The scheduler has been shut down.
    #[error("scheduler is shut down")]
    ShutDown,
}

/// Result type alias for the resource synchronization layer.
pub type Result<T> = std::result::Result<T, SyncError>;
