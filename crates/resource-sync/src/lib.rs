//! Bifrost resource synchronization layer.
//!
//! The portal renders a handful of remote resources (Spark jobs, datasets,
//! the Delta catalog, uploads, backend health) that all refresh on their own
//! cadence. Instead of every view running its own polling loop, this crate
//! provides one shared layer:
//!
//! - [`Fetcher`], the transport seam that executes a single request for a
//!   resource key. [`HttpFetcher`] is the reqwest-backed implementation.
//! - [`ResourceCache`], the keyed store of the latest known value plus fetch
//!   status and staleness metadata. Consumers only ever read from here.
//! - [`PollScheduler`], which owns one poll task per resource key, applies
//!   fetch outcomes to the cache, and backs off exponentially on failure.
//! - [`SubscriptionHub`], which fans a single poll cycle out to every
//!   subscriber of a key.
//!
//! Fetch failures never propagate to consumers as errors; they surface as
//! `Failed` cache entries while the previous good value is retained, so a
//! flaky backend degrades to stale data rather than an empty page.

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod fetcher;
pub mod hub;
pub mod scheduler;

pub use cache::ResourceCache;
pub use config::PollConfig;
pub use entry::{
    Payload,
    ResourceEntry,
    ResourceKey,
    ResourceStatus,
};
pub use error::{
    FetchError,
    Result,
    SyncError,
};
pub use fetcher::{
    Fetcher,
    HttpFetcher,
    RequestSpec,
};
pub use hub::SubscriptionHub;
pub use scheduler::{
    PollScheduler,
    Subscription,
};
