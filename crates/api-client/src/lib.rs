//! Typed client for the Bifrost data-platform API.
//!
//! Wraps the backend's REST surface (Spark jobs, datasets, uploads, the
//! Delta table catalog, cluster and health endpoints) behind strongly typed
//! methods. The client is an explicitly constructed value with its own
//! lifecycle: build one at startup and pass it down. There is no hidden
//! module-level singleton.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod routes;

pub use auth::{
    Auth,
    AuthConfig,
};
pub use client::Client;
pub use config::{
    Config,
    Environment,
};
pub use error::{
    Error,
    Result,
};
pub use metrics::{
    DashboardMetrics,
    RecentActivity,
};
