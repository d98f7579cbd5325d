//! Bifrost portal sync daemon.
//!
//! Registers the dashboard's resources with a poll scheduler, logs every
//! update, and keeps polling until interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::{
    error,
    info,
    warn,
};
use tracing_subscriber::EnvFilter;

use bifrost_api_client::Client;
use bifrost_resource_sync::{
    HttpFetcher,
    PollScheduler,
    ResourceStatus,
};

mod args;
mod resources;

use args::PortalArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = PortalArgs::parse();
    let api_config = args.api.to_config();
    info!(base_url = %api_config.base_url, environment = %args.api.environment, "starting portal");

    // One-shot health probe so a misconfigured backend shows up in the logs
    // immediately instead of as the first round of poll failures.
    let client = Client::new(api_config.clone())?;
    match client.health().await {
        Ok(health) => {
            info!(status = %health.status, region = %health.region, "backend reachable")
        }
        Err(err) => warn!(%err, "backend health check failed, polling will retry"),
    }

    let fetcher = HttpFetcher::new(
        &api_config.base_url,
        api_config.bearer_token.as_deref(),
    )?;
    let scheduler = PollScheduler::with_sweep_interval(Arc::new(fetcher), args.poll.sweep_interval());

    let base = args.poll.to_config();
    let mut subscriptions = Vec::new();
    for resource in resources::dashboard_resources(&base) {
        scheduler.register(resource.key.clone(), resource.spec, resource.config)?;

        let subscription = scheduler.subscribe(&resource.key, |entry| match entry.status {
            ResourceStatus::Failed => {
                error!(
                    key = %entry.key,
                    failures = entry.consecutive_failures,
                    error = ?entry.last_error,
                    stale_value = entry.has_value(),
                    "resource update failed"
                );
            }
            status => {
                info!(key = %entry.key, status = ?status, "resource updated");
            }
        })?;
        subscriptions.push(subscription);
    }
    info!(resources = subscriptions.len(), "polling started");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    drop(subscriptions);
    scheduler.shutdown().await;
    info!("shutdown complete");
    Ok(())
}
