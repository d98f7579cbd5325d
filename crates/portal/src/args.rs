//! Portal command arguments

use std::time::Duration;

use bifrost_api_client::{
    Config,
    Environment,
};
use bifrost_resource_sync::PollConfig;

/// Parameters for the backend the portal talks to
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Api")]
pub struct ApiArgs {
    /// Deployment environment to resolve the base URL from
    #[arg(
        long = "api.environment",
        default_value = "production",
        env = "BIFROST_ENV"
    )]
    pub environment: Environment,

    /// Backend base URL. Overrides the environment's default when set
    #[arg(long = "api.base-url", env = "BIFROST_API_URL")]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long = "api.bearer-token", env = "BIFROST_API_TOKEN")]
    pub bearer_token: Option<String>,
}

impl ApiArgs {
    /// Build the client configuration, preferring an explicit base URL.
    pub fn to_config(&self) -> Config {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| self.environment.base_url().to_string());

        let config = Config::new(base_url);
        match &self.bearer_token {
            Some(token) => config.with_bearer_token(token),
            None => config,
        }
    }
}

/// Parameters for the polling loop
#[derive(Debug, Clone, PartialEq, clap::Args)]
#[command(next_help_heading = "Poll")]
pub struct PollArgs {
    /// Base refresh interval in milliseconds
    #[arg(
        long = "poll.interval-ms",
        default_value = "30000",
        env = "POLL_INTERVAL_MS"
    )]
    pub interval_ms: u64,

    /// Per-fetch timeout in milliseconds
    #[arg(
        long = "poll.timeout-ms",
        default_value = "10000",
        env = "POLL_TIMEOUT_MS"
    )]
    pub timeout_ms: u64,

    /// Upper bound on the failure backoff delay in milliseconds
    #[arg(
        long = "poll.max-backoff-ms",
        default_value = "300000",
        env = "POLL_MAX_BACKOFF_MS"
    )]
    pub max_backoff_ms: u64,

    /// Fraction of the delay randomized to spread fetches out
    #[arg(
        long = "poll.jitter-ratio",
        default_value = "0.1",
        env = "POLL_JITTER_RATIO"
    )]
    pub jitter_ratio: f64,

    /// How often in milliseconds unreferenced cache entries are evicted
    #[arg(
        long = "poll.sweep-interval-ms",
        default_value = "60000",
        env = "POLL_SWEEP_INTERVAL_MS"
    )]
    pub sweep_interval_ms: u64,
}

impl PollArgs {
    pub fn to_config(&self) -> PollConfig {
        PollConfig::default()
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_max_backoff(Duration::from_millis(self.max_backoff_ms))
            .with_jitter_ratio(self.jitter_ratio)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Main portal arguments
#[derive(Debug, Clone, PartialEq, clap::Parser)]
#[command(name = "bifrost-portal", about = "Bifrost portal sync daemon")]
pub struct PortalArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let args = PortalArgs::parse_from(["bifrost-portal"]);

        assert_eq!(args.api.environment, Environment::Production);
        assert_eq!(args.poll.interval_ms, 30_000);
        assert_eq!(args.poll.timeout_ms, 10_000);
        assert_eq!(args.poll.max_backoff_ms, 300_000);
        assert_eq!(args.poll.jitter_ratio, 0.1);
        assert_eq!(args.poll.sweep_interval_ms, 60_000);
    }

    #[test]
    fn base_url_flag_overrides_the_environment() {
        let args = PortalArgs::parse_from([
            "bifrost-portal",
            "--api.environment",
            "dev",
            "--api.base-url",
            "http://10.0.0.5:8000",
        ]);

        let config = args.api.to_config();
        assert_eq!(config.base_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn environment_resolves_the_default_base_url() {
        let args = PortalArgs::parse_from(["bifrost-portal", "--api.environment", "development"]);

        let config = args.api.to_config();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.bearer_token, None);
    }

    #[test]
    fn poll_args_convert_to_a_valid_config() {
        let args = PortalArgs::parse_from([
            "bifrost-portal",
            "--poll.interval-ms",
            "5000",
            "--poll.timeout-ms",
            "1000",
        ]);

        let config = args.poll.to_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(1));
    }
}
