//! Configuration for the Bifrost API client.

use crate::error::{
    Error,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;
use std::str::FromStr;

/// Deployment environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// Local FastAPI backend.
    Development,
    /// Hosted Bifrost backend.
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Production
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(Error::ConfigError(format!(
                "Invalid environment '{s}'. Valid values are: development, dev, production, prod"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "Development"),
            Environment::Production => write!(f, "Production"),
        }
    }
}

impl Environment {
    /// Base URL of the backend for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:8000",
            Environment::Production => "https://api.bifrost-platform.dev",
        }
    }

    /// Read the environment from `BIFROST_ENV`, if set to a valid value.
    pub fn from_env() -> Option<Self> {
        std::env::var("BIFROST_ENV")
            .ok()
            .and_then(|val| val.parse().ok())
    }

    /// Like [`Environment::from_env`], falling back to `default` when the
    /// variable is unset or invalid.
    pub fn from_env_or(default: Self) -> Self {
        Self::from_env().unwrap_or(default)
    }
}

/// Configuration for the Bifrost API client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL for the API
    pub base_url: String,
    /// Bearer token for authentication
    pub bearer_token: Option<String>,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    pub fn from_environment(env: Environment) -> Self {
        Self::new(env.base_url())
    }

    /// Build a config from `BIFROST_ENV`, defaulting to production.
    pub fn from_env() -> Self {
        Self::from_environment(Environment::from_env_or(Environment::default()))
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Check that the base URL and token are usable.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::ConfigError("Base URL cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::ConfigError(
                "Base URL must start with http:// or https://".to_string(),
            ));
        }
        if let Some(token) = &self.bearer_token {
            if token.trim().is_empty() {
                return Err(Error::ConfigError(
                    "Bearer token cannot be empty or whitespace".to_string(),
                ));
            }
        }
        Ok(())
    }
}
