//! Bearer-token handling for the Bifrost API client.

use crate::error::{
    Error,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Validated bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    token: String,
}

impl AuthConfig {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let config = Self {
            token: token.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::AuthError("Bearer token cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Format the token as an Authorization header value per RFC 6750.
    pub fn as_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Header construction helpers.
pub struct Auth;

impl Auth {
    /// Insert `Authorization: Bearer <token>` into `headers`.
    pub fn add_bearer_token(headers: &mut reqwest::header::HeaderMap, token: &str) -> Result<()> {
        use reqwest::header::{
            AUTHORIZATION,
            HeaderValue,
        };

        if token.trim().is_empty() {
            return Err(Error::AuthError(
                "Cannot add empty bearer token".to_string(),
            ));
        }

        let header_value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            Error::AuthError("Invalid token format: contains invalid characters".to_string())
        })?;

        headers.insert(AUTHORIZATION, header_value);
        Ok(())
    }

    /// Insert the header from an [`AuthConfig`].
    pub fn add_auth_config(
        headers: &mut reqwest::header::HeaderMap,
        config: &AuthConfig,
    ) -> Result<()> {
        Self::add_bearer_token(headers, config.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn auth_config_formats_the_header_value() {
        let config = AuthConfig::new("demo-token").unwrap();
        assert_eq!(config.as_header_value(), "Bearer demo-token");
        assert_eq!(config.token(), "demo-token");
    }

    #[test]
    fn empty_tokens_are_rejected() {
        assert_matches!(AuthConfig::new(""), Err(Error::AuthError(_)));
        assert_matches!(AuthConfig::new("   "), Err(Error::AuthError(_)));
    }

    #[test]
    fn add_bearer_token_sets_the_authorization_header() {
        let mut headers = reqwest::header::HeaderMap::new();
        Auth::add_bearer_token(&mut headers, "demo-token").unwrap();

        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer demo-token"
        );
    }

    #[test]
    fn add_bearer_token_rejects_control_characters() {
        let mut headers = reqwest::header::HeaderMap::new();
        let result = Auth::add_bearer_token(&mut headers, "bad\ntoken");

        assert_matches!(result, Err(Error::AuthError(_)));
        assert!(headers.is_empty());
    }

    #[test]
    fn add_auth_config_delegates_to_the_token() {
        let mut headers = reqwest::header::HeaderMap::new();
        let config = AuthConfig::new("tok").unwrap();
        Auth::add_auth_config(&mut headers, &config).unwrap();

        assert_eq!(headers.len(), 1);
    }
}
