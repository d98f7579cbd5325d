//! Transport seam: one fetch for one resource, no retries.
//!
//! Retry policy lives in the scheduler; a [`Fetcher`] only executes a single
//! request and classifies its failure. [`HttpFetcher`] is the production
//! implementation over reqwest; tests substitute scripted fetchers.

use async_trait::async_trait;
use http::Method;
use url::Url;

use crate::{
    entry::{
        Payload,
        ResourceKey,
    },
    error::{
        FetchError,
        SyncError,
    },
};

/// Declarative description of the request behind a resource key.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the fetcher's base URL, e.g. `/api/jobs`.
    pub path: String,
    /// Optional JSON body for non-GET requests.
    pub body: Option<Payload>,
    /// Extra headers beyond what the transport adds by default.
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn post(path: impl Into<String>, body: Payload) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Executes one network call for one resource key.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, key: &ResourceKey, spec: &RequestSpec) -> Result<Payload, FetchError>;
}

/// Reqwest-backed [`Fetcher`] speaking JSON to the Bifrost backend.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFetcher {
    /// Build a fetcher for `base_url`, attaching `Authorization: Bearer ...`
    /// to every request when a token is supplied.
    pub fn new(base_url: &str, bearer_token: Option<&str>) -> Result<Self, SyncError> {
        let base_url = normalize_base(base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(token) = bearer_token {
            let mut headers = reqwest::header::HeaderMap::new();
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| {
                    SyncError::InvalidConfig(
                        "bearer token contains invalid header characters".to_string(),
                    )
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Wrap an existing reqwest client, e.g. one shared with the typed API
    /// client.
    pub fn from_client(client: reqwest::Client, base_url: &str) -> Result<Self, SyncError> {
        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Network(format!("invalid request path '{path}': {e}")))
    }
}

/// Parse and force a trailing slash so `Url::join` appends instead of
/// replacing the last path segment.
fn normalize_base(base_url: &str) -> Result<Url, SyncError> {
    let mut text = base_url.trim().to_string();
    if text.is_empty() {
        return Err(SyncError::InvalidConfig("base URL cannot be empty".to_string()));
    }
    if !text.ends_with('/') {
        text.push('/');
    }
    Url::parse(&text).map_err(|e| SyncError::InvalidConfig(format!("invalid base URL: {e}")))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &ResourceKey, spec: &RequestSpec) -> Result<Payload, FetchError> {
        let url = self.resolve(&spec.path)?;
        let mut request = self.client.request(spec.method.clone(), url);
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        response.json::<Payload>().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                tracing::debug!(key = %key, error = %e, "response body failed to decode");
                FetchError::Decode(e.to_string())
            }
        })
    }
}
