//! Main client for the Bifrost backend API.

use tracing::debug;

use crate::{
    Auth,
    AuthConfig,
    Config,
    Error,
    Result,
    metrics::{
        DashboardMetrics,
        compute_dashboard_metrics,
    },
    models::{
        ClusterInfo,
        DataUpload,
        Dataset,
        DeltaTable,
        DeltaTableHistory,
        HealthStatus,
        JobSubmission,
        JobSubmissionReceipt,
        QueryResult,
        SparkJob,
        TableQuery,
    },
    routes,
};

/// Typed client for Bifrost API operations.
///
/// Holds a connection pool, so cloning the client (or wrapping it in an
/// `Arc`) is the intended way to share it.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    http: reqwest::Client,
}

impl Client {
    /// Create a client from a validated [`Config`].
    ///
    /// A bearer token in the config becomes a default `Authorization`
    /// header on every request.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let auth = AuthConfig::new(token.clone())?;
            Auth::add_auth_config(&mut headers, &auth)?;
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn from_client(config: Config, http: reqwest::Client) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Typed endpoints.

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json(routes::HEALTH).await
    }

    pub async fn jobs(&self) -> Result<Vec<SparkJob>> {
        self.get_json(routes::JOBS).await
    }

    pub async fn job(&self, job_id: &str) -> Result<SparkJob> {
        self.get_json(&routes::job(job_id)).await
    }

    pub async fn submit_job(&self, submission: &JobSubmission) -> Result<JobSubmissionReceipt> {
        self.post_json(routes::SUBMIT_JOB, submission).await
    }

    pub async fn uploads(&self) -> Result<Vec<DataUpload>> {
        self.get_json(routes::UPLOADS).await
    }

    /// Upload a file as multipart form data under the `file` field.
    pub async fn upload_file(
        &self,
        filename: impl Into<String>,
        contents: Vec<u8>,
    ) -> Result<DataUpload> {
        let filename = filename.into();
        debug!(filename = %filename, size = contents.len(), "uploading file");

        let part = reqwest::multipart::Part::bytes(contents).file_name(filename);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url(routes::UPLOAD_FILE))
            .multipart(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    pub async fn datasets(&self) -> Result<Vec<Dataset>> {
        self.get_json(routes::DATASETS).await
    }

    pub async fn clusters(&self) -> Result<ClusterInfo> {
        self.get_json(routes::CLUSTERS).await
    }

    pub async fn delta_tables(&self) -> Result<Vec<DeltaTable>> {
        self.get_json(routes::DELTA_TABLES).await
    }

    pub async fn delta_table_history(&self, table_name: &str) -> Result<Vec<DeltaTableHistory>> {
        self.get_json(&routes::delta_table_history(table_name)).await
    }

    pub async fn query_table(&self, query: &TableQuery) -> Result<QueryResult> {
        self.post_json(routes::QUERY_TABLE, query).await
    }

    /// Fetch health and jobs concurrently and derive the dashboard numbers.
    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics> {
        let (health, jobs) = tokio::try_join!(self.health(), self.jobs())?;
        Ok(compute_dashboard_metrics(&health, &jobs))
    }

    // Request plumbing.

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Turn non-success statuses into [`Error::ApiError`] with the response
    /// body as the message, then decode the success body as JSON.
    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
