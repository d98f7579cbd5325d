//! Wire models for the Bifrost backend's JSON payloads.

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Lifecycle state of a Spark job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
    Queued,
}

impl JobStatus {
    /// Whether the job still consumes cluster capacity.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Submitted | JobStatus::Running)
    }
}

/// Resource usage reported for a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetrics {
    pub cpu_usage: String,
    pub memory_usage: String,
    /// Human-formatted size, e.g. `"512MB"`.
    pub data_processed: String,
}

/// Output summary of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    pub rows_processed: u64,
    /// Human-formatted duration, e.g. `"3.2 seconds"`.
    pub execution_time: String,
    pub output_path: String,
    pub metrics: JobMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkJob {
    pub job_id: String,
    pub job_name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub job_type: String,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub results: Option<JobResults>,
}

/// Request body for submitting a Spark job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSubmission {
    pub job_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub european_compliance: Option<bool>,
}

/// Acknowledgement returned by the job submission endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobSubmissionReceipt {
    pub job_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub estimated_duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataUpload {
    pub upload_id: String,
    pub filename: String,
    pub size: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub path: String,
    pub size: u64,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub workers: u32,
    pub cores: u32,
    pub memory: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCapacity {
    pub cores: u32,
    pub memory: String,
    pub storage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub clusters: Vec<ClusterSummary>,
    pub total_capacity: ClusterCapacity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatuses {
    pub spark: String,
    pub minio: String,
    pub postgres: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceStatuses,
    pub region: String,
    pub compliance: String,
}

/// The backend is inconsistent about schema nullability: some tables encode
/// it as a boolean, others as the strings `"true"`/`"false"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NullableFlag {
    Bool(bool),
    Text(String),
}

impl NullableFlag {
    pub fn is_nullable(&self) -> bool {
        match self {
            NullableFlag::Bool(b) => *b,
            NullableFlag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: NullableFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaTable {
    pub name: String,
    pub path: String,
    pub version: u64,
    pub size_mb: f64,
    pub num_files: u64,
    #[serde(default)]
    pub rows: Option<u64>,
    pub schema: Vec<SchemaField>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One commit in a Delta table's transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaTableHistory {
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub operation_parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub operation_metrics: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub read_version: Option<u64>,
    #[serde(default)]
    pub isolation_level: Option<String>,
}

/// Request body for querying a Delta table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableQuery {
    pub table_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub data: Vec<Vec<serde_json::Value>>,
    pub row_count: u64,
    pub execution_time_ms: f64,
    pub table_version: u64,
}
