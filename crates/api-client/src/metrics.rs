//! Dashboard metrics derived from the job list and health endpoints.
//!
//! The backend has no metrics endpoint; the dashboard numbers are computed
//! client-side from the payloads the poller already fetches.

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::models::{
    HealthStatus,
    JobStatus,
    ServiceStatuses,
    SparkJob,
};

/// Average execution time assumed when no completed job reports one.
const DEFAULT_AVG_QUERY_SECONDS: f64 = 2.1;

/// Monthly data-processing target, in megabytes, that the progress bar
/// measures against.
const DATA_PROCESSED_TARGET_MB: f64 = 2400.0;

/// One row in the dashboard's recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    pub icon: String,
}

/// Aggregated numbers shown on the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// Total data processed by completed jobs, formatted as gigabytes.
    pub data_processed: String,
    /// Percentage of the processing target reached, clamped to 100.
    pub data_processed_progress: f64,
    pub active_jobs: usize,
    /// Mean execution time of completed jobs, formatted as seconds.
    pub avg_query_time: String,
    pub gdpr_compliance: u8,
    /// The five most recently created jobs, newest first.
    pub recent_activity: Vec<RecentActivity>,
    pub services: ServiceStatuses,
}

/// Computes dashboard metrics from a health snapshot and the full job list.
pub fn compute_dashboard_metrics(health: &HealthStatus, jobs: &[SparkJob]) -> DashboardMetrics {
    let active_jobs = jobs.iter().filter(|job| job.status.is_active()).count();
    let completed: Vec<&SparkJob> = jobs
        .iter()
        .filter(|job| job.status == JobStatus::Completed)
        .collect();

    let avg_query_seconds = if completed.is_empty() {
        DEFAULT_AVG_QUERY_SECONDS
    } else {
        let total: f64 = completed
            .iter()
            .filter_map(|job| job.results.as_ref())
            .filter_map(|results| parse_seconds(&results.execution_time))
            .sum();
        total / completed.len() as f64
    };

    let total_mb: f64 = completed
        .iter()
        .filter_map(|job| job.results.as_ref())
        .filter_map(|results| parse_megabytes(&results.metrics.data_processed))
        .sum();

    let mut sorted: Vec<&SparkJob> = jobs.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let recent_activity = sorted
        .into_iter()
        .take(5)
        .map(|job| {
            let completed = job.status == JobStatus::Completed;
            RecentActivity {
                id: job.job_id.clone(),
                title: job.job_name.clone(),
                description: format!(
                    "{} {} job",
                    if completed { "Completed" } else { "Processing" },
                    job.job_type
                ),
                status: job.status,
                timestamp: job.created_at,
                icon: if completed { "✓" } else { "⚡" }.to_string(),
            }
        })
        .collect();

    DashboardMetrics {
        data_processed: format!("{:.1} GB", total_mb / 1024.0),
        data_processed_progress: (total_mb / DATA_PROCESSED_TARGET_MB).min(1.0) * 100.0,
        active_jobs,
        avg_query_time: format!("{avg_query_seconds:.1}s"),
        gdpr_compliance: 100,
        recent_activity,
        services: health.services.clone(),
    }
}

/// Parses a duration like `"3.2 seconds"`.
fn parse_seconds(text: &str) -> Option<f64> {
    text.trim()
        .strip_suffix("seconds")
        .map(str::trim)
        .unwrap_or(text.trim())
        .parse()
        .ok()
}

/// Parses a size like `"512MB"`, ignoring other units.
fn parse_megabytes(text: &str) -> Option<f64> {
    text.trim().strip_suffix("MB")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::models::{
        JobMetrics,
        JobResults,
    };

    fn health() -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
            services: ServiceStatuses {
                spark: "healthy".to_string(),
                minio: "healthy".to_string(),
                postgres: "healthy".to_string(),
            },
            region: "eu-west-1".to_string(),
            compliance: "GDPR".to_string(),
        }
    }

    fn job(id: &str, status: JobStatus, hour: u32) -> SparkJob {
        SparkJob {
            job_id: id.to_string(),
            job_name: format!("job-{id}"),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 4, 1, hour, 0, 0).unwrap(),
            job_type: "sql".to_string(),
            estimated_duration: None,
            progress: None,
            memory: None,
            results: None,
        }
    }

    fn completed_job(id: &str, hour: u32, execution_time: &str, data_processed: &str) -> SparkJob {
        let mut job = job(id, JobStatus::Completed, hour);
        job.results = Some(JobResults {
            rows_processed: 1000,
            execution_time: execution_time.to_string(),
            output_path: "s3://bifrost/out".to_string(),
            metrics: JobMetrics {
                cpu_usage: "40%".to_string(),
                memory_usage: "1GB".to_string(),
                data_processed: data_processed.to_string(),
            },
        });
        job
    }

    #[test]
    fn empty_job_list_falls_back_to_defaults() {
        let metrics = compute_dashboard_metrics(&health(), &[]);

        assert_eq!(metrics.active_jobs, 0);
        assert_eq!(metrics.avg_query_time, "2.1s");
        assert_eq!(metrics.data_processed, "0.0 GB");
        assert_eq!(metrics.data_processed_progress, 0.0);
        assert_eq!(metrics.gdpr_compliance, 100);
        assert!(metrics.recent_activity.is_empty());
    }

    #[test]
    fn aggregates_completed_job_results() {
        let jobs = vec![
            completed_job("a", 8, "2.0 seconds", "1024MB"),
            completed_job("b", 9, "4.0 seconds", "512MB"),
            job("c", JobStatus::Running, 10),
            job("d", JobStatus::Submitted, 11),
            job("e", JobStatus::Failed, 12),
        ];

        let metrics = compute_dashboard_metrics(&health(), &jobs);

        assert_eq!(metrics.active_jobs, 2);
        assert_eq!(metrics.avg_query_time, "3.0s");
        assert_eq!(metrics.data_processed, "1.5 GB");
        assert_eq!(metrics.data_processed_progress, 64.0);
    }

    #[test]
    fn progress_is_capped_at_the_target() {
        let jobs = vec![completed_job("a", 8, "1.0 seconds", "9000MB")];

        let metrics = compute_dashboard_metrics(&health(), &jobs);
        assert_eq!(metrics.data_processed_progress, 100.0);
    }

    #[test]
    fn recent_activity_is_newest_first_and_capped_at_five() {
        let jobs: Vec<SparkJob> = (0..7)
            .map(|i| job(&format!("j{i}"), JobStatus::Running, 6 + i))
            .collect();

        let metrics = compute_dashboard_metrics(&health(), &jobs);

        assert_eq!(metrics.recent_activity.len(), 5);
        assert_eq!(metrics.recent_activity[0].id, "j6");
        assert_eq!(metrics.recent_activity[4].id, "j2");
        assert_eq!(metrics.recent_activity[0].icon, "⚡");
        assert_eq!(
            metrics.recent_activity[0].description,
            "Processing sql job"
        );
    }

    #[test]
    fn completed_jobs_get_checkmark_activity_entries() {
        let jobs = vec![completed_job("a", 8, "2.0 seconds", "100MB")];

        let metrics = compute_dashboard_metrics(&health(), &jobs);
        assert_eq!(metrics.recent_activity[0].icon, "✓");
        assert_eq!(metrics.recent_activity[0].description, "Completed sql job");
    }

    #[rstest]
    #[case("3.2 seconds", Some(3.2))]
    #[case("3.2", Some(3.2))]
    #[case("fast", None)]
    fn parses_execution_times(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_seconds(text), expected);
    }

    #[rstest]
    #[case("512MB", Some(512.0))]
    #[case("1.5GB", None)]
    #[case("", None)]
    fn parses_data_sizes(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_megabytes(text), expected);
    }
}
