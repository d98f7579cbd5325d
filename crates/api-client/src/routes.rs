//! Route paths for the Bifrost backend API.
//!
//! Paths are relative to the configured base URL so they can be joined
//! against either environment.

pub const HEALTH: &str = "/api/health";
pub const JOBS: &str = "/api/jobs";
pub const SUBMIT_JOB: &str = "/api/jobs/spark";
pub const UPLOADS: &str = "/api/data/uploads";
pub const UPLOAD_FILE: &str = "/api/data/upload";
pub const DATASETS: &str = "/api/datasets";
pub const CLUSTERS: &str = "/api/spark/clusters";
pub const DELTA_TABLES: &str = "/api/catalog/delta-tables";
pub const QUERY_TABLE: &str = "/api/catalog/query";

/// Path for a single job's status.
pub fn job(job_id: &str) -> String {
    format!("{JOBS}/{job_id}")
}

/// Path for a Delta table's transaction history.
pub fn delta_table_history(table_name: &str) -> String {
    format!("{DELTA_TABLES}/{table_name}/history")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parameterized_paths_embed_their_argument() {
        assert_eq!(job("j-42"), "/api/jobs/j-42");
        assert_eq!(
            delta_table_history("sales"),
            "/api/catalog/delta-tables/sales/history"
        );
    }
}
