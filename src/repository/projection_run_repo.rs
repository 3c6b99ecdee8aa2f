// ==========================================
// Sales Projection - Projection run repository trait
// ==========================================
// Execution records: projection_run + projected_sales.
// Runs are written once and never modified.
// ==========================================

use crate::domain::{ProjectionRun, ProjectionRunDetail};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait ProjectionRunRepository: Send + Sync {
    /// Persist a run and all of its projected rows in one transaction
    async fn create_run(&self, detail: &ProjectionRunDetail) -> RepositoryResult<()>;

    async fn find_run(&self, run_id: &str) -> RepositoryResult<Option<ProjectionRun>>;

    /// Run plus its forecasts grouped per method
    async fn find_run_detail(&self, run_id: &str) -> RepositoryResult<Option<ProjectionRunDetail>>;

    /// Runs of a company, newest first
    async fn list_runs(&self, company_id: i64) -> RepositoryResult<Vec<ProjectionRun>>;

    /// Delete a run; projected rows cascade. Returns false if it did not exist.
    async fn delete_run(&self, run_id: &str) -> RepositoryResult<bool>;

    /// Number of projected rows owned by a run
    async fn count_records(&self, run_id: &str) -> RepositoryResult<usize>;
}
