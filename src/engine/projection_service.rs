// ==========================================
// Sales Projection - Projection service
// ==========================================
// Flow: read committed series -> ProjectionEngine -> one execution record
// Runs only read history; concurrent imports never see partial runs.
// ==========================================

use crate::config::{config_keys, ProjectionConfigReader};
use crate::domain::{ProjectionRun, ProjectionRunDetail};
use crate::engine::projection::{ProjectionEngine, ProjectionError, ProjectionResult};
use crate::repository::{ProjectionRunRepository, RepositoryError, SalesHistoryRepository};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct ProjectionService<H, P, C>
where
    H: SalesHistoryRepository,
    P: ProjectionRunRepository,
    C: ProjectionConfigReader,
{
    history_repo: H,
    run_repo: P,
    config: C,
}

impl<H, P, C> ProjectionService<H, P, C>
where
    H: SalesHistoryRepository,
    P: ProjectionRunRepository,
    C: ProjectionConfigReader,
{
    pub fn new(history_repo: H, run_repo: P, config: C) -> Self {
        Self {
            history_repo,
            run_repo,
            config,
        }
    }

    /// Engine with the configured minimum history
    async fn engine(&self) -> ProjectionResult<ProjectionEngine> {
        let min_points = self
            .config
            .get_min_history_points()
            .await
            .map_err(|e| ProjectionError::ConfigReadError {
                key: config_keys::PROJECTION_MIN_HISTORY_POINTS.to_string(),
                message: e.to_string(),
            })?;
        Ok(ProjectionEngine::with_min_history(min_points))
    }

    /// Project a company's committed history and store the run
    ///
    /// # Returns
    /// - Ok(detail): the new run with every method's forecast
    /// - Err(InsufficientData): fewer points than configured; nothing stored
    #[instrument(skip(self))]
    pub async fn run_projection(
        &self,
        company_id: i64,
        description: Option<String>,
    ) -> ProjectionResult<ProjectionRunDetail> {
        let engine = self.engine().await?;
        let series = self.history_repo.fetch_series(company_id).await?;
        let forecasts = engine.project(&series)?;

        let base_period = engine.check_series(&series)?;
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let detail = ProjectionRunDetail {
            run: ProjectionRun {
                run_id: Uuid::new_v4().to_string(),
                company_id,
                description,
                base_period,
                history_points: series.len(),
                created_at: Utc::now(),
            },
            forecasts,
        };

        self.run_repo.create_run(&detail).await.map_err(|e| match e {
            RepositoryError::ForeignKeyViolation(_) => {
                ProjectionError::CompanyNotFound(company_id)
            }
            other => ProjectionError::Repository(other),
        })?;

        info!(
            company_id,
            run_id = %detail.run.run_id,
            history_points = detail.run.history_points,
            "projection run stored"
        );
        Ok(detail)
    }

    pub async fn get_run(&self, run_id: &str) -> ProjectionResult<ProjectionRunDetail> {
        self.run_repo
            .find_run_detail(run_id)
            .await?
            .ok_or_else(|| ProjectionError::RunNotFound(run_id.to_string()))
    }

    pub async fn list_runs(&self, company_id: i64) -> ProjectionResult<Vec<ProjectionRun>> {
        Ok(self.run_repo.list_runs(company_id).await?)
    }

    pub async fn delete_run(&self, run_id: &str) -> ProjectionResult<()> {
        if self.run_repo.delete_run(run_id).await? {
            info!(run_id, "projection run deleted");
            Ok(())
        } else {
            Err(ProjectionError::RunNotFound(run_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::{Period, ProjectionMethod};
    use crate::repository::{ProjectionRunRepositoryImpl, SalesHistoryRepositoryImpl};
    use rusqlite::{params, Connection};
    use std::sync::{Arc, Mutex};

    type Service =
        ProjectionService<SalesHistoryRepositoryImpl, ProjectionRunRepositoryImpl, ConfigManager>;

    fn setup(months: u32) -> Service {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO company (company_id, name, created_at) VALUES (1, 'ACME', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        for k in 0..months {
            conn.execute(
                "INSERT INTO historical_sales VALUES (1, 2024, ?1, ?2, 'x', 'x')",
                params![k + 1, (100_000 + 5_000 * k).to_string()],
            )
            .unwrap();
        }
        let conn = Arc::new(Mutex::new(conn));
        ProjectionService::new(
            SalesHistoryRepositoryImpl::from_connection(conn.clone()),
            ProjectionRunRepositoryImpl::from_connection(conn.clone()),
            ConfigManager::from_connection(conn).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_run_is_stored_and_reloadable() {
        let service = setup(12);
        let detail = service
            .run_projection(1, Some("  plan 2025 ".to_string()))
            .await
            .unwrap();

        assert_eq!(detail.run.base_period, Period::new(2024, 12).unwrap());
        assert_eq!(detail.run.history_points, 12);
        assert_eq!(detail.run.description.as_deref(), Some("plan 2025"));

        let loaded = service.get_run(&detail.run.run_id).await.unwrap();
        assert_eq!(loaded.forecasts, detail.forecasts);
        let least_squares = loaded.forecast(ProjectionMethod::LeastSquares).unwrap();
        assert_eq!(least_squares.points.len(), 12);
    }

    #[tokio::test]
    async fn test_insufficient_history_stores_nothing() {
        let service = setup(1);
        let err = service.run_projection(1, None).await.unwrap_err();
        assert!(matches!(err, ProjectionError::InsufficientData { .. }));
        assert!(service.list_runs(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_run() {
        let service = setup(2);
        let err = service.delete_run("missing").await.unwrap_err();
        assert!(matches!(err, ProjectionError::RunNotFound(_)));
    }
}
