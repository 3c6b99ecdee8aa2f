// ==========================================
// Sales Projection - Projection API
// ==========================================
// Run, inspect and delete projection executions
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::{MethodForecast, Period, ProjectionRun, ProjectionRunDetail};
use crate::engine::ProjectionService;
use crate::repository::{CompanyRepository, ProjectionRunRepositoryImpl, SalesHistoryRepositoryImpl};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A run with its forecasts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionApiResponse {
    pub run_id: String,
    pub company_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_period: Period,
    pub history_points: usize,
    pub created_at: DateTime<Utc>,
    pub forecasts: Vec<MethodForecast>,
}

impl From<ProjectionRunDetail> for ProjectionApiResponse {
    fn from(detail: ProjectionRunDetail) -> Self {
        let ProjectionRunDetail { run, forecasts } = detail;
        Self {
            run_id: run.run_id,
            company_id: run.company_id,
            description: run.description,
            base_period: run.base_period,
            history_points: run.history_points,
            created_at: run.created_at,
            forecasts,
        }
    }
}

/// Run header for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRunSummary {
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub base_period: Period,
    pub history_points: usize,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectionRun> for ProjectionRunSummary {
    fn from(run: ProjectionRun) -> Self {
        Self {
            run_id: run.run_id,
            description: run.description,
            base_period: run.base_period,
            history_points: run.history_points,
            created_at: run.created_at,
        }
    }
}

// ==========================================
// ProjectionApi
// ==========================================
pub struct ProjectionApi {
    service: ProjectionService<SalesHistoryRepositoryImpl, ProjectionRunRepositoryImpl, ConfigManager>,
    company_repo: CompanyRepository,
}

impl ProjectionApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::DatabaseError(format!("no se pudo crear la configuración: {}", e)))?;
        Ok(Self {
            service: ProjectionService::new(
                SalesHistoryRepositoryImpl::from_connection(conn.clone()),
                ProjectionRunRepositoryImpl::from_connection(conn.clone()),
                config,
            ),
            company_repo: CompanyRepository::from_connection(conn),
        })
    }

    /// Project the committed history of a company
    ///
    /// # Returns
    /// - Ok: new run id and, per method, the projected months
    /// - Err(InsufficientData): not enough history; nothing stored
    pub async fn run_projection(
        &self,
        company_id: i64,
        description: Option<&str>,
    ) -> ApiResult<ProjectionApiResponse> {
        if !self.company_repo.exists(company_id)? {
            return Err(ApiError::NotFound(format!("empresa {}", company_id)));
        }
        let detail = self
            .service
            .run_projection(company_id, description.map(str::to_string))
            .await?;
        Ok(detail.into())
    }

    pub async fn get_run(&self, run_id: &str) -> ApiResult<ProjectionApiResponse> {
        Ok(self.service.get_run(run_id.trim()).await?.into())
    }

    /// Newest first
    pub async fn list_runs(&self, company_id: i64) -> ApiResult<Vec<ProjectionRunSummary>> {
        let runs = self.service.list_runs(company_id).await?;
        Ok(runs.into_iter().map(ProjectionRunSummary::from).collect())
    }

    pub async fn delete_run(&self, run_id: &str) -> ApiResult<()> {
        Ok(self.service.delete_run(run_id.trim()).await?)
    }
}
