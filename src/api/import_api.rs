// ==========================================
// Sales Projection - Import API
// ==========================================
// Entry point for sales history uploads
// ==========================================

use crate::api::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::config::ConfigManager;
use crate::domain::{ImportSummary, Period};
use crate::importer::{SalesImporter, SalesImporterImpl};
use crate::repository::{CompanyRepository, SalesHistoryRepositoryImpl};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    pub company_id: i64,
    pub file_name: String,
    /// periods that did not exist before
    pub inserted_count: usize,
    /// periods whose amount was overwritten
    pub updated_count: usize,
    pub total_rows: usize,
    pub first_period: Period,
    pub last_period: Period,
    pub elapsed_ms: u64,
}

impl From<ImportSummary> for ImportApiResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            company_id: summary.company_id,
            file_name: summary.file_name,
            inserted_count: summary.inserted_count,
            updated_count: summary.updated_count,
            total_rows: summary.total_rows,
            first_period: summary.first_period,
            last_period: summary.last_period,
            elapsed_ms: summary.elapsed_ms,
        }
    }
}

/// One entry of a multi-company batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchImportItem {
    pub company_id: i64,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ImportApiResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorResponse>,
}

// ==========================================
// ImportApi
// ==========================================
// Holds one importer for its whole lifetime so the per-company
// serialization covers every request going through this instance.
pub struct ImportApi {
    importer: SalesImporterImpl<SalesHistoryRepositoryImpl, ConfigManager>,
    company_repo: CompanyRepository,
}

impl ImportApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::DatabaseError(format!("no se pudo crear la configuración: {}", e)))?;
        Ok(Self {
            importer: SalesImporterImpl::new(
                SalesHistoryRepositoryImpl::from_connection(conn.clone()),
                config,
            ),
            company_repo: CompanyRepository::from_connection(conn),
        })
    }

    fn ensure_company(&self, company_id: i64) -> ApiResult<()> {
        if self.company_repo.exists(company_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("empresa {}", company_id)))
        }
    }

    /// Import an uploaded file
    ///
    /// # Arguments
    /// - company_id: owner of the series
    /// - file_name: original name; its extension selects the format
    /// - content: raw file bytes
    pub async fn import_upload(
        &self,
        company_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> ApiResult<ImportApiResponse> {
        if file_name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "el nombre del archivo no puede estar vacío".to_string(),
            ));
        }
        self.ensure_company(company_id)?;

        let summary = self
            .importer
            .import_bytes(company_id, file_name.trim(), content)
            .await?;
        Ok(summary.into())
    }

    /// Import a file from disk
    pub async fn import_file(
        &self,
        company_id: i64,
        file_path: &Path,
    ) -> ApiResult<ImportApiResponse> {
        self.ensure_company(company_id)?;
        let summary = self.importer.import_file(company_id, file_path).await?;
        Ok(summary.into())
    }

    /// Import several (company, file) pairs concurrently; one result per entry
    pub async fn batch_import(&self, requests: Vec<(i64, PathBuf)>) -> Vec<BatchImportItem> {
        let labels: Vec<(i64, String)> = requests
            .iter()
            .map(|(company_id, path)| (*company_id, path.display().to_string()))
            .collect();

        let results = self.importer.batch_import(requests).await;

        labels
            .into_iter()
            .zip(results)
            .map(|((company_id, file_path), result)| match result {
                Ok(summary) => BatchImportItem {
                    company_id,
                    file_path,
                    result: Some(summary.into()),
                    error: None,
                },
                Err(err) => BatchImportItem {
                    company_id,
                    file_path,
                    result: None,
                    error: Some(ApiError::from(err).to_response()),
                },
            })
            .collect()
    }
}
