// ==========================================
// Sales Projection - History API
// ==========================================
// Companies and their stored monthly series (read side)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{Company, Period};
use crate::repository::{CompanyRepository, SalesHistoryRepository, SalesHistoryRepositoryImpl};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesPointDto {
    pub year: i32,
    pub month: u32,
    pub amount: Decimal,
}

/// Stored series of a company, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSeriesResponse {
    pub company_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_period: Option<Period>,
    pub records: Vec<SalesPointDto>,
    /// missing months between first and last; always empty for data written by the importer
    pub gaps: Vec<Period>,
}

pub struct HistoryApi {
    history_repo: SalesHistoryRepositoryImpl,
    company_repo: CompanyRepository,
}

impl HistoryApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            history_repo: SalesHistoryRepositoryImpl::from_connection(conn.clone()),
            company_repo: CompanyRepository::from_connection(conn),
        }
    }

    // ===== companies =====

    pub fn create_company(&self, company_id: i64, name: &str) -> ApiResult<Company> {
        if company_id <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "id de empresa inválido: {}",
                company_id
            )));
        }
        Ok(self.company_repo.create(company_id, name)?)
    }

    pub fn list_companies(&self) -> ApiResult<Vec<Company>> {
        Ok(self.company_repo.list()?)
    }

    /// Delete a company with its history and projection runs
    pub fn delete_company(&self, company_id: i64) -> ApiResult<()> {
        if self.company_repo.delete(company_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("empresa {}", company_id)))
        }
    }

    // ===== series =====

    pub async fn get_series(&self, company_id: i64) -> ApiResult<SalesSeriesResponse> {
        if !self.company_repo.exists(company_id)? {
            return Err(ApiError::NotFound(format!("empresa {}", company_id)));
        }

        let records = self.history_repo.fetch_series(company_id).await?;
        let gaps = self.history_repo.find_gaps(company_id).await?;

        Ok(SalesSeriesResponse {
            company_id,
            first_period: records.first().map(|r| r.period()),
            last_period: records.last().map(|r| r.period()),
            records: records
                .into_iter()
                .map(|r| SalesPointDto {
                    year: r.year,
                    month: r.month,
                    amount: r.amount,
                })
                .collect(),
            gaps,
        })
    }
}
