// ==========================================
// Sales Projection - Sales history repository trait
// ==========================================
// Persistence gateway for historical_sales, keyed by (company, year, month).
// Rule: no business logic here, only data access.
// ==========================================

use crate::domain::{HistoricalSalesRecord, Period, UpsertPlan};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::BTreeSet;

// ==========================================
// SalesHistoryRepository Trait
// ==========================================
// Implementor: SalesHistoryRepositoryImpl (rusqlite)
#[async_trait]
pub trait SalesHistoryRepository: Send + Sync {
    // ===== continuity queries =====

    /// Latest stored period of a company (None when it has no history)
    async fn latest_period(&self, company_id: i64) -> RepositoryResult<Option<Period>>;

    /// Whether a record exists for (company, year, month)
    async fn exists(&self, company_id: i64, year: i32, month: u32) -> RepositoryResult<bool>;

    /// Stored periods inside [from, to], in one round-trip
    async fn existing_periods(
        &self,
        company_id: i64,
        from: Period,
        to: Period,
    ) -> RepositoryResult<BTreeSet<Period>>;

    // ===== atomic write =====

    /// Apply an upsert plan in a single transaction.
    ///
    /// # Returns
    /// - Ok((inserted, updated))
    /// - Err(OptimisticLockFailure): latest stored period no longer matches `plan.base_period`
    /// - Err(_): any other failure; nothing is written
    async fn apply_batch(&self, plan: &UpsertPlan) -> RepositoryResult<(usize, usize)>;

    // ===== reads =====

    /// Whole series of a company in chronological order
    async fn fetch_series(&self, company_id: i64) -> RepositoryResult<Vec<HistoricalSalesRecord>>;

    /// Number of stored records of a company
    async fn count_records(&self, company_id: i64) -> RepositoryResult<usize>;

    /// Periods missing between the first and last stored period.
    /// Empty whenever the continuity invariant holds.
    async fn find_gaps(&self, company_id: i64) -> RepositoryResult<Vec<Period>>;
}
