// ==========================================
// Sales Projection - Sales importer
// ==========================================
// File -> database for one company
// Flow: parse -> syntax -> duplicates -> continuity -> plan -> atomic write
// Any failure leaves the stored series untouched.
// ==========================================

use crate::config::{config_keys, ImportConfigReader};
use crate::domain::{ImportSummary, ParsedSalesFile};
use crate::importer::continuity::ContinuityChecker;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{UniversalFileParser, DEFAULT_MAX_DATA_ROWS};
use crate::importer::sales_importer_trait::SalesImporter;
use crate::importer::syntax_validator::SyntaxValidator;
use crate::importer::upsert_planner::UpsertPlanner;
use crate::repository::{RepositoryError, SalesHistoryRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

type CompanyLocks = Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>;

/// Handle on one company's import lock.
/// Dropping the last handle removes the company from the registry.
struct CompanyLockLease<'a> {
    locks: &'a CompanyLocks,
    company_id: i64,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for CompanyLockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // registry + this lease; clones are only handed out under the registry mutex
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.company_id);
        }
    }
}

// ==========================================
// SalesImporterImpl
// ==========================================
pub struct SalesImporterImpl<R, C>
where
    R: SalesHistoryRepository,
    C: ImportConfigReader,
{
    // data access
    history_repo: R,

    // config reader
    config: C,

    // pipeline stages
    file_parser: UniversalFileParser,
    syntax_validator: SyntaxValidator,
    continuity_checker: ContinuityChecker,
    upsert_planner: UpsertPlanner,

    // one async lock per company; imports of the same company run one at a time
    company_locks: CompanyLocks,
}

impl<R, C> SalesImporterImpl<R, C>
where
    R: SalesHistoryRepository,
    C: ImportConfigReader,
{
    /// # Arguments
    /// - history_repo: sales history gateway
    /// - config: reader for the row limit
    pub fn new(history_repo: R, config: C) -> Self {
        Self {
            history_repo,
            config,
            file_parser: UniversalFileParser,
            syntax_validator: SyntaxValidator,
            continuity_checker: ContinuityChecker,
            upsert_planner: UpsertPlanner,
            company_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn history_repo(&self) -> &R {
        &self.history_repo
    }

    fn company_lock(&self, company_id: i64) -> CompanyLockLease<'_> {
        let mut locks = self
            .company_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(company_id).or_default().clone();
        CompanyLockLease {
            locks: &self.company_locks,
            company_id,
            lock,
        }
    }

    /// Companies with an import waiting or running
    #[cfg(test)]
    fn locked_companies(&self) -> usize {
        self.company_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Configured row limit, never above the file format's 1000 rows
    async fn max_data_rows(&self) -> ImportResult<usize> {
        let configured = self
            .config
            .get_max_data_rows()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: config_keys::IMPORT_MAX_DATA_ROWS.to_string(),
                message: e.to_string(),
            })?;
        Ok(configured.clamp(1, DEFAULT_MAX_DATA_ROWS))
    }

    /// Everything after parsing
    async fn run_pipeline(
        &self,
        company_id: i64,
        parsed: ParsedSalesFile,
        started: Instant,
    ) -> ImportResult<ImportSummary> {
        // === Step 2: syntax + in-file duplicates (no I/O, outside the lock) ===
        let rows = self.syntax_validator.validate(&parsed.rows).map_err(|e| {
            warn!(error = %e, "syntax validation failed");
            e
        })?;
        debug!(rows = rows.len(), "syntax validation passed");

        // === Step 3..5 under the company lock ===
        let lease = self.company_lock(company_id);
        let _guard = lease.lock.lock().await;

        let outcome = self
            .continuity_checker
            .check(&self.history_repo, company_id, rows)
            .await
            .map_err(|e| {
                warn!(error = %e, "continuity check failed");
                e
            })?;

        let plan = self
            .upsert_planner
            .build(&self.history_repo, company_id, &outcome)
            .await?;
        debug!(
            inserts = plan.inserted_count(),
            updates = plan.updated_count(),
            "upsert plan built"
        );

        let (inserted, updated) = self
            .history_repo
            .apply_batch(&plan)
            .await
            .map_err(|e| match e {
                RepositoryError::ForeignKeyViolation(_) => ImportError::CompanyNotFound(company_id),
                other => {
                    error!(error = %other, "batch write failed");
                    ImportError::from(other)
                }
            })?;

        let (first_period, last_period) = match (outcome.rows.first(), outcome.rows.last()) {
            (Some(first), Some(last)) => (first.period, last.period),
            _ => return Err(ImportError::NoDataRows),
        };

        let summary = ImportSummary {
            company_id,
            file_name: parsed.file_name,
            total_rows: outcome.rows.len(),
            inserted_count: inserted,
            updated_count: updated,
            first_period,
            last_period,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            company_id,
            inserted,
            updated,
            elapsed_ms = summary.elapsed_ms,
            "sales import committed"
        );
        Ok(summary)
    }
}

#[async_trait]
impl<R, C> SalesImporter for SalesImporterImpl<R, C>
where
    R: SalesHistoryRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path))]
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        company_id: i64,
        file_path: P,
    ) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        info!(company_id, file = %file_path.as_ref().display(), "sales import started");

        // === Step 1: parse ===
        let max_rows = self.max_data_rows().await?;
        let parsed = self
            .file_parser
            .parse_path(file_path.as_ref(), max_rows)
            .map_err(|e| {
                error!(error = %e, "file parsing failed");
                e
            })?;

        self.run_pipeline(company_id, parsed, started).await
    }

    #[instrument(skip(self, content))]
    async fn import_bytes(
        &self,
        company_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        info!(company_id, bytes = content.len(), "sales import started");

        // === Step 1: parse ===
        let max_rows = self.max_data_rows().await?;
        let parsed = self
            .file_parser
            .parse_bytes(file_name, content, max_rows)
            .map_err(|e| {
                error!(error = %e, "file parsing failed");
                e
            })?;

        self.run_pipeline(company_id, parsed, started).await
    }

    async fn batch_import(
        &self,
        requests: Vec<(i64, PathBuf)>,
    ) -> Vec<ImportResult<ImportSummary>> {
        use futures::future::join_all;

        info!(count = requests.len(), "batch import started");

        let tasks = requests
            .into_iter()
            .map(|(company_id, path)| async move { self.import_file(company_id, path).await });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "batch import finished"
        );

        results
    }
}
