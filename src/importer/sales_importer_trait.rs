// ==========================================
// Sales Projection - Sales import traits
// ==========================================
// Interfaces only; implementations live next to this file.
// ==========================================

use crate::domain::{ImportSummary, RawSalesRow};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// SalesImporter Trait
// ==========================================
// Implementor: SalesImporterImpl
#[async_trait]
pub trait SalesImporter: Send + Sync {
    /// Import a sales history file from disk for one company
    ///
    /// # Pipeline
    /// 1. parse (extension, header, row limit)
    /// 2. syntax validation (all row errors collected) + in-file duplicates
    /// 3. continuity against the stored series
    /// 4. upsert planning
    /// 5. one atomic write
    ///
    /// # Returns
    /// - Ok(ImportSummary): counts of inserted/updated periods
    /// - Err(ImportError): nothing was written
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        company_id: i64,
        file_path: P,
    ) -> ImportResult<ImportSummary>;

    /// Same pipeline over uploaded content; `file_name` selects the format
    async fn import_bytes(
        &self,
        company_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> ImportResult<ImportSummary>;

    /// Import several (company, file) pairs concurrently.
    /// Imports for the same company still run one at a time.
    /// Results come back in request order.
    async fn batch_import(
        &self,
        requests: Vec<(i64, PathBuf)>,
    ) -> Vec<ImportResult<ImportSummary>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// Turns file content into raw rows; knows nothing about sales.
pub trait FileParser: Send + Sync {
    /// # Arguments
    /// - `content`: whole file
    /// - `max_rows`: data rows allowed after the header
    ///
    /// # Returns
    /// Non-blank data rows with their physical 1-based row numbers
    fn parse_bytes(&self, content: &[u8], max_rows: usize) -> ImportResult<Vec<RawSalesRow>>;
}
