// ==========================================
// Sales Projection - Import layer
// ==========================================
// Uploaded sales history -> verified, gap-free stored series
// Supports: CSV, Excel
// ==========================================

// module declarations
pub mod continuity;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod sales_importer_impl;
pub mod sales_importer_trait;
pub mod syntax_validator;
pub mod upsert_planner;

// core types
pub use continuity::{ContinuityChecker, ContinuityOutcome, ContinuityState};
pub use error::{
    ContinuityBreak, ImportError, ImportErrorKind, ImportResult, RowSyntaxError, RowSyntaxKind,
};
pub use file_parser::{CsvParser, ExcelParser, SpreadsheetKind, UniversalFileParser};
pub use sales_importer_impl::SalesImporterImpl;
pub use syntax_validator::SyntaxValidator;
pub use upsert_planner::UpsertPlanner;

// trait interfaces
pub use sales_importer_trait::{FileParser, SalesImporter};
