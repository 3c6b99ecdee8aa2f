// ==========================================
// Sales Projection - Core library
// ==========================================
// Monthly sales history import with continuity validation,
// and three-method sales projection over the stored series.
// Storage: SQLite
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain layer - entities and value types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - projection math and orchestration
pub mod engine;

// Import layer - file parsing and validation pipeline
pub mod importer;

// Config layer - runtime settings
pub mod config;

// Database bootstrap (PRAGMAs, schema)
pub mod db;

// Logging
pub mod logging;

// API layer - request entry points
pub mod api;

// Application layer - shared state
pub mod app;

// ==========================================
// Re-exports
// ==========================================

pub use domain::{
    Company, HistoricalSalesRecord, ImportSummary, MethodForecast, Period, ProjectionMethod,
    ProjectionRun, ProjectionRunDetail,
};

pub use engine::{ProjectionEngine, ProjectionService};

pub use importer::{SalesImporter, SalesImporterImpl};

pub use api::{ApiError, ApiErrorResponse, HistoryApi, ImportApi, ProjectionApi};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Sales Projection";
