// ==========================================
// Sales Projection - API layer
// ==========================================
// Request-scoped entry points used by the CLI and any outer adapter
// ==========================================

pub mod error;
pub mod history_api;
pub mod import_api;
pub mod projection_api;

pub use error::{ApiError, ApiErrorResponse, ApiResult, RowErrorDto};
pub use history_api::{HistoryApi, SalesPointDto, SalesSeriesResponse};
pub use import_api::{BatchImportItem, ImportApi, ImportApiResponse};
pub use projection_api::{ProjectionApi, ProjectionApiResponse, ProjectionRunSummary};
