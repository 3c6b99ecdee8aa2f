// ==========================================
// Sales Projection - Engine layer
// ==========================================
// Forecasting rules; no SQL here
// ==========================================

pub mod projection;
pub mod projection_service;

pub use projection::{
    ProjectionEngine, ProjectionError, ProjectionResult, FORECAST_HORIZON_MONTHS,
};
pub use projection_service::ProjectionService;
