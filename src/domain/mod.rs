// ==========================================
// Sales Projection - Domain layer
// ==========================================
// Entities and value types only.
// No data access, no engine logic.
// ==========================================

pub mod company;
pub mod period;
pub mod projection;
pub mod sales;

pub use company::Company;
pub use period::{Period, MAX_YEAR, MIN_YEAR};
pub use projection::{
    MethodForecast, ProjectedPoint, ProjectedSalesRecord, ProjectionMethod, ProjectionRun,
    ProjectionRunDetail,
};
pub use sales::{
    HistoricalSalesRecord, ImportSummary, ParsedSalesFile, RawSalesRow, SalesRow, UpsertOperation,
    UpsertPlan,
};
