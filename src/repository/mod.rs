// ==========================================
// Sales Projection - Repository layer
// ==========================================
// Rule: repositories hold no business logic
// ==========================================
// Data access behind traits; every query is parameterized
// ==========================================

pub mod company_repo;
pub mod error;
pub mod projection_run_repo;
pub mod projection_run_repo_impl;
pub mod sales_history_repo;
pub mod sales_history_repo_impl;

pub use company_repo::CompanyRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use projection_run_repo::ProjectionRunRepository;
pub use projection_run_repo_impl::ProjectionRunRepositoryImpl;
pub use sales_history_repo::SalesHistoryRepository;
pub use sales_history_repo_impl::SalesHistoryRepositoryImpl;
