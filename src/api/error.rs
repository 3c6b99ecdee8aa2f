// ==========================================
// Sales Projection - API error type
// ==========================================
// Turns layer errors into stable codes + Spanish messages
// for whoever renders the result (CLI, HTTP adapter, UI).
// ==========================================

use crate::domain::Period;
use crate::engine::ProjectionError;
use crate::importer::error::{ImportError, RowSyntaxError};
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API layer error. Every message states its cause explicitly.
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== request =====
    #[error("entrada inválida: {0}")]
    InvalidInput(String),

    #[error("recurso no encontrado: {0}")]
    NotFound(String),

    // ===== import =====
    #[error("{0}")]
    FileFormat(String),

    #[error("{} fila(s) con errores de sintaxis", .0.len())]
    RowSyntax(Vec<RowSyntaxError>),

    #[error("{0}")]
    DuplicateInFile(String),

    #[error("Fila {row}: se esperaba {expected}, se encontró {found}")]
    Continuity {
        row: usize,
        expected: Period,
        found: Period,
    },

    // ===== projection =====
    #[error("{0}")]
    InsufficientData(String),

    // ===== concurrency =====
    #[error("{0}")]
    ConcurrentModification(String),

    // ===== data access =====
    #[error("error de base de datos: {0}")]
    DatabaseError(String),

    // ===== generic =====
    #[error("error interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure { .. } => {
                ApiError::ConcurrentModification(err.to_string())
            }
            RepositoryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RepositoryError::UniqueConstraintViolation(_)
            | RepositoryError::FieldValueError { .. } => ApiError::InvalidInput(err.to_string()),
            RepositoryError::ForeignKeyViolation(_)
            | RepositoryError::DatabaseConnectionError(_)
            | RepositoryError::LockError(_)
            | RepositoryError::DatabaseTransactionError(_)
            | RepositoryError::DatabaseQueryError(_) => ApiError::DatabaseError(err.to_string()),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_)
            | ImportError::InvalidHeader { .. }
            | ImportError::EmptyFile
            | ImportError::NoDataRows
            | ImportError::TooManyRows { .. } => ApiError::FileFormat(err.to_string()),
            ImportError::RowSyntax(errors) => ApiError::RowSyntax(errors),
            ImportError::DuplicateInFile { .. } => ApiError::DuplicateInFile(err.to_string()),
            ImportError::Continuity(brk) => ApiError::Continuity {
                row: brk.row,
                expected: brk.expected,
                found: brk.found,
            },
            ImportError::ConcurrentModification(_) => {
                ApiError::ConcurrentModification(err.to_string())
            }
            ImportError::CompanyNotFound(_) => ApiError::NotFound(err.to_string()),
            ImportError::Repository(repo_err) => ApiError::from(repo_err),
            ImportError::ConfigReadError { .. } | ImportError::InternalError(_) => {
                ApiError::InternalError(err.to_string())
            }
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::InsufficientData { .. } => ApiError::InsufficientData(err.to_string()),
            // Only reachable if stored data was written around the importer
            ProjectionError::DiscontinuousSeries { .. } => ApiError::InternalError(err.to_string()),
            ProjectionError::CompanyNotFound(_) | ProjectionError::RunNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ProjectionError::ConfigReadError { .. } => ApiError::InternalError(err.to_string()),
            ProjectionError::Repository(repo_err) => ApiError::from(repo_err),
        }
    }
}

/// Result alias
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// Error contract
// ==========================================

/// One row-level problem: `{row, error}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowErrorDto {
    pub row: usize,
    pub error: String,
}

/// Serialized failure handed to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rows: Vec<RowErrorDto>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::FileFormat(_) => "FILE_FORMAT_ERROR",
            ApiError::RowSyntax(_) => "ROW_SYNTAX_ERROR",
            ApiError::DuplicateInFile(_) => "DUPLICATE_IN_FILE",
            ApiError::Continuity { .. } => "CONTINUITY_ERROR",
            ApiError::InsufficientData(_) => "INSUFFICIENT_DATA",
            ApiError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ApiErrorResponse {
        let rows = match self {
            ApiError::RowSyntax(errors) => errors
                .iter()
                .map(|e| RowErrorDto {
                    row: e.row,
                    error: e.detail(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let details = match self {
            ApiError::Continuity {
                row,
                expected,
                found,
            } => Some(serde_json::json!({
                "row": row,
                "expected": expected,
                "found": found,
            })),
            _ => None,
        };

        ApiErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            rows,
            details,
        }
    }
}
