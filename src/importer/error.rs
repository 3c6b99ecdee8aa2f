// ==========================================
// Sales Projection - Import error types
// ==========================================
// Tooling: thiserror derive
// Every variant is fatal for the import: nothing is written.
// ==========================================

use crate::domain::Period;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// Row-level syntax errors
// ==========================================

/// What is wrong with a single field (or the shape) of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowSyntaxKind {
    WrongColumnCount { found: usize },
    InvalidYear,
    InvalidMonth,
    InvalidAmount,
}

/// One syntax problem, keyed by physical row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSyntaxError {
    pub row: usize,
    pub kind: RowSyntaxKind,
    pub value: String, // offending raw value (the whole row for column-count errors)
}

impl RowSyntaxError {
    /// Message without the row prefix
    pub fn detail(&self) -> String {
        match &self.kind {
            RowSyntaxKind::WrongColumnCount { found } => format!(
                "número de columnas incorrecto: se esperaban 3, se encontraron {}",
                found
            ),
            RowSyntaxKind::InvalidYear => format!(
                "año inválido '{}': debe ser un entero entre 2000 y 2100",
                self.value
            ),
            RowSyntaxKind::InvalidMonth => format!(
                "mes inválido '{}': debe ser un entero entre 1 y 12",
                self.value
            ),
            RowSyntaxKind::InvalidAmount => format!(
                "monto inválido '{}': debe ser un número decimal no negativo",
                self.value
            ),
        }
    }
}

impl fmt::Display for RowSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fila {}: {}", self.row, self.detail())
    }
}

// ==========================================
// Continuity break
// ==========================================

/// First row that does not extend the stored series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityBreak {
    pub row: usize,
    pub expected: Period,
    pub found: Period,
}

impl fmt::Display for ContinuityBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fila {}: se esperaba {}, se encontró {}",
            self.row, self.expected, self.found
        )
    }
}

// ==========================================
// ImportErrorKind - coarse classification
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportErrorKind {
    FileFormat,
    RowSyntax,
    DuplicateInFile,
    Continuity,
    ConcurrentModification,
    NotFound,
    Persistence,
    Internal,
}

/// Import pipeline error
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== file format =====
    #[error("archivo no encontrado: {0}")]
    FileNotFound(String),

    #[error("formato de archivo no soportado: '{0}' (solo .csv, .xlsx o .xls)")]
    UnsupportedFormat(String),

    #[error("no se pudo leer el archivo: {0}")]
    FileReadError(String),

    #[error("error al leer la hoja de cálculo: {0}")]
    ExcelParseError(String),

    #[error("error al leer el CSV: {0}")]
    CsvParseError(String),

    #[error("encabezado inválido: se esperaba '{expected}', se encontró '{found}'")]
    InvalidHeader { expected: String, found: String },

    #[error("el archivo está vacío")]
    EmptyFile,

    #[error("el archivo no contiene filas de datos")]
    NoDataRows,

    #[error("el archivo tiene {found} filas de datos; el máximo permitido es {max}")]
    TooManyRows { max: usize, found: usize },

    // ===== row content =====
    #[error("{} fila(s) con errores de sintaxis", .0.len())]
    RowSyntax(Vec<RowSyntaxError>),

    #[error("período duplicado en el archivo: {period} aparece en las filas {first_row} y {duplicate_row}")]
    DuplicateInFile {
        period: Period,
        first_row: usize,
        duplicate_row: usize,
    },

    #[error("{0}")]
    Continuity(ContinuityBreak),

    // ===== storage =====
    #[error("importación concurrente detectada: {0}")]
    ConcurrentModification(String),

    #[error("empresa no encontrada: {0}")]
    CompanyNotFound(i64),

    #[error("error de persistencia: {0}")]
    Repository(RepositoryError),

    // ===== config =====
    #[error("no se pudo leer la configuración '{key}': {message}")]
    ConfigReadError { key: String, message: String },

    // ===== generic =====
    #[error("error interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_)
            | ImportError::InvalidHeader { .. }
            | ImportError::EmptyFile
            | ImportError::NoDataRows
            | ImportError::TooManyRows { .. } => ImportErrorKind::FileFormat,
            ImportError::RowSyntax(_) => ImportErrorKind::RowSyntax,
            ImportError::DuplicateInFile { .. } => ImportErrorKind::DuplicateInFile,
            ImportError::Continuity(_) => ImportErrorKind::Continuity,
            ImportError::ConcurrentModification(_) => ImportErrorKind::ConcurrentModification,
            ImportError::CompanyNotFound(_) => ImportErrorKind::NotFound,
            ImportError::Repository(_) => ImportErrorKind::Persistence,
            ImportError::ConfigReadError { .. }
            | ImportError::InternalError(_)
            | ImportError::Other(_) => ImportErrorKind::Internal,
        }
    }

    /// Row-level errors, empty for file-level failures
    pub fn row_errors(&self) -> &[RowSyntaxError] {
        match self {
            ImportError::RowSyntax(errors) => errors,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure { .. } => {
                ImportError::ConcurrentModification(err.to_string())
            }
            other => ImportError::Repository(other),
        }
    }
}

/// Result alias
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuity_message_names_both_periods() {
        let err = ImportError::Continuity(ContinuityBreak {
            row: 2,
            expected: Period::new(2024, 2).unwrap(),
            found: Period::new(2024, 3).unwrap(),
        });
        assert_eq!(
            err.to_string(),
            "Fila 2: se esperaba Febrero 2024, se encontró Marzo 2024"
        );
        assert_eq!(err.kind(), ImportErrorKind::Continuity);
    }

    #[test]
    fn test_lock_failure_maps_to_concurrent_modification() {
        let err: ImportError = RepositoryError::OptimisticLockFailure {
            company_id: 1,
            expected: "Enero 2024".to_string(),
            actual: "Febrero 2024".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ImportErrorKind::ConcurrentModification);

        let err: ImportError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.kind(), ImportErrorKind::Persistence);
    }

    #[test]
    fn test_row_error_display() {
        let err = RowSyntaxError {
            row: 5,
            kind: RowSyntaxKind::InvalidMonth,
            value: "13".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fila 5: mes inválido '13': debe ser un entero entre 1 y 12"
        );
    }
}
