// ==========================================
// Sales Projection - Repository error type
// ==========================================
// Tooling: thiserror derive
// ==========================================

use thiserror::Error;

/// Repository layer error
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== concurrency =====
    #[error("la serie de la empresa {company_id} cambió durante la importación: se leyó {expected}, ahora es {actual}")]
    OptimisticLockFailure {
        company_id: i64,
        expected: String,
        actual: String,
    },

    // ===== database =====
    #[error("registro no encontrado: {entity} con id={id}")]
    NotFound { entity: String, id: String },

    #[error("no se pudo abrir la base de datos: {0}")]
    DatabaseConnectionError(String),

    #[error("no se pudo obtener el bloqueo de la base de datos: {0}")]
    LockError(String),

    #[error("transacción fallida: {0}")]
    DatabaseTransactionError(String),

    #[error("consulta fallida: {0}")]
    DatabaseQueryError(String),

    #[error("restricción de unicidad violada: {0}")]
    UniqueConstraintViolation(String),

    #[error("restricción de clave foránea violada: {0}")]
    ForeignKeyViolation(String),

    // ===== data =====
    #[error("valor inválido en la columna {field}: {message}")]
    FieldValueError { field: String, message: String },

    // ===== generic =====
    #[error("error interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result alias
pub type RepositoryResult<T> = Result<T, RepositoryError>;
