// ==========================================
// Sales Projection - Company repository
// ==========================================
// Table: company
// Only what the import/projection core needs: register, look up, remove.
// Deleting a company cascades to its history and projection runs.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::Company;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sales_history_repo_impl::timestamp_column;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct CompanyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompanyRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Register a company
    ///
    /// # Returns
    /// - Err(UniqueConstraintViolation): the id is already taken
    pub fn create(&self, company_id: i64, name: &str) -> RepositoryResult<Company> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "name".to_string(),
                message: "el nombre de la empresa no puede estar vacío".to_string(),
            });
        }

        let created_at = Utc::now();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO company (company_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![company_id, name, created_at.to_rfc3339()],
        )?;

        Ok(Company {
            company_id,
            name: name.to_string(),
            created_at,
        })
    }

    pub fn find_by_id(&self, company_id: i64) -> RepositoryResult<Option<Company>> {
        let conn = self.get_conn()?;
        let company = conn
            .query_row(
                "SELECT company_id, name, created_at FROM company WHERE company_id = ?1",
                params![company_id],
                |row| {
                    Ok(Company {
                        company_id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: timestamp_column(row.get(2)?, 2)?,
                    })
                },
            )
            .optional()?;
        Ok(company)
    }

    pub fn exists(&self, company_id: i64) -> RepositoryResult<bool> {
        Ok(self.find_by_id(company_id)?.is_some())
    }

    pub fn list(&self) -> RepositoryResult<Vec<Company>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT company_id, name, created_at FROM company ORDER BY company_id")?;
        let companies = stmt
            .query_map([], |row| {
                Ok(Company {
                    company_id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: timestamp_column(row.get(2)?, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(companies)
    }

    /// Remove a company together with everything it owns
    ///
    /// # Returns
    /// - Ok(true): deleted
    /// - Ok(false): no such company
    pub fn delete(&self, company_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM company WHERE company_id = ?1",
            params![company_id],
        )?;
        Ok(affected > 0)
    }
}
