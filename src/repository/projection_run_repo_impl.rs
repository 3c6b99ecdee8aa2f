// ==========================================
// Sales Projection - Projection run repository (rusqlite)
// ==========================================
// Tables: projection_run, projected_sales
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{Period, ProjectedSalesRecord, ProjectionMethod, ProjectionRun, ProjectionRunDetail};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::projection_run_repo::ProjectionRunRepository;
use crate::repository::sales_history_repo_impl::{decimal_column, timestamp_column};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const RUN_COLUMNS: &str =
    "run_id, company_id, description, base_year, base_month, history_points, created_at";

fn map_run(row: &Row<'_>) -> rusqlite::Result<ProjectionRun> {
    let history_points: i64 = row.get(5)?;
    Ok(ProjectionRun {
        run_id: row.get(0)?,
        company_id: row.get(1)?,
        description: row.get(2)?,
        base_period: Period {
            year: row.get(3)?,
            month: row.get(4)?,
        },
        history_points: history_points.max(0) as usize,
        created_at: timestamp_column(row.get(6)?, 6)?,
    })
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<ProjectedSalesRecord> {
    let raw_method: String = row.get(1)?;
    let method = ProjectionMethod::from_db_str(&raw_method).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("método de proyección desconocido: {}", raw_method).into(),
        )
    })?;
    Ok(ProjectedSalesRecord {
        run_id: row.get(0)?,
        method,
        year: row.get(2)?,
        month: row.get(3)?,
        amount: decimal_column(row.get(4)?, 4)?,
    })
}

// ==========================================
// ProjectionRunRepositoryImpl
// ==========================================
pub struct ProjectionRunRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectionRunRepositoryImpl {
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

    fn find_run_in(conn: &Connection, run_id: &str) -> RepositoryResult<Option<ProjectionRun>> {
        let sql = format!("SELECT {} FROM projection_run WHERE run_id = ?1", RUN_COLUMNS);
        let run = conn.query_row(&sql, params![run_id], map_run).optional()?;
        Ok(run)
    }
}

#[async_trait]
impl ProjectionRunRepository for ProjectionRunRepositoryImpl {
    async fn create_run(&self, detail: &ProjectionRunDetail) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let run = &detail.run;
        tx.execute(
            r#"
            INSERT INTO projection_run (
                run_id, company_id, description, base_year, base_month,
                history_points, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                run.run_id,
                run.company_id,
                run.description,
                run.base_period.year,
                run.base_period.month,
                run.history_points as i64,
                run.created_at.to_rfc3339(),
            ],
        )?;

        let records = detail.to_records();
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO projected_sales (run_id, method, year, month, amount)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for record in &records {
                stmt.execute(params![
                    record.run_id,
                    record.method.to_db_str(),
                    record.year,
                    record.month,
                    record.amount.to_string(),
                ])?;
            }
        }

        tx.commit()?;
        debug!(run_id = %run.run_id, rows = records.len(), "projection run stored");
        Ok(())
    }

    async fn find_run(&self, run_id: &str) -> RepositoryResult<Option<ProjectionRun>> {
        let conn = self.get_conn()?;
        Self::find_run_in(&conn, run_id)
    }

    async fn find_run_detail(&self, run_id: &str) -> RepositoryResult<Option<ProjectionRunDetail>> {
        let conn = self.get_conn()?;
        let Some(run) = Self::find_run_in(&conn, run_id)? else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, method, year, month, amount
            FROM projected_sales
            WHERE run_id = ?1
            ORDER BY method, year, month
            "#,
        )?;
        let records = stmt
            .query_map(params![run_id], map_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ProjectionRunDetail::from_records(run, records)))
    }

    async fn list_runs(&self, company_id: i64) -> RepositoryResult<Vec<ProjectionRun>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM projection_run WHERE company_id = ?1 ORDER BY created_at DESC, rowid DESC",
            RUN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![company_id], map_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    async fn delete_run(&self, run_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM projection_run WHERE run_id = ?1",
            params![run_id],
        )?;
        Ok(affected > 0)
    }

    async fn count_records(&self, run_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projected_sales WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
