// ==========================================
// Sales Projection - Sales history repository (rusqlite)
// ==========================================
// Table: historical_sales
// Amounts are stored as canonical decimal text to keep them exact.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{HistoricalSalesRecord, Period, UpsertOperation, UpsertPlan};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sales_history_repo::SalesHistoryRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Parse a decimal TEXT column inside a row mapper
pub(crate) fn decimal_column(raw: String, idx: usize) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an RFC 3339 timestamp column inside a row mapper
pub(crate) fn timestamp_column(raw: String, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn describe_period(period: Option<Period>) -> String {
    period
        .map(|p| p.to_string())
        .unwrap_or_else(|| "sin datos".to_string())
}

// ==========================================
// SalesHistoryRepositoryImpl
// ==========================================
pub struct SalesHistoryRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SalesHistoryRepositoryImpl {
    /// Open a repository on a database file
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn latest_period_in(conn: &Connection, company_id: i64) -> RepositoryResult<Option<Period>> {
        let period = conn
            .query_row(
                r#"
                SELECT year, month
                FROM historical_sales
                WHERE company_id = ?1
                ORDER BY year DESC, month DESC
                LIMIT 1
                "#,
                params![company_id],
                |row| {
                    Ok(Period {
                        year: row.get(0)?,
                        month: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(period)
    }

    fn stored_periods_in(conn: &Connection, company_id: i64) -> RepositoryResult<Vec<Period>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT year, month
            FROM historical_sales
            WHERE company_id = ?1
            ORDER BY year ASC, month ASC
            "#,
        )?;

        let periods = stmt
            .query_map(params![company_id], |row| {
                Ok(Period {
                    year: row.get(0)?,
                    month: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(periods)
    }
}

#[async_trait]
impl SalesHistoryRepository for SalesHistoryRepositoryImpl {
    async fn latest_period(&self, company_id: i64) -> RepositoryResult<Option<Period>> {
        let conn = self.get_conn()?;
        Self::latest_period_in(&conn, company_id)
    }

    async fn exists(&self, company_id: i64, year: i32, month: u32) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM historical_sales WHERE company_id = ?1 AND year = ?2 AND month = ?3",
                params![company_id, year, month],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    async fn existing_periods(
        &self,
        company_id: i64,
        from: Period,
        to: Period,
    ) -> RepositoryResult<BTreeSet<Period>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT year, month
            FROM historical_sales
            WHERE company_id = ?1
              AND (year * 12 + month - 1) BETWEEN ?2 AND ?3
            "#,
        )?;

        let periods = stmt
            .query_map(
                params![company_id, from.month_index(), to.month_index()],
                |row| {
                    Ok(Period {
                        year: row.get(0)?,
                        month: row.get(1)?,
                    })
                },
            )?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(periods)
    }

    async fn apply_batch(&self, plan: &UpsertPlan) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.get_conn()?;
        // IMMEDIATE takes the write lock up front so the snapshot check below
        // and the writes see the same state.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let actual = Self::latest_period_in(&tx, plan.company_id)?;
        if actual != plan.base_period {
            warn!(
                company_id = plan.company_id,
                expected = %describe_period(plan.base_period),
                actual = %describe_period(actual),
                "latest period moved since validation, rolling back"
            );
            return Err(RepositoryError::OptimisticLockFailure {
                company_id: plan.company_id,
                expected: describe_period(plan.base_period),
                actual: describe_period(actual),
            });
        }

        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        let mut updated = 0;
        {
            let mut insert_stmt = tx.prepare(
                r#"
                INSERT INTO historical_sales (
                    company_id, year, month, amount, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                "#,
            )?;
            let mut update_stmt = tx.prepare(
                r#"
                UPDATE historical_sales
                SET amount = ?4, updated_at = ?5
                WHERE company_id = ?1 AND year = ?2 AND month = ?3
                "#,
            )?;

            for op in &plan.operations {
                let row = op.row();
                let values = params![
                    plan.company_id,
                    row.period.year,
                    row.period.month,
                    row.amount.to_string(),
                    now,
                ];
                match op {
                    UpsertOperation::Insert(_) => {
                        insert_stmt.execute(values)?;
                        inserted += 1;
                    }
                    UpsertOperation::Update(_) => {
                        let affected = update_stmt.execute(values)?;
                        if affected != 1 {
                            return Err(RepositoryError::NotFound {
                                entity: "HistoricalSalesRecord".to_string(),
                                id: format!("{}/{}", plan.company_id, row.period),
                            });
                        }
                        updated += 1;
                    }
                }
            }
        }

        tx.commit()?;
        debug!(
            company_id = plan.company_id,
            inserted, updated, "sales batch committed"
        );
        Ok((inserted, updated))
    }

    async fn fetch_series(&self, company_id: i64) -> RepositoryResult<Vec<HistoricalSalesRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT company_id, year, month, amount, created_at, updated_at
            FROM historical_sales
            WHERE company_id = ?1
            ORDER BY year ASC, month ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![company_id], |row| {
                Ok(HistoricalSalesRecord {
                    company_id: row.get(0)?,
                    year: row.get(1)?,
                    month: row.get(2)?,
                    amount: decimal_column(row.get(3)?, 3)?,
                    created_at: timestamp_column(row.get(4)?, 4)?,
                    updated_at: timestamp_column(row.get(5)?, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    async fn count_records(&self, company_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM historical_sales WHERE company_id = ?1",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn find_gaps(&self, company_id: i64) -> RepositoryResult<Vec<Period>> {
        let conn = self.get_conn()?;
        let periods = Self::stored_periods_in(&conn, company_id)?;

        let mut gaps = Vec::new();
        for pair in periods.windows(2) {
            let mut expected = pair[0].successor();
            while expected < pair[1] {
                gaps.push(expected);
                expected = expected.successor();
            }
        }
        Ok(gaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::SalesRow;

    fn setup() -> SalesHistoryRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO company (company_id, name, created_at) VALUES (1, 'ACME', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        SalesHistoryRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn row(year: i32, month: u32, amount: i64) -> SalesRow {
        SalesRow {
            row_number: 2,
            period: Period::new(year, month).unwrap(),
            amount: Decimal::new(amount, 0),
        }
    }

    #[tokio::test]
    async fn test_apply_batch_inserts_and_reads_back() {
        let repo = setup();
        let plan = UpsertPlan {
            company_id: 1,
            base_period: None,
            operations: vec![
                UpsertOperation::Insert(row(2024, 1, 100)),
                UpsertOperation::Insert(row(2024, 2, 200)),
            ],
        };

        let (inserted, updated) = repo.apply_batch(&plan).await.unwrap();
        assert_eq!((inserted, updated), (2, 0));

        assert_eq!(
            repo.latest_period(1).await.unwrap(),
            Period::new(2024, 2)
        );
        assert!(repo.exists(1, 2024, 1).await.unwrap());
        assert!(!repo.exists(1, 2024, 3).await.unwrap());

        let series = repo.fetch_series(1).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].amount, Decimal::new(200, 0));
    }

    #[tokio::test]
    async fn test_apply_batch_rejects_stale_snapshot() {
        let repo = setup();
        let first = UpsertPlan {
            company_id: 1,
            base_period: None,
            operations: vec![UpsertOperation::Insert(row(2024, 1, 100))],
        };
        repo.apply_batch(&first).await.unwrap();

        // Built against the empty store, applied after another import committed
        let stale = UpsertPlan {
            company_id: 1,
            base_period: None,
            operations: vec![UpsertOperation::Insert(row(2024, 5, 100))],
        };
        let err = repo.apply_batch(&stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::OptimisticLockFailure { .. }));
        assert_eq!(repo.count_records(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_apply_batch_is_all_or_nothing() {
        let repo = setup();
        // The update targets a period that does not exist, after a valid insert
        let plan = UpsertPlan {
            company_id: 1,
            base_period: None,
            operations: vec![
                UpsertOperation::Insert(row(2024, 1, 100)),
                UpsertOperation::Update(row(2024, 2, 200)),
            ],
        };

        assert!(repo.apply_batch(&plan).await.is_err());
        assert_eq!(repo.count_records(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_existing_periods_and_gaps() {
        let repo = setup();
        {
            let conn = repo.get_conn().unwrap();
            for (year, month) in [(2023, 11), (2023, 12), (2024, 3)] {
                conn.execute(
                    "INSERT INTO historical_sales VALUES (1, ?1, ?2, '1', 'x', 'x')",
                    params![year, month],
                )
                .unwrap();
            }
        }

        let existing = repo
            .existing_periods(1, Period::new(2023, 12).unwrap(), Period::new(2024, 6).unwrap())
            .await
            .unwrap();
        assert_eq!(existing.len(), 2);
        assert!(existing.contains(&Period::new(2024, 3).unwrap()));

        let gaps = repo.find_gaps(1).await.unwrap();
        assert_eq!(
            gaps,
            vec![Period::new(2024, 1).unwrap(), Period::new(2024, 2).unwrap()]
        );
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_an_error() {
        let repo = setup();
        repo.get_conn()
            .unwrap()
            .execute(
                "INSERT INTO historical_sales VALUES (1, 2024, 1, '10', '2024-01-01T00:00:00Z', 'ayer')",
                [],
            )
            .unwrap();

        let err = repo.fetch_series(1).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseQueryError(_)), "{:?}", err);
    }
}
