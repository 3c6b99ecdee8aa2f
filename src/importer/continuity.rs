// ==========================================
// Sales Projection - Continuity checker
// ==========================================
// Stored series per company must stay gap-free.
// Rows are sorted, then walked month by month:
//   Expecting(p) --row == p--> Expecting(p + 1) ... --> Completed
//   Expecting(p) --row != p--> Broken
// ==========================================

use crate::domain::{Period, SalesRow};
use crate::importer::error::{ContinuityBreak, ImportError, ImportResult};
use crate::repository::sales_history_repo::SalesHistoryRepository;
use tracing::debug;

// ==========================================
// Walk state
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityState {
    Expecting(Period),
    Completed,
    Broken(ContinuityBreak),
}

impl ContinuityState {
    /// Feed the next row (in chronological order)
    pub fn advance(self, row: &SalesRow) -> Self {
        match self {
            ContinuityState::Expecting(expected) if row.period == expected => {
                ContinuityState::Expecting(expected.successor())
            }
            ContinuityState::Expecting(expected) => ContinuityState::Broken(ContinuityBreak {
                row: row.row_number,
                expected,
                found: row.period,
            }),
            done => done,
        }
    }

    /// Close the walk once every row was fed
    pub fn finish(self) -> Self {
        match self {
            ContinuityState::Expecting(_) => ContinuityState::Completed,
            other => other,
        }
    }
}

/// Sorted rows plus the snapshot they were checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityOutcome {
    pub rows: Vec<SalesRow>,
    pub base_period: Option<Period>,
}

pub struct ContinuityChecker;

impl ContinuityChecker {
    /// First period the walk expects.
    ///
    /// - no stored data: the earliest row itself
    /// - earliest row already stored: that row (overwrite window)
    /// - otherwise: the month after the latest stored period
    pub fn start_period(latest: Option<Period>, first: Period, first_is_stored: bool) -> Period {
        match latest {
            None => first,
            Some(_) if first_is_stored => first,
            Some(latest) => latest.successor(),
        }
    }

    /// Walk sorted rows from `start`
    pub fn walk(start: Period, rows: &[SalesRow]) -> Result<(), ContinuityBreak> {
        let state = rows
            .iter()
            .fold(ContinuityState::Expecting(start), |state, row| {
                state.advance(row)
            })
            .finish();

        match state {
            ContinuityState::Broken(brk) => Err(brk),
            _ => Ok(()),
        }
    }

    /// Sort rows chronologically and check they extend the stored series
    pub async fn check<R>(
        &self,
        repo: &R,
        company_id: i64,
        mut rows: Vec<SalesRow>,
    ) -> ImportResult<ContinuityOutcome>
    where
        R: SalesHistoryRepository + ?Sized,
    {
        rows.sort_by_key(|row| row.period);

        let latest = repo.latest_period(company_id).await?;
        let Some(first) = rows.first().map(|row| row.period) else {
            return Ok(ContinuityOutcome {
                rows,
                base_period: latest,
            });
        };

        let first_is_stored = match latest {
            Some(latest) if first <= latest => {
                repo.exists(company_id, first.year, first.month).await?
            }
            _ => false,
        };

        let start = Self::start_period(latest, first, first_is_stored);
        debug!(
            company_id,
            start = %start,
            rows = rows.len(),
            "continuity walk"
        );

        Self::walk(start, &rows).map_err(ImportError::Continuity)?;

        Ok(ContinuityOutcome {
            rows,
            base_period: latest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn p(year: i32, month: u32) -> Period {
        Period::new(year, month).unwrap()
    }

    fn row(row_number: usize, year: i32, month: u32) -> SalesRow {
        SalesRow {
            row_number,
            period: p(year, month),
            amount: Decimal::ONE,
        }
    }

    #[test]
    fn test_state_machine_transitions() {
        let state = ContinuityState::Expecting(p(2024, 12));
        let state = state.advance(&row(2, 2024, 12));
        assert_eq!(state, ContinuityState::Expecting(p(2025, 1)));

        let broken = state.advance(&row(3, 2025, 3));
        assert!(matches!(broken, ContinuityState::Broken(_)));
        // Broken is terminal
        assert_eq!(broken.advance(&row(4, 2025, 1)), broken);
        assert_eq!(broken.finish(), broken);

        assert_eq!(
            ContinuityState::Expecting(p(2025, 2)).finish(),
            ContinuityState::Completed
        );
    }

    #[test]
    fn test_start_period() {
        assert_eq!(ContinuityChecker::start_period(None, p(2019, 5), false), p(2019, 5));
        assert_eq!(
            ContinuityChecker::start_period(Some(p(2024, 1)), p(2024, 1), true),
            p(2024, 1)
        );
        assert_eq!(
            ContinuityChecker::start_period(Some(p(2024, 1)), p(2024, 3), false),
            p(2024, 2)
        );
    }

    #[test]
    fn test_walk_reports_gap() {
        let rows = vec![row(2, 2024, 2), row(3, 2024, 4)];
        let brk = ContinuityChecker::walk(p(2024, 2), &rows).unwrap_err();
        assert_eq!(brk.row, 3);
        assert_eq!(brk.expected, p(2024, 3));
        assert_eq!(brk.found, p(2024, 4));
    }

    #[test]
    fn test_walk_crosses_year_boundary() {
        let rows = vec![row(2, 2023, 11), row(3, 2023, 12), row(4, 2024, 1)];
        assert!(ContinuityChecker::walk(p(2023, 11), &rows).is_ok());
    }
}
