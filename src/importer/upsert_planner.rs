// ==========================================
// Sales Projection - Upsert planner
// ==========================================
// Stored period -> Update, otherwise -> Insert.
// Pure over the set of stored periods; one lookup for the whole file.
// ==========================================

use crate::domain::{Period, SalesRow, UpsertOperation, UpsertPlan};
use crate::importer::continuity::ContinuityOutcome;
use crate::importer::error::ImportResult;
use crate::repository::sales_history_repo::SalesHistoryRepository;
use std::collections::BTreeSet;

pub struct UpsertPlanner;

impl UpsertPlanner {
    /// Classify rows against a known set of stored periods
    pub fn plan(
        company_id: i64,
        base_period: Option<Period>,
        rows: &[SalesRow],
        stored: &BTreeSet<Period>,
    ) -> UpsertPlan {
        let operations = rows
            .iter()
            .map(|row| {
                if stored.contains(&row.period) {
                    UpsertOperation::Update(*row)
                } else {
                    UpsertOperation::Insert(*row)
                }
            })
            .collect();

        UpsertPlan {
            company_id,
            base_period,
            operations,
        }
    }

    /// Look up stored periods covering the rows, then classify
    pub async fn build<R>(
        &self,
        repo: &R,
        company_id: i64,
        outcome: &ContinuityOutcome,
    ) -> ImportResult<UpsertPlan>
    where
        R: SalesHistoryRepository + ?Sized,
    {
        let stored = match (outcome.rows.first(), outcome.rows.last()) {
            (Some(first), Some(last)) => {
                repo.existing_periods(company_id, first.period, last.period)
                    .await?
            }
            _ => BTreeSet::new(),
        };

        Ok(Self::plan(
            company_id,
            outcome.base_period,
            &outcome.rows,
            &stored,
        ))
    }
}
