// ==========================================
// Sales Projection - Historical sales domain model
// ==========================================
// Entities: historical_sales table + import pipeline intermediates
// Lifecycle: records are only created/updated by the import pipeline,
//            one commit per import
// ==========================================

use crate::domain::period::Period;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// HistoricalSalesRecord - stored monthly sales figure
// ==========================================
// Key: (company_id, year, month)
// Aligned with: historical_sales table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSalesRecord {
    pub company_id: i64,
    pub year: i32,
    pub month: u32,
    pub amount: Decimal, // exact amount, never negative

    // ===== audit =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HistoricalSalesRecord {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }
}

// ==========================================
// RawSalesRow - parser output
// ==========================================
// Untyped cells of one non-blank data row plus its physical row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSalesRow {
    pub row_number: usize, // 1-based; the header is row 1
    pub fields: Vec<String>,
}

// ==========================================
// ParsedSalesFile - parser output for a whole file
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSalesFile {
    pub file_name: String,
    pub rows: Vec<RawSalesRow>,
}

// ==========================================
// SalesRow - syntactically valid row
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    pub row_number: usize,
    pub period: Period,
    pub amount: Decimal,
}

// ==========================================
// UpsertOperation / UpsertPlan - write batch of one import
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "row", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertOperation {
    Insert(SalesRow),
    Update(SalesRow),
}

impl UpsertOperation {
    pub fn row(&self) -> &SalesRow {
        match self {
            UpsertOperation::Insert(row) | UpsertOperation::Update(row) => row,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, UpsertOperation::Update(_))
    }
}

/// Ordered write batch produced by the upsert planner.
///
/// `base_period` is the latest stored period observed when the plan was
/// built; the gateway refuses to apply the plan if it has moved since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPlan {
    pub company_id: i64,
    pub base_period: Option<Period>,
    pub operations: Vec<UpsertOperation>,
}

impl UpsertPlan {
    pub fn inserted_count(&self) -> usize {
        self.operations.iter().filter(|op| !op.is_update()).count()
    }

    pub fn updated_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_update()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

// ==========================================
// ImportSummary - successful import outcome
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub company_id: i64,
    pub file_name: String,
    pub total_rows: usize,
    pub inserted_count: usize,
    pub updated_count: usize,
    pub first_period: Period,
    pub last_period: Period,
    pub elapsed_ms: u64,
}
