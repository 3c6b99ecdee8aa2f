// ==========================================
// Sales Projection - Company (tenant)
// ==========================================
// Owns its sales history and projection runs.
// Only the fields the core needs; full company management lives elsewhere.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub company_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
