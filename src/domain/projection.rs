// ==========================================
// Sales Projection - Projection domain model
// ==========================================
// Entities: projection_run (execution record) + projected_sales
// Lifecycle: one run per projection invocation, immutable afterwards;
//            deleting a run cascades to its projected rows
// ==========================================

use crate::domain::period::Period;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ProjectionMethod
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionMethod {
    LeastSquares,
    PercentGrowth,
    AbsoluteGrowth,
}

impl ProjectionMethod {
    pub const ALL: [ProjectionMethod; 3] = [
        ProjectionMethod::LeastSquares,
        ProjectionMethod::PercentGrowth,
        ProjectionMethod::AbsoluteGrowth,
    ];

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProjectionMethod::LeastSquares => "LEAST_SQUARES",
            ProjectionMethod::PercentGrowth => "PERCENT_GROWTH",
            ProjectionMethod::AbsoluteGrowth => "ABSOLUTE_GROWTH",
        }
    }

    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "LEAST_SQUARES" => Some(ProjectionMethod::LeastSquares),
            "PERCENT_GROWTH" => Some(ProjectionMethod::PercentGrowth),
            "ABSOLUTE_GROWTH" => Some(ProjectionMethod::AbsoluteGrowth),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProjectionMethod::LeastSquares => "Mínimos cuadrados",
            ProjectionMethod::PercentGrowth => "Incremento porcentual",
            ProjectionMethod::AbsoluteGrowth => "Incremento absoluto",
        };
        f.write_str(label)
    }
}

// ==========================================
// ProjectedPoint - one forecast month
// ==========================================
// Serializes flat as {year, month, amount}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    #[serde(flatten)]
    pub period: Period,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodForecast {
    pub method: ProjectionMethod,
    pub points: Vec<ProjectedPoint>,
}

// ==========================================
// ProjectionRun - execution record
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRun {
    pub run_id: String,
    pub company_id: i64,
    pub description: Option<String>,
    pub base_period: Period,   // last historical period of the input snapshot
    pub history_points: usize, // size of the input snapshot
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ProjectedSalesRecord - persisted forecast row
// ==========================================
// Key: (run_id, method, year, month)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedSalesRecord {
    pub run_id: String,
    pub method: ProjectionMethod,
    pub year: i32,
    pub month: u32,
    pub amount: Decimal,
}

impl ProjectedSalesRecord {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }
}

/// A run together with its forecasts grouped per method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRunDetail {
    pub run: ProjectionRun,
    pub forecasts: Vec<MethodForecast>,
}

impl ProjectionRunDetail {
    /// Flatten forecasts into persisted rows
    pub fn to_records(&self) -> Vec<ProjectedSalesRecord> {
        self.forecasts
            .iter()
            .flat_map(|forecast| {
                forecast.points.iter().map(move |point| ProjectedSalesRecord {
                    run_id: self.run.run_id.clone(),
                    method: forecast.method,
                    year: point.period.year,
                    month: point.period.month,
                    amount: point.amount,
                })
            })
            .collect()
    }

    /// Group persisted rows back into per-method forecasts (method order, then period order)
    pub fn from_records(run: ProjectionRun, mut records: Vec<ProjectedSalesRecord>) -> Self {
        records.sort_by(|a, b| a.method.cmp(&b.method).then(a.period().cmp(&b.period())));

        let forecasts = ProjectionMethod::ALL
            .iter()
            .filter_map(|method| {
                let points: Vec<ProjectedPoint> = records
                    .iter()
                    .filter(|r| r.method == *method)
                    .map(|r| ProjectedPoint {
                        period: r.period(),
                        amount: r.amount,
                    })
                    .collect();
                if points.is_empty() {
                    None
                } else {
                    Some(MethodForecast {
                        method: *method,
                        points,
                    })
                }
            })
            .collect();

        Self { run, forecasts }
    }

    pub fn forecast(&self, method: ProjectionMethod) -> Option<&MethodForecast> {
        self.forecasts.iter().find(|f| f.method == method)
    }
}
