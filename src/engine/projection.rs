// ==========================================
// Sales Projection - Projection engine
// ==========================================
// Input: contiguous monthly series, oldest first
// Output: one forecast per method, 12 months after the last period
// Rule: no SQL here; the three methods share one input snapshot
// ==========================================

use crate::domain::{HistoricalSalesRecord, MethodForecast, Period, ProjectedPoint, ProjectionMethod};
use crate::repository::error::RepositoryError;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Projection error
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("datos insuficientes: se necesitan al menos {required} meses de historia y hay {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("la serie histórica no es continua: después de {after} se esperaba {expected}, se encontró {found}")]
    DiscontinuousSeries {
        after: Period,
        expected: Period,
        found: Period,
    },

    #[error("empresa no encontrada: {0}")]
    CompanyNotFound(i64),

    #[error("ejecución de proyección no encontrada: {0}")]
    RunNotFound(String),

    #[error("no se pudo leer la configuración '{key}': {message}")]
    ConfigReadError { key: String, message: String },

    #[error("error de persistencia: {0}")]
    Repository(#[from] RepositoryError),
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Months projected per method
pub const FORECAST_HORIZON_MONTHS: u32 = 12;

/// Round to cents; NaN/inf collapse to zero
fn to_amount(value: f64) -> Decimal {
    if !value.is_finite() || value == 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// ==========================================
// ProjectionEngine
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ProjectionEngine {
    horizon_months: u32,
    min_history_points: usize,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self {
            horizon_months: FORECAST_HORIZON_MONTHS,
            min_history_points: 2,
        }
    }
}

impl ProjectionEngine {
    /// `horizon_months` is kept within 1..=12; `min_history_points` is raised
    /// to 2 since no method is defined on fewer points
    pub fn new(horizon_months: u32, min_history_points: usize) -> Self {
        Self {
            horizon_months: horizon_months.clamp(1, FORECAST_HORIZON_MONTHS),
            min_history_points: min_history_points.max(2),
        }
    }

    /// Full 12-month horizon with the given minimum history
    pub fn with_min_history(min_history_points: usize) -> Self {
        Self::new(FORECAST_HORIZON_MONTHS, min_history_points)
    }

    pub fn horizon_months(&self) -> u32 {
        self.horizon_months
    }

    /// Check length and contiguity of the input series
    pub fn check_series(&self, series: &[HistoricalSalesRecord]) -> ProjectionResult<Period> {
        if series.len() < self.min_history_points {
            return Err(ProjectionError::InsufficientData {
                required: self.min_history_points,
                available: series.len(),
            });
        }

        for pair in series.windows(2) {
            let (prev, next) = (pair[0].period(), pair[1].period());
            if next != prev.successor() {
                return Err(ProjectionError::DiscontinuousSeries {
                    after: prev,
                    expected: prev.successor(),
                    found: next,
                });
            }
        }

        series
            .last()
            .map(|r| r.period())
            .ok_or(ProjectionError::InsufficientData {
                required: self.min_history_points,
                available: 0,
            })
    }

    /// All three forecasts from the same snapshot
    pub fn project(&self, series: &[HistoricalSalesRecord]) -> ProjectionResult<Vec<MethodForecast>> {
        let last_period = self.check_series(series)?;
        let values: Vec<f64> = series
            .iter()
            .map(|r| r.amount.to_f64().unwrap_or(0.0))
            .collect();

        Ok(ProjectionMethod::ALL
            .iter()
            .map(|method| {
                let amounts = match method {
                    ProjectionMethod::LeastSquares => self.least_squares(&values),
                    ProjectionMethod::PercentGrowth => self.percent_growth(&values),
                    ProjectionMethod::AbsoluteGrowth => self.absolute_growth(&values),
                };
                MethodForecast {
                    method: *method,
                    points: amounts
                        .into_iter()
                        .enumerate()
                        .map(|(i, amount)| ProjectedPoint {
                            period: last_period.plus_months(i as u32 + 1),
                            amount,
                        })
                        .collect(),
                }
            })
            .collect())
    }

    // ===== methods =====
    // Each takes at least two values (checked by `project`).

    /// amount = a·t + b fitted on t = 0..n-1, evaluated on t = n..n+h-1, clamped at 0
    pub fn least_squares(&self, values: &[f64]) -> Vec<Decimal> {
        let n = values.len() as f64;
        let (mut sum_t, mut sum_y, mut sum_ty, mut sum_tt) = (0.0, 0.0, 0.0, 0.0);
        for (i, y) in values.iter().enumerate() {
            let t = i as f64;
            sum_t += t;
            sum_y += y;
            sum_ty += t * y;
            sum_tt += t * t;
        }

        let denominator = n * sum_tt - sum_t * sum_t;
        let slope = if denominator == 0.0 {
            0.0
        } else {
            (n * sum_ty - sum_t * sum_y) / denominator
        };
        let intercept = (sum_y - slope * sum_t) / n;

        (0..self.horizon_months)
            .map(|k| {
                let t = values.len() as f64 + f64::from(k);
                to_amount((slope * t + intercept).max(0.0))
            })
            .collect()
    }

    /// Mean month-over-month ratio compounded from the last value.
    /// Ratios over a zero month are skipped; with none left the rate is 0.
    pub fn percent_growth(&self, values: &[f64]) -> Vec<Decimal> {
        let rates: Vec<f64> = values
            .windows(2)
            .filter(|pair| pair[0] != 0.0)
            .map(|pair| pair[1] / pair[0] - 1.0)
            .collect();
        let rate = mean(&rates).unwrap_or(0.0);

        let mut current = values.last().copied().unwrap_or(0.0);
        (0..self.horizon_months)
            .map(|_| {
                current *= 1.0 + rate;
                to_amount(current.max(0.0))
            })
            .collect()
    }

    /// Mean month-over-month difference added to the last value, clamped at 0
    pub fn absolute_growth(&self, values: &[f64]) -> Vec<Decimal> {
        let diffs: Vec<f64> = values.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let step = mean(&diffs).unwrap_or(0.0);
        let last = values.last().copied().unwrap_or(0.0);

        (1..=self.horizon_months)
            .map(|k| to_amount((last + step * f64::from(k)).max(0.0)))
            .collect()
    }
}
