// ==========================================
// Sales Projection - Period value type
// ==========================================
// A (year, month) pair with chronological order.
// Used for continuity checks and forecast horizons; never persisted alone.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest year accepted for stored sales records
pub const MIN_YEAR: i32 = 2000;

/// Highest year accepted for stored sales records
pub const MAX_YEAR: i32 = 2100;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

// ==========================================
// Period
// ==========================================
// Field order matters: the derived Ord compares year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Build a period, rejecting months outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// True when the year is inside the range allowed for stored records
    pub fn is_storable(&self) -> bool {
        (MIN_YEAR..=MAX_YEAR).contains(&self.year)
    }

    /// Next month; December rolls over to January of the following year
    pub fn successor(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Previous month; January rolls back to December of the previous year
    pub fn predecessor(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Period `months` months after this one
    pub fn plus_months(&self, months: u32) -> Self {
        Self::from_month_index(self.month_index() + i64::from(months))
    }

    /// Months elapsed since January of year 0
    pub fn month_index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    /// Inverse of `month_index`
    pub fn from_month_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Number of months from `self` to `other` (negative if `other` is earlier)
    pub fn months_until(&self, other: &Period) -> i64 {
        other.month_index() - self.month_index()
    }

    /// Spanish month name, e.g. "Febrero".
    /// Out-of-range months (only reachable through the pub fields) get a neutral label.
    pub fn month_name(&self) -> &'static str {
        self.month
            .checked_sub(1)
            .and_then(|idx| MONTH_NAMES.get(idx as usize))
            .copied()
            .unwrap_or("Mes inválido")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}
