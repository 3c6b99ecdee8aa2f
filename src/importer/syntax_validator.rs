// ==========================================
// Sales Projection - Syntax validator
// ==========================================
// Per-row checks in isolation + duplicate periods inside the file.
// Row errors are collected, never short-circuited.
// ==========================================

use crate::domain::{Period, RawSalesRow, SalesRow, MAX_YEAR, MIN_YEAR};
use crate::importer::data_cleaner::{normalize_decimal, parse_integer};
use crate::importer::error::{ImportError, ImportResult, RowSyntaxError, RowSyntaxKind};
use std::collections::HashMap;
use tracing::debug;

const COLUMN_COUNT: usize = 3;

pub struct SyntaxValidator;

impl SyntaxValidator {
    /// Check one row.
    ///
    /// A row with the wrong shape reports only that; otherwise every bad
    /// field is reported.
    pub fn validate_row(&self, raw: &RawSalesRow) -> Result<SalesRow, Vec<RowSyntaxError>> {
        let row = raw.row_number;

        if raw.fields.len() != COLUMN_COUNT {
            return Err(vec![RowSyntaxError {
                row,
                kind: RowSyntaxKind::WrongColumnCount {
                    found: raw.fields.len(),
                },
                value: raw.fields.join(";"),
            }]);
        }

        let (year_raw, month_raw, amount_raw) = (&raw.fields[0], &raw.fields[1], &raw.fields[2]);
        let mut errors = Vec::new();

        let year = parse_integer(year_raw)
            .filter(|y| (i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)).contains(y))
            .map(|y| y as i32);
        if year.is_none() {
            errors.push(RowSyntaxError {
                row,
                kind: RowSyntaxKind::InvalidYear,
                value: year_raw.clone(),
            });
        }

        let month = parse_integer(month_raw)
            .filter(|m| (1..=12).contains(m))
            .map(|m| m as u32);
        if month.is_none() {
            errors.push(RowSyntaxError {
                row,
                kind: RowSyntaxKind::InvalidMonth,
                value: month_raw.clone(),
            });
        }

        let amount = normalize_decimal(amount_raw).filter(|a| !a.is_sign_negative() || a.is_zero());
        if amount.is_none() {
            errors.push(RowSyntaxError {
                row,
                kind: RowSyntaxKind::InvalidAmount,
                value: amount_raw.clone(),
            });
        }

        match (year, month, amount) {
            (Some(year), Some(month), Some(amount)) => Ok(SalesRow {
                row_number: row,
                period: Period { year, month },
                amount,
            }),
            _ => Err(errors),
        }
    }

    /// Validate every row, then look for duplicate periods.
    ///
    /// # Returns
    /// - Ok(rows): typed rows in source order
    /// - Err(RowSyntax): every row error of the file
    /// - Err(DuplicateInFile): first repeated period in source order
    pub fn validate(&self, raw_rows: &[RawSalesRow]) -> ImportResult<Vec<SalesRow>> {
        let mut rows = Vec::with_capacity(raw_rows.len());
        let mut errors = Vec::new();

        for raw in raw_rows {
            match self.validate_row(raw) {
                Ok(row) => rows.push(row),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "row syntax errors found");
            return Err(ImportError::RowSyntax(errors));
        }

        self.detect_duplicates(&rows)?;
        Ok(rows)
    }

    pub fn detect_duplicates(&self, rows: &[SalesRow]) -> ImportResult<()> {
        let mut seen: HashMap<Period, usize> = HashMap::with_capacity(rows.len());
        for row in rows {
            if let Some(first_row) = seen.insert(row.period, row.row_number) {
                return Err(ImportError::DuplicateInFile {
                    period: row.period,
                    first_row,
                    duplicate_row: row.row_number,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn raw(row_number: usize, fields: &[&str]) -> RawSalesRow {
        RawSalesRow {
            row_number,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_row() {
        let row = SyntaxValidator
            .validate_row(&raw(2, &["2024", "1", "150000,50"]))
            .unwrap();
        assert_eq!(row.period, Period::new(2024, 1).unwrap());
        assert_eq!(row.amount, Decimal::new(15000050, 2));
        assert_eq!(row.row_number, 2);
    }

    #[test]
    fn test_zero_amount_is_valid() {
        assert!(SyntaxValidator.validate_row(&raw(2, &["2024", "1", "0"])).is_ok());
    }

    #[test]
    fn test_wrong_column_count_reports_only_that() {
        let errors = SyntaxValidator
            .validate_row(&raw(3, &["2024", "x"]))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, RowSyntaxKind::WrongColumnCount { found: 2 });
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let errors = SyntaxValidator
            .validate_row(&raw(4, &["1999", "13", "-5"]))
            .unwrap_err();
        let kinds: Vec<RowSyntaxKind> = errors.into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowSyntaxKind::InvalidYear,
                RowSyntaxKind::InvalidMonth,
                RowSyntaxKind::InvalidAmount
            ]
        );
    }

    #[test]
    fn test_year_bounds_are_inclusive() {
        assert!(SyntaxValidator.validate_row(&raw(2, &["2000", "1", "1"])).is_ok());
        assert!(SyntaxValidator.validate_row(&raw(2, &["2100", "12", "1"])).is_ok());
        assert!(SyntaxValidator.validate_row(&raw(2, &["2101", "1", "1"])).is_err());
    }

    #[test]
    fn test_errors_collected_across_rows() {
        let rows = vec![
            raw(2, &["2024", "1", "10"]),
            raw(3, &["2024", "mes", "10"]),
            raw(4, &["2024", "3", "diez"]),
        ];
        let err = SyntaxValidator.validate(&rows).unwrap_err();
        let rows_with_errors: Vec<usize> = err.row_errors().iter().map(|e| e.row).collect();
        assert_eq!(rows_with_errors, vec![3, 4]);
    }

    #[test]
    fn test_duplicate_period_in_file() {
        let rows = vec![
            raw(2, &["2024", "1", "10"]),
            raw(3, &["2024", "2", "10"]),
            raw(4, &["2024", "01", "20"]),
        ];
        let err = SyntaxValidator.validate(&rows).unwrap_err();
        match err {
            ImportError::DuplicateInFile {
                period,
                first_row,
                duplicate_row,
            } => {
                assert_eq!(period, Period::new(2024, 1).unwrap());
                assert_eq!((first_row, duplicate_row), (2, 4));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_message_names_period() {
        let rows = vec![raw(2, &["2024", "1", "10"]), raw(3, &["2024", "1", "10"])];
        let message = SyntaxValidator.validate(&rows).unwrap_err().to_string();
        assert!(message.contains("Enero 2024"));
    }
}
