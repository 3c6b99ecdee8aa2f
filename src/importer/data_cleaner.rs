// ==========================================
// Sales Projection - Cell cleaning
// ==========================================
// TRIM / BOM removal / locale-tolerant decimals.
// The only place where decimal separators are interpreted.
// ==========================================

use rust_decimal::Decimal;
use std::str::FromStr;

const BOM: char = '\u{feff}';

/// Trim a raw cell and drop a leading byte-order mark
pub fn clean_cell(value: &str) -> String {
    value.trim_start_matches(BOM).trim().to_string()
}

/// Parse an amount written with either `.` or `,` as decimal separator.
///
/// Returns None for empty input, signs other than a plain number,
/// more than one separator (no thousands grouping is inferred),
/// or anything `Decimal` cannot represent.
pub fn normalize_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let separators = trimmed.chars().filter(|c| *c == '.' || *c == ',').count();
    if separators > 1 {
        return None;
    }

    let valid_chars = trimmed
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == '.' || c == ',' || (i == 0 && c == '-'));
    if !valid_chars || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    Decimal::from_str(&trimmed.replace(',', ".")).ok()
}

/// Parse a strict integer cell. Spreadsheets hand integers over as "2024"
/// but may also produce "2024.0"; both are accepted.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let (int_part, frac) = trimmed.split_once('.')?;
    if !frac.is_empty() && frac.chars().all(|c| c == '0') {
        int_part.parse::<i64>().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_and_dot_separators() {
        assert_eq!(normalize_decimal("150000,50"), Some(Decimal::new(15000050, 2)));
        assert_eq!(normalize_decimal("150000.50"), Some(Decimal::new(15000050, 2)));
        assert_eq!(normalize_decimal(" 42 "), Some(Decimal::new(42, 0)));
        assert_eq!(normalize_decimal("0,5"), Some(Decimal::new(5, 1)));
    }

    #[test]
    fn test_keeps_scale_exactly() {
        let parsed = normalize_decimal("150000,50").unwrap();
        assert_eq!(parsed.to_string(), "150000.50");
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_decimal(""), None);
        assert_eq!(normalize_decimal("abc"), None);
        assert_eq!(normalize_decimal("1.500,50"), None);
        assert_eq!(normalize_decimal("1,2,3"), None);
        assert_eq!(normalize_decimal("12a"), None);
        assert_eq!(normalize_decimal("-"), None);
        assert_eq!(normalize_decimal("1e5"), None);
    }

    #[test]
    fn test_negative_is_parsed_so_the_caller_can_reject_it() {
        assert_eq!(normalize_decimal("-10,5"), Some(Decimal::new(-105, 1)));
    }

    #[test]
    fn test_clean_cell_strips_bom() {
        assert_eq!(clean_cell("\u{feff}Anio "), "Anio");
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("2024"), Some(2024));
        assert_eq!(parse_integer("2024.0"), Some(2024));
        assert_eq!(parse_integer("2024.5"), None);
        assert_eq!(parse_integer("1,0"), None);
        assert_eq!(parse_integer("dos"), None);
    }
}
