//! Cell-level parsing shared by the three table loaders.
//!
//! Dates are normalized to calendar days. Numeric cells distinguish a
//! missing value (empty or an NA token) from a malformed one, since the
//! former is a legitimate "contributes nothing" input and the latter
//! drops the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Cell values treated as missing, mirroring the usual spreadsheet export
/// NA spellings.
const NA_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "-"];

/// Date-only formats, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%m/%d/%Y"];

/// Date-time formats, tried in order. The time of day is discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// Whether a cell holds one of the NA spellings.
#[must_use]
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    NA_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Parses a date or date-time cell into its calendar day.
///
/// Returns `None` for missing or unrecognized values.
#[must_use]
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let s = cell.trim();
    if is_missing(s) {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parses a coordinate cell. Returns `None` if missing, unparseable or
/// not finite.
#[must_use]
pub fn parse_coordinate(cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A numeric cell that may legitimately be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    /// Empty or NA.
    Missing,
    /// A finite number.
    Value(f64),
    /// Present but not a finite number.
    Malformed,
}

impl NumericCell {
    /// Classifies a raw cell.
    #[must_use]
    pub fn parse(cell: &str) -> Self {
        if is_missing(cell) {
            return Self::Missing;
        }
        match cell.trim().parse::<f64>() {
            Ok(v) if v.is_nan() => Self::Missing,
            Ok(v) if v.is_finite() => Self::Value(v),
            _ => Self::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_date("2021-07-04"), Some(day(2021, 7, 4)));
    }

    #[test]
    fn parses_slash_and_dot_dates() {
        assert_eq!(parse_date("2021/07/04"), Some(day(2021, 7, 4)));
        assert_eq!(parse_date("2021.07.04"), Some(day(2021, 7, 4)));
        assert_eq!(parse_date("20210704"), Some(day(2021, 7, 4)));
    }

    #[test]
    fn datetime_is_normalized_to_day() {
        assert_eq!(parse_date("2021-07-04 23:59:59"), Some(day(2021, 7, 4)));
        assert_eq!(parse_date("2021-07-04T08:00:00.250"), Some(day(2021, 7, 4)));
        assert_eq!(parse_date("2021-07-04 08:00"), Some(day(2021, 7, 4)));
        assert_eq!(
            parse_date("2021-07-04T23:30:00+09:00"),
            Some(day(2021, 7, 4))
        );
    }

    #[test]
    fn rejects_invalid_date() {
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2021-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn coordinates_must_be_finite() {
        assert_eq!(parse_coordinate(" 37.5665 "), Some(37.5665));
        assert_eq!(parse_coordinate("inf"), None);
        assert_eq!(parse_coordinate("NaN"), None);
        assert_eq!(parse_coordinate("north"), None);
        assert_eq!(parse_coordinate(""), None);
    }

    #[test]
    fn numeric_cells_distinguish_missing_from_malformed() {
        assert_eq!(NumericCell::parse("13.5"), NumericCell::Value(13.5));
        assert_eq!(NumericCell::parse(""), NumericCell::Missing);
        assert_eq!(NumericCell::parse("NaN"), NumericCell::Missing);
        assert_eq!(NumericCell::parse("n/a"), NumericCell::Missing);
        assert_eq!(NumericCell::parse("high"), NumericCell::Malformed);
        assert_eq!(NumericCell::parse("inf"), NumericCell::Malformed);
    }
}
