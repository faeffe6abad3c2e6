//! Conversion from a Polars `DataFrame` into a typed [`Table`].
//!
//! Kinds are decided here, once. Native numeric dtypes become numeric,
//! booleans categorical and dates temporal. String columns are inspected:
//! missing markers are nulled, then the column becomes numeric or temporal
//! when every remaining value parses, text when values are long and mostly
//! unique, and categorical otherwise.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

use super::{Column, Table};
use crate::error::{Result, ResultExt};

/// Characters stripped before numeric parsing.
const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Cell values treated as missing.
const MISSING_MARKERS: [&str; 9] = [
    "", "error", "unknown", "n/a", "na", "null", "missing", "none", "#n/a",
];

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: MM-DD-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}(:\d{2})?$").expect("Invalid regex: datetime"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("Invalid regex: ISO"),
    ]
});

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Remove currency, percent and grouping characters.
pub fn clean_numeric_string(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.contains(&lower.as_str())
}

/// Parse a formatted number such as `"$1,234.50"` or `"42%"`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Parse a date or datetime string into UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if !DATE_PATTERNS.iter().any(|re| re.is_match(s)) {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

impl Table {
    /// Build a table from a Polars `DataFrame`, inferring each column's kind.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let name = series.name().to_string();
            let column = convert_series(&name, series)
                .context(format!("Failed to convert column '{name}'"))?;
            debug!(column = %name, kind = %column.kind(), "converted column");
            columns.push(column);
        }
        Table::new(columns)
    }
}

fn convert_series(name: &str, series: &Series) -> Result<Column> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) {
        let floats = series.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = floats.f64()?.into_iter().collect();
        return Ok(Column::numeric_opt(name, values));
    }

    match dtype {
        DataType::Boolean => {
            let values = series
                .bool()?
                .into_iter()
                .map(|v| v.map(|b| b.to_string()));
            Ok(Column::categorical_opt(name, values))
        }
        DataType::Date | DataType::Datetime(_, _) => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            let values = millis
                .i64()?
                .into_iter()
                .map(|v| v.and_then(DateTime::from_timestamp_millis));
            Ok(Column::temporal(name, values))
        }
        DataType::String => Ok(convert_strings(name, series.str()?)),
        _ => {
            let strings = series.cast(&DataType::String)?;
            Ok(convert_strings(name, strings.str()?))
        }
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn convert_strings(name: &str, values: &StringChunked) -> Column {
    let cleaned: Vec<Option<&str>> = values
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !is_missing_marker(s)))
        .collect();
    let present: Vec<&str> = cleaned.iter().flatten().copied().collect();

    if present.is_empty() {
        return Column::categorical_opt(name, cleaned);
    }

    if present.iter().all(|s| parse_numeric_string(s).is_some()) {
        let parsed = cleaned.iter().map(|v| v.and_then(parse_numeric_string));
        return Column::numeric_opt(name, parsed);
    }

    if present.iter().all(|s| parse_timestamp(s).is_some()) {
        let parsed = cleaned.iter().map(|v| v.and_then(parse_timestamp));
        return Column::temporal(name, parsed);
    }

    let unique = present
        .iter()
        .collect::<std::collections::HashSet<_>>()
        .len();
    let unique_ratio = unique as f64 / present.len() as f64;
    let avg_length =
        present.iter().map(|s| s.chars().count()).sum::<usize>() as f64 / present.len() as f64;

    if unique_ratio > 0.7 && avg_length > 30.0 {
        Column::text(name, cleaned)
    } else {
        Column::categorical_opt(name, cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnKind;

    // ==================== Parsing tests ====================

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("$1,234.50"), Some(1234.5));
        assert_eq!(parse_numeric_string(" 42% "), Some(42.0));
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string(""), None);
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing_marker("N/A"));
        assert!(is_missing_marker("  "));
        assert!(is_missing_marker("#N/A"));
        assert!(!is_missing_marker("0"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 00:00");

        let us = parse_timestamp("03/15/2024").unwrap();
        assert_eq!(us.format("%Y-%m-%d").to_string(), "2024-03-15");

        let iso = parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(iso.format("%H:%M").to_string(), "12:30");

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-45").is_none());
    }

    // ==================== DataFrame conversion tests ====================

    #[test]
    fn test_from_dataframe_kinds() {
        let df = df! {
            "amount" => [1i64, 2, 3, 4],
            "price" => ["$1.00", "$2.50", "N/A", "$4.00"],
            "region" => ["north", "south", "north", "east"],
            "day" => ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            "flag" => [true, false, true, true],
        }
        .unwrap();

        let table = Table::from_dataframe(&df).unwrap();

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column("amount").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(table.column("price").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(table.column("price").unwrap().null_count(), 1);
        assert_eq!(table.column("region").unwrap().kind(), ColumnKind::Categorical);
        assert_eq!(table.column("day").unwrap().kind(), ColumnKind::Temporal);
        assert_eq!(table.column("flag").unwrap().kind(), ColumnKind::Categorical);
    }

    #[test]
    fn test_long_unique_strings_become_text() {
        let sentences = [
            "The quick brown fox jumps over the lazy dog again",
            "A completely different sentence about data quality",
            "Yet another long free text comment from a customer",
        ];
        let df = df! { "comment" => sentences }.unwrap();
        let table = Table::from_dataframe(&df).unwrap();
        assert_eq!(table.column("comment").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn test_float_nan_becomes_null() {
        let df = df! { "x" => [1.0f64, f64::NAN, 3.0] }.unwrap();
        let table = Table::from_dataframe(&df).unwrap();
        assert_eq!(table.column("x").unwrap().null_count(), 1);
    }
}
