//! Normalizer: raw provider table to flat, clean, complete table.
//!
//! Steps, in order:
//! 1. promote the date index to the first column
//! 2. collapse two-level labels by joining non-empty levels with `_`
//! 3. clean every name: trim, lowercase, spaces to `_`, drop `.`
//! 4. parse the `date` column, when present, into a calendar date
//! 5. drop every row that has a null or NaN anywhere
//!
//! Row order is preserved and columns are neither reordered nor filtered.

use super::table::{date_to_days, ColumnLabel, NormalizedPriceTable, RawPriceTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub const DATE_COLUMN: &str = "date";

/// Structural problems that stop normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("duplicate column '{name}' after normalization")]
    DuplicateColumn { name: String },

    #[error("column '{name}' has {len} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("unsupported date column type: {dtype}")]
    UnsupportedDateType { dtype: String },

    #[error("table operation failed: {0}")]
    Frame(String),
}

impl From<PolarsError> for NormalizeError {
    fn from(e: PolarsError) -> Self {
        NormalizeError::Frame(e.to_string())
    }
}

/// Join the non-empty, trimmed levels of a label with `_`.
pub fn flatten_label(label: &ColumnLabel) -> String {
    match label {
        ColumnLabel::Flat(name) => name.trim().to_string(),
        ColumnLabel::Nested(outer, inner) => [outer.trim(), inner.trim()]
            .into_iter()
            .filter(|level| !level.is_empty())
            .collect::<Vec<_>>()
            .join("_"),
    }
}

/// Lowercase snake_case name: `"Adj Close"` becomes `"adj_close"`.
pub fn clean_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('.', "")
        .trim()
        .to_string()
}

/// Parse `%Y-%m-%d`, optionally followed by a time of day.
fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

fn parse_date_column(column: &Column) -> Result<Column, NormalizeError> {
    match column.dtype() {
        DataType::Date => Ok(column.clone()),
        DataType::Datetime(_, _) => Ok(column.cast(&DataType::Date)?),
        DataType::String => {
            let days: Vec<Option<i32>> = column
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_date_str).map(date_to_days))
                .collect();
            Ok(Column::new(column.name().clone(), days).cast(&DataType::Date)?)
        }
        DataType::Null => {
            let days: Vec<Option<i32>> = vec![None; column.len()];
            Ok(Column::new(column.name().clone(), days).cast(&DataType::Date)?)
        }
        other => Err(NormalizeError::UnsupportedDateType {
            dtype: other.to_string(),
        }),
    }
}

/// Rows with no null and no NaN in any column.
fn complete_rows(frame: &DataFrame) -> Result<Vec<bool>, NormalizeError> {
    let mut keep = vec![true; frame.height()];
    for column in frame.get_columns() {
        let nulls = column.as_materialized_series().is_null();
        for (row, is_null) in nulls.into_iter().enumerate() {
            if is_null.unwrap_or(true) {
                keep[row] = false;
            }
        }
        if column.dtype().is_float() {
            let values = column.cast(&DataType::Float64)?;
            for (row, value) in values.f64()?.into_iter().enumerate() {
                if value.is_some_and(f64::is_nan) {
                    keep[row] = false;
                }
            }
        }
    }
    Ok(keep)
}

/// Normalize a raw table. Empty input yields an empty table.
pub fn normalize(raw: RawPriceTable) -> Result<NormalizedPriceTable, NormalizeError> {
    if raw.is_empty() {
        debug!("normalize: empty input, nothing to do");
        return Ok(NormalizedPriceTable::empty());
    }

    let expected = raw.height();
    let (index, values) = raw.into_parts();

    let mut labelled: Vec<(ColumnLabel, Column)> = Vec::with_capacity(values.len() + 1);
    if let Some(index) = index {
        let name = match index.name().as_str().trim() {
            "" => "index".to_string(),
            name => name.to_string(),
        };
        labelled.push((ColumnLabel::Flat(name), index));
    }
    labelled.extend(values);

    let mut seen = HashSet::with_capacity(labelled.len());
    let mut columns = Vec::with_capacity(labelled.len());
    for (label, mut column) in labelled {
        let name = clean_name(&flatten_label(&label));
        if column.len() != expected {
            return Err(NormalizeError::LengthMismatch {
                name,
                len: column.len(),
                expected,
            });
        }
        if !seen.insert(name.clone()) {
            return Err(NormalizeError::DuplicateColumn { name });
        }
        column.rename(name.as_str().into());
        columns.push(column);
    }

    match columns.iter().position(|c| c.name().as_str() == DATE_COLUMN) {
        Some(pos) => columns[pos] = parse_date_column(&columns[pos])?,
        None => debug!("no date column; leaving values as delivered"),
    }

    let frame = DataFrame::new(columns)?;
    let keep = complete_rows(&frame)?;
    let dropped = keep.iter().filter(|k| !**k).count();
    let frame = if dropped == 0 {
        frame
    } else {
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        frame.filter(&mask)?
    };

    debug!(rows = frame.height(), dropped, "normalized table");
    if frame.height() == 0 {
        return Ok(NormalizedPriceTable::empty());
    }
    Ok(NormalizedPriceTable::from_frame(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::date_values;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn date_index(name: &str, days: &[u32]) -> Column {
        let days: Vec<i32> = days.iter().map(|d| date_to_days(day(*d))).collect();
        Column::new(name.into(), days).cast(&DataType::Date).unwrap()
    }

    fn flat(name: &str, values: Vec<Option<f64>>) -> (ColumnLabel, Column) {
        (ColumnLabel::flat(name), Column::new(name.into(), values))
    }

    #[test]
    fn flattens_nested_labels() {
        assert_eq!(flatten_label(&ColumnLabel::nested("Close", "AAPL")), "Close_AAPL");
        assert_eq!(flatten_label(&ColumnLabel::nested("Date", "")), "Date");
        assert_eq!(flatten_label(&ColumnLabel::nested(" Open ", " MSFT ")), "Open_MSFT");
    }

    #[test]
    fn cleans_names() {
        assert_eq!(clean_name("Adj Close"), "adj_close");
        assert_eq!(clean_name(" Volume "), "volume");
        assert_eq!(clean_name("BRK.B Close"), "brkb_close");
    }

    #[test]
    fn promotes_index_and_cleans_columns() {
        let raw = RawPriceTable::new(
            date_index("Date", &[2, 3]),
            vec![
                flat("Open", vec![Some(1.0), Some(2.0)]),
                flat("Adj Close", vec![Some(1.5), Some(2.5)]),
            ],
        );
        let table = normalize(raw).unwrap();
        assert_eq!(table.column_names(), vec!["date", "open", "adj_close"]);
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn hierarchical_labels_collapse() {
        let raw = RawPriceTable::new(
            date_index("Date", &[2]),
            vec![(
                ColumnLabel::nested("Close", "AAPL"),
                Column::new("Close".into(), vec![Some(1.0)]),
            )],
        );
        assert!(raw.is_hierarchical());
        let table = normalize(raw).unwrap();
        assert_eq!(table.column_names(), vec!["date", "close_aapl"]);
        assert_eq!(table.latest_close(), Some(1.0));
    }

    #[test]
    fn drops_rows_with_nulls_or_nan() {
        let raw = RawPriceTable::new(
            date_index("Date", &[2, 3, 4, 5]),
            vec![
                flat("Open", vec![Some(1.0), None, Some(3.0), Some(4.0)]),
                flat("Close", vec![Some(1.0), Some(2.0), Some(f64::NAN), Some(4.0)]),
            ],
        );
        let table = normalize(raw).unwrap();
        assert_eq!(table.height(), 2);
        let dates = date_values(table.frame().column("date").unwrap()).unwrap();
        assert_eq!(dates, vec![Some(day(2)), Some(day(5))]);
    }

    #[test]
    fn parses_string_dates_and_drops_unparseable() {
        let raw = RawPriceTable::without_index(vec![
            (
                ColumnLabel::flat("Date"),
                Column::new(
                    "Date".into(),
                    vec!["2024-01-02", "not a date", "2024-01-04 00:00:00"],
                ),
            ),
            flat("Close", vec![Some(1.0), Some(2.0), Some(3.0)]),
        ]);
        let table = normalize(raw).unwrap();
        let dates = date_values(table.frame().column("date").unwrap()).unwrap();
        assert_eq!(dates, vec![Some(day(2)), Some(day(4))]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(normalize(RawPriceTable::empty()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let raw = RawPriceTable::new(
            date_index("Date", &[2]),
            vec![flat("Close", vec![Some(1.0)]), flat("close ", vec![Some(1.0)])],
        );
        assert_eq!(
            normalize(raw).unwrap_err(),
            NormalizeError::DuplicateColumn {
                name: "close".into()
            }
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let raw = RawPriceTable::new(
            date_index("Date", &[2, 3]),
            vec![flat("Close", vec![Some(1.0)])],
        );
        assert!(matches!(
            normalize(raw).unwrap_err(),
            NormalizeError::LengthMismatch { len: 1, expected: 2, .. }
        ));
    }

    #[test]
    fn integer_dates_are_unsupported() {
        let raw = RawPriceTable::without_index(vec![
            (ColumnLabel::flat("date"), Column::new("date".into(), &[1i64, 2])),
            flat("close", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(matches!(
            normalize(raw).unwrap_err(),
            NormalizeError::UnsupportedDateType { .. }
        ));
    }

    #[test]
    fn unnamed_index_without_date_column_is_kept() {
        let raw = RawPriceTable::new(
            date_index(" ", &[2, 3]),
            vec![flat("Close", vec![Some(1.0), Some(2.0)])],
        );
        let table = normalize(raw).unwrap();
        assert_eq!(table.column_names(), vec!["index", "close"]);
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn table_without_date_column_still_drops_incomplete_rows() {
        let raw = RawPriceTable::without_index(vec![flat("Close", vec![Some(1.0), None])]);
        let table = normalize(raw).unwrap();
        assert_eq!(table.column_names(), vec!["close"]);
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = RawPriceTable::new(
            date_index("Date", &[2, 3, 4]),
            vec![
                flat("Open", vec![Some(1.0), None, Some(3.0)]),
                flat("Adj Close", vec![Some(1.5), Some(2.5), Some(3.5)]),
            ],
        );
        let once = normalize(raw).unwrap();
        let twice = normalize(once.clone().into_raw()).unwrap();
        assert_eq!(once, twice);
    }
}
