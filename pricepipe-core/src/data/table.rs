//! Raw and normalized price tables.
//!
//! A [`RawPriceTable`] is whatever the provider handed back: an optional date
//! index plus value columns whose labels may be flat (`Open`) or two-level
//! (`(Close, AAPL)`). A [`NormalizedPriceTable`] wraps a flat polars
//! `DataFrame` with snake_case names, a `date` column and no missing values.

use chrono::NaiveDate;
use polars::prelude::*;
use std::fmt;

/// Label of a raw value column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnLabel {
    Flat(String),
    Nested(String, String),
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        ColumnLabel::Flat(name.into())
    }

    pub fn nested(outer: impl Into<String>, inner: impl Into<String>) -> Self {
        ColumnLabel::Nested(outer.into(), inner.into())
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, ColumnLabel::Nested(..))
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Flat(name) => f.write_str(name),
            ColumnLabel::Nested(outer, inner) => write!(f, "({outer}, {inner})"),
        }
    }
}

/// Tabular fetch result. Empty means "no data".
#[derive(Debug, Clone, Default)]
pub struct RawPriceTable {
    index: Option<Column>,
    columns: Vec<(ColumnLabel, Column)>,
}

impl RawPriceTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table indexed by `index` (its name becomes the index label).
    pub fn new(index: Column, columns: Vec<(ColumnLabel, Column)>) -> Self {
        Self {
            index: Some(index),
            columns,
        }
    }

    /// Table with no index; every column is a value column.
    pub fn without_index(columns: Vec<(ColumnLabel, Column)>) -> Self {
        Self {
            index: None,
            columns,
        }
    }

    pub fn index(&self) -> Option<&Column> {
        self.index.as_ref()
    }

    pub fn columns(&self) -> &[(ColumnLabel, Column)] {
        &self.columns
    }

    /// Row count, taken from the index when present.
    pub fn height(&self) -> usize {
        self.index
            .as_ref()
            .map(Column::len)
            .or_else(|| self.columns.first().map(|(_, c)| c.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.height() == 0
    }

    /// True when any value column carries a two-level label.
    pub fn is_hierarchical(&self) -> bool {
        self.columns.iter().any(|(label, _)| label.is_nested())
    }

    pub(crate) fn into_parts(self) -> (Option<Column>, Vec<(ColumnLabel, Column)>) {
        (self.index, self.columns)
    }
}

/// Flat, cleaned table ready to persist or display.
#[derive(Debug, Clone)]
pub struct NormalizedPriceTable {
    frame: DataFrame,
}

impl NormalizedPriceTable {
    pub(crate) fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn empty() -> Self {
        Self {
            frame: DataFrame::empty(),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.width() == 0 || self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> NormalizedPriceTable {
        Self::from_frame(self.frame.head(Some(n)))
    }

    /// Name of the first column whose name contains `close`.
    pub fn close_column(&self) -> Option<String> {
        self.column_names().into_iter().find(|n| n.contains("close"))
    }

    /// Last value of the close column.
    pub fn latest_close(&self) -> Option<f64> {
        let name = self.close_column()?;
        let values = float_values(self.frame.column(&name).ok()?)?;
        values.into_iter().rev().flatten().next()
    }

    /// `(date, close)` points in row order, for charting.
    pub fn close_series(&self) -> Vec<(NaiveDate, f64)> {
        let Some(name) = self.close_column() else {
            return Vec::new();
        };
        let (Ok(dates), Ok(closes)) = (self.frame.column("date"), self.frame.column(&name)) else {
            return Vec::new();
        };
        match (date_values(dates), float_values(closes)) {
            (Some(dates), Some(closes)) => dates
                .into_iter()
                .zip(closes)
                .filter_map(|(d, c)| Some((d?, c?)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Reinterpret as a raw table with flat labels and no index.
    pub fn into_raw(self) -> RawPriceTable {
        let columns = self
            .frame
            .get_columns()
            .iter()
            .map(|c| (ColumnLabel::flat(c.name().as_str()), c.clone()))
            .collect();
        RawPriceTable::without_index(columns)
    }
}

impl PartialEq for NormalizedPriceTable {
    fn eq(&self, other: &Self) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

pub(crate) fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch().checked_add_signed(chrono::Duration::days(i64::from(days)))
}

pub(crate) fn date_to_days(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

/// Values of a `Date` column as calendar dates.
pub(crate) fn date_values(column: &Column) -> Option<Vec<Option<NaiveDate>>> {
    if column.dtype() != &DataType::Date {
        return None;
    }
    let days = column.cast(&DataType::Int32).ok()?;
    let values = days
        .i32()
        .ok()?
        .into_iter()
        .map(|d| d.and_then(days_to_date))
        .collect();
    Some(values)
}

/// Values of a numeric column as `f64`.
pub(crate) fn float_values(column: &Column) -> Option<Vec<Option<f64>>> {
    let dtype = column.dtype();
    if !(dtype.is_float() || dtype.is_integer()) {
        return None;
    }
    let cast = column.cast(&DataType::Float64).ok()?;
    Some(cast.f64().ok()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_column(dates: &[NaiveDate]) -> Column {
        let days: Vec<i32> = dates.iter().map(|d| date_to_days(*d)).collect();
        Column::new("date".into(), days)
            .cast(&DataType::Date)
            .unwrap()
    }

    fn sample() -> NormalizedPriceTable {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let frame = DataFrame::new(vec![
            date_column(&[d(2), d(3), d(4)]),
            Column::new("open".into(), &[1.0, 2.0, 3.0]),
            Column::new("close".into(), &[1.5, 2.5, 3.5]),
            Column::new("adj_close".into(), &[1.4, 2.4, 3.4]),
        ])
        .unwrap();
        NormalizedPriceTable::from_frame(frame)
    }

    #[test]
    fn latest_close_reads_first_close_column() {
        let t = sample();
        assert_eq!(t.close_column().as_deref(), Some("close"));
        assert_eq!(t.latest_close(), Some(3.5));
    }

    #[test]
    fn close_series_pairs_dates() {
        let series = sample().close_series();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0], (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 1.5));
    }

    #[test]
    fn head_limits_rows() {
        let t = sample();
        assert_eq!(t.head(2).height(), 2);
        assert_eq!(t.head(10).height(), 3);
    }

    #[test]
    fn empty_tables() {
        assert!(RawPriceTable::empty().is_empty());
        assert!(NormalizedPriceTable::empty().is_empty());
        assert_eq!(NormalizedPriceTable::empty().latest_close(), None);
        assert!(NormalizedPriceTable::empty().close_series().is_empty());
    }

    #[test]
    fn into_raw_keeps_columns_flat() {
        let raw = sample().into_raw();
        assert!(raw.index().is_none());
        assert!(!raw.is_hierarchical());
        assert_eq!(raw.height(), 3);
        assert_eq!(raw.columns()[0].0, ColumnLabel::flat("date"));
    }

    #[test]
    fn label_display() {
        assert_eq!(ColumnLabel::nested("Close", "AAPL").to_string(), "(Close, AAPL)");
        assert_eq!(ColumnLabel::flat("Open").to_string(), "Open");
    }
}
