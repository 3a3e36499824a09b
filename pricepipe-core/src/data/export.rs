//! CSV writer for normalized tables.
//!
//! Output is UTF-8, comma-separated, with a header of column names and no
//! index column. Dates are `YYYY-MM-DD`, floats use the shortest
//! round-trip form, integers are written verbatim and missing cells are
//! empty. Files are written atomically: serialize to `<path>.tmp`, then
//! rename into place.

use super::table::{date_values, float_values, NormalizedPriceTable};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Encode(String),
}

/// What `write_csv` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, rows: usize },
    SkippedEmpty,
}

fn render_column(column: &Column) -> Result<Vec<String>, WriteError> {
    let encode = |e: PolarsError| WriteError::Encode(format!("column '{}': {e}", column.name()));
    let dtype = column.dtype();

    if let Some(dates) = date_values(column) {
        return Ok(dates
            .into_iter()
            .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default())
            .collect());
    }
    if dtype.is_float() {
        let values = float_values(column).unwrap_or_default();
        return Ok(values
            .into_iter()
            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
            .collect());
    }
    if dtype == &DataType::UInt64 {
        return Ok(column
            .u64()
            .map_err(encode)?
            .into_iter()
            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
            .collect());
    }
    if dtype.is_integer() {
        let cast = column.cast(&DataType::Int64).map_err(encode)?;
        return Ok(cast
            .i64()
            .map_err(encode)?
            .into_iter()
            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
            .collect());
    }
    let cast = column.cast(&DataType::String).map_err(encode)?;
    Ok(cast
        .str()
        .map_err(encode)?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn render_rows(frame: &DataFrame) -> Result<Vec<Vec<String>>, WriteError> {
    let cells: Vec<Vec<String>> = frame
        .get_columns()
        .iter()
        .map(render_column)
        .collect::<Result<_, _>>()?;

    Ok((0..frame.height())
        .map(|row| cells.iter().map(|col| col[row].clone()).collect())
        .collect())
}

/// First `n` rows rendered as CSV cell text, for display.
pub fn preview_rows(table: &NormalizedPriceTable, n: usize) -> Result<Vec<Vec<String>>, WriteError> {
    render_rows(table.head(n).frame())
}

/// Serialize a table to CSV bytes.
pub fn to_csv_bytes(table: &NormalizedPriceTable) -> Result<Vec<u8>, WriteError> {
    let frame = table.frame();
    let mut wtr = csv::Writer::from_writer(vec![]);
    let encode = |e: csv::Error| WriteError::Encode(e.to_string());

    wtr.write_record(table.column_names()).map_err(encode)?;

    for row in render_rows(frame)? {
        wtr.write_record(&row).map_err(encode)?;
    }

    wtr.into_inner()
        .map_err(|e| WriteError::Encode(format!("failed to flush CSV writer: {e}")))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `table` to `path`, creating missing parent directories.
///
/// An empty table writes nothing and reports [`WriteOutcome::SkippedEmpty`].
pub fn write_csv(table: &NormalizedPriceTable, path: &Path) -> Result<WriteOutcome, WriteError> {
    if table.is_empty() {
        warn!(path = %path.display(), "empty table; nothing written");
        return Ok(WriteOutcome::SkippedEmpty);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let bytes = to_csv_bytes(table)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, &bytes).map_err(|source| WriteError::Io {
        path: tmp.clone(),
        source,
    })?;

    // Atomic rename
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(WriteError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    let rows = table.height();
    info!(path = %path.display(), rows, "wrote CSV");
    Ok(WriteOutcome::Written {
        path: path.to_path_buf(),
        rows,
    })
}
