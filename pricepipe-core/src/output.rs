//! Output file naming.

use crate::domain::{Period, Ticker};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Timestamp format embedded in generated filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where generated CSV files go and what they are called.
///
/// Names are `<TICKER>_<period>_<YYYYMMDD_HHMMSS>.csv`. Second resolution
/// means two generations within the same second collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path for a file generated now (local wall-clock time).
    pub fn generate_filename(&self, ticker: &Ticker, period: Period) -> PathBuf {
        self.filename_at(ticker, period, Local::now().naive_local())
    }

    pub fn filename_at(&self, ticker: &Ticker, period: Period, at: NaiveDateTime) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}.csv",
            ticker,
            period,
            at.format(TIMESTAMP_FORMAT)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn filename_pattern() {
        let layout = OutputLayout::new("data");
        let path = layout.filename_at(&Ticker::parse("aapl").unwrap(), Period::OneYear, at(9, 7, 3));
        assert_eq!(path, PathBuf::from("data/AAPL_1y_20240305_090703.csv"));
    }

    #[test]
    fn different_seconds_differ_same_second_collides() {
        let layout = OutputLayout::new("out");
        let t = Ticker::parse("MSFT").unwrap();
        let a = layout.filename_at(&t, Period::Max, at(10, 0, 0));
        let b = layout.filename_at(&t, Period::Max, at(10, 0, 1));
        let c = layout.filename_at(&t, Period::Max, at(10, 0, 0));
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn generated_name_lives_in_output_dir() {
        let layout = OutputLayout::new("/tmp/somewhere");
        let path = layout.generate_filename(&Ticker::parse("IBM").unwrap(), Period::YearToDate);
        assert_eq!(path.parent().unwrap(), Path::new("/tmp/somewhere"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("IBM_ytd_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "IBM_ytd_".len() + "YYYYMMDD_HHMMSS".len() + ".csv".len());
    }
}
