//! Deterministic synthetic price history for offline runs.

use super::provider::{PriceProvider, ProviderError};
use super::table::{date_to_days, ColumnLabel, RawPriceTable};
use crate::domain::{Period, Ticker};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-walk daily bars seeded from the symbol.
///
/// The same symbol, period and end date always yield the same table. Row
/// count follows [`Period::approx_trading_days`]; weekends are skipped.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    end: Option<NaiveDate>,
}

impl SyntheticProvider {
    /// Series ending today (local time).
    pub fn new() -> Self {
        Self::default()
    }

    /// Series ending on a fixed date.
    pub fn ending(end: NaiveDate) -> Self {
        Self { end: Some(end) }
    }

    fn end_date(&self) -> NaiveDate {
        self.end.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The last `count` weekdays up to and including `end`, ascending.
fn trading_days(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = Some(end);
    while let Some(day) = current {
        if days.len() == count {
            break;
        }
        if !is_weekend(day) {
            days.push(day);
        }
        current = day.pred_opt();
    }
    days.reverse();
    days
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn history(&self, ticker: &Ticker, period: Period) -> Result<RawPriceTable, ProviderError> {
        let end = self.end_date();
        let dates = trading_days(end, period.approx_trading_days(end));

        // Deterministic seed from symbol name
        let seed: [u8; 32] = *blake3::hash(ticker.as_str().as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let n = dates.len();
        let mut opens = Vec::with_capacity(n);
        let mut highs = Vec::with_capacity(n);
        let mut lows = Vec::with_capacity(n);
        let mut closes = Vec::with_capacity(n);
        let mut volumes = Vec::with_capacity(n);
        let mut price = 100.0_f64;

        for _ in &dates {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            opens.push(open);
            highs.push(high);
            lows.push(low);
            closes.push(close);
            volumes.push(rng.gen_range(500_000..5_000_000u64));
            price = close;
        }

        let days: Vec<i32> = dates.into_iter().map(date_to_days).collect();
        let index = Column::new("Date".into(), days)
            .cast(&DataType::Date)
            .map_err(|e| ProviderError::ResponseFormat(format!("date cast: {e}")))?;

        Ok(RawPriceTable::new(
            index,
            vec![
                (ColumnLabel::flat("Open"), Column::new("Open".into(), opens)),
                (ColumnLabel::flat("High"), Column::new("High".into(), highs)),
                (ColumnLabel::flat("Low"), Column::new("Low".into(), lows)),
                (
                    ColumnLabel::flat("Close"),
                    Column::new("Close".into(), closes.clone()),
                ),
                (
                    ColumnLabel::flat("Adj Close"),
                    Column::new("Adj Close".into(), closes),
                ),
                (
                    ColumnLabel::flat("Volume"),
                    Column::new("Volume".into(), volumes),
                ),
            ],
        ))
    }
}
