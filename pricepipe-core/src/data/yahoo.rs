//! Yahoo Finance price provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API using the named `range`
//! parameter. Yahoo Finance has no official API and is subject to
//! unannounced format changes; anything it returns that does not decode is
//! reported as [`ProviderError::ResponseFormat`].

use super::provider::{PriceProvider, ProviderError};
use super::table::{date_to_days, ColumnLabel, RawPriceTable};
use crate::config::ProviderConfig;
use crate::domain::{Period, Ticker};
use polars::prelude::*;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{symbol}", self.base_url)
    }

    /// Decode a chart API body into a raw table.
    ///
    /// A "Not Found" chart error maps to `SymbolNotFound`; a result with no
    /// timestamps (or only empty rows) is an empty table.
    pub fn parse_body(symbol: &str, body: &str) -> Result<RawPriceTable, ProviderError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
        })?;
        Self::parse_response(symbol, resp)
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<RawPriceTable, ProviderError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (_, Some(err)) if err.code == "Not Found" => {
                return Err(ProviderError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            (_, Some(err)) => {
                return Err(ProviderError::ResponseFormat(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (Some(result), None) => result,
            (None, None) => {
                return Err(ProviderError::ResponseFormat(
                    "empty result with no error".into(),
                ))
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(RawPriceTable::empty());
        };
        let Some(timestamps) = data.timestamp else {
            return Ok(RawPriceTable::empty());
        };

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let n = timestamps.len();
        let mut dates = Vec::with_capacity(n);
        let mut opens = Vec::with_capacity(n);
        let mut highs = Vec::with_capacity(n);
        let mut lows = Vec::with_capacity(n);
        let mut closes = Vec::with_capacity(n);
        let mut adjs = Vec::with_capacity(n);
        let mut volumes = Vec::with_capacity(n);

        for (i, &ts) in timestamps.iter().enumerate() {
            // Exchange-local trading date
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    ProviderError::ResponseFormat(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Skip rows where every field is missing (holidays, partial sessions)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            dates.push(date_to_days(date));
            opens.push(open);
            highs.push(high);
            lows.push(low);
            closes.push(close);
            if let Some(adj_closes) = &adj_closes {
                adjs.push(adj_closes.get(i).copied().flatten());
            }
            volumes.push(volume);
        }

        if dates.is_empty() {
            return Ok(RawPriceTable::empty());
        }

        let index = Column::new("Date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| ProviderError::ResponseFormat(format!("date cast: {e}")))?;

        let mut columns = vec![
            (ColumnLabel::flat("Open"), Column::new("Open".into(), opens)),
            (ColumnLabel::flat("High"), Column::new("High".into(), highs)),
            (ColumnLabel::flat("Low"), Column::new("Low".into(), lows)),
            (ColumnLabel::flat("Close"), Column::new("Close".into(), closes)),
        ];
        // Adjusted closes only when Yahoo sent the indicator.
        if adj_closes.is_some() {
            columns.push((
                ColumnLabel::flat("Adj Close"),
                Column::new("Adj Close".into(), adjs),
            ));
        }
        columns.push((
            ColumnLabel::flat("Volume"),
            Column::new("Volume".into(), volumes),
        ));

        Ok(RawPriceTable::new(index, columns))
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn history(&self, ticker: &Ticker, period: Period) -> Result<RawPriceTable, ProviderError> {
        let symbol = ticker.as_str();
        let url = self.chart_url(symbol);
        debug!(%url, range = period.as_str(), "requesting chart");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("range", period.as_str()),
                ("interval", "1d"),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Self::parse_body(symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"gmtoffset": -14400},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, null, 182.15],
                        "high": [188.44, null, 183.09],
                        "low": [183.89, null, 180.88],
                        "close": [185.64, null, 181.91],
                        "volume": [82488700, null, 71983600]
                    }],
                    "adjclose": [{"adjclose": [184.73, null, 181.02]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_chart_body() {
        let table = YahooProvider::parse_body("AAPL", SAMPLE).unwrap();
        // The all-null middle row is skipped.
        assert_eq!(table.height(), 2);
        let labels: Vec<String> = table.columns().iter().map(|(l, _)| l.to_string()).collect();
        assert_eq!(
            labels,
            vec!["Open", "High", "Low", "Close", "Adj Close", "Volume"]
        );
        let index = table.index().unwrap();
        assert_eq!(index.name().as_str(), "Date");
        assert_eq!(index.dtype(), &DataType::Date);
    }

    #[test]
    fn body_without_adjclose_keeps_every_row() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": -18000},
                    "timestamp": [1704205800, 1704292200],
                    "indicators": {
                        "quote": [{
                            "open": [10.0, 11.0],
                            "high": [10.5, 11.5],
                            "low": [9.5, 10.5],
                            "close": [10.2, 11.2],
                            "volume": [1000, 2000]
                        }]
                    }
                }],
                "error": null
            }
        }"#;
        let raw = YahooProvider::parse_body("MSFT", body).unwrap();
        let labels: Vec<String> = raw.columns().iter().map(|(l, _)| l.to_string()).collect();
        assert_eq!(labels, vec!["Open", "High", "Low", "Close", "Volume"]);

        let table = crate::data::normalize(raw).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.column_names(),
            vec!["date", "open", "high", "low", "close", "volume"]
        );
        assert_eq!(table.latest_close(), Some(11.2));
    }

    #[test]
    fn uses_exchange_offset_for_dates() {
        let table = YahooProvider::parse_body("AAPL", SAMPLE).unwrap();
        let days = table.index().unwrap().cast(&DataType::Int32).unwrap();
        let first = days.i32().unwrap().get(0).unwrap();
        let expected = date_to_days(chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first, expected);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooProvider::parse_body("ZZZZINVALID", body).unwrap_err();
        assert_eq!(
            err,
            ProviderError::SymbolNotFound {
                symbol: "ZZZZINVALID".into()
            }
        );
    }

    #[test]
    fn other_chart_errors_are_format_errors() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let err = YahooProvider::parse_body("AAPL", body).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseFormat(_)));
    }

    #[test]
    fn missing_timestamps_is_empty_table() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let table = YahooProvider::parse_body("AAPL", body).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn garbage_body_is_format_error() {
        let err = YahooProvider::parse_body("AAPL", "<html>").unwrap_err();
        assert!(matches!(err, ProviderError::ResponseFormat(_)));
    }

    #[test]
    fn builds_from_config() {
        let provider = YahooProvider::new(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.name(), "yahoo_finance");
        assert!(provider.chart_url("AAPL").ends_with("/v8/finance/chart/AAPL"));
    }
}
