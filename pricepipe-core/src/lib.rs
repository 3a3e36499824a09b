//! pricepipe core: fetch daily stock price history, normalize it, write CSV.
//!
//! - Domain types (tickers, periods, requests)
//! - Price providers (Yahoo Finance, synthetic) behind one trait
//! - Rate-limited fetcher with a typed no-data / provider-error outcome
//! - Normalizer producing flat snake_case tables with no missing values
//! - Atomic CSV writer and timestamped output naming
//! - Pipeline driver tying the three stages together

pub mod config;
pub mod data;
pub mod domain;
pub mod output;
pub mod pipeline;

pub use config::{ConfigError, PipelineConfig, ProviderKind};
pub use domain::{Period, PriceRequest, Ticker};
pub use output::OutputLayout;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineReport};
