//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, the
//! synthetic generator) so the fetcher can swap implementations and tests can
//! plug in mocks.

use super::table::RawPriceTable;
use crate::domain::{Period, Ticker};
use thiserror::Error;

/// Structured error types for provider requests.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("provider setup failed: {0}")]
    Client(String),
}

/// Trait for price history sources.
///
/// An empty table is a valid answer and means the provider has nothing for
/// the symbol over that window.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily history for `ticker` over `period`.
    fn history(&self, ticker: &Ticker, period: Period) -> Result<RawPriceTable, ProviderError>;
}
