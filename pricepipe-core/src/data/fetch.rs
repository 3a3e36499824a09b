//! Fetcher: one ticker, one period, one provider request.

use super::provider::{PriceProvider, ProviderError};
use super::rate_limit::{RateLimit, RateLimiter};
use super::table::RawPriceTable;
use crate::domain::PriceRequest;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a fetch produced no table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no data returned for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl FetchError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::NoData { .. })
    }
}

/// Provider plus rate limiter. No retries.
pub struct Fetcher {
    provider: Box<dyn PriceProvider>,
    limiter: RateLimiter,
}

impl Fetcher {
    pub fn new(provider: Box<dyn PriceProvider>, rate_limit: RateLimit) -> Self {
        Self {
            provider,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.limiter.policy()
    }

    /// Fetch history for one request.
    ///
    /// An empty provider table and an unknown symbol both come back as
    /// [`FetchError::NoData`]; every other provider failure is
    /// [`FetchError::Provider`].
    pub fn fetch(&self, request: &PriceRequest) -> Result<RawPriceTable, FetchError> {
        let symbol = request.ticker.as_str();
        let waited = self.limiter.wait();
        if !waited.is_zero() {
            debug!(symbol, waited_ms = waited.as_millis() as u64, "rate limit wait");
        }

        info!(
            symbol,
            period = request.period.as_str(),
            provider = self.provider.name(),
            "fetching price history"
        );

        // Any answered request, including an unknown symbol, starts the interval.
        let table = match self.provider.history(&request.ticker, request.period) {
            Ok(table) => table,
            Err(ProviderError::SymbolNotFound { .. }) => {
                self.limiter.record_success();
                warn!(symbol, "symbol not found");
                return Err(FetchError::NoData {
                    symbol: symbol.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        self.limiter.record_success();

        if table.is_empty() {
            return Err(FetchError::NoData {
                symbol: symbol.to_string(),
            });
        }
        info!(symbol, rows = table.height(), "fetched price history");
        Ok(table)
    }

    /// Like [`fetch`](Self::fetch) but degrades every failure to an empty
    /// table after logging it.
    pub fn fetch_or_empty(&self, request: &PriceRequest) -> RawPriceTable {
        match self.fetch(request) {
            Ok(table) => table,
            Err(e) => {
                warn!(request = %request, error = %e, "fetch failed; continuing with empty table");
                RawPriceTable::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticProvider;
    use crate::domain::{Period, Ticker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct Scripted {
        result: Result<RawPriceTable, ProviderError>,
        calls: Arc<AtomicUsize>,
    }

    impl PriceProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn history(&self, _: &Ticker, _: Period) -> Result<RawPriceTable, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn request(symbol: &str) -> PriceRequest {
        PriceRequest::new(Ticker::parse(symbol).unwrap(), Period::OneMonth)
    }

    fn scripted(result: Result<RawPriceTable, ProviderError>) -> (Fetcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Scripted {
            result,
            calls: Arc::clone(&calls),
        };
        (Fetcher::new(Box::new(provider), RateLimit::disabled()), calls)
    }

    #[test]
    fn returns_provider_table() {
        let fetcher = Fetcher::new(Box::new(SyntheticProvider::new()), RateLimit::disabled());
        let table = fetcher.fetch(&request("AAPL")).unwrap();
        assert_eq!(table.height(), 21);
    }

    #[test]
    fn empty_table_is_no_data() {
        let (fetcher, _) = scripted(Ok(RawPriceTable::empty()));
        let err = fetcher.fetch(&request("ZZZZ")).unwrap_err();
        assert_eq!(
            err,
            FetchError::NoData {
                symbol: "ZZZZ".into()
            }
        );
    }

    #[test]
    fn symbol_not_found_is_no_data() {
        let (fetcher, _) = scripted(Err(ProviderError::SymbolNotFound {
            symbol: "ZZZZ".into(),
        }));
        assert!(fetcher.fetch(&request("ZZZZ")).unwrap_err().is_no_data());
    }

    #[test]
    fn unknown_symbol_starts_rate_limit_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Scripted {
            result: Err(ProviderError::SymbolNotFound {
                symbol: "ZZZZ".into(),
            }),
            calls: Arc::clone(&calls),
        };
        let fetcher = Fetcher::new(Box::new(provider), RateLimit::new(Duration::from_millis(60)));

        assert!(fetcher.fetch(&request("ZZZZ")).unwrap_err().is_no_data());
        assert!(fetcher.limiter.remaining() > Duration::ZERO);

        let start = Instant::now();
        assert!(fetcher.fetch(&request("ZZZZ")).unwrap_err().is_no_data());
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn other_failures_are_provider_errors() {
        let (fetcher, calls) = scripted(Err(ProviderError::Network("connection refused".into())));
        let err = fetcher.fetch(&request("AAPL")).unwrap_err();
        assert!(matches!(err, FetchError::Provider(ProviderError::Network(_))));
        // No retry
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fetch_or_empty_degrades_failures() {
        let (fetcher, _) = scripted(Err(ProviderError::RateLimited {
            retry_after_secs: 60,
        }));
        assert!(fetcher.fetch_or_empty(&request("AAPL")).is_empty());
    }
}
