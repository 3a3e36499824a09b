//! Price data: providers, fetching, normalization and CSV export.

pub mod export;
pub mod fetch;
pub mod normalize;
pub mod provider;
pub mod rate_limit;
pub mod synthetic;
pub mod table;
pub mod yahoo;

pub use export::{preview_rows, to_csv_bytes, write_csv, WriteError, WriteOutcome};
pub use fetch::{FetchError, Fetcher};
pub use normalize::{clean_name, flatten_label, normalize, NormalizeError, DATE_COLUMN};
pub use provider::{PriceProvider, ProviderError};
pub use rate_limit::{RateLimit, RateLimiter};
pub use synthetic::SyntheticProvider;
pub use table::{ColumnLabel, NormalizedPriceTable, RawPriceTable};
pub use yahoo::YahooProvider;
