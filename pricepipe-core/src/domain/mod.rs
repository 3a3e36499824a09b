//! Domain types: ticker symbols, lookback periods, price requests.

pub mod period;
pub mod request;
pub mod ticker;

pub use period::{Period, PeriodError};
pub use request::PriceRequest;
pub use ticker::{Ticker, TickerError};
