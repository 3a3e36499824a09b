use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Period, Ticker};

/// One ticker over one period: the unit of work for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRequest {
    pub ticker: Ticker,
    pub period: Period,
}

impl PriceRequest {
    pub fn new(ticker: Ticker, period: Period) -> Self {
        Self { ticker, period }
    }
}

impl fmt::Display for PriceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ticker, self.period)
    }
}
