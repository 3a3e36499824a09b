use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minimum accepted symbol length after trimming.
pub const MIN_TICKER_LEN: usize = 2;
/// Maximum accepted symbol length after trimming.
pub const MAX_TICKER_LEN: usize = 15;

/// A validated, uppercased ticker symbol.
///
/// The same rule applies to every entry point: 2-15 characters drawn from
/// ASCII letters, `-` and `.`, with at least one letter (`BRK.B`, `BF-B`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker symbol is empty")]
    Empty,

    #[error("ticker symbol must be at least {MIN_TICKER_LEN} characters (got {len})")]
    TooShort { len: usize },

    #[error("ticker symbol too long (max {MAX_TICKER_LEN} characters, got {len})")]
    TooLong { len: usize },

    #[error("invalid ticker symbol '{0}': letters, hyphens and dots only")]
    InvalidCharacters(String),
}

impl Ticker {
    /// Trim, uppercase and validate raw user input.
    pub fn parse(input: &str) -> Result<Self, TickerError> {
        let symbol = input.trim().to_uppercase();
        let len = symbol.chars().count();

        if len == 0 {
            return Err(TickerError::Empty);
        }
        if len < MIN_TICKER_LEN {
            return Err(TickerError::TooShort { len });
        }
        if len > MAX_TICKER_LEN {
            return Err(TickerError::TooLong { len });
        }

        let allowed = symbol
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '.');
        let has_letter = symbol.chars().any(|c| c.is_ascii_alphabetic());
        if !allowed || !has_letter {
            return Err(TickerError::InvalidCharacters(symbol));
        }

        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
