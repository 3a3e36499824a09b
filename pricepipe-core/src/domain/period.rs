use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named lookback window for a history request.
///
/// Tokens match the provider's `range` parameter exactly, so `as_str()` is
/// what goes on the wire and into generated filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period '{input}'. Valid periods: {}", Period::valid_tokens())]
pub struct PeriodError {
    pub input: String,
}

impl Period {
    /// Every accepted period, shortest first.
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// Human-readable label for selectors.
    pub fn label(self) -> &'static str {
        match self {
            Period::OneDay => "1 day",
            Period::FiveDays => "5 days",
            Period::OneMonth => "1 month",
            Period::ThreeMonths => "3 months",
            Period::SixMonths => "6 months",
            Period::OneYear => "1 year",
            Period::TwoYears => "2 years",
            Period::FiveYears => "5 years",
            Period::TenYears => "10 years",
            Period::YearToDate => "Year to date",
            Period::Max => "Max available",
        }
    }

    /// Parse a token case-insensitively (`YTD`, `Max` and `ytd` are equivalent).
    pub fn parse(input: &str) -> Result<Self, PeriodError> {
        let token = input.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| PeriodError {
                input: input.trim().to_string(),
            })
    }

    /// Comma-separated list of accepted tokens.
    pub fn valid_tokens() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Period {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Period {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Approximate number of trading days the window covers, ending at `today`.
    ///
    /// Uses 21 sessions per month and 252 per year; `ytd` counts weekdays since
    /// January 1st and `max` assumes twenty years.
    pub fn approx_trading_days(self, today: NaiveDate) -> usize {
        match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 21,
            Period::ThreeMonths => 63,
            Period::SixMonths => 126,
            Period::OneYear => 252,
            Period::TwoYears => 504,
            Period::FiveYears => 1_260,
            Period::TenYears => 2_520,
            Period::YearToDate => {
                let jan1 = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                jan1.iter_days()
                    .take_while(|d| *d <= today)
                    .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
                    .count()
                    .max(1)
            }
            Period::Max => 5_040,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
