//! Pipeline configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! output_dir = "data"
//! default_period = "1y"
//!
//! [rate_limit]
//! min_interval_ms = 3000
//!
//! [provider]
//! kind = "yahoo"          # or "synthetic" for offline data
//! base_url = "https://query2.finance.yahoo.com"
//! timeout_secs = 30
//! ```

use crate::data::RateLimit;
use crate::domain::Period;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory generated CSV files go into.
    pub output_dir: PathBuf,
    pub default_period: Period,
    pub rate_limit: RateLimitConfig,
    pub provider: ProviderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            default_period: Period::default(),
            rate_limit: RateLimitConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum milliseconds between provider requests. Zero disables waiting.
    pub min_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: RateLimit::DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

impl RateLimitConfig {
    pub fn policy(&self) -> RateLimit {
        RateLimit::new(Duration::from_millis(self.min_interval_ms))
    }
}

/// Which price source the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: "https://query2.finance.yahoo.com".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let cfg = PipelineConfig::from_toml("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.output_dir, PathBuf::from("data"));
        assert_eq!(cfg.default_period, Period::OneYear);
        assert_eq!(cfg.rate_limit.policy(), RateLimit::default());
        assert_eq!(cfg.provider.timeout_secs, 30);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let cfg = PipelineConfig::from_toml(
            r#"
            output_dir = "/tmp/prices"
            default_period = "ytd"

            [rate_limit]
            min_interval_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/prices"));
        assert_eq!(cfg.default_period, Period::YearToDate);
        assert!(cfg.rate_limit.policy().is_disabled());
        assert_eq!(cfg.provider, ProviderConfig::default());
    }

    #[test]
    fn provider_kind_parses_lowercase() {
        let cfg = PipelineConfig::from_toml("[provider]\nkind = \"synthetic\"").unwrap();
        assert_eq!(cfg.provider.kind, ProviderKind::Synthetic);
        assert_eq!(cfg.provider.timeout_secs, 30);
    }

    #[test]
    fn bad_period_is_parse_error() {
        let err = PipelineConfig::from_toml(r#"default_period = "3y""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PipelineConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn roundtrips_through_toml() {
        let cfg = PipelineConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), cfg);
    }
}
