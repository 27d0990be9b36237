// src/config.rs
// =============================================================================
// Settings for a Collector and its HTTP transport.
//
// A CollectorConfig can be built in code, deserialized from JSON (the CLI's
// --config flag) or filled in from command-line arguments. Every field has a
// default, so a config file only needs to mention what it changes:
//
//   { "max_depth": 2, "cookies": false }
// =============================================================================

use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CrawlError, CrawlResult};

/// User-Agent sent when nothing else is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("link-collector/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// User-Agent header for every request
    pub user_agent: String,

    /// Deepest level to fetch; the seed URL is depth 1 and 0 means no limit
    pub max_depth: usize,

    /// Keep a cookie jar for the whole crawl
    pub cookies: bool,

    /// Per-request timeout in seconds; None leaves reqwest's default
    pub timeout_secs: Option<u64>,

    /// How many redirects to follow before giving up on a request
    pub max_redirects: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_depth: 0,
            cookies: true,
            timeout_secs: None,
            max_redirects: 10,
        }
    }
}

impl CollectorConfig {
    /// Parses a JSON config document and validates it.
    pub fn from_json_str(json: &str) -> CrawlResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CrawlError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make every request fail.
    pub fn validate(&self) -> CrawlResult<()> {
        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(CrawlError::InvalidConfig(format!(
                "user_agent {:?} is not a valid header value",
                self.user_agent
            )));
        }

        if self.timeout_secs == Some(0) {
            return Err(CrawlError::InvalidConfig(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert!(config.user_agent.starts_with("link-collector/"));
        assert_eq!(config.max_depth, 0);
        assert!(config.cookies);
        assert_eq!(config.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CollectorConfig::from_json_str(r#"{ "max_depth": 2, "cookies": false }"#).unwrap();
        assert_eq!(config.max_depth, 2);
        assert!(!config.cookies);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = CollectorConfig::from_json_str(r#"{ "user_agent": "bad\nagent" }"#).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidConfig(_)));

        let err = CollectorConfig::from_json_str(r#"{ "timeout_secs": 0 }"#).unwrap_err();
        assert!(matches!(err, CrawlError::InvalidConfig(_)));

        let err = CollectorConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, CrawlError::InvalidConfig(_)));
    }
}
