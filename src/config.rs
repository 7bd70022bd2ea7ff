//! Configuration Module
//!
//! Handles loading and validating server configuration from environment
//! variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::replication::HubConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries each region can hold
    pub capacity: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Regions registered at startup
    pub regions: Vec<String>,
    /// Per-region timeout for replicated updates, in milliseconds
    pub fanout_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum entries per region (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REGIONS` - Comma-separated region ids (default: us-east,eu-west,ap-south)
    /// - `FANOUT_TIMEOUT_MS` - Replication timeout per region (default: 250)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            regions: env::var("REGIONS")
                .ok()
                .map(|v| parse_regions(&v))
                .unwrap_or(defaults.regions),
            fanout_timeout_ms: parse_var("FANOUT_TIMEOUT_MS")
                .unwrap_or(defaults.fanout_timeout_ms),
        }
    }

    /// Fails fast on values the cache cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::Config("CACHE_CAPACITY must be positive".into()));
        }
        if self.default_ttl_ms == 0 {
            return Err(CacheError::Config("DEFAULT_TTL_MS must be positive".into()));
        }
        if self.fanout_timeout_ms == 0 {
            return Err(CacheError::Config("FANOUT_TIMEOUT_MS must be positive".into()));
        }
        if self.regions.is_empty() {
            return Err(CacheError::Config("REGIONS must name at least one region".into()));
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn fanout_timeout(&self) -> Duration {
        Duration::from_millis(self.fanout_timeout_ms)
    }

    /// Hub settings derived from this configuration.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            capacity: self.capacity,
            default_ttl: self.default_ttl(),
            fanout_timeout: self.fanout_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl_ms: 300_000,
            server_port: 3000,
            regions: vec![
                "us-east".to_string(),
                "eu-west".to_string(),
                "ap-south".to_string(),
            ],
            fanout_timeout_ms: 250,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Splits a comma-separated list, dropping blanks and duplicates.
fn parse_regions(raw: &str) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for region in raw.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        if !regions.iter().any(|r| r == region) {
            regions.push(region.to_string());
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.regions, vec!["us-east", "eu-west", "ap-south"]);
        assert_eq!(config.fanout_timeout(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("SERVER_PORT");
        env::remove_var("REGIONS");
        env::remove_var("FANOUT_TIMEOUT_MS");

        let config = Config::from_env();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.regions.len(), 3);
        assert_eq!(config.fanout_timeout_ms, 250);
    }

    #[test]
    fn test_parse_regions() {
        assert_eq!(
            parse_regions(" us-east, ,eu-west,us-east "),
            vec!["us-east", "eu-west"]
        );
        assert!(parse_regions(" , ").is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = Config {
            capacity: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));

        let config = Config {
            default_ttl_ms: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));

        let config = Config {
            regions: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_hub_config() {
        let hub = Config::default().hub_config();
        assert_eq!(hub.capacity, 1000);
        assert_eq!(hub.default_ttl, Duration::from_secs(300));
        assert_eq!(hub.fanout_timeout, Duration::from_millis(250));
    }
}
