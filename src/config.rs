//! Runtime configuration
//!
//! Values come from the environment, then CLI flags override them.

use std::time::Duration;

use crate::{Error, Result};

/// Where the published manifests live unless told otherwise
pub const DEFAULT_SOURCE: &str = "https://gist.githubusercontent.com/miguelmota/86814b3bcd0bb8ffbd5b4fa9d1cb52ba/raw/a633c647f657b9a2c436ac8e8b8e11b805bba87a";

/// Default timeout for one manifest fetch
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base URL (`http://`, `https://`) or a local directory
    pub source: String,
    /// Per-fetch timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: DEFAULT_SOURCE.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Read `SHARDROP_SOURCE` and `SHARDROP_FETCH_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        if let Ok(source) = std::env::var("SHARDROP_SOURCE") {
            config.source = source;
        }
        if let Ok(raw) = std::env::var("SHARDROP_FETCH_TIMEOUT_SECS") {
            config.fetch_timeout_secs = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// True when `source` should be fetched over HTTP
    pub fn is_remote(&self) -> bool {
        self.source.starts_with("https://") || self.source.starts_with("http://")
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(Error::Config("fetch timeout must be positive".into())),
        Ok(secs) => Ok(secs),
        Err(e) => Err(Error::Config(format!("invalid fetch timeout '{}': {}", raw, e))),
    }
}
