use std::env;
use std::path::PathBuf;

use crate::error::{BattleLensError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Object store
    pub data_base_url: String,
    pub default_dataset: Option<String>,
    pub datasets_file: Option<PathBuf>,
    pub fetch_timeout_secs: u64,

    // Cache
    pub response_cache_ttl_secs: i64,
    pub rows_cache_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables (after `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Ok(Self {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: parsed_env("API_PORT", 3000)?,
            data_base_url: required_env("DATA_BASE_URL")?,
            default_dataset: optional_env("DEFAULT_DATASET"),
            datasets_file: optional_env("DATASETS_FILE").map(PathBuf::from),
            fetch_timeout_secs: parsed_env("FETCH_TIMEOUT_SECS", 30)?,
            response_cache_ttl_secs: parsed_env("RESPONSE_CACHE_TTL_SECS", 30 * 60)?,
            rows_cache_ttl_secs: parsed_env("ROWS_CACHE_TTL_SECS", 60 * 60)?,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    optional_env(key)
        .ok_or_else(|| BattleLensError::Config(format!("{key} environment variable is required")))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BattleLensError::Config(format!("{key} must be a number, got {raw:?}")))
}
