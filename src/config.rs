//! Application configuration and environment variable parsing.
//!
//! Configuration is loaded from the environment (optionally seeded from a
//! .env file). Every knob has a sensible default so the CLI runs with no
//! environment at all; a `GITHUB_TOKEN` or `CREDENTIALS_FILE` is only needed
//! for private organizations or to raise rate limits.

use chrono::Weekday;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_base")]
    pub github_api_base: String,

    /// Connect/read timeout applied to every API request, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Page size requested from list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: u8,

    /// Maximum number of repository fetches in flight at once.
    #[serde(default = "default_concurrency_limit")]
    pub fetch_concurrency_limit: usize,

    /// Directory holding per-organization JSON cache files.
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Day the weekly trend buckets start on ("mon", "sunday", ...).
    #[serde(default = "default_week_start_day")]
    pub week_start_day: String,

    /// Optional GitHub Personal Access Token for higher rate limits.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Optional path to a .git-credentials style file used for basic auth
    /// when no token is set.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_per_page() -> u8 {
    100
}

fn default_concurrency_limit() -> usize {
    10
}

fn default_week_start_day() -> String {
    "mon".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn http_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.http_timeout_secs)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn week_start(&self) -> anyhow::Result<Weekday> {
        self.week_start_day.parse().map_err(|_| {
            anyhow::anyhow!(
                "WEEK_START_DAY '{}' is not a weekday name",
                self.week_start_day
            )
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_api_base: default_api_base(),
            http_timeout_secs: default_http_timeout_secs(),
            per_page: default_per_page(),
            fetch_concurrency_limit: default_concurrency_limit(),
            cache_dir: None,
            week_start_day: default_week_start_day(),
            github_token: None,
            credentials_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "GITHUB_API_BASE",
        "HTTP_TIMEOUT_SECS",
        "PER_PAGE",
        "FETCH_CONCURRENCY_LIMIT",
        "CACHE_DIR",
        "WEEK_START_DAY",
        "GITHUB_TOKEN",
        "CREDENTIALS_FILE",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        clear_vars();
        env::set_var("GITHUB_API_BASE", "https://github.example.com/api/v3");
        env::set_var("HTTP_TIMEOUT_SECS", "9");
        env::set_var("PER_PAGE", "50");
        env::set_var("FETCH_CONCURRENCY_LIMIT", "4");
        env::set_var("WEEK_START_DAY", "sun");

        let config = AppConfig::from_env().expect("Failed to load config");

        assert_eq!(config.github_api_base, "https://github.example.com/api/v3");
        assert_eq!(config.http_timeout_secs, 9);
        assert_eq!(config.per_page, 50);
        assert_eq!(config.fetch_concurrency_limit, 4);
        assert_eq!(config.week_start().unwrap(), Weekday::Sun);

        clear_vars();
    }

    #[test]
    #[serial]
    fn test_config_defaults_with_empty_env() {
        clear_vars();

        let config = AppConfig::from_env().expect("Failed to load config");

        assert_eq!(config.github_api_base, "https://api.github.com");
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.fetch_concurrency_limit, 10);
        assert_eq!(config.week_start().unwrap(), Weekday::Mon);
        assert!(config.github_token.is_none());
        assert!(config.credentials_file.is_none());
    }

    #[test]
    fn test_week_start_rejects_garbage() {
        let config = AppConfig {
            week_start_day: "someday".to_string(),
            ..AppConfig::default()
        };
        assert!(config.week_start().is_err());
    }
}
