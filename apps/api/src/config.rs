use anyhow::{Context, Result};

use crate::forms::runtime::DEFAULT_FIELDS_PER_STEP;

/// Application configuration loaded from environment variables.
/// Every variable is optional; invalid numbers fail start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Integration configs go to Redis when set, otherwise stay in memory.
    pub redis_url: Option<String>,
    /// Submissions are forwarded to this remote forms API when set.
    pub forms_api_url: Option<String>,
    pub integration_test_timeout_secs: u64,
    pub fields_per_step: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            redis_url: None,
            forms_api_url: None,
            integration_test_timeout_secs: 10,
            fields_per_step: DEFAULT_FIELDS_PER_STEP,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        let defaults = Config::default();

        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            redis_url: optional_env("REDIS_URL"),
            forms_api_url: optional_env("FORMS_API_URL"),
            integration_test_timeout_secs: parse_env(
                "INTEGRATION_TEST_TIMEOUT_SECS",
                defaults.integration_test_timeout_secs,
            )?,
            fields_per_step: parse_env("FIELDS_PER_STEP", defaults.fields_per_step)?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
