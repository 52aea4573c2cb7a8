//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BLOOMERY_API_URL` - API base URL (default: `http://127.0.0.1:4000/api`)
//! - `BLOOMERY_API_TIMEOUT_SECS` - per-request timeout (default: 30)
//! - `BLOOMERY_API_MAX_RETRIES` - attempts for the `*_with_retry` verbs (default: 3)
//! - `BLOOMERY_API_RETRY_DELAY_MS` - base backoff delay for the verbs (default: 1000)
//! - `BLOOMERY_LOAD_MAX_ATTEMPTS` - store/background fetch-cycle attempts (default: 5)
//! - `BLOOMERY_LOAD_RETRY_DELAY_MS` - fetch-cycle base delay, doubling without jitter (default: 1000)
//! - `BLOOMERY_REFRESH_INTERVAL_SECS` - periodic store refresh; 0 disables (default: 300)
//!
//! Precedence: a runtime override (`with_base_url` and friends) beats the
//! environment, which beats the built-in default.

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000/api";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Bloomery client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, no trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts for the retry-wrapped HTTP verbs.
    pub max_retries: u32,
    /// Base backoff delay for the retry-wrapped HTTP verbs.
    pub retry_delay: Duration,
    /// Attempts per store/background fetch cycle.
    pub load_max_attempts: u32,
    /// Base delay between fetch-cycle attempts (doubles, no jitter).
    pub load_retry_delay: Duration,
    /// Interval for the periodic store refresh; `None` disables it.
    pub refresh_interval: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            load_max_attempts: 5,
            load_retry_delay: Duration::from_millis(1000),
            refresh_interval: Some(Duration::from_secs(300)),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable, or if
    /// the base URL is not a valid absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = normalize_base_url(&get_env_or_default("BLOOMERY_API_URL", DEFAULT_BASE_URL))?;
        let timeout = Duration::from_secs(parse_env("BLOOMERY_API_TIMEOUT_SECS", 30)?);
        let max_retries = parse_env("BLOOMERY_API_MAX_RETRIES", 3)?;
        let retry_delay = Duration::from_millis(parse_env("BLOOMERY_API_RETRY_DELAY_MS", 1000)?);
        let load_max_attempts = parse_env("BLOOMERY_LOAD_MAX_ATTEMPTS", 5)?;
        let load_retry_delay =
            Duration::from_millis(parse_env("BLOOMERY_LOAD_RETRY_DELAY_MS", 1000)?);
        let refresh_secs: u64 = parse_env("BLOOMERY_REFRESH_INTERVAL_SECS", 300)?;

        Ok(Self {
            base_url,
            timeout,
            max_retries,
            retry_delay,
            load_max_attempts,
            load_retry_delay,
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
        })
    }

    /// Override the base URL at runtime (beats the environment).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not a valid absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub const fn with_load_max_attempts(mut self, load_max_attempts: u32) -> Self {
        self.load_max_attempts = load_max_attempts;
        self
    }

    #[must_use]
    pub const fn with_load_retry_delay(mut self, load_retry_delay: Duration) -> Self {
        self.load_retry_delay = load_retry_delay;
        self
    }

    #[must_use]
    pub const fn with_refresh_interval(mut self, refresh_interval: Option<Duration>) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }
}

/// Validate the base URL and trim any trailing slash so paths can always be
/// appended as `{base}{path}`.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("BLOOMERY_API_URL".to_string(), e.to_string())
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Environment mutations race across parallel tests; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "BLOOMERY_API_URL",
        "BLOOMERY_API_TIMEOUT_SECS",
        "BLOOMERY_API_MAX_RETRIES",
        "BLOOMERY_API_RETRY_DELAY_MS",
        "BLOOMERY_LOAD_MAX_ATTEMPTS",
        "BLOOMERY_LOAD_RETRY_DELAY_MS",
        "BLOOMERY_REFRESH_INTERVAL_SECS",
    ];

    #[allow(unsafe_code)]
    fn clear_vars() {
        for var in VARS {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    #[allow(unsafe_code)]
    fn defaults_apply_when_env_is_empty() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:4000/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.load_max_attempts, 5);
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(300)));
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_overrides_defaults_and_zero_disables_refresh() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe {
            std::env::set_var("BLOOMERY_API_URL", "https://api.bloomery.shop/v1/");
            std::env::set_var("BLOOMERY_API_MAX_RETRIES", "7");
            std::env::set_var("BLOOMERY_REFRESH_INTERVAL_SECS", "0");
        }

        let config = ClientConfig::from_env().unwrap();
        // Trailing slash is trimmed.
        assert_eq!(config.base_url, "https://api.bloomery.shop/v1");
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.refresh_interval, None);

        clear_vars();
    }

    #[test]
    #[allow(unsafe_code)]
    fn unparseable_values_are_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_vars();
        unsafe { std::env::set_var("BLOOMERY_API_TIMEOUT_SECS", "soon") };

        let error = ClientConfig::from_env().unwrap_err();
        assert!(error.to_string().contains("BLOOMERY_API_TIMEOUT_SECS"));

        clear_vars();
    }

    #[test]
    fn runtime_override_beats_environment() {
        let config = ClientConfig::default()
            .with_base_url("https://staging.bloomery.shop/api/")
            .unwrap();
        assert_eq!(config.base_url, "https://staging.bloomery.shop/api");

        assert!(ClientConfig::default().with_base_url("not a url").is_err());
    }
}
