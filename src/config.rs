//! Explicit configuration for the hourly weather API.
//!
//! The credential is never looked up implicitly: callers build a [`WeatherApiConfig`]
//! (usually through [`WeatherApiConfig::from_env`]) and hand it to the loader, so a
//! missing key is reported before any request is made.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the weather API key.
pub const API_KEY_ENV: &str = "API_KEY";
/// Optional override of the hourly history endpoint.
pub const API_URL_ENV: &str = "WEATHER_API_URL";
/// Optional per-request timeout in seconds.
pub const API_TIMEOUT_ENV: &str = "WEATHER_API_TIMEOUT_SECS";

/// History-on-Demand hourly endpoint.
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.weather.com/v3/wx/hod/r1/direct";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing weather API key: set the {0} environment variable")]
    MissingApiKey(&'static str),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection settings for [`crate::IbmWeatherLoader`].
#[derive(Clone)]
pub struct WeatherApiConfig {
    api_key: String,
    /// Endpoint queried once per time chunk.
    pub base_url: String,
    /// Per-request timeout; exceeding it counts as a failed chunk.
    pub timeout: Duration,
}

impl WeatherApiConfig {
    /// Creates a config with the default endpoint and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] if `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(API_KEY_ENV));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_WEATHER_API_URL.to_string(),
            timeout: DEFAULT_API_TIMEOUT,
        })
    }

    /// Reads [`API_KEY_ENV`], [`API_URL_ENV`] and [`API_TIMEOUT_ENV`] from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_ENV).ok_or(ConfigError::MissingApiKey(API_KEY_ENV))?;
        let mut config = Self::new(api_key)?;

        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(API_TIMEOUT_ENV) {
            let seconds: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: API_TIMEOUT_ENV,
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(seconds);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for WeatherApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
