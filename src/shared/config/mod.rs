//! Client configuration module
//!
//! Provides the configuration consumed by the API client: base URL, per-attempt
//! timeout, retry policy, and the token refresh endpoint.
//!
//! Configuration can be assembled three ways:
//!
//! - [`ClientConfig::builder`] for explicit construction
//! - [`ClientConfig::from_env`] for `PRESSROOM_*` environment overrides
//! - [`ClientConfig::from_toml_str`] / [`ClientConfig::from_toml_file`]
//!
//! Every path goes through the same validation in [`ClientConfigBuilder::build`].

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default server URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
/// Default refresh endpoint path
pub const DEFAULT_REFRESH_ENDPOINT: &str = "/api/auth/refresh";

const ENV_API_URL: &str = "PRESSROOM_API_URL";
const ENV_TIMEOUT_MS: &str = "PRESSROOM_TIMEOUT_MS";
const ENV_MAX_RETRIES: &str = "PRESSROOM_MAX_RETRIES";
const ENV_RETRY_DELAY_MS: &str = "PRESSROOM_RETRY_DELAY_MS";
const ENV_REFRESH_ENDPOINT: &str = "PRESSROOM_REFRESH_ENDPOINT";

/// API client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server URL, without trailing slash
    pub base_url: String,
    /// Timeout applied to each physical HTTP attempt
    pub timeout: Duration,
    /// Maximum number of retries for retryable failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_delay: Duration,
    /// Path of the token refresh endpoint
    pub refresh_endpoint: String,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.to_string(),
            user_agent: concat!("pressroom/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfigBuilder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Build a configuration from defaults plus `PRESSROOM_*` environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Ok(url) = std::env::var(ENV_API_URL) {
            builder = builder.base_url(url);
        }
        if let Some(ms) = env_number(ENV_TIMEOUT_MS)? {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(retries) = env_number(ENV_MAX_RETRIES)? {
            let retries = u32::try_from(retries)
                .map_err(|_| ConfigError::InvalidValue(ENV_MAX_RETRIES, retries.to_string()))?;
            builder = builder.max_retries(retries);
        }
        if let Some(ms) = env_number(ENV_RETRY_DELAY_MS)? {
            builder = builder.retry_delay(Duration::from_millis(ms));
        }
        if let Ok(endpoint) = std::env::var(ENV_REFRESH_ENDPOINT) {
            builder = builder.refresh_endpoint(endpoint);
        }

        builder.build()
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    ///
    /// ```toml
    /// base_url = "https://news.example.com"
    /// timeout_ms = 10000
    /// max_retries = 2
    /// retry_delay_ms = 250
    /// refresh_endpoint = "/api/auth/refresh"
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = Self::builder();
        if let Some(url) = file.base_url {
            builder = builder.base_url(url);
        }
        if let Some(ms) = file.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(retries) = file.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(ms) = file.retry_delay_ms {
            builder = builder.retry_delay(Duration::from_millis(ms));
        }
        if let Some(endpoint) = file.refresh_endpoint {
            builder = builder.refresh_endpoint(endpoint);
        }
        if let Some(agent) = file.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// Read and parse a TOML configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&source)
    }

    /// Get the full URL for an API path
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue("timeout", "0".to_string()));
        }
        if !self.refresh_endpoint.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "refresh_endpoint",
                self.refresh_endpoint.clone(),
            ));
        }
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
    refresh_endpoint: Option<String>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Set the server URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum retry count
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the base backoff delay
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.refresh_endpoint = Some(endpoint.into());
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
            refresh_endpoint: self.refresh_endpoint.unwrap_or(defaults.refresh_endpoint),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    refresh_endpoint: Option<String>,
    user_agent: Option<String>,
}

fn env_number(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}
