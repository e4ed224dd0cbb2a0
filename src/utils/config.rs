// src/utils/config.rs
use log::info;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::classification::remote::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_DELAY_SECS: f64 = 3.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    MissingCredential(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Everything the remote classifier needs. Built once at startup and
/// handed to the classifier; nothing reads the environment after that.
#[derive(Clone)]
pub struct RemoteClassifierConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl fmt::Debug for RemoteClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteClassifierConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl RemoteClassifierConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Fails when `GROQ_API_KEY` is missing; the run must not start without it.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("GROQ_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential("GROQ_API_KEY"))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("GROQ_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("GROQ_MODEL").filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        let timeout_secs: u64 = parse_or(&lookup, "GROQ_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        config.request_timeout = Duration::from_secs(timeout_secs);
        Ok(config)
    }

    pub fn log_config(&self) {
        info!("🤖 Remote classifier configuration:");
        info!("   Model: {}", self.model);
        info!("   Endpoint: {}", self.base_url);
        info!("   Request timeout: {}s", self.request_timeout.as_secs());
        info!(
            "   Retries: {} attempts, backoff {:?} doubling up to {:?}",
            self.retry.max_attempts, self.retry.base_delay, self.retry.max_delay
        );
    }
}

/// Group size and inter-group pause for batched classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay: Duration::from_secs_f64(DEFAULT_BATCH_DELAY_SECS),
        }
    }
}

impl BatchConfig {
    /// `batch_size` must be positive and `delay_secs` finite and non-negative.
    pub fn new(batch_size: usize, delay_secs: f64) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch_size",
                value: batch_size.to_string(),
            });
        }
        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "delay",
                value: delay_secs.to_string(),
            });
        }
        Ok(Self {
            batch_size,
            delay: Duration::from_secs_f64(delay_secs),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
