//! Runtime configuration
//!
//! Everything is read once at startup from `NEWSLETTER_*` environment
//! variables and passed down explicitly.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PORT: u16 = 7860;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the inference endpoint and the local server
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Full URL of the chat-completion endpoint
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub bind: SocketAddr,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: DEFAULT_TIMEOUT,
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout_secs: u64 = parse_var(
            "NEWSLETTER_TIMEOUT_SECS",
            get("NEWSLETTER_TIMEOUT_SECS"),
            defaults.request_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "NEWSLETTER_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let temperature: f32 = parse_var(
            "NEWSLETTER_TEMPERATURE",
            get("NEWSLETTER_TEMPERATURE"),
            defaults.temperature,
        )?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                var: "NEWSLETTER_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".to_string(),
            });
        }

        Ok(Self {
            endpoint: get("NEWSLETTER_ENDPOINT").unwrap_or(defaults.endpoint),
            model: get("NEWSLETTER_MODEL").unwrap_or(defaults.model),
            temperature,
            max_tokens: parse_var(
                "NEWSLETTER_MAX_TOKENS",
                get("NEWSLETTER_MAX_TOKENS"),
                defaults.max_tokens,
            )?,
            request_timeout: Duration::from_secs(timeout_secs),
            bind: parse_var("NEWSLETTER_BIND", get("NEWSLETTER_BIND"), defaults.bind)?,
        })
    }
}

fn parse_var<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = raw else {
        return Ok(default);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
