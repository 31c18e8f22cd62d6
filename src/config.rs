//! Client configuration parsed from environment variables or CLI flags.
//!
//! Both endpoints are injected; nothing is hardcoded. The HTTP base URL is
//! used for the history snapshot, the socket URL for the live stream.

use std::time::Duration;

use crate::retry::ReconnectPolicy;

pub const HTTP_BASE_URL_VAR: &str = "FREECHAT_HTTP_BASE_URL";
pub const SOCKET_URL_VAR: &str = "FREECHAT_SOCKET_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "FREECHAT_REQUEST_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_VAR: &str = "FREECHAT_CONNECT_TIMEOUT_SECS";
pub const RECONNECT_ATTEMPTS_VAR: &str = "FREECHAT_RECONNECT_ATTEMPTS";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Path of the history snapshot relative to the HTTP base URL.
pub const HISTORY_PATH: &str = "/api/messages";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration; set {var}")]
    Missing { var: &'static str },
    #[error("invalid HTTP base URL (expected http:// or https://): {0}")]
    InvalidHttpUrl(String),
    #[error("invalid socket URL (expected ws:// or wss://): {0}")]
    InvalidSocketUrl(String),
    #[error("invalid value for {var}: {value}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Total deadline for the history request.
    pub request: Duration,
    /// Deadline for TCP connect (HTTP) and the socket handshake.
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// HTTP base URL without a trailing slash.
    pub http_base_url: String,
    /// WebSocket endpoint.
    pub socket_url: String,
    pub timeouts: Timeouts,
    pub reconnect: ReconnectPolicy,
}

impl ChatConfig {
    /// Build a config from the two required endpoints with default timeouts
    /// and no reconnect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHttpUrl`] or
    /// [`ConfigError::InvalidSocketUrl`] when a URL has the wrong scheme.
    pub fn new(http_base_url: &str, socket_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            http_base_url: normalize_http_base_url(http_base_url)?,
            socket_url: validate_socket_url(socket_url)?,
            timeouts: Timeouts::default(),
            reconnect: ReconnectPolicy::disabled(),
        })
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `FREECHAT_HTTP_BASE_URL`
    /// - `FREECHAT_SOCKET_URL`
    ///
    /// Optional:
    /// - `FREECHAT_REQUEST_TIMEOUT_SECS`: default 10
    /// - `FREECHAT_CONNECT_TIMEOUT_SECS`: default 10
    /// - `FREECHAT_RECONNECT_ATTEMPTS`: default 0 (no reconnect)
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for missing endpoints, bad URL schemes or
    /// unparsable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http = std::env::var(HTTP_BASE_URL_VAR).map_err(|_| ConfigError::Missing { var: HTTP_BASE_URL_VAR })?;
        let socket = std::env::var(SOCKET_URL_VAR).map_err(|_| ConfigError::Missing { var: SOCKET_URL_VAR })?;

        let mut config = Self::new(&http, &socket)?;
        config.timeouts = Timeouts {
            request: Duration::from_secs(env_parse(REQUEST_TIMEOUT_VAR, DEFAULT_REQUEST_TIMEOUT_SECS)?),
            connect: Duration::from_secs(env_parse(CONNECT_TIMEOUT_VAR, DEFAULT_CONNECT_TIMEOUT_SECS)?),
        };
        config.reconnect = ReconnectPolicy::with_attempts(env_parse(RECONNECT_ATTEMPTS_VAR, 0)?);
        Ok(config)
    }

    /// Full URL of the history snapshot endpoint.
    #[must_use]
    pub fn history_url(&self) -> String {
        format!("{}{HISTORY_PATH}", self.http_base_url)
    }
}

fn env_parse<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        Err(_) => Ok(default),
    }
}

fn normalize_http_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(trimmed.to_owned()),
        _ => Err(ConfigError::InvalidHttpUrl(raw.to_owned())),
    }
}

fn validate_socket_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let host = trimmed
        .strip_prefix("ws://")
        .or_else(|| trimmed.strip_prefix("wss://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(trimmed.to_owned()),
        _ => Err(ConfigError::InvalidSocketUrl(raw.to_owned())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
