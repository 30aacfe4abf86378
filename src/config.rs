//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing goes through a lookup closure so tests can feed a plain map
//! instead of mutating process-wide environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const STATE_DIR_NAME: &str = ".careconnect";

pub const ENV_API_URL: &str = "CARECONNECT_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CARECONNECT_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CARECONNECT_CONNECT_TIMEOUT_SECS";
pub const ENV_STATE_DIR: &str = "CARECONNECT_STATE_DIR";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting did not parse.
    #[error("invalid value for {var}: {value:?} (expected a positive integer)")]
    InvalidNumber { var: &'static str, value: String },

    /// The API base URL is not http(s).
    #[error("invalid value for {var}: {value:?} (expected an http:// or https:// URL)")]
    InvalidUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL, without a trailing slash (e.g. `https://host/api`).
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Directory holding the persisted session keys.
    pub state_dir: PathBuf,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CARECONNECT_API_URL`: default `http://127.0.0.1:8000/api`
    /// - `CARECONNECT_REQUEST_TIMEOUT_SECS`: default 10
    /// - `CARECONNECT_CONNECT_TIMEOUT_SECS`: default 5
    /// - `CARECONNECT_STATE_DIR`: default `$HOME/.careconnect`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a value is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(lookup(ENV_API_URL))?;
        let timeouts = Timeouts {
            request_secs: parse_secs(ENV_REQUEST_TIMEOUT_SECS, lookup(ENV_REQUEST_TIMEOUT_SECS), DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_secs(ENV_CONNECT_TIMEOUT_SECS, lookup(ENV_CONNECT_TIMEOUT_SECS), DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let state_dir = match lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir(lookup("HOME")),
        };
        Ok(Self { api_url, timeouts, state_dir })
    }
}

pub(crate) fn parse_api_url(raw: Option<String>) -> Result<String, ConfigError> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(DEFAULT_API_URL.to_owned());
    };
    let url = raw.trim().trim_end_matches('/').to_owned();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl { var: ENV_API_URL, value: raw });
    }
    Ok(url)
}

pub(crate) fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidNumber { var, value: raw }),
        Ok(secs) => Ok(secs),
    }
}

fn default_state_dir(home: Option<String>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(STATE_DIR_NAME),
        None => PathBuf::from(STATE_DIR_NAME),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
