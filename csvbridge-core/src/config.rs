//! Configuration management
//!
//! Settings live in `settings.json` inside the csvbridge directory:
//! ```json
//! {
//!   "connection": {
//!     "url": "https://ledger.example.com",
//!     "accessToken": "...",
//!     "verify": true,
//!     "timeout": 31.41
//!   }
//! }
//! ```
//! Every connection field can be overridden from the environment.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result as DomainResult};

pub const URL_ENV: &str = "CSVBRIDGE_URL";
pub const ACCESS_TOKEN_ENV: &str = "CSVBRIDGE_ACCESS_TOKEN";
pub const VERIFY_ENV: &str = "CSVBRIDGE_VERIFY";
pub const TIMEOUT_ENV: &str = "CSVBRIDGE_TIMEOUT";

/// Request timeout used when nothing is configured, in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 31.41;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    connection: ConnectionFile,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout: Option<f64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Everything the remote gateway needs to talk to the ledger
#[derive(Clone, PartialEq)]
pub struct ConnectionSettings {
    pub base_url: String,
    pub access_token: String,
    /// Verify the server's TLS certificate
    pub verify: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("verify", &self.verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_token: String::new(),
            verify: true,
            timeout: default_timeout(),
        }
    }
}

impl ConnectionSettings {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            ..Default::default()
        }
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the settings are usable before any request goes out
    pub fn validate(&self) -> DomainResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config(format!(
                "Ledger URL is not set (settings.json connection.url or {})",
                URL_ENV
            )));
        }

        let parsed = Url::parse(self.base_url.trim())
            .map_err(|e| Error::config(format!("Invalid ledger URL \"{}\": {}", self.base_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::config("Ledger URL must use http or https"));
        }

        if self.access_token.trim().is_empty() {
            return Err(Error::config(format!(
                "Access token is not set (settings.json connection.accessToken or {})",
                ACCESS_TOKEN_ENV
            )));
        }

        if self.timeout.is_zero() {
            return Err(Error::config("Timeout must be greater than zero"));
        }

        Ok(())
    }
}

/// csvbridge configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub connection: ConnectionSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the csvbridge directory
    ///
    /// Environment variables win over settings.json, which wins over defaults.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let settings_path = config_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %settings_path.display(), error = %e, "Ignoring malformed settings file");
                SettingsFile::default()
            })
        } else {
            SettingsFile::default()
        };

        let base_url = std::env::var(URL_ENV)
            .ok()
            .or_else(|| raw.connection.url.clone())
            .unwrap_or_default();

        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .or_else(|| raw.connection.access_token.clone())
            .unwrap_or_default();

        let verify = match std::env::var(VERIFY_ENV).ok().as_deref() {
            Some(value) => parse_bool(value).unwrap_or(true),
            None => raw.connection.verify.unwrap_or(true),
        };

        let configured = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .or(raw.connection.timeout);
        let timeout = match configured {
            Some(secs) => timeout_from_secs(secs).unwrap_or_else(|| {
                tracing::warn!(timeout = secs, "Unusable timeout, using the default");
                default_timeout()
            }),
            None => default_timeout(),
        };

        Ok(Self {
            connection: ConnectionSettings {
                base_url: base_url.trim().to_string(),
                access_token: access_token.trim().to_string(),
                verify,
                timeout,
            },
            _raw_settings: raw,
        })
    }

    /// Save config to the csvbridge directory
    /// Preserves other settings that csvbridge doesn't manage
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let settings_path = config_dir.join("settings.json");

        // A file we cannot parse is left alone rather than replaced
        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).with_context(|| {
                format!("Refusing to overwrite malformed {}", settings_path.display())
            })?
        } else {
            SettingsFile::default()
        };

        let conn = &self.connection;
        settings.connection.url = Some(conn.base_url.clone()).filter(|s| !s.is_empty());
        settings.connection.access_token = Some(conn.access_token.clone()).filter(|s| !s.is_empty());
        settings.connection.verify = Some(conn.verify);
        settings.connection.timeout = Some(conn.timeout.as_secs_f64());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

/// Seconds as a request timeout; `None` unless positive and representable
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

fn default_timeout() -> Duration {
    Duration::from_millis((DEFAULT_TIMEOUT_SECS * 1000.0) as u64)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}
