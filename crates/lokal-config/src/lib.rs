//! Configuration for the Lokal CLI.
//!
//! A TOML file in the platform config directory, overridden by `LOKAL_*`
//! environment variables, translated into `lokal_api::ClientConfig`.
//! The CLI layers its own flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use lokal_api::{ClientConfig, Credentials, DEFAULT_BASE_URL, TransportConfig};

/// Placeholder shown instead of secrets.
pub const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// How to reach the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Daemon base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Username for basic auth (used only together with `password`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for basic auth. Stored in plaintext; `LOKAL_PASSWORD` avoids that.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// API token sent as `X-Auth-Token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
            api_token: None,
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Translate into a client config, validating the URL.
    ///
    /// Basic auth is only configured when both username and password are
    /// present; an empty token counts as no token.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let base_url: Url = self
            .base_url
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: "base_url".into(),
                reason: format!("invalid URL: {}", self.base_url),
            })?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        let mut credentials = Credentials::default();
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            credentials = credentials.with_basic(username.clone(), password.clone());
        }
        if let Some(token) = self.api_token.as_ref().filter(|t| !t.is_empty()) {
            credentials = credentials.with_api_token(token.clone());
        }

        Ok(ClientConfig {
            base_url,
            credentials,
            transport: TransportConfig {
                timeout: Duration::from_secs(self.timeout),
                ..TransportConfig::default()
            },
        })
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            password: self.password.as_ref().map(|_| REDACTED.into()),
            api_token: self.api_token.as_ref().map(|_| REDACTED.into()),
            ..self.clone()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("so", "lokal", "lokal").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lokal");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `LOKAL_*` variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LOKAL_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
