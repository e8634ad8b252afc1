//! CLI configuration: flag overrides on top of `lokal_config`.
//!
//! Adds flag overrides from `GlobalOpts` (--base-url, --api-token, etc.)
//! on top of the file + environment layers.

use lokal_api::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use lokal_config::{Config, config_path, save_config};

/// Load the config and apply CLI flag overrides (flag > env > file > default).
pub fn effective_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = lokal_config::load_config()?;

    if let Some(ref url) = global.base_url {
        cfg.base_url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        cfg.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        cfg.password = Some(password.clone());
    }
    if let Some(ref token) = global.api_token {
        cfg.api_token = Some(token.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }

    Ok(cfg)
}

/// Translate the effective configuration into a `ClientConfig`.
pub fn resolve_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    Ok(effective_config(global)?.to_client_config()?)
}
