//! Configuration loader
//!
//! Loads the connector configuration from a JSON file and applies
//! environment overrides.
//!
//! ## Loading Strategy
//! 1. Use the explicit path when one is given, otherwise probe the standard
//!    locations
//! 2. Parse the file as JSON
//! 3. Apply environment overrides
//! 4. Validate required keys
//!
//! ## Environment Variables
//! - `RSERIES_REFRESH_TOKEN`: OAuth refresh token
//! - `RSERIES_CLIENT_ID`: OAuth client id
//! - `RSERIES_CLIENT_SECRET`: OAuth client secret
//! - `RSERIES_ACCOUNT_ID`: Account id used in resource URLs
//! - `RSERIES_FULL_URL`: Resource API host
//! - `RSERIES_SHOP_ID`: Default shop for purchase orders
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` (current working directory)
//! 2. `../config.json` (parent directory)
//! 3. Next to the executable

use std::path::{Path, PathBuf};

use rseries_domain::{ConnectorConfig, ConnectorError, Result};

use crate::errors::InfraError;

/// A validated configuration and the file it came from.
///
/// The path is kept because refreshed credentials are written back to it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: ConnectorConfig,
}

/// Load, override from the environment and validate.
///
/// # Errors
/// Returns `ConnectorError::Config` if:
/// - No config file is found or the given one does not exist
/// - The file is not valid JSON
/// - A required key is missing after overrides
pub fn load(path: Option<PathBuf>) -> Result<LoadedConfig> {
    let path = match path {
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            ConnectorError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    let mut config = load_from_file(&path)?;
    let overridden = apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if !overridden.is_empty() {
        tracing::info!(keys = ?overridden, "Applied environment overrides");
    }

    config.validate()?;
    Ok(LoadedConfig { path, config })
}

/// Read and parse a JSON config file without validating it.
///
/// # Errors
/// Returns `ConnectorError::Config` when the file is missing or malformed.
pub fn load_from_file(path: &Path) -> Result<ConnectorConfig> {
    if !path.exists() {
        return Err(ConnectorError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConnectorError::Config(format!("Failed to read config file: {e}")))?;

    serde_json::from_str(&contents).map_err(|e| ConnectorError::from(InfraError::from(e)))
}

/// Apply `RSERIES_*` overrides using `lookup` to read variables.
///
/// Returns the config keys that were overridden. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ConnectorConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut applied = Vec::new();

    if let Some(v) = get("RSERIES_REFRESH_TOKEN") {
        config.refresh_token = Some(v);
        applied.push("refresh_token");
    }
    if let Some(v) = get("RSERIES_CLIENT_ID") {
        config.client_id = v;
        applied.push("client_id");
    }
    if let Some(v) = get("RSERIES_CLIENT_SECRET") {
        config.client_secret = v;
        applied.push("client_secret");
    }
    if let Some(v) = get("RSERIES_ACCOUNT_ID") {
        config.account_ids = v;
        applied.push("account_ids");
    }
    if let Some(v) = get("RSERIES_FULL_URL") {
        config.full_url = Some(v);
        applied.push("full_url");
    }
    if let Some(v) = get("RSERIES_SHOP_ID") {
        config.buyorders_shop_id = Some(v);
        applied.push("buyorders_shop_id");
    }

    applied
}

/// Probe the standard locations for a config file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config.json"));
        candidates.push(cwd.join("../config.json"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("config.json"));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}
