//! Configuration loading and runtime tunables
//!
//! This module loads the connector's JSON config file, applies environment
//! overrides and exposes the tunables of the HTTP, retry and rate-limit
//! layers.

pub mod loader;
pub mod settings;

// Re-export commonly used items
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths, LoadedConfig};
pub use settings::ConnectorSettings;
