//! Configuration file loading.
//!
//! Search order:
//! 1. Explicit `--config` path
//! 2. `./sldraft.toml`
//! 3. `<platform config dir>/sldraft/config.toml`
//! 4. Built-in defaults

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use sldraft_core::{EditorConfig, EngineError};
use thiserror::Error;

/// Local configuration file name.
pub const LOCAL_CONFIG: &str = "sldraft.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] EngineError),
}

/// Find and load the editor configuration.
///
/// An explicit path that does not exist is an error; missing files in the
/// other locations are skipped.
pub fn load_config(explicit_path: Option<&Path>) -> Result<EditorConfig, ConfigError> {
    if let Some(path) = explicit_path {
        info!("Loading configuration from {}", path.display());
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!("Loading configuration from {}", local.display());
        return load_config_file(local);
    }

    if let Some(system) = system_config_path() {
        if system.exists() {
            info!("Loading configuration from {}", system.display());
            return load_config_file(&system);
        }
        debug!("No configuration at {}", system.display());
    } else {
        debug!("Could not determine platform config directory");
    }

    debug!("Using default configuration");
    Ok(EditorConfig::default())
}

fn system_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sldraft").join("config.toml"))
}

/// Load and validate a TOML configuration file.
pub fn load_config_file(path: &Path) -> Result<EditorConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EditorConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}
