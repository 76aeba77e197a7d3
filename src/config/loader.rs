// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::{Result, SitepipeError};

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (output-root invariants, glob compilation, etc.). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {}", path.display()))?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load the configuration for the application and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - A missing file at the *default* path yields the built-in defaults
///   (a bare project needs no config file at all).
/// - A missing file at any other path is a configuration error, since the
///   user asked for it explicitly.
/// - The resulting tree is validated before being handed out.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    let config = if path.exists() {
        load_from_path(path)?
    } else if path == default_config_path() {
        debug!(path = %path.display(), "no config file; using built-in defaults");
        ConfigFile::default()
    } else {
        return Err(SitepipeError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    };

    validate_config(&config)?;
    Ok(config)
}

/// Default config path, relative to the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitepipe.toml")
}
