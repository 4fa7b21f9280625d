//! Seed group definitions loaded from config.toml
//!
//! The groups defined in config.toml are created at startup when they do not
//! already exist, so a fresh deployment comes up with its initial mutual-aid
//! pools in place.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// List of group configurations to seed
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Configuration for a single seed group
#[derive(Debug, Deserialize, Clone)]
pub struct GroupConfig {
    /// Name of the group
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Fixed monthly contribution; falls back to the configured default
    pub monthly_contribution: Option<i64>,
}

/// Loads seed group configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads seed group configuration from the default location (./config.toml).
/// A missing file is treated as an empty seed list, not an error.
pub fn load_default_config() -> Result<Config> {
    if !Path::new("config.toml").exists() {
        return Ok(Config::default());
    }
    load_config("config.toml")
}
