//! Configuration for a template set

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Options applied to every fragment added to a template set
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render keys missing from the data as the zero value of their type
    /// instead of `<no value>`
    pub missing_key_zero: bool,

    /// How deeply `share` calls may nest before the render fails
    pub max_share_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            missing_key_zero: false,
            max_share_depth: 32,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the missing-key behaviour
    pub fn with_missing_key_zero(mut self, yes: bool) -> Self {
        self.missing_key_zero = yes;
        self
    }

    /// Set the maximum `share` nesting depth
    pub fn with_max_share_depth(mut self, depth: usize) -> Self {
        self.max_share_depth = depth;
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
