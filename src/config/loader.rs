//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{AppConfig, CharsetConfig};
use crate::config::validation::{validate_charset, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Somewhere a fresh `[charset]` section can be fetched from.
///
/// Absent keys must fall back to defaults; only malformed data is an error.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<CharsetConfig, ConfigError>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for Box<T> {
    fn load(&self) -> Result<CharsetConfig, ConfigError> {
        (**self).load()
    }
}

/// Reads the `[charset]` section of a config file on every load.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<CharsetConfig, ConfigError> {
        let content = fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content)?;
        validate_charset(&config.charset).map_err(ConfigError::Validation)?;
        Ok(config.charset)
    }
}

/// A fixed configuration acts as its own source.
impl ConfigSource for CharsetConfig {
    fn load(&self) -> Result<CharsetConfig, ConfigError> {
        validate_charset(self).map_err(ConfigError::Validation)?;
        Ok(self.clone())
    }
}
