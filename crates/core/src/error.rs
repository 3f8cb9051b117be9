//! Configuration error model.

use std::path::PathBuf;

use thiserror::Error;

/// Result type used when loading role configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure to load a role configuration document.
///
/// Only loading is fallible. Once a configuration is in place, lookups degrade
/// to empty records instead of failing (a missing role is a configuration gap,
/// not an error).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read role configuration from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON (or has the wrong shape).
    #[error("invalid role configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
