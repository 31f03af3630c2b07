//! Machine configuration.
//!
//! A machine can be configured in code or from a TOML file:
//!
//! ```toml
//! start_state = "EnemyIdle"
//! max_chained_transitions = 16
//! history_limit = 128
//! ```
//!
//! Missing keys fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for a single machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Name of the state entered by `start()`: the short type name or the
    /// full type path. Unknown names are logged and ignored.
    #[serde(default)]
    pub start_state: Option<String>,

    /// Follow-up transitions allowed after the first one before a chain
    /// of requests is treated as a loop.
    #[serde(default = "default_max_chained_transitions")]
    pub max_chained_transitions: usize,

    /// Transitions kept in the history. Zero disables the log.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_max_chained_transitions() -> usize {
    32
}

fn default_history_limit() -> usize {
    64
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            start_state: None,
            max_chained_transitions: default_max_chained_transitions(),
            history_limit: default_history_limit(),
        }
    }
}

impl MachineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(?path, "loaded machine config");
        Self::from_toml_str(&contents)
    }
}
