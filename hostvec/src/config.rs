//! Runtime configuration
//!
//! ```toml
//! strict_arity = true
//! stats_report_rate = 100
//! trace_calls = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of a [`Runtime`](crate::runtime::Runtime)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Reject calls passing more arguments than the method declares
    pub strict_arity: bool,
    /// Log object statistics every N constructions/releases (0 = never)
    pub stats_report_rate: u64,
    /// Log every dispatched call at debug level
    pub trace_calls: bool,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_arity(mut self, strict: bool) -> Self {
        self.strict_arity = strict;
        self
    }

    pub fn stats_report_rate(mut self, rate: u64) -> Self {
        self.stats_report_rate = rate;
        self
    }

    pub fn trace_calls(mut self, trace: bool) -> Self {
        self.trace_calls = trace;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
