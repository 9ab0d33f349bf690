//! Serializable pipeline run configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use stockledger_core::ingest::ColumnAliases;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one pipeline run.
///
/// The aging reference date is the only non-input-derived parameter of the
/// whole derivation; leaving it unset lets the runner use today's date,
/// while tests and reproducible runs inject a fixed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Reference date for stock aging (`"YYYY-MM-DD"` in TOML).
    pub reference_date: Option<NaiveDate>,

    /// Recurse into subdirectories when discovering input files.
    pub recursive: bool,

    /// Header alias table. A config file lists only its additions; built-in
    /// spellings stay available unless explicitly rebound.
    pub aliases: ColumnAliases,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_date: None,
            recursive: true,
            aliases: ColumnAliases::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }
}
