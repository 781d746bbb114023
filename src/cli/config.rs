//! Configuration file handling
//!
//! ```json
//! {"data_dir": "./insightdb-data", "max_result_rows": 5000, "log_level": "INFO"}
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::executor::DEFAULT_MAX_RESULT_ROWS;
use crate::observability::Severity;

use super::errors::{CliError, CliResult};

/// Data directory used when the configuration names none
pub const DEFAULT_DATA_DIR: &str = "./insightdb-data";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding persisted datasets
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Largest result a query may return
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,

    /// Minimum severity written to the log
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}
fn default_max_result_rows() -> usize {
    DEFAULT_MAX_RESULT_ROWS
}
fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_result_rows: default_max_result_rows(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        if self.max_result_rows == 0 {
            return Err(CliError::config_error("max_result_rows must be > 0"));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of TRACE, INFO, WARN, ERROR, FATAL.",
                self.log_level
            ))
        })
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            data_dir: Some(self.data_path()),
            max_result_rows: self.max_result_rows,
        }
    }
}
