//! # Configuration File
//!
//! Optional YAML file read with `--config`. Every field has a default, and
//! command-line flags win over whatever the file sets.
//!
//! ```yaml
//! partition: tenant-42
//! log_format: json
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Partition used for key-value output when neither flag nor file sets one.
pub const DEFAULT_PARTITION: &str = "default";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Settings read from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Key-value partition for `--emit kv` output.
    pub partition: String,
    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partition: DEFAULT_PARTITION.to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Read `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config file: {}", path.display()))
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, partition: Option<&str>, log_format: Option<LogFormat>) -> Self {
        if let Some(partition) = partition {
            self.partition = partition.to_string();
        }
        if let Some(log_format) = log_format {
            self.log_format = log_format;
        }
        self
    }
}
