//! Report configuration loaded from JSON

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading a report configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level report configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Report name, used as the jobflow name
    pub name: String,

    /// Tables and partitions that must be fully written before submitting
    #[serde(default)]
    pub wait_for: Vec<WaitSpec>,

    /// Hive steps, submitted in this order
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// A table whose partitions must be available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSpec {
    pub table_name: String,

    /// Partition path suffixes relative to the table location
    #[serde(default)]
    pub partitions: Vec<String>,
}

/// One Hive step and its optional import into the serving store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub hive_script: String,

    /// Script arguments, passed through to the job runner untouched
    #[serde(default)]
    pub hive_args: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hive_table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo_collection: Option<String>,

    /// Free-form arguments appended to the importer command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importer_args: Option<String>,

    /// Clear the destination collection before loading
    #[serde(default)]
    pub drop: bool,

    /// Refresh Hive metadata before importing
    #[serde(default)]
    pub hive_init: bool,
}

impl StepSpec {
    /// A step is imported only when it names both a source table and a collection
    pub fn import_target(&self) -> Option<(&str, &str)> {
        match (&self.hive_table, &self.mongo_collection) {
            (Some(table), Some(collection)) => Some((table.as_str(), collection.as_str())),
            _ => None,
        }
    }

    pub fn is_importable(&self) -> bool {
        self.import_target().is_some()
    }
}

/// Parse a `key=value` parameter, splitting at the first `=`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Replace every literal occurrence of each key with its value, in order.
///
/// This is a plain substring replace on the raw document, not templating.
pub fn substitute_params(raw: &str, params: &[(String, String)]) -> String {
    let mut text = raw.to_string();
    for (name, value) in params {
        info!("Replace {} with {}", name, value);
        text = text.replace(name.as_str(), value);
    }
    text
}

impl PipelineConfig {
    /// Load a configuration file, applying parameters before parsing
    pub fn load<P: AsRef<Path>>(path: P, params: &[(String, String)]) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_with_params(&raw, params)
    }

    /// Parse a configuration from raw JSON text after substitution
    pub fn from_json_with_params(raw: &str, params: &[(String, String)]) -> Result<Self, ConfigError> {
        Self::from_json(&substitute_params(raw, params))
    }

    /// Parse a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }

        for (i, wait) in self.wait_for.iter().enumerate() {
            if wait.table_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "wait_for[{}] has an empty table_name",
                    i
                )));
            }
            if wait.partitions.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "wait_for[{}] ({}) has an empty partition",
                    i, wait.table_name
                )));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            if step.hive_script.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "steps[{}] has an empty hive_script",
                    i
                )));
            }
        }

        Ok(())
    }

    /// Steps that will be handed to the importer
    pub fn importable_steps(&self) -> impl Iterator<Item = &StepSpec> {
        self.steps.iter().filter(|s| s.is_importable())
    }
}
