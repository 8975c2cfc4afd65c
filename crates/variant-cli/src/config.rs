//! CLI configuration, stored as RON

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How reports are printed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Ron,
}

/// Complete CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CliConfig {
    /// Reject variant sets with more than one default variant
    #[serde(default)]
    pub strict_defaults: bool,
    /// Report format
    #[serde(default)]
    pub output: OutputFormat,
}

impl CliConfig {
    /// Load configuration, falling back to defaults when the file is missing
    /// or unreadable
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::info!("No config file at {:?} ({}), using defaults", path, e);
                return Self::default();
            }
        };

        match Self::parse(&content) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }
}
