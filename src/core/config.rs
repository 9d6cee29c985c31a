//! Configuration for repo-guard
//!
//! Loaded from YAML. Lookup order: an explicit file, then `./.repo-guard.yaml`,
//! then defaults. CLI flags override what is loaded here.

use crate::core::error::GuardError;
use crate::security::scrubber::SecretScrubber;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name looked up in the current directory
pub const CONFIG_FILENAME: &str = ".repo-guard.yaml";

/// Root configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GuardConfig {
    /// Default trusted base directory for `resolve` and `audit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// Fallback tracing filter when `RUST_LOG` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Scrubber settings
    #[serde(default)]
    pub scrubber: ScrubberConfig,
}

/// Scrubber settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScrubberConfig {
    /// Credential scheme labels in addition to the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_labels: Vec<String>,
}

impl GuardConfig {
    /// Load configuration
    ///
    /// With `explicit`, that file must exist. Without it, `dir/.repo-guard.yaml`
    /// is used if present and defaults otherwise.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, GuardError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let implicit = dir.join(CONFIG_FILENAME);
                if implicit.is_file() {
                    Self::from_file(&implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate a YAML file
    pub fn from_file(path: &Path) -> Result<Self, GuardError> {
        let content = fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            GuardError::Config(message) => {
                GuardError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Parse and validate YAML text
    pub fn from_yaml(content: &str) -> Result<Self, GuardError> {
        // An empty or comment-only document is a valid, empty configuration.
        let has_content = content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#') && line != "---"
        });
        if !has_content {
            return Ok(Self::default());
        }

        let config: GuardConfig = serde_yaml::from_str(content)
            .map_err(|e| GuardError::Config(format!("failed to parse YAML config: {}", e)))?;
        config.scrubber()?;
        Ok(config)
    }

    /// Build the scrubber these settings describe
    pub fn scrubber(&self) -> Result<SecretScrubber, GuardError> {
        SecretScrubber::with_labels(&self.scrubber.extra_labels)
    }
}
