//! Server configuration.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration consumed by the orchestration core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KestrelConfig {
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Label based recipe activation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Label to regular expression matched against the start of each changed path.
    #[serde(default)]
    pub label_patterns: BTreeMap<String, String>,
    /// Labels that add recipes on top of the default set instead of replacing it.
    #[serde(default)]
    pub additive_labels: Vec<String>,
}

impl ActivationConfig {
    pub fn with_label(mut self, label: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.label_patterns.insert(label.into(), pattern.into());
        self
    }

    pub fn with_additive_label(mut self, label: impl Into<String>, pattern: impl Into<String>) -> Self {
        let label = label.into();
        self.additive_labels.push(label.clone());
        self.with_label(label, pattern)
    }

    pub fn is_additive(&self, label: &str) -> bool {
        self.additive_labels.iter().any(|l| l == label)
    }
}

/// Remote status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Public base URL of the server, used to build job links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Label put on pull requests whose event passed with allowed failures.
    #[serde(default)]
    pub failed_but_allowed_label: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            failed_but_allowed_label: None,
        }
    }
}

impl KestrelConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
