//! Label based recipe activation from changed file paths.

use kestrel_core::config::ActivationConfig;
use kestrel_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Labels eligible for an event's changed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationMatch {
    /// Matched labels, sorted.
    pub labels: Vec<String>,
    /// Every matched label covered every changed file and none is additive.
    pub matched_all: bool,
}

impl ActivationMatch {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug)]
struct LabelPattern {
    label: String,
    regex: Regex,
    additive: bool,
}

/// Matcher built once from an [`ActivationConfig`].
#[derive(Debug)]
pub struct ActivationMatcher {
    patterns: Vec<LabelPattern>,
}

impl ActivationMatcher {
    /// Compile the configured patterns. Each pattern is anchored at the
    /// start of the path.
    pub fn new(config: &ActivationConfig) -> Result<Self> {
        let patterns = config
            .label_patterns
            .iter()
            .map(|(label, pattern)| {
                let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                    Error::InvalidConfig(format!("activation pattern for {label}: {e}"))
                })?;
                Ok(LabelPattern {
                    label: label.clone(),
                    regex,
                    additive: config.is_additive(label),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Labels whose pattern matches at least one of `changed_files`.
    pub fn match_files<S: AsRef<str>>(&self, changed_files: &[S]) -> ActivationMatch {
        let mut labels = Vec::new();
        let mut matched_all = true;

        // Config labels come from a BTreeMap, so they are already sorted.
        for pattern in &self.patterns {
            let count = changed_files
                .iter()
                .filter(|f| pattern.regex.is_match(f.as_ref()))
                .count();
            if count == 0 {
                continue;
            }
            if count != changed_files.len() || pattern.additive {
                matched_all = false;
            }
            labels.push(pattern.label.clone());
        }

        debug!(
            files = changed_files.len(),
            labels = ?labels,
            matched_all,
            "Matched activation labels"
        );

        ActivationMatch {
            labels,
            matched_all,
        }
    }
}
