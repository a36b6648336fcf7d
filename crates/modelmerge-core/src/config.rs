//! Configuration schema (modelmerge.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::conflict::{ConflictCode, Severity};

/// Severity threshold overrides for specific conflict codes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of conflict code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a conflict code, or default
    pub fn get_severity(&self, code: ConflictCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: ConflictCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Objects excluded from comparison
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IgnoreRules {
    /// Entity names to skip (glob patterns)
    #[serde(default)]
    pub entities: Vec<String>,

    /// Attributes to skip, as `Entity.Attribute` glob patterns
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl IgnoreRules {
    /// Check if a name matches any pattern in the list
    fn matches_pattern(name: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    /// Check if an entity is excluded
    pub fn is_entity_ignored(&self, entity: &str) -> bool {
        Self::matches_pattern(entity, &self.entities)
    }

    /// Check if an attribute (given by its qualified name) is excluded
    pub fn is_attribute_ignored(&self, qualified: &str) -> bool {
        Self::matches_pattern(qualified, &self.attributes)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.attributes.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Merge mode: exporting requires every difference to be resolved
    #[serde(default = "default_true")]
    pub merge_enabled: bool,

    /// Include domain references in attribute comparison
    #[serde(default = "default_true")]
    pub compare_domains: bool,

    /// Include relationships in entity comparison
    #[serde(default = "default_true")]
    pub compare_relationships: bool,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Ignore rules
    #[serde(default)]
    pub ignore: IgnoreRules,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            merge_enabled: true,
            compare_domains: true,
            compare_relationships: true,
            severity: SeverityThreshold::default(),
            ignore: IgnoreRules::default(),
        }
    }
}

impl CompareConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Disable merge mode
    pub fn without_merge(mut self) -> Self {
        self.merge_enabled = false;
        self
    }
}

/// Simple glob matching (supports a single `*`)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
