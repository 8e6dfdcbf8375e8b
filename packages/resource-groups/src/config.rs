//! Propagation configuration (YAML schema v1)
//!
//! ```yaml
//! version: 1
//! change_detection: size_only   # or: membership
//! log_item_diffs: true
//! ```

use crate::error::{ResourceGroupError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// How the patcher decides an item's tags changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDetection {
    /// Changed only when the tag count differs.
    ///
    /// Same-size sets with different members are treated as unchanged.
    #[default]
    SizeOnly,
    /// Changed whenever the sets differ
    Membership,
}

impl ChangeDetection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SizeOnly => "size_only",
            Self::Membership => "membership",
        }
    }
}

impl std::fmt::Display for ChangeDetection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropagationConfig {
    /// Schema version (always 1 for v1)
    pub version: u32,

    #[serde(default)]
    pub change_detection: ChangeDetection,

    /// Emit a debug event per patched item with its tag diff
    #[serde(default = "default_true")]
    pub log_item_diffs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            version: 1,
            change_detection: ChangeDetection::default(),
            log_item_diffs: true,
        }
    }
}

impl PropagationConfig {
    pub fn with_change_detection(mut self, change_detection: ChangeDetection) -> Self {
        self.change_detection = change_detection;
        self
    }

    pub fn with_item_diffs(mut self, enabled: bool) -> Self {
        self.log_item_diffs = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(ResourceGroupError::config(format!(
                "Unsupported configuration version {}. Supported versions: {:?}",
                self.version, SUPPORTED_VERSIONS
            )));
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
