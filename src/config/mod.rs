//! Configuration loading and management

use crate::core::error::{ConfigError, GuardResult};
use crate::core::options::{self, OptionsOverride, Section, SectionOptions, ValidationOptions};
use serde::{Deserialize, Serialize};

/// Default cap on request bodies read by the request middleware (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Application-wide defaults for every validator
///
/// ```yaml
/// defaults:
///   abortEarly: false
/// query:
///   allowUnknown: false
/// body_limit: 1048576
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Global defaults, applied before any section default
    #[serde(default)]
    pub defaults: ValidationOptions,

    /// Per-section defaults (`query`, `params`, `body`, `response`)
    #[serde(flatten)]
    pub sections: SectionOptions,

    /// Maximum request body size, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            defaults: ValidationOptions::default(),
            sections: SectionOptions::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> GuardResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let config = serde_yaml::from_str(&content).map_err(|e| ConfigError::malformed(Some(path), e))?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> GuardResult<Self> {
        let config = serde_yaml::from_str(yaml).map_err(|e| ConfigError::malformed(None, e))?;
        Ok(config)
    }

    /// Effective options for a section, given the route's own override
    pub fn options_for(
        &self,
        section: Section,
        route: Option<&OptionsOverride>,
    ) -> ValidationOptions {
        options::resolve(self.defaults, section, self.sections.get(section), route)
    }
}
