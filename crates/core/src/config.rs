//! Resolver settings
//!
//! Every field is optional in the document; accessors supply the defaults.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Settings controlling how a project is resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Validate the project before resolving it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_project: Option<bool>,

    /// Follow `requires` edges when closing patch selections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_requires: Option<bool>,

    /// Accept display tasks that list other display tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_nested_display_tasks: Option<bool>,
}

impl ResolverConfig {
    /// Parse settings from a TOML document
    pub fn from_toml_str(document: &str) -> Result<Self> {
        Ok(toml::from_str(document)?)
    }

    /// Whether to validate the project first (default: true)
    pub fn validate_project(&self) -> bool {
        self.validate_project.unwrap_or(true)
    }

    /// Whether to follow `requires` edges in patches (default: true)
    pub fn follow_requires(&self) -> bool {
        self.follow_requires.unwrap_or(true)
    }

    /// Whether nested display tasks pass validation (default: false)
    pub fn allow_nested_display_tasks(&self) -> bool {
        self.allow_nested_display_tasks.unwrap_or(false)
    }
}
