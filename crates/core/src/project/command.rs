//! Command configuration shared by tasks, functions and task groups

use super::Project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Command type for commands that run tests
pub const TEST_COMMAND_TYPE: &str = "test";
/// Command type for infrastructure commands
pub const SYSTEM_COMMAND_TYPE: &str = "system";
/// Command type for setup commands
pub const SETUP_COMMAND_TYPE: &str = "setup";

/// Command type used when neither the command nor the project sets one.
///
/// It separates setup-related commands from the actual testing commands.
pub const DEFAULT_COMMAND_TYPE: &str = TEST_COMMAND_TYPE;

/// Name of the command that generates new tasks at runtime
pub const GENERATE_TASKS_COMMAND: &str = "generate.tasks";

/// A single command invocation, either a plugin command or a function call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CommandConf {
    /// Name of a project function to call instead of a command
    #[serde(default, rename = "func", skip_serializing_if = "String::is_empty")]
    pub function: String,

    /// Command type (`test`, `system` or `setup`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub command_type: Option<String>,

    /// Human readable description of what the command does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Plugin command identifier, e.g. `shell.exec`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    /// Variants this command runs on; empty means every variant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,

    /// Maximum duration of the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Command-specific parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,

    /// Variables available to the command
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
}

impl CommandConf {
    /// Create a plugin command
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Create a call to a project function
    pub fn function(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            ..Self::default()
        }
    }

    /// Whether the command should run on the given variant
    pub fn runs_on_variant(&self, variant: &str) -> bool {
        self.variants.is_empty() || self.variants.iter().any(|v| v == variant)
    }

    /// Display name of the command, falling back to the command identifier
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.command)
    }

    /// Effective command type.
    ///
    /// An explicit type wins, then the project's default, then
    /// [`DEFAULT_COMMAND_TYPE`].
    pub fn command_type<'a>(&'a self, project: &'a Project) -> &'a str {
        self.command_type
            .as_deref()
            .or(project.command_type.as_deref())
            .unwrap_or(DEFAULT_COMMAND_TYPE)
    }

    fn is_empty(&self) -> bool {
        self.command.is_empty() && self.function.is_empty()
    }
}

/// A command set as written in configuration: one command or a list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommandSet {
    /// A list of commands
    Multi(Vec<CommandConf>),
    /// A single command
    Single(CommandConf),
}

impl CommandSet {
    /// The commands in this set.
    ///
    /// A single command that names neither a command nor a function yields
    /// an empty list.
    pub fn list(&self) -> &[CommandConf] {
        match self {
            Self::Multi(commands) => commands,
            Self::Single(command) if command.is_empty() => &[],
            Self::Single(command) => std::slice::from_ref(command),
        }
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::Multi(Vec::new())
    }
}
