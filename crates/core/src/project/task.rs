//! Canonical task definitions, task groups and their dependency edges

use super::command::{CommandConf, CommandSet};
use serde::{Deserialize, Deserializer, Serialize};

/// A task or task group that must finish before the holder can run
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct TaskUnitDependency {
    /// Task or task group name; `*` selects every task on the variant
    pub name: String,
    /// Variant of the dependency; unset means the holder's variant, `*` every variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Required finishing status of the dependency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// When set, patches do not pull the dependency in automatically
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub patch_optional: bool,
}

impl TaskUnitDependency {
    /// Dependency on a task in the holder's own variant
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Dependency on a task in another variant
    pub fn on_variant(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Some(variant.into()),
            ..Self::default()
        }
    }
}

// Dependencies may be written as a bare task name or as a full mapping.
impl<'de> Deserialize<'de> for TaskUnitDependency {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DependencyHelper {
            name: String,
            #[serde(default)]
            variant: Option<String>,
            #[serde(default)]
            status: Option<String>,
            #[serde(default)]
            patch_optional: bool,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Selector(String),
            Full(DependencyHelper),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Selector(name) => Self::new(name),
            Repr::Full(helper) => Self {
                name: helper.name,
                variant: helper.variant,
                status: helper.status,
                patch_optional: helper.patch_optional,
            },
        })
    }
}

/// A task that must be part of any patch containing the holder.
///
/// Only consulted when configuring patches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskUnitRequirement {
    /// Required task name
    pub name: String,
    /// Variant of the required task; unset means the holder's variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Canonical definition of a task, from the project's `tasks` list.
///
/// Variant references inherit unset settings from here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectTask {
    /// Task name, unique within the project
    pub name: String,
    /// Scheduling priority, higher runs first
    #[serde(default)]
    pub priority: i64,
    /// Unset falls back to the project default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_timeout_secs: Option<u64>,
    /// Tasks that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<TaskUnitDependency>,
    /// Tasks that must be selected alongside this one in patches
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<TaskUnitRequirement>,
    /// Commands the task runs
    #[serde(default)]
    pub commands: Vec<CommandConf>,
    /// Tags used by aliases and selectors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Unset means patchable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patchable: Option<bool>,
    /// Unset defers to the variant and project settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepback: Option<bool>,
}

impl ProjectTask {
    /// Create a task with the given name and no settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the task may run in patches.
    ///
    /// Only an explicit `patchable: false` opts out.
    pub fn is_patchable(&self) -> bool {
        self.patchable != Some(false)
    }

    /// Whether the task carries any of the given tags
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Tasks that share a host and its setup/teardown lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskGroup {
    /// Group name, unique among tasks and groups
    pub name: String,

    /// Number of hosts the group may use, 0 meaning one
    #[serde(default)]
    pub max_hosts: u32,
    /// Run once before the first member task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_group: Option<CommandSet>,
    /// Run once after the last member task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown_group: Option<CommandSet>,
    /// Run before each member task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_task: Option<CommandSet>,
    /// Run after each member task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown_task: Option<CommandSet>,
    /// Run when a member task times out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<CommandSet>,
    /// Member task names, in execution order
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Tags shared by every member task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Keep processes alive between member tasks
    #[serde(default, rename = "share_processes")]
    pub share_procs: bool,
}

impl TaskGroup {
    /// Whether the group lists the given task
    pub fn contains(&self, task: &str) -> bool {
        self.tasks.iter().any(|t| t == task)
    }
}
