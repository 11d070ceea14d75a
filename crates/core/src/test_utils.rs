//! Shared test utilities for ciplan-core tests.
//!
//! Helpers for building small project fixtures without going through YAML.

use crate::project::{BuildVariant, BuildVariantTaskUnit, ProjectTask, TaskGroup};

/// Create a canonical task with no settings
pub fn project_task(name: &str) -> ProjectTask {
    ProjectTask::new(name)
}

/// Create a task group with the given members
pub fn group(name: &str, members: &[&str]) -> TaskGroup {
    TaskGroup {
        name: name.to_string(),
        tasks: members.iter().map(ToString::to_string).collect(),
        ..TaskGroup::default()
    }
}

/// Create a variant task reference with no overrides
pub fn unit(name: &str) -> BuildVariantTaskUnit {
    BuildVariantTaskUnit::new(name)
}

/// Create a variant whose display name equals its name
pub fn variant(name: &str, tasks: Vec<BuildVariantTaskUnit>) -> BuildVariant {
    BuildVariant {
        name: name.to_string(),
        display_name: name.to_string(),
        tasks,
        ..BuildVariant::default()
    }
}
