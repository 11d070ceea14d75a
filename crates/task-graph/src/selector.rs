//! Turning selection requests into pairs

use crate::pairs::{TVPair, TVPairSet};
use ciplan_core::project::Project;
use tracing::debug;

/// Selector that stands for every variant or every task
pub const ALL: &str = "all";

fn is_wildcard(names: &[String]) -> bool {
    matches!(names, [only] if only == ALL)
}

/// Expand `["all"]` into every enabled variant in project order.
///
/// Any other list is returned unchanged.
pub fn expand_variant_wildcard(project: &Project, variants: &[String]) -> Vec<String> {
    if !is_wildcard(variants) {
        return variants.to_vec();
    }
    project
        .build_variants
        .iter()
        .filter(|bv| bv.is_enabled())
        .map(|bv| bv.name.clone())
        .collect()
}

/// Expand `["all"]` into every task not explicitly marked unpatchable.
///
/// Only the project-level `patchable` field is consulted here. Variant
/// overrides are applied later by [`select_pairs`] on the merged unit.
/// Any other list is returned unchanged.
pub fn expand_task_wildcard(project: &Project, tasks: &[String]) -> Vec<String> {
    if !is_wildcard(tasks) {
        return tasks.to_vec();
    }
    project
        .tasks
        .iter()
        .filter(|t| t.is_patchable())
        .map(|t| t.name.clone())
        .collect()
}

/// Cross product of `variants` and `tasks`, keeping the pairs whose task
/// runs on the variant.
///
/// With `is_patch` set, pairs whose merged unit is not patchable are
/// dropped too. Names that match nothing contribute no pairs.
pub fn select_pairs(
    project: &Project,
    variants: &[String],
    tasks: &[String],
    is_patch: bool,
) -> TVPairSet {
    let mut pairs = TVPairSet::new();
    for variant in variants {
        for task in tasks {
            match project.find_task_for_variant(task, variant) {
                Some(unit) if is_patch && !unit.is_patchable() => {
                    debug!(variant = %variant, task = %task, "Skipping unpatchable task");
                }
                Some(_) => pairs.push(TVPair::new(variant.as_str(), task.as_str())),
                None => {}
            }
        }
    }
    pairs
}
