//! Deterministic task identifiers
//!
//! An ID is `<project>_<variant>_<task>_<revision>_<created>`, with `-` and
//! spaces replaced by `_`. Patch versions use `patch_<revision>_<version id>`
//! as the revision so their IDs never collide with mainline ones. Names that
//! still render to the same ID within one version are reported as
//! [`Error::DuplicateTaskId`].

use crate::pairs::{TVPair, TVPairSet, TaskVariantPairs};
use ciplan_core::context::VersionContext;
use ciplan_core::project::{BuildVariant, Project};
use ciplan_core::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Prefix applied to display task names before hashing them into an ID
pub const DISPLAY_TASK_PREFIX: &str = "display_";

/// Generated IDs keyed by pair, iterated in pair order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskIdTable(BTreeMap<TVPair, String>);

impl TaskIdTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the ID for a task on a variant
    pub fn add_id(&mut self, variant: &str, task_name: &str, id: impl Into<String>) {
        self.0.insert(TVPair::new(variant, task_name), id.into());
    }

    /// ID for a task on a variant, if one was generated
    pub fn get_id(&self, variant: &str, task_name: &str) -> Option<&str> {
        self.0
            .get(&TVPair::new(variant, task_name))
            .map(String::as_str)
    }

    /// IDs of `task_name` on every variant
    pub fn ids_for_all_variants(&self, task_name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(pair, _)| pair.task_name == task_name)
            .map(|(_, id)| id.as_str())
            .collect()
    }

    /// IDs of `task_name` on every variant except the excluded pair
    pub fn ids_for_all_variants_excluding(&self, task_name: &str, exclude: &TVPair) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(pair, _)| pair.task_name == task_name && *pair != exclude)
            .map(|(_, id)| id.as_str())
            .collect()
    }

    /// Every ID in the table except the one for `task_name` on
    /// `current_variant`
    pub fn ids_for_all_tasks(&self, current_variant: &str, task_name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(pair, _)| !(pair.variant == current_variant && pair.task_name == task_name))
            .map(|(_, id)| id.as_str())
            .collect()
    }

    /// Number of IDs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate pairs and IDs in pair order
    pub fn iter(&self) -> impl Iterator<Item = (&TVPair, &str)> {
        self.0.iter().map(|(pair, id)| (pair, id.as_str()))
    }
}

/// Execution and display task ID tables for one version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskIdConfig {
    /// IDs of execution tasks
    pub execution_tasks: TaskIdTable,
    /// IDs of display tasks
    pub display_tasks: TaskIdTable,
}

impl TaskIdConfig {
    /// Check that no ID is shared by two pairs across both tables.
    ///
    /// Every collision is reported, not only the first.
    pub fn ensure_unique(&self) -> Result<()> {
        let mut seen: HashMap<&str, &TVPair> = HashMap::new();
        let mut errors = Vec::new();
        for (pair, id) in self.execution_tasks.iter().chain(self.display_tasks.iter()) {
            if let Some(first) = seen.insert(id, pair) {
                errors.push(Error::duplicate_task_id(id, first.to_string(), pair.to_string()));
            }
        }
        Error::from_accumulated(errors)
    }
}

/// Replace `-` and spaces with `_`
pub fn clean_name(name: &str) -> String {
    name.replace(['-', ' '], "_")
}

/// Revision component of IDs for a version
pub fn id_revision(version: &VersionContext) -> String {
    if version.is_patch() {
        format!("patch_{}_{}", version.revision, version.id)
    } else {
        version.revision.clone()
    }
}

/// ID for `name` on `variant`
pub fn generate_id(project: &Project, variant: &str, name: &str, version: &VersionContext) -> String {
    clean_name(&format!(
        "{}_{}_{}_{}_{}",
        project.identifier,
        variant,
        name,
        id_revision(version),
        version.formatted_create_time()
    ))
}

fn display_id(project: &Project, variant: &str, name: &str, version: &VersionContext) -> String {
    generate_id(project, variant, &format!("{DISPLAY_TASK_PREFIX}{name}"), version)
}

/// IDs for every task, task-group member and display task of every variant.
///
/// Variants are visited in display-name order. Fails when two pairs render
/// to the same ID.
pub fn new_task_id_table(project: &Project, version: &VersionContext) -> Result<TaskIdConfig> {
    let mut config = TaskIdConfig::default();

    for bv in project.build_variants.sorted_by_display_name() {
        for unit in &bv.tasks {
            if let Some(tg) = project.find_task_group(&unit.name) {
                for member in &tg.tasks {
                    let id = generate_id(project, &bv.name, member, version);
                    config.execution_tasks.add_id(&bv.name, member, id);
                }
            } else {
                let id = generate_id(project, &bv.name, &unit.name, version);
                config.execution_tasks.add_id(&bv.name, &unit.name, id);
            }
        }

        for dt in &bv.display_tasks {
            let id = display_id(project, &bv.name, &dt.name, version);
            config.display_tasks.add_id(&bv.name, &dt.name, id);
        }
    }

    config.ensure_unique()?;
    Ok(config)
}

/// IDs for the selected pairs of a patch only.
///
/// Task-group names among the execution pairs are expanded into their
/// members first. IDs are generated only for tasks both defined on the
/// variant and requested; pairs on unknown variants get no ID. Fails when
/// two pairs render to the same ID.
pub fn new_patch_task_id_table(
    project: &Project,
    version: &VersionContext,
    pairs: &TaskVariantPairs,
) -> Result<TaskIdConfig> {
    let mut exec_pairs = TVPairSet::new();
    for pair in &pairs.exec_tasks {
        if let Some(tg) = project.find_task_group(&pair.task_name) {
            for member in &tg.tasks {
                exec_pairs.push(TVPair::new(pair.variant.as_str(), member.as_str()));
            }
        } else {
            exec_pairs.push(pair.clone());
        }
    }

    let mut config = TaskIdConfig::default();
    for variant in exec_pairs.variants() {
        let Some(bv) = project.find_build_variant(variant) else {
            debug!(variant, "Skipping IDs for unknown variant");
            continue;
        };
        add_patch_exec_ids(project, version, bv, &exec_pairs, &mut config.execution_tasks);
    }
    for variant in pairs.display_tasks.variants() {
        let Some(bv) = project.find_build_variant(variant) else {
            debug!(variant, "Skipping display IDs for unknown variant");
            continue;
        };
        let requested: HashSet<&str> = pairs.display_tasks.task_names(variant).into_iter().collect();
        for dt in &bv.display_tasks {
            if requested.contains(dt.name.as_str()) {
                let id = display_id(project, &bv.name, &dt.name, version);
                config.display_tasks.add_id(&bv.name, &dt.name, id);
            }
        }
    }
    config.ensure_unique()?;
    Ok(config)
}

fn add_patch_exec_ids(
    project: &Project,
    version: &VersionContext,
    bv: &BuildVariant,
    exec_pairs: &TVPairSet,
    table: &mut TaskIdTable,
) {
    let requested: HashSet<&str> = exec_pairs.task_names(&bv.name).into_iter().collect();
    for unit in &bv.tasks {
        if let Some(tg) = project.find_task_group(&unit.name) {
            for member in tg.tasks.iter().filter(|m| requested.contains(m.as_str())) {
                table.add_id(&bv.name, member, generate_id(project, &bv.name, member, version));
            }
        } else if requested.contains(unit.name.as_str()) {
            table.add_id(&bv.name, &unit.name, generate_id(project, &bv.name, &unit.name, version));
        }
    }
}
