//! Project model and structural lookups
//!
//! A [`Project`] is one resolved configuration snapshot: the canonical task
//! catalog, task groups, build variants and everything they reference. The
//! lookups here never mutate the project. [`Project::find_task_for_variant`]
//! returns a merged *copy* of the variant's task reference.

mod command;
mod module;
mod task;
mod validation;
mod variant;

pub use command::{
    CommandConf, CommandSet, DEFAULT_COMMAND_TYPE, GENERATE_TASKS_COMMAND, SETUP_COMMAND_TYPE,
    SYSTEM_COMMAND_TYPE, TEST_COMMAND_TYPE,
};
pub use module::Module;
pub use task::{ProjectTask, TaskGroup, TaskUnitDependency, TaskUnitRequirement};
pub use validation::{ProjectValidator, ValidationError};
pub use variant::{BuildVariant, BuildVariantTaskUnit, BuildVariants, DisplayTask};

use crate::context::TaskRecord;
use crate::{EntityKind, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Root of a project configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Project {
    /// Whether the project is tracked
    #[serde(default)]
    pub enabled: bool,
    /// Re-run earlier commits when a task fails
    #[serde(default)]
    pub stepback: bool,
    /// Minutes between scheduled builds
    #[serde(default, rename = "batchtime")]
    pub batch_time: u32,
    /// Repository owner
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    /// Tracked branch
    #[serde(default)]
    pub branch: String,
    /// Project identifier, set by the loader
    #[serde(default)]
    pub identifier: String,
    /// Human-readable project name
    #[serde(default)]
    pub display_name: String,
    /// Default type for commands that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_type: Option<String>,
    /// Path patterns whose changes do not trigger builds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
    /// Commands run before every task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<CommandSet>,
    /// Commands run after every task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<CommandSet>,
    /// Commands run when a task times out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<CommandSet>,
    /// Timeout for the timeout handler commands
    #[serde(default)]
    pub callback_timeout_secs: u64,
    /// External repositories checked out alongside the project
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,
    /// Build variants, in declaration order
    #[serde(default, rename = "buildvariants")]
    pub build_variants: BuildVariants,
    /// Named reusable command sequences
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub functions: BTreeMap<String, CommandSet>,
    /// Named clusters of tasks sharing hosts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_groups: Vec<TaskGroup>,
    /// Canonical task catalog
    #[serde(default)]
    pub tasks: Vec<ProjectTask>,
    /// Default execution timeout for tasks
    #[serde(default)]
    pub exec_timeout_secs: u64,
}

impl Project {
    /// Create an empty project with the given identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Build variant with the given name
    pub fn find_build_variant(&self, name: &str) -> Option<&BuildVariant> {
        self.build_variants.iter().find(|bv| bv.name == name)
    }

    /// Canonical task with the given name
    pub fn find_project_task(&self, name: &str) -> Option<&ProjectTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Task group with the given name
    pub fn find_task_group(&self, name: &str) -> Option<&TaskGroup> {
        self.task_groups.iter().find(|tg| tg.name == name)
    }

    /// Whether `name` refers to a task group
    pub fn is_task_group(&self, name: &str) -> bool {
        self.find_task_group(name).is_some()
    }

    /// Module with the given name
    pub fn module_by_name(&self, name: &str) -> Result<&Module> {
        self.modules
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::not_found(EntityKind::Module, name))
    }

    /// Canonical task with the given name, or an empty task when missing
    pub fn spec_for_task(&self, name: &str) -> ProjectTask {
        self.find_project_task(name).cloned().unwrap_or_default()
    }

    /// Resolve `task` as it runs on `variant`.
    ///
    /// The variant may list the task directly or through a task group. The
    /// returned unit is a copy of the variant's reference, merged with the
    /// canonical task definition. Group references come back with
    /// `is_group` and `group_name` set and `name` set to the member task.
    ///
    /// Returns `None` when the variant does not exist, does not carry the
    /// task, or the task has no canonical definition.
    pub fn find_task_for_variant(&self, task: &str, variant: &str) -> Option<BuildVariantTaskUnit> {
        let bv = self.find_build_variant(variant)?;
        let project_task = self.find_project_task(task)?;

        for unit in &bv.tasks {
            if unit.name == task {
                let mut merged = unit.clone();
                merged.populate(project_task);
                return Some(merged);
            }
            if let Some(tg) = self.find_task_group(&unit.name)
                && tg.contains(task)
            {
                let mut merged = unit.clone();
                merged.name = task.to_string();
                merged.is_group = true;
                merged.group_name = Some(tg.name.clone());
                merged.populate(project_task);
                return Some(merged);
            }
        }
        None
    }

    /// Names of the task references listed on a variant, groups unexpanded
    pub fn find_tasks_for_variant(&self, variant: &str) -> Option<Vec<&str>> {
        self.find_build_variant(variant)
            .map(|bv| bv.tasks.iter().map(|t| t.name.as_str()).collect())
    }

    /// Names of every task that runs on a variant, with groups expanded
    /// into their members, in variant order.
    pub fn expanded_tasks_for_variant(&self, variant: &str) -> Vec<&str> {
        let Some(bv) = self.find_build_variant(variant) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = Vec::new();
        for unit in &bv.tasks {
            let members: Vec<&str> = match self.find_task_group(&unit.name) {
                Some(tg) => tg.tasks.iter().map(String::as_str).collect(),
                None => vec![unit.name.as_str()],
            };
            for name in members {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Names of all build variants, in project order
    pub fn find_all_variants(&self) -> Vec<&str> {
        self.build_variants.iter().map(|bv| bv.name.as_str()).collect()
    }

    /// Every direct task reference of every variant, merged with its
    /// canonical definition. References without one are skipped.
    pub fn find_all_build_variant_tasks(&self) -> Vec<BuildVariantTaskUnit> {
        let by_name: BTreeMap<&str, &ProjectTask> =
            self.tasks.iter().map(|t| (t.name.as_str(), t)).collect();

        self.build_variants
            .iter()
            .flat_map(|bv| bv.tasks.iter())
            .filter_map(|unit| {
                by_name.get(unit.name.as_str()).map(|task| {
                    let mut merged = unit.clone();
                    merged.populate(task);
                    merged
                })
            })
            .collect()
    }

    /// Variants that list `task` directly
    pub fn find_variants_with_task(&self, task: &str) -> Vec<&str> {
        self.build_variants
            .iter()
            .filter(|bv| bv.tasks.iter().any(|t| t.name == task))
            .map(|bv| bv.name.as_str())
            .collect()
    }

    /// Variants that contain `task` as a task, a task-group member, a
    /// display task or a display-task member. Sorted by name.
    pub fn variants_with_task(&self, task: &str) -> Vec<String> {
        let mut variants = BTreeSet::new();
        for bv in &self.build_variants {
            let in_tasks = bv.tasks.iter().any(|unit| {
                unit.name == task
                    || self
                        .find_task_group(&unit.name)
                        .is_some_and(|tg| tg.contains(task))
            });
            let in_display = bv
                .display_tasks
                .iter()
                .any(|dt| dt.name == task || dt.contains(task));
            if in_tasks || in_display {
                variants.insert(bv.name.clone());
            }
        }
        variants.into_iter().collect()
    }

    /// Variant name to display name
    pub fn variant_mappings(&self) -> BTreeMap<String, String> {
        self.build_variants
            .iter()
            .map(|bv| (bv.name.clone(), bv.display_name.clone()))
            .collect()
    }

    /// How many times each task invokes `command`, directly or through a
    /// function. Tasks that never do are absent from the map.
    pub fn tasks_that_call_command(&self, command: &str) -> BTreeMap<String, usize> {
        let functions: BTreeMap<&str, usize> = self
            .functions
            .iter()
            .filter_map(|(name, set)| {
                let calls = set.list().iter().filter(|c| c.command == command).count();
                (calls > 0).then_some((name.as_str(), calls))
            })
            .collect();

        let mut tasks = BTreeMap::new();
        for task in &self.tasks {
            let mut calls = 0;
            for cmd in &task.commands {
                if !cmd.function.is_empty()
                    && let Some(times) = functions.get(cmd.function.as_str())
                {
                    calls += times;
                }
                if cmd.command == command {
                    calls += 1;
                }
            }
            if calls > 0 {
                tasks.insert(task.name.clone(), calls);
            }
        }
        tasks
    }

    /// Whether the task generates other tasks at runtime
    pub fn is_generate_task(&self, task: &str) -> bool {
        self.tasks_that_call_command(GENERATE_TASKS_COMMAND)
            .contains_key(task)
    }

    /// Distro a running task should be scheduled on: the task reference's
    /// first distro, else the variant's first `run_on` distro.
    pub fn find_distro_name_for_task(&self, task: &TaskRecord) -> Result<String> {
        let bv = self.build_variants.get(&task.build_variant)?;
        let unit = bv.get(&task.display_name)?;

        unit.distros
            .first()
            .or_else(|| bv.run_on.first())
            .cloned()
            .ok_or_else(|| Error::configuration(format!("cannot find the distro for {}", task.id)))
    }

    /// Validate the structure of the project.
    ///
    /// Nested display tasks are rejected unless `allow_nested_display_tasks`
    /// is set.
    pub fn validate(&self, allow_nested_display_tasks: bool) -> Result<()> {
        ProjectValidator::new(self)
            .allow_nested_display_tasks(allow_nested_display_tasks)
            .validate()
            .map_err(|problems| Error::Validation { problems })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{group, project_task, unit, variant};

    fn sample() -> Project {
        let mut project = Project::new("sample");
        project.tasks = vec![
            project_task("compile"),
            ProjectTask {
                priority: 5,
                ..project_task("test")
            },
            project_task("lint"),
        ];
        project.task_groups = vec![group("checks", &["lint", "test"])];
        project.build_variants = BuildVariants(vec![
            variant("linux", vec![unit("compile"), unit("test")]),
            variant("windows", vec![unit("compile"), unit("checks")]),
        ]);
        project
    }

    #[test]
    fn test_find_task_for_variant_direct() {
        let project = sample();
        let found = project.find_task_for_variant("test", "linux").unwrap();
        assert_eq!(found.name, "test");
        assert_eq!(found.priority, Some(5));
        assert!(!found.is_group);
    }

    #[test]
    fn test_find_task_for_variant_through_group() {
        let project = sample();
        let found = project.find_task_for_variant("lint", "windows").unwrap();
        assert_eq!(found.name, "lint");
        assert!(found.is_group);
        assert_eq!(found.group_name.as_deref(), Some("checks"));
    }

    #[test]
    fn test_find_task_for_variant_not_found() {
        let project = sample();
        assert!(project.find_task_for_variant("lint", "linux").is_none());
        assert!(project.find_task_for_variant("compile", "macos").is_none());
        assert!(project.find_task_for_variant("nope", "linux").is_none());
    }

    #[test]
    fn test_find_task_for_variant_group_member_without_definition() {
        let mut project = sample();
        project.task_groups[0].tasks.push("ghost".to_string());
        assert!(project.find_task_for_variant("ghost", "windows").is_none());
    }

    #[test]
    fn test_find_task_for_variant_leaves_project_untouched() {
        let project = sample();
        let before = project.clone();
        let _ = project.find_task_for_variant("test", "linux");
        assert_eq!(project, before);
    }

    #[test]
    fn test_expanded_tasks_for_variant() {
        let project = sample();
        assert_eq!(
            project.expanded_tasks_for_variant("windows"),
            vec!["compile", "lint", "test"]
        );
        assert!(project.expanded_tasks_for_variant("macos").is_empty());
    }

    #[test]
    fn test_variants_with_task_includes_groups() {
        let project = sample();
        assert_eq!(project.variants_with_task("lint"), vec!["windows"]);
        assert_eq!(project.variants_with_task("test"), vec!["linux", "windows"]);
        assert_eq!(project.find_variants_with_task("test"), vec!["linux"]);
    }

    #[test]
    fn test_module_by_name() {
        let mut project = sample();
        project.modules.push(Module {
            name: "enterprise".to_string(),
            ..Module::default()
        });
        assert!(project.module_by_name("enterprise").is_ok());
        assert!(matches!(
            project.module_by_name("community"),
            Err(Error::NotFound {
                kind: EntityKind::Module,
                ..
            })
        ));
    }

    #[test]
    fn test_spec_for_task_defaults() {
        let project = sample();
        assert_eq!(project.spec_for_task("test").priority, 5);
        assert_eq!(project.spec_for_task("missing"), ProjectTask::default());
    }

    #[test]
    fn test_tasks_that_call_command() {
        let mut project = sample();
        project.functions.insert(
            "generate".to_string(),
            CommandSet::Multi(vec![CommandConf::command(GENERATE_TASKS_COMMAND)]),
        );
        project.tasks[0].commands = vec![
            CommandConf::function("generate"),
            CommandConf::command(GENERATE_TASKS_COMMAND),
        ];
        project.tasks[2].commands = vec![CommandConf::command("shell.exec")];

        let calls = project.tasks_that_call_command(GENERATE_TASKS_COMMAND);
        assert_eq!(calls.get("compile"), Some(&2));
        assert!(!calls.contains_key("lint"));
        assert!(project.is_generate_task("compile"));
        assert!(!project.is_generate_task("lint"));
    }

    #[test]
    fn test_find_distro_name_for_task() {
        let mut project = sample();
        project.build_variants[0].run_on = vec!["ubuntu1604-test".to_string()];
        project.build_variants[0].tasks[1].distros = vec!["ubuntu1604-large".to_string()];

        let mut record = TaskRecord {
            id: "t1".to_string(),
            build_variant: "linux".to_string(),
            display_name: "test".to_string(),
            ..TaskRecord::default()
        };
        assert_eq!(project.find_distro_name_for_task(&record).unwrap(), "ubuntu1604-large");

        record.display_name = "compile".to_string();
        assert_eq!(project.find_distro_name_for_task(&record).unwrap(), "ubuntu1604-test");

        record.build_variant = "windows".to_string();
        assert!(project.find_distro_name_for_task(&record).is_err());
    }
}
