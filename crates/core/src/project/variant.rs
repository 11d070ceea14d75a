//! Build variants and the task references they carry

use super::task::{ProjectTask, TaskUnitDependency, TaskUnitRequirement};
use crate::{EntityKind, Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// A reference to a task or task group from a build variant's `tasks` list.
///
/// Every override is optional: `None` means "inherit from the project task",
/// while `Some` (including `Some(false)`, `Some(0)` and `Some(vec![])`) is an
/// explicit setting that [`BuildVariantTaskUnit::populate`] never replaces.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct BuildVariantTaskUnit {
    /// Name of a project task or task group
    pub name: String,
    /// Set when the unit refers to a task group
    #[serde(skip)]
    pub is_group: bool,
    /// Name of the task group this unit belongs to, if any
    #[serde(skip)]
    pub group_name: Option<String>,

    /// `Some(false)` keeps the task out of patches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patchable: Option<bool>,
    /// Scheduling priority on this variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Replaces the task dependencies when set, even with an empty list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<TaskUnitDependency>>,
    /// Tasks required alongside this one on this variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<TaskUnitRequirement>>,

    /// Distros the task can run on, ahead of the variant's `run_on`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distros: Vec<String>,

    /// Execution timeout on this variant, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_timeout_secs: Option<u64>,
    /// Stepback setting on this variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepback: Option<bool>,
}

impl BuildVariantTaskUnit {
    /// Create a reference with no overrides
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fill every unset override from the canonical task definition.
    ///
    /// The name and commands are never touched. Calling this again with the
    /// same task changes nothing.
    pub fn populate(&mut self, task: &ProjectTask) {
        if self.depends_on.is_none() {
            self.depends_on = Some(task.depends_on.clone());
        }
        if self.requires.is_none() {
            self.requires = Some(task.requires.clone());
        }
        if self.priority.is_none() {
            self.priority = Some(task.priority);
        }
        if self.patchable.is_none() {
            self.patchable = task.patchable;
        }
        if self.exec_timeout_secs.is_none() {
            self.exec_timeout_secs = task.exec_timeout_secs;
        }
        if self.stepback.is_none() {
            self.stepback = task.stepback;
        }
    }

    /// Dependencies of the unit, empty when unset
    pub fn dependencies(&self) -> &[TaskUnitDependency] {
        self.depends_on.as_deref().unwrap_or_default()
    }

    /// Requirements of the unit, empty when unset
    pub fn requirements(&self) -> &[TaskUnitRequirement] {
        self.requires.as_deref().unwrap_or_default()
    }

    /// Whether the unit may run in patches; unset means yes
    pub fn is_patchable(&self) -> bool {
        self.patchable != Some(false)
    }
}

// Task units may be written as a bare name or as a mapping with overrides.
impl<'de> Deserialize<'de> for BuildVariantTaskUnit {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct UnitHelper {
            name: String,
            #[serde(default)]
            patchable: Option<bool>,
            #[serde(default)]
            priority: Option<i64>,
            #[serde(default)]
            depends_on: Option<Vec<TaskUnitDependency>>,
            #[serde(default)]
            requires: Option<Vec<TaskUnitRequirement>>,
            #[serde(default)]
            distros: Vec<String>,
            #[serde(default)]
            exec_timeout_secs: Option<u64>,
            #[serde(default)]
            stepback: Option<bool>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Selector(String),
            Full(UnitHelper),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Selector(name) => Self::new(name),
            Repr::Full(helper) => Self {
                name: helper.name,
                is_group: false,
                group_name: None,
                patchable: helper.patchable,
                priority: helper.priority,
                depends_on: helper.depends_on,
                requires: helper.requires,
                distros: helper.distros,
                exec_timeout_secs: helper.exec_timeout_secs,
                stepback: helper.stepback,
            },
        })
    }
}

/// A reporting aggregate over execution tasks of one variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DisplayTask {
    /// Display task name
    pub name: String,
    /// Execution tasks the display task reports on
    #[serde(default)]
    pub execution_tasks: Vec<String>,
}

impl DisplayTask {
    /// Whether the display task aggregates the given execution task
    pub fn contains(&self, exec_task: &str) -> bool {
        self.execution_tasks.iter().any(|t| t == exec_task)
    }
}

/// A named execution environment and the tasks that run in it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BuildVariant {
    /// Variant name, unique within the project
    pub name: String,
    /// Human-readable name, also the sort key
    #[serde(default)]
    pub display_name: String,
    /// Extra expansions for tasks on this variant
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expansions: BTreeMap<String, String>,
    /// Modules checked out for this variant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    /// Disabled variants are skipped by mainline builds and `all`
    #[serde(default)]
    pub disabled: bool,
    /// Tags applied to every task on the variant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether push builds are enabled
    #[serde(default)]
    pub push: bool,

    /// Overrides the project batch time when set
    #[serde(default, rename = "batchtime", skip_serializing_if = "Option::is_none")]
    pub batch_time: Option<u32>,

    /// Overrides the project stepback setting when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepback: Option<bool>,

    /// Default distros, used when a task names none
    #[serde(default)]
    pub run_on: Vec<String>,

    /// Tasks and task groups run on the variant, in order
    #[serde(default)]
    pub tasks: Vec<BuildVariantTaskUnit>,
    /// Display tasks defined on the variant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_tasks: Vec<DisplayTask>,
}

impl BuildVariant {
    /// The task reference with the given name
    pub fn get(&self, name: &str) -> Result<&BuildVariantTaskUnit> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::not_found(EntityKind::VariantTask, format!("{}/{name}", self.name)))
    }

    /// Name of the display task aggregating `exec_task`, if any
    pub fn display_task_name_for(&self, exec_task: &str) -> Option<&str> {
        self.display_tasks
            .iter()
            .find(|dt| dt.contains(exec_task))
            .map(|dt| dt.name.as_str())
    }

    /// Display task with the given name
    pub fn find_display_task(&self, name: &str) -> Option<&DisplayTask> {
        self.display_tasks.iter().find(|dt| dt.name == name)
    }

    /// Whether the variant takes part in wildcard selections
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

/// The project's ordered list of build variants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct BuildVariants(pub Vec<BuildVariant>);

impl BuildVariants {
    /// The build variant with the given name
    pub fn get(&self, name: &str) -> Result<&BuildVariant> {
        self.0
            .iter()
            .find(|bv| bv.name == name)
            .ok_or_else(|| Error::not_found(EntityKind::BuildVariant, name))
    }

    /// Stable sort by display name
    pub fn sort_by_display_name(&mut self) {
        self.0.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    }

    /// Variants ordered by display name, leaving `self` untouched
    pub fn sorted_by_display_name(&self) -> Vec<&BuildVariant> {
        let mut sorted: Vec<&BuildVariant> = self.0.iter().collect();
        sorted.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        sorted
    }
}

impl Deref for BuildVariants {
    type Target = Vec<BuildVariant>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BuildVariants {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<BuildVariant>> for BuildVariants {
    fn from(variants: Vec<BuildVariant>) -> Self {
        Self(variants)
    }
}

impl<'a> IntoIterator for &'a BuildVariants {
    type Item = &'a BuildVariant;
    type IntoIter = std::slice::Iter<'a, BuildVariant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
