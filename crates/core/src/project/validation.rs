//! Structural validation of a loaded project
//!
//! Validation reports every problem it finds instead of stopping at the
//! first one, so a broken configuration can be fixed in one round.

use super::{Project, TaskUnitDependency, TaskUnitRequirement};
use std::collections::HashSet;
use thiserror::Error;

/// Wildcard accepted in dependency names and variants
const WILDCARD: &str = "*";

/// A structural problem in a project configuration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A variant lists a name that is neither a task nor a task group
    #[error("Build variant '{variant}' references '{task}', which is neither a task nor a task group")]
    UnknownTaskReference {
        /// Variant holding the reference
        variant: String,
        /// The unresolved name
        task: String,
    },

    /// A task group lists a task that does not exist
    #[error("Task group '{group}' lists non-existent task '{task}'")]
    UnknownGroupMember {
        /// The task group
        group: String,
        /// The unresolved member
        task: String,
    },

    /// A display task lists a task that does not run on its variant
    #[error("Display task '{display_task}' on build variant '{variant}' lists '{task}', which does not run on that variant")]
    UnknownDisplayMember {
        /// Variant defining the display task
        variant: String,
        /// The display task
        display_task: String,
        /// The member that does not run on the variant
        task: String,
    },

    /// A display task lists another display task
    #[error("Display task '{display_task}' on build variant '{variant}' contains display task '{member}'; display tasks cannot be nested")]
    NestedDisplayTask {
        /// Variant defining both display tasks
        variant: String,
        /// The outer display task
        display_task: String,
        /// The nested display task
        member: String,
    },

    /// Two tasks share a name
    #[error("Task '{0}' is defined more than once")]
    DuplicateTask(String),

    /// Two task groups share a name
    #[error("Task group '{0}' is defined more than once")]
    DuplicateTaskGroup(String),

    /// Two build variants share a name
    #[error("Build variant '{0}' is defined more than once")]
    DuplicateVariant(String),

    /// A dependency names a task that does not exist
    #[error("Task '{task}' depends on non-existent task '{dependency}'")]
    UnknownDependency {
        /// Task declaring the dependency
        task: String,
        /// The unresolved dependency
        dependency: String,
    },

    /// A dependency or requirement names a variant that does not exist
    #[error("Task '{task}' refers to non-existent build variant '{variant}'")]
    UnknownVariant {
        /// Task holding the reference
        task: String,
        /// The unresolved variant
        variant: String,
    },

    /// A requirement names a task that does not exist
    #[error("Task '{task}' requires non-existent task '{requirement}'")]
    UnknownRequirement {
        /// Task declaring the requirement
        task: String,
        /// The unresolved requirement
        requirement: String,
    },
}

/// Validator for project configurations
pub struct ProjectValidator<'a> {
    project: &'a Project,
    allow_nested_display_tasks: bool,
}

impl<'a> ProjectValidator<'a> {
    /// Create a new validator for the given project
    #[must_use]
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            allow_nested_display_tasks: false,
        }
    }

    /// Accept display tasks listed as members of other display tasks
    #[must_use]
    pub fn allow_nested_display_tasks(mut self, allow: bool) -> Self {
        self.allow_nested_display_tasks = allow;
        self
    }

    /// Validate the entire project
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        self.validate_unique_names(&mut errors);
        self.validate_task_references(&mut errors);
        self.validate_task_groups(&mut errors);
        self.validate_display_tasks(&mut errors);
        self.validate_dependencies(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_unique_names(&self, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for task in &self.project.tasks {
            if !seen.insert(task.name.as_str()) {
                errors.push(ValidationError::DuplicateTask(task.name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for group in &self.project.task_groups {
            if !seen.insert(group.name.as_str()) {
                errors.push(ValidationError::DuplicateTaskGroup(group.name.clone()));
            }
        }

        let mut seen = HashSet::new();
        for bv in &self.project.build_variants {
            if !seen.insert(bv.name.as_str()) {
                errors.push(ValidationError::DuplicateVariant(bv.name.clone()));
            }
        }
    }

    fn validate_task_references(&self, errors: &mut Vec<ValidationError>) {
        for bv in &self.project.build_variants {
            for unit in &bv.tasks {
                if self.project.find_project_task(&unit.name).is_none()
                    && !self.project.is_task_group(&unit.name)
                {
                    errors.push(ValidationError::UnknownTaskReference {
                        variant: bv.name.clone(),
                        task: unit.name.clone(),
                    });
                }
            }
        }
    }

    fn validate_task_groups(&self, errors: &mut Vec<ValidationError>) {
        for group in &self.project.task_groups {
            for member in &group.tasks {
                if self.project.find_project_task(member).is_none() {
                    errors.push(ValidationError::UnknownGroupMember {
                        group: group.name.clone(),
                        task: member.clone(),
                    });
                }
            }
        }
    }

    fn validate_display_tasks(&self, errors: &mut Vec<ValidationError>) {
        for bv in &self.project.build_variants {
            let runs_here: HashSet<&str> = self
                .project
                .expanded_tasks_for_variant(&bv.name)
                .into_iter()
                .collect();

            for dt in &bv.display_tasks {
                for member in &dt.execution_tasks {
                    if bv.find_display_task(member).is_some() {
                        if !self.allow_nested_display_tasks {
                            errors.push(ValidationError::NestedDisplayTask {
                                variant: bv.name.clone(),
                                display_task: dt.name.clone(),
                                member: member.clone(),
                            });
                        }
                        continue;
                    }
                    if !runs_here.contains(member.as_str()) {
                        errors.push(ValidationError::UnknownDisplayMember {
                            variant: bv.name.clone(),
                            display_task: dt.name.clone(),
                            task: member.clone(),
                        });
                    }
                }
            }
        }
    }

    fn validate_dependencies(&self, errors: &mut Vec<ValidationError>) {
        for task in &self.project.tasks {
            self.check_edges(&task.name, &task.depends_on, &task.requires, errors);
        }
        for bv in &self.project.build_variants {
            for unit in &bv.tasks {
                self.check_edges(&unit.name, unit.dependencies(), unit.requirements(), errors);
            }
        }
    }

    fn check_edges(
        &self,
        holder: &str,
        depends_on: &[TaskUnitDependency],
        requires: &[TaskUnitRequirement],
        errors: &mut Vec<ValidationError>,
    ) {
        for dep in depends_on {
            if dep.name != WILDCARD && !self.is_task_or_group(&dep.name) {
                errors.push(ValidationError::UnknownDependency {
                    task: holder.to_string(),
                    dependency: dep.name.clone(),
                });
            }
            self.check_variant(holder, dep.variant.as_deref(), errors);
        }
        for req in requires {
            if !self.is_task_or_group(&req.name) {
                errors.push(ValidationError::UnknownRequirement {
                    task: holder.to_string(),
                    requirement: req.name.clone(),
                });
            }
            self.check_variant(holder, req.variant.as_deref(), errors);
        }
    }

    fn check_variant(&self, holder: &str, variant: Option<&str>, errors: &mut Vec<ValidationError>) {
        if let Some(variant) = variant
            && !variant.is_empty()
            && variant != WILDCARD
            && self.project.find_build_variant(variant).is_none()
        {
            errors.push(ValidationError::UnknownVariant {
                task: holder.to_string(),
                variant: variant.to_string(),
            });
        }
    }

    fn is_task_or_group(&self, name: &str) -> bool {
        self.project.find_project_task(name).is_some() || self.project.is_task_group(name)
    }
}
