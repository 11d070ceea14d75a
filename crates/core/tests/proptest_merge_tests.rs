//! Property-based tests for the override merge.
//!
//! - Populating twice equals populating once
//! - Explicitly set fields are never replaced
//! - Unset fields always take the canonical value

use ciplan_core::project::{BuildVariantTaskUnit, ProjectTask, TaskUnitDependency};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn deps_strategy() -> impl Strategy<Value = Vec<TaskUnitDependency>> {
    proptest::collection::vec("[a-z]{1,8}".prop_map(TaskUnitDependency::new), 0..4)
}

fn project_task_strategy() -> impl Strategy<Value = ProjectTask> {
    (
        any::<i64>(),
        proptest::option::of(any::<u64>()),
        deps_strategy(),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(priority, exec_timeout_secs, depends_on, patchable, stepback)| ProjectTask {
            name: "task".to_string(),
            priority,
            exec_timeout_secs,
            depends_on,
            patchable,
            stepback,
            ..ProjectTask::default()
        })
}

fn unit_strategy() -> impl Strategy<Value = BuildVariantTaskUnit> {
    (
        proptest::option::of(any::<i64>()),
        proptest::option::of(any::<u64>()),
        proptest::option::of(deps_strategy()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(priority, exec_timeout_secs, depends_on, patchable, stepback)| {
            BuildVariantTaskUnit {
                name: "task".to_string(),
                priority,
                exec_timeout_secs,
                depends_on,
                patchable,
                stepback,
                ..BuildVariantTaskUnit::default()
            }
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn populate_is_idempotent(unit in unit_strategy(), task in project_task_strategy()) {
        let mut once = unit;
        once.populate(&task);
        let mut twice = once.clone();
        twice.populate(&task);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn populate_never_overwrites_explicit_fields(
        unit in unit_strategy(),
        task in project_task_strategy(),
    ) {
        let mut merged = unit.clone();
        merged.populate(&task);

        if unit.priority.is_some() {
            prop_assert_eq!(merged.priority, unit.priority);
        }
        if unit.exec_timeout_secs.is_some() {
            prop_assert_eq!(merged.exec_timeout_secs, unit.exec_timeout_secs);
        }
        if unit.depends_on.is_some() {
            prop_assert_eq!(&merged.depends_on, &unit.depends_on);
        }
        if unit.patchable.is_some() {
            prop_assert_eq!(merged.patchable, unit.patchable);
        }
        if unit.stepback.is_some() {
            prop_assert_eq!(merged.stepback, unit.stepback);
        }
        prop_assert_eq!(&merged.name, &unit.name);
    }

    #[test]
    fn populate_fills_unset_fields(task in project_task_strategy()) {
        let mut merged = BuildVariantTaskUnit::new("task");
        merged.populate(&task);

        prop_assert_eq!(merged.priority, Some(task.priority));
        prop_assert_eq!(merged.exec_timeout_secs, task.exec_timeout_secs);
        prop_assert_eq!(merged.dependencies(), task.depends_on.as_slice());
        prop_assert_eq!(merged.patchable, task.patchable);
        prop_assert_eq!(merged.stepback, task.stepback);
    }
}
