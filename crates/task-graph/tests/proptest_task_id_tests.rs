//! Property-based tests for task ID generation.
//!
//! These tests verify the contracts of the ID generator:
//! - IDs are identical across calls for the same inputs
//! - Different pairs in the same version never share an ID, or the table
//!   build reports the collision
//! - Patch IDs never equal mainline IDs
//! - IDs never contain `-` or spaces

use chrono::{DateTime, TimeZone, Utc};
use ciplan_core::Error;
use ciplan_core::context::{Requester, VersionContext};
use ciplan_core::project::{BuildVariant, BuildVariantTaskUnit, BuildVariants, Project};
use ciplan_task_graph::{generate_id, new_task_id_table};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Strategies
// =============================================================================

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_\\-]{0,10}".prop_map(String::from)
}

fn time_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn version_strategy(requester: Requester) -> impl Strategy<Value = VersionContext> {
    ("[0-9a-f]{8,40}", "[0-9a-f]{6,24}", time_strategy())
        .prop_map(move |(revision, id, created)| VersionContext::new(id, revision, requester, created))
}

/// A project whose names may contain `-` and `_`, so distinct pairs can
/// render to the same ID.
fn project_strategy() -> impl Strategy<Value = Project> {
    (
        proptest::collection::hash_set("[a-c][a-c_\\-]{0,3}", 1..4),
        proptest::collection::hash_set("[a-c][a-c_\\-]{0,3}", 1..6),
    )
        .prop_map(|(variants, tasks)| {
            let mut project = Project::new("proj");
            let tasks: Vec<String> = tasks.into_iter().collect();
            project.build_variants = BuildVariants(
                variants
                    .into_iter()
                    .map(|name| BuildVariant {
                        display_name: name.clone(),
                        name,
                        tasks: tasks.iter().map(BuildVariantTaskUnit::new).collect(),
                        ..BuildVariant::default()
                    })
                    .collect(),
            );
            project
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn ids_are_deterministic(
        variant in name_strategy(),
        task in name_strategy(),
        version in version_strategy(Requester::Repotracker),
    ) {
        let project = Project::new("proj");
        let first = generate_id(&project, &variant, &task, &version);
        let second = generate_id(&project, &variant, &task, &version.clone());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ids_use_clean_characters(
        variant in name_strategy(),
        task in name_strategy(),
        version in version_strategy(Requester::Patch),
    ) {
        let id = generate_id(&Project::new("my-proj"), &variant, &task, &version);
        prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.'));
    }

    #[test]
    fn patch_ids_differ_from_mainline(
        variant in name_strategy(),
        task in name_strategy(),
        version in version_strategy(Requester::Repotracker),
    ) {
        let project = Project::new("proj");
        let mut patch_version = version.clone();
        patch_version.requester = Requester::Patch;

        let mainline = generate_id(&project, &variant, &task, &version);
        let patch = generate_id(&project, &variant, &task, &patch_version);
        prop_assert_ne!(mainline, patch);
    }

    #[test]
    fn changing_the_revision_changes_the_id(
        version in version_strategy(Requester::Repotracker),
        other_revision in "[0-9a-f]{8,40}",
    ) {
        prop_assume!(other_revision != version.revision);
        let project = Project::new("proj");
        let mut other = version.clone();
        other.revision = other_revision;
        prop_assert_ne!(
            generate_id(&project, "linux", "compile", &version),
            generate_id(&project, "linux", "compile", &other)
        );
    }

    #[test]
    fn full_table_ids_are_unique_or_collisions_reported(
        project in project_strategy(),
        version in version_strategy(Requester::Repotracker),
    ) {
        let mut rendered: HashMap<String, usize> = HashMap::new();
        for bv in project.build_variants.iter() {
            for unit in &bv.tasks {
                *rendered
                    .entry(generate_id(&project, &bv.name, &unit.name, &version))
                    .or_default() += 1;
            }
        }
        let expected: usize = rendered.values().sum();
        let collides = rendered.len() < expected;

        match new_task_id_table(&project, &version) {
            Ok(config) => {
                prop_assert!(!collides);
                prop_assert_eq!(config.execution_tasks.len(), expected);
                let unique: HashSet<&str> =
                    config.execution_tasks.iter().map(|(_, id)| id).collect();
                prop_assert_eq!(unique.len(), expected);
            }
            Err(err) => {
                prop_assert!(collides);
                let is_duplicate = match &err {
                    Error::DuplicateTaskId { .. } => true,
                    Error::Multiple { errors } => errors
                        .iter()
                        .all(|e| matches!(e, Error::DuplicateTaskId { .. })),
                    _ => false,
                };
                prop_assert!(is_duplicate, "unexpected error: {}", err);
            }
        }
    }
}
