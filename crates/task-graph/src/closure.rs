//! Closing a pair selection over its dependencies

use crate::graph::DependencyGraph;
use crate::pairs::{TVPair, TVPairSet};
use ciplan_core::project::Project;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Wildcard accepted in dependency names and variants
const WILDCARD: &str = "*";

/// Expands a pair set with everything it depends on
pub trait DependencyCloser: Send + Sync {
    /// Return `pairs` plus every pair they transitively depend on.
    fn close(&self, project: &Project, pairs: &TVPairSet, is_patch: bool) -> TVPairSet;
}

/// Closer that walks `depends_on` edges, and `requires` edges in patches.
///
/// - an unset dependency variant means the holder's variant
/// - variant `*` means every variant carrying the task
/// - name `*` means every task on the target variant
/// - a task group name means each of its members
#[derive(Debug, Clone)]
pub struct DependsOnCloser {
    follow_requires: bool,
}

impl Default for DependsOnCloser {
    fn default() -> Self {
        Self {
            follow_requires: true,
        }
    }
}

impl DependsOnCloser {
    /// Create a closer that follows `requires` edges in patches
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `requires` edges are followed in patches
    #[must_use]
    pub fn follow_requires(mut self, follow: bool) -> Self {
        self.follow_requires = follow;
        self
    }

    /// Build the dependency graph reachable from `pairs`
    pub fn dependency_graph(&self, project: &Project, pairs: &TVPairSet, is_patch: bool) -> DependencyGraph {
        self.walk(project, pairs, is_patch).1
    }

    fn walk(&self, project: &Project, pairs: &TVPairSet, is_patch: bool) -> (TVPairSet, DependencyGraph) {
        let mut graph = DependencyGraph::new();
        let mut seen: HashSet<TVPair> = HashSet::new();
        let mut order = TVPairSet::new();
        let mut queue: VecDeque<TVPair> = VecDeque::new();

        for pair in pairs {
            if seen.insert(pair.clone()) {
                graph.add_pair(pair);
                order.push(pair.clone());
                queue.push_back(pair.clone());
            }
        }

        while let Some(pair) = queue.pop_front() {
            for dep in self.direct_dependencies(project, &pair, is_patch) {
                graph.add_dependency(&pair, &dep);
                if seen.insert(dep.clone()) {
                    order.push(dep.clone());
                    queue.push_back(dep);
                }
            }
        }

        (order, graph)
    }

    fn direct_dependencies(&self, project: &Project, pair: &TVPair, is_patch: bool) -> Vec<TVPair> {
        let Some(unit) = project.find_task_for_variant(&pair.task_name, &pair.variant) else {
            debug!(pair = %pair, "No task definition for pair; not following dependencies");
            return Vec::new();
        };

        let mut edges: Vec<(&str, Option<&str>)> = Vec::new();
        for dep in unit.dependencies() {
            if is_patch && dep.patch_optional {
                debug!(pair = %pair, dependency = %dep.name, "Skipping patch-optional dependency");
                continue;
            }
            edges.push((dep.name.as_str(), dep.variant.as_deref()));
        }
        if is_patch && self.follow_requires {
            for req in unit.requirements() {
                edges.push((req.name.as_str(), req.variant.as_deref()));
            }
        }

        let mut targets = Vec::new();
        for (name, variant) in edges {
            for target in resolve_targets(project, pair, name, variant) {
                if is_patch
                    && project
                        .find_task_for_variant(&target.task_name, &target.variant)
                        .is_some_and(|u| !u.is_patchable())
                {
                    debug!(pair = %pair, dependency = %target, "Skipping unpatchable dependency");
                    continue;
                }
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }
}

impl DependencyCloser for DependsOnCloser {
    fn close(&self, project: &Project, pairs: &TVPairSet, is_patch: bool) -> TVPairSet {
        let (closed, graph) = self.walk(project, pairs, is_patch);
        debug!(
            requested = pairs.len(),
            closed = closed.len(),
            edges = graph.edge_count(),
            "Closed pairs over dependencies"
        );
        closed
    }
}

/// Pairs a single dependency edge of `holder` points at
fn resolve_targets(project: &Project, holder: &TVPair, name: &str, variant: Option<&str>) -> Vec<TVPair> {
    let variants: Vec<&str> = match variant {
        None | Some("") => vec![holder.variant.as_str()],
        Some(WILDCARD) => project.find_all_variants(),
        Some(v) => vec![v],
    };

    let mut targets = Vec::new();
    for v in variants {
        let names: Vec<&str> = if name == WILDCARD {
            project.expanded_tasks_for_variant(v)
        } else if let Some(tg) = project.find_task_group(name) {
            tg.tasks.iter().map(String::as_str).collect()
        } else {
            vec![name]
        };

        for task in names {
            let target = TVPair::new(v, task);
            if &target == holder {
                continue;
            }
            if project.find_task_for_variant(task, v).is_some() {
                targets.push(target);
            } else if variant != Some(WILDCARD) && name != WILDCARD {
                debug!(holder = %holder, dependency = %target, "Dependency does not run on its variant");
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciplan_core::project::{
        BuildVariant, BuildVariantTaskUnit, BuildVariants, ProjectTask, TaskGroup,
        TaskUnitDependency, TaskUnitRequirement,
    };

    fn pairs(items: &[(&str, &str)]) -> TVPairSet {
        items.iter().map(|(v, t)| TVPair::new(*v, *t)).collect()
    }

    fn task(name: &str, deps: Vec<TaskUnitDependency>) -> ProjectTask {
        ProjectTask {
            depends_on: deps,
            ..ProjectTask::new(name)
        }
    }

    fn variant(name: &str, tasks: &[&str]) -> BuildVariant {
        BuildVariant {
            name: name.to_string(),
            tasks: tasks.iter().map(|t| BuildVariantTaskUnit::new(*t)).collect(),
            ..BuildVariant::default()
        }
    }

    #[test]
    fn test_same_variant_dependency() {
        let mut project = Project::new("p");
        project.tasks = vec![
            task("compile", vec![]),
            task("test", vec![TaskUnitDependency::new("compile")]),
        ];
        project.build_variants = BuildVariants(vec![variant("v1", &["compile", "test"])]);

        let closed = DependsOnCloser::new().close(&project, &pairs(&[("v1", "test")]), false);
        assert_eq!(closed, pairs(&[("v1", "test"), ("v1", "compile")]));
    }

    #[test]
    fn test_transitive_and_cross_variant() {
        let mut project = Project::new("p");
        project.tasks = vec![
            task("compile", vec![]),
            task("test", vec![TaskUnitDependency::new("compile")]),
            task(
                "package",
                vec![
                    TaskUnitDependency::new("test"),
                    TaskUnitDependency::on_variant("compile", "*"),
                ],
            ),
        ];
        project.build_variants = BuildVariants(vec![
            variant("linux", &["compile", "test", "package"]),
            variant("windows", &["compile"]),
            variant("macos", &["test"]),
        ]);

        let closed = DependsOnCloser::new().close(&project, &pairs(&[("linux", "package")]), false);
        assert_eq!(
            closed,
            pairs(&[
                ("linux", "package"),
                ("linux", "test"),
                ("linux", "compile"),
                ("windows", "compile"),
            ])
        );
    }

    #[test]
    fn test_wildcard_name_and_group() {
        let mut project = Project::new("p");
        project.tasks = vec![
            task("a", vec![]),
            task("b", vec![]),
            task("all_deps", vec![TaskUnitDependency::new("*")]),
            task("group_dep", vec![TaskUnitDependency::new("grp")]),
        ];
        project.task_groups = vec![TaskGroup {
            name: "grp".to_string(),
            tasks: vec!["a".to_string(), "b".to_string()],
            ..TaskGroup::default()
        }];
        project.build_variants = BuildVariants(vec![variant("v", &["grp", "all_deps", "group_dep"])]);

        let closer = DependsOnCloser::new();
        let closed = closer.close(&project, &pairs(&[("v", "all_deps")]), false);
        assert_eq!(
            closed,
            pairs(&[("v", "all_deps"), ("v", "a"), ("v", "b"), ("v", "group_dep")])
        );

        let closed = closer.close(&project, &pairs(&[("v", "group_dep")]), false);
        assert_eq!(closed, pairs(&[("v", "group_dep"), ("v", "a"), ("v", "b")]));
    }

    #[test]
    fn test_patch_optional_and_requires() {
        let mut project = Project::new("p");
        let mut test = task(
            "test",
            vec![TaskUnitDependency {
                patch_optional: true,
                ..TaskUnitDependency::new("compile")
            }],
        );
        test.requires = vec![TaskUnitRequirement {
            name: "lint".to_string(),
            variant: None,
        }];
        project.tasks = vec![task("compile", vec![]), task("lint", vec![]), test];
        project.build_variants = BuildVariants(vec![variant("v", &["compile", "lint", "test"])]);
        let input = pairs(&[("v", "test")]);

        let mainline = DependsOnCloser::new().close(&project, &input, false);
        assert_eq!(mainline, pairs(&[("v", "test"), ("v", "compile")]));

        let patch = DependsOnCloser::new().close(&project, &input, true);
        assert_eq!(patch, pairs(&[("v", "test"), ("v", "lint")]));

        let no_requires = DependsOnCloser::new()
            .follow_requires(false)
            .close(&project, &input, true);
        assert_eq!(no_requires, pairs(&[("v", "test")]));
    }

    #[test]
    fn test_cycles_terminate_and_are_detected() {
        let mut project = Project::new("p");
        project.tasks = vec![
            task("a", vec![TaskUnitDependency::new("b")]),
            task("b", vec![TaskUnitDependency::new("a")]),
        ];
        project.build_variants = BuildVariants(vec![variant("v", &["a", "b"])]);
        let input = pairs(&[("v", "a")]);

        let closer = DependsOnCloser::new();
        assert_eq!(closer.close(&project, &input, false), pairs(&[("v", "a"), ("v", "b")]));
        assert!(closer.dependency_graph(&project, &input, false).has_cycles());
    }

    #[test]
    fn test_input_duplicates_are_dropped() {
        let mut project = Project::new("p");
        project.tasks = vec![task("a", vec![])];
        project.build_variants = BuildVariants(vec![variant("v", &["a"])]);
        let closed = DependsOnCloser::new().close(&project, &pairs(&[("v", "a"), ("v", "a")]), false);
        assert_eq!(closed, pairs(&[("v", "a")]));
    }
}
