//! Resolution entry point.
//!
//! A [`Resolver`] bundles the collaborators a resolution needs and turns a
//! project plus a version (and, for patches, the patch request) into the
//! final pair sets and ID tables.

use crate::alias::{AliasStore, InMemoryAliasStore, pairs_for_alias};
use crate::closure::{DependencyCloser, DependsOnCloser};
use crate::display::expand_display_tasks;
use crate::pairs::{TVPair, TaskVariantPairs};
use crate::selector::{expand_task_wildcard, expand_variant_wildcard, select_pairs};
use crate::task_id::{TaskIdConfig, new_patch_task_id_table, new_task_id_table};
use ciplan_core::config::ResolverConfig;
use ciplan_core::context::{PatchContext, VersionContext};
use ciplan_core::project::Project;
use ciplan_core::{Error, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Select the pairs of a patch and update the patch's variant and task
/// lists to match.
///
/// Wildcards are expanded, the requested cross product is selected, alias
/// pairs are added, display tasks are expanded in both directions and the
/// result is closed over dependencies.
pub fn build_project_tv_pairs(
    project: &Project,
    patch: &mut PatchContext,
    alias: &str,
    aliases: &dyn AliasStore,
    closer: &dyn DependencyCloser,
) -> Result<TaskVariantPairs> {
    patch.build_variants = expand_variant_wildcard(project, &patch.build_variants);
    patch.tasks = expand_task_wildcard(project, &patch.tasks);

    let mut pairs = select_pairs(project, &patch.build_variants, &patch.tasks, true);

    if !alias.is_empty() {
        let (alias_pairs, display_pairs) = pairs_for_alias(project, aliases, alias)?;
        pairs.extend(alias_pairs);
        for pair in display_pairs {
            if !patch.build_variants.contains(&pair.variant) {
                patch.build_variants.push(pair.variant);
            }
            if !patch.tasks.contains(&pair.task_name) {
                patch.tasks.push(pair.task_name);
            }
        }
    }

    let mut tvp = expand_display_tasks(project, pairs, &patch.tasks, &patch.build_variants);
    tvp.exec_tasks = closer.close(project, &tvp.exec_tasks, true);
    tvp.display_tasks.dedup();

    patch.sync_variants_tasks(tvp.to_variant_tasks());
    Ok(tvp)
}

/// Every task and display task of every enabled variant
pub fn mainline_pairs(project: &Project) -> TaskVariantPairs {
    let mut tvp = TaskVariantPairs::default();
    for bv in project.build_variants.iter().filter(|bv| bv.is_enabled()) {
        for task in project.expanded_tasks_for_variant(&bv.name) {
            if project.find_task_for_variant(task, &bv.name).is_some() {
                tvp.exec_tasks.push(TVPair::new(bv.name.as_str(), task));
            }
        }
        for dt in &bv.display_tasks {
            tvp.display_tasks.push(TVPair::new(bv.name.as_str(), dt.name.as_str()));
        }
    }
    tvp
}

/// Outcome of resolving one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Selected execution and display pairs
    pub pairs: TaskVariantPairs,
    /// IDs for the selected pairs
    pub ids: TaskIdConfig,
    /// The patch request with its lists synced to the final selection
    pub patch: Option<PatchContext>,
}

/// One unit of work for [`Resolver::resolve_batch`]
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    /// Project to resolve
    pub project: Project,
    /// Version to resolve for
    pub version: VersionContext,
    /// Patch request, required for patch requesters
    pub patch: Option<PatchContext>,
    /// Alias to apply, empty for none
    pub alias: String,
}

/// Resolves projects into pair sets and ID tables
#[derive(Clone)]
pub struct Resolver {
    aliases: Arc<dyn AliasStore>,
    closer: Arc<dyn DependencyCloser>,
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver from its collaborators
    pub fn new(
        aliases: Arc<dyn AliasStore>,
        closer: Arc<dyn DependencyCloser>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            aliases,
            closer,
            config,
        }
    }

    /// Resolver with an empty alias store and the `depends_on` closer
    pub fn from_config(config: ResolverConfig) -> Self {
        let closer = DependsOnCloser::new().follow_requires(config.follow_requires());
        Self::new(Arc::new(InMemoryAliasStore::new()), Arc::new(closer), config)
    }

    /// Settings in use
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one version.
    ///
    /// Patch requesters need the patch request and get a patch-scoped ID
    /// table. Everything else resolves every enabled variant and gets the
    /// full table.
    #[tracing::instrument(
        name = "resolve",
        fields(project = %project.identifier, version = %version.id, requester = %version.requester),
        skip(self, project, version, patch)
    )]
    pub fn resolve(
        &self,
        project: &Project,
        version: &VersionContext,
        patch: Option<&PatchContext>,
        alias: &str,
    ) -> Result<Resolution> {
        if self.config.validate_project() {
            project.validate(self.config.allow_nested_display_tasks())?;
        }

        let resolution = if version.is_patch() {
            let mut patch = patch
                .cloned()
                .ok_or_else(|| Error::inconsistent_context("patch version has no patch request"))?;
            let pairs = build_project_tv_pairs(
                project,
                &mut patch,
                alias,
                self.aliases.as_ref(),
                self.closer.as_ref(),
            )?;
            let ids = new_patch_task_id_table(project, version, &pairs)?;
            Resolution {
                pairs,
                ids,
                patch: Some(patch),
            }
        } else {
            if patch.is_some() {
                debug!("Ignoring patch request for a mainline version");
            }
            let pairs = mainline_pairs(project);
            let ids = new_task_id_table(project, version)?;
            Resolution {
                pairs,
                ids,
                patch: None,
            }
        };

        info!(
            exec_tasks = resolution.pairs.exec_tasks.len(),
            display_tasks = resolution.pairs.display_tasks.len(),
            ids = resolution.ids.execution_tasks.len() + resolution.ids.display_tasks.len(),
            "Resolved version"
        );
        Ok(resolution)
    }

    /// Resolve several versions independently.
    ///
    /// A failing or panicking request yields an error in its own slot and
    /// never affects the others.
    #[tracing::instrument(name = "resolve_batch", fields(requests = requests.len()), skip(self, requests))]
    pub fn resolve_batch(&self, requests: Vec<ResolutionRequest>) -> Vec<Result<Resolution>> {
        requests
            .into_iter()
            .map(|request| {
                let unit = format!(
                    "project '{}' version '{}'",
                    request.project.identifier, request.version.id
                );
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.resolve(
                        &request.project,
                        &request.version,
                        request.patch.as_ref(),
                        &request.alias,
                    )
                }));
                outcome.unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    warn!(unit = %unit, message = %message, "Recovered panic while resolving");
                    Err(Error::panicked(unit, message))
                })
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
