//! Key/value expansions handed to the task executor

use crate::context::{PatchContext, Requester, TaskRecord, VersionContext};
use crate::project::BuildVariant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String substitutions available to a running task's commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Expansions(BTreeMap<String, String>);

impl Expansions {
    /// Create an empty expansion map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single expansion, replacing any previous value
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value of an expansion, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the expansion is set
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merge another map in; its values win
    pub fn update<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in other {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Iterate expansions in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of expansions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no expansion is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// One distro-level expansion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistroExpansion {
    /// Expansion name
    pub key: String,
    /// Expansion value
    pub value: String,
}

/// The parts of a distro record the expansions need
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DistroContext {
    /// Distro name
    pub id: String,
    /// Working directory on hosts of this distro
    #[serde(default)]
    pub work_dir: String,
    /// Applied after the built-in expansions
    #[serde(default)]
    pub expansions: Vec<DistroExpansion>,
}

/// Build the expansions for a task about to run.
///
/// Built-in keys come first, then distro expansions, then the variant's
/// expansions, each layer overriding the previous one.
pub fn populate_expansions(
    distro: &DistroContext,
    version: &VersionContext,
    variant: &BuildVariant,
    task: &TaskRecord,
    patch: Option<&PatchContext>,
) -> Expansions {
    let mut expansions = Expansions::new();
    expansions.put("execution", task.execution.to_string());
    expansions.put("version_id", task.version.as_str());
    expansions.put("task_id", task.id.as_str());
    expansions.put("task_name", task.display_name.as_str());
    expansions.put("build_id", task.build_id.as_str());
    expansions.put("build_variant", task.build_variant.as_str());
    expansions.put("workdir", distro.work_dir.as_str());
    expansions.put("revision", task.revision.as_str());
    expansions.put("project", task.project.as_str());
    expansions.put("branch_name", version.branch.as_str());
    expansions.put("author", version.author.as_str());
    expansions.put("distro_id", distro.id.as_str());
    expansions.put("created_at", version.formatted_create_time());

    if version.is_patch() {
        expansions.put("is_patch", "true");
        expansions.put(
            "revision_order_id",
            format!("{}_{}", version.author, version.revision_order_number),
        );

        if version.requester == Requester::GithubPullRequest
            && let Some(github) = patch.and_then(|p| p.github.as_ref())
        {
            expansions.put("github_pr_number", github.pr_number.to_string());
            expansions.put("github_org", github.base_owner.as_str());
            expansions.put("github_repo", github.base_repo.as_str());
            expansions.put("github_author", github.author.as_str());
        }
    } else {
        expansions.put("revision_order_id", version.revision_order_number.to_string());
    }

    for e in &distro.expansions {
        expansions.put(e.key.as_str(), e.value.as_str());
    }
    expansions.update(&variant.expansions);

    expansions
}
