//! Read-only records describing the version, patch and task being resolved
//!
//! These mirror the persisted records owned by the version and patch stores.
//! The resolver never writes them back; it only reads identifiers,
//! revisions and timestamps from them.

use crate::loader::ConfigLoader;
use crate::project::TaskGroup;
use crate::{EntityKind, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layout used to render version creation times inside identifiers
pub const ID_TIME_LAYOUT: &str = "%y_%m_%d_%H_%M_%S";

/// Who or what asked for a version to be built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Requester {
    /// A commit picked up by the repository tracker
    #[default]
    #[serde(rename = "gitter_request")]
    Repotracker,
    /// A patch submitted by a user
    #[serde(rename = "patch_request")]
    Patch,
    /// A patch created from a GitHub pull request
    #[serde(rename = "github_pull_request")]
    GithubPullRequest,
    /// A patch tested by the commit queue before merging
    #[serde(rename = "merge_test")]
    MergeTest,
    /// A version created by a project trigger
    #[serde(rename = "trigger_request")]
    Trigger,
    /// A periodic or ad-hoc build
    #[serde(rename = "ad_hoc")]
    AdHoc,
}

impl Requester {
    /// Wire name of the requester
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repotracker => "gitter_request",
            Self::Patch => "patch_request",
            Self::GithubPullRequest => "github_pull_request",
            Self::MergeTest => "merge_test",
            Self::Trigger => "trigger_request",
            Self::AdHoc => "ad_hoc",
        }
    }

    /// Whether versions from this requester build proposed, unmerged changes
    pub fn is_patch(self) -> bool {
        matches!(
            self,
            Self::Patch | Self::GithubPullRequest | Self::MergeTest
        )
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Requester {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gitter_request" => Ok(Self::Repotracker),
            "patch_request" => Ok(Self::Patch),
            "github_pull_request" => Ok(Self::GithubPullRequest),
            "merge_test" => Ok(Self::MergeTest),
            "trigger_request" => Ok(Self::Trigger),
            "ad_hoc" => Ok(Self::AdHoc),
            other => Err(Error::configuration(format!("unknown requester '{other}'"))),
        }
    }
}

/// The persisted version a resolution runs against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionContext {
    /// Version id, unique across the system
    pub id: String,
    /// Project identifier the version belongs to
    #[serde(default)]
    pub identifier: String,
    /// Commit the version builds
    pub revision: String,
    /// What created the version
    #[serde(default)]
    pub requester: Requester,
    /// Read from the stored record, never regenerated
    pub create_time: DateTime<Utc>,
    /// Commit author, or patch submitter
    #[serde(default)]
    pub author: String,
    /// Branch the commit was tracked on
    #[serde(default)]
    pub branch: String,
    /// Position of the commit in the project history
    #[serde(default)]
    pub revision_order_number: u64,
    /// The configuration document the version was created from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config: String,
}

impl VersionContext {
    /// Create a version record with the required identity fields
    pub fn new(
        id: impl Into<String>,
        revision: impl Into<String>,
        requester: Requester,
        create_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            identifier: String::new(),
            revision: revision.into(),
            requester,
            create_time,
            author: String::new(),
            branch: String::new(),
            revision_order_number: 0,
            config: String::new(),
        }
    }

    /// Whether the version builds a patch
    pub fn is_patch(&self) -> bool {
        self.requester.is_patch()
    }

    /// Creation time rendered with [`ID_TIME_LAYOUT`]
    pub fn formatted_create_time(&self) -> String {
        self.create_time.format(ID_TIME_LAYOUT).to_string()
    }
}

/// Pull request metadata attached to GitHub patches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GithubPatchData {
    /// Pull request number
    pub pr_number: u64,
    /// Owner of the base repository
    pub base_owner: String,
    /// Name of the base repository
    pub base_repo: String,
    /// GitHub login of the PR author
    pub author: String,
}

/// Tasks selected on one variant of a patch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VariantTasks {
    /// Variant name
    pub variant: String,
    /// Execution tasks selected on the variant
    pub tasks: Vec<String>,
    /// Display tasks selected on the variant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_tasks: Vec<String>,
}

/// The patch a resolution runs for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PatchContext {
    /// Patch id
    #[serde(default)]
    pub id: String,
    /// Requested variant names, or `["all"]`
    #[serde(default)]
    pub build_variants: Vec<String>,
    /// Requested task names, or `["all"]`
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Final per-variant selection, filled in after resolution
    #[serde(default)]
    pub variants_tasks: Vec<VariantTasks>,
    /// Set for patches created from a GitHub pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubPatchData>,
}

impl PatchContext {
    /// Create a patch request for the given variants and tasks
    pub fn new<V, T>(variants: V, tasks: T) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            build_variants: variants.into_iter().map(Into::into).collect(),
            tasks: tasks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Replace the per-variant selection and rebuild the flat variant and
    /// task lists from it.
    pub fn sync_variants_tasks(&mut self, variants_tasks: Vec<VariantTasks>) {
        let mut variants: Vec<String> = Vec::new();
        let mut tasks: Vec<String> = Vec::new();
        for vt in &variants_tasks {
            if !variants.contains(&vt.variant) {
                variants.push(vt.variant.clone());
            }
            for task in vt.tasks.iter().chain(&vt.display_tasks) {
                if !tasks.contains(task) {
                    tasks.push(task.clone());
                }
            }
        }
        self.build_variants = variants;
        self.tasks = tasks;
        self.variants_tasks = variants_tasks;
    }
}

/// The persisted record of a task instance that is running or about to run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskRecord {
    /// Task id
    pub id: String,
    /// Project identifier
    pub project: String,
    /// Version id
    pub version: String,
    /// Build the task belongs to
    pub build_id: String,
    /// Variant the task runs on
    pub build_variant: String,
    /// Task name as shown to users
    pub display_name: String,
    /// Commit the task builds
    pub revision: String,
    /// Execution number, starting at 0
    #[serde(default)]
    pub execution: u32,
    /// Task group the task runs in, empty when none
    #[serde(default)]
    pub task_group: String,
}

/// What an agent knows about the task it is running
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    /// The running task
    pub task: Option<TaskRecord>,
    /// The version the task belongs to
    pub version: Option<VersionContext>,
}

/// Resolve the task group a running task belongs to.
///
/// The project is loaded from the configuration stored on the version. An
/// empty `task_group` yields a synthetic group built from the project's
/// `pre`, `post` and `timeout` commands.
pub fn resolve_task_group(
    task_group: &str,
    context: Option<&TaskContext>,
    loader: &dyn ConfigLoader,
) -> Result<TaskGroup> {
    let context = context
        .ok_or_else(|| Error::inconsistent_context("unable to get task group: task context is missing"))?;
    let task = context
        .task
        .as_ref()
        .ok_or_else(|| Error::inconsistent_context("unable to get task group: task is missing"))?;
    if task.version.is_empty() {
        return Err(Error::inconsistent_context("task has no version"));
    }
    let version = context
        .version
        .as_ref()
        .ok_or_else(|| Error::inconsistent_context("version is missing"))?;

    let project = loader.load(version.config.as_bytes(), &task.project)?;

    if task_group.is_empty() {
        return Ok(TaskGroup {
            setup_task: project.pre.clone(),
            teardown_task: project.post.clone(),
            timeout: project.timeout.clone(),
            ..TaskGroup::default()
        });
    }

    project
        .find_task_group(task_group)
        .cloned()
        .ok_or_else(|| Error::not_found(EntityKind::TaskGroup, task_group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_requesters() {
        assert!(Requester::Patch.is_patch());
        assert!(Requester::GithubPullRequest.is_patch());
        assert!(Requester::MergeTest.is_patch());
        assert!(!Requester::Repotracker.is_patch());
        assert!(!Requester::Trigger.is_patch());
        assert!(!Requester::AdHoc.is_patch());
    }

    #[test]
    fn test_requester_round_trips_through_str() {
        for requester in [
            Requester::Repotracker,
            Requester::Patch,
            Requester::GithubPullRequest,
            Requester::MergeTest,
            Requester::Trigger,
            Requester::AdHoc,
        ] {
            assert_eq!(requester.as_str().parse::<Requester>().unwrap(), requester);
        }
        assert!("bogus".parse::<Requester>().is_err());
    }

    #[test]
    fn test_formatted_create_time() {
        let created = DateTime::parse_from_rfc3339("2018-03-07T14:05:09Z")
            .unwrap()
            .with_timezone(&Utc);
        let version = VersionContext::new("v1", "abc123", Requester::Repotracker, created);
        assert_eq!(version.formatted_create_time(), "18_03_07_14_05_09");
    }

    #[test]
    fn test_sync_variants_tasks_rebuilds_lists() {
        let mut patch = PatchContext::new(["all"], ["all"]);
        patch.sync_variants_tasks(vec![
            VariantTasks {
                variant: "linux".to_string(),
                tasks: vec!["compile".to_string(), "test".to_string()],
                display_tasks: vec!["suite".to_string()],
            },
            VariantTasks {
                variant: "windows".to_string(),
                tasks: vec!["compile".to_string()],
                display_tasks: vec![],
            },
        ]);
        assert_eq!(patch.build_variants, vec!["linux", "windows"]);
        assert_eq!(patch.tasks, vec!["compile", "test", "suite"]);
        assert_eq!(patch.variants_tasks.len(), 2);
    }
}
