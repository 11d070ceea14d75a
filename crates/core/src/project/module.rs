use serde::{Deserialize, Serialize};

/// An external repository checked out alongside the project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Module {
    /// Module name, referenced from build variants
    pub name: String,
    /// Branch to check out
    #[serde(default)]
    pub branch: String,
    /// Repository location, e.g. `git@github.com:owner/name.git`
    #[serde(default)]
    pub repo: String,
    /// Directory prefix the module is checked out under
    #[serde(default)]
    pub prefix: String,
    /// Pinned revision
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

impl Module {
    /// Owner and repository name parsed from [`Module::repo`].
    ///
    /// Returns `None` unless the last path component has exactly the
    /// `owner/name` shape.
    pub fn repo_owner_and_name(&self) -> Option<(&str, &str)> {
        let basename = self.repo.rsplit(':').next().unwrap_or(&self.repo);
        let owner_and_name = basename.strip_suffix(".git").unwrap_or(basename);
        let mut parts = owner_and_name.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Some((owner, name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(repo: &str) -> Module {
        Module {
            name: "enterprise".to_string(),
            repo: repo.to_string(),
            ..Module::default()
        }
    }

    #[test]
    fn test_owner_and_name_from_ssh_url() {
        let m = module("git@github.com:evergreen-ci/sample.git");
        assert_eq!(m.repo_owner_and_name(), Some(("evergreen-ci", "sample")));
    }

    #[test]
    fn test_owner_and_name_without_suffix() {
        let m = module("git@github.com:mongodb/mongo");
        assert_eq!(m.repo_owner_and_name(), Some(("mongodb", "mongo")));
    }

    #[test]
    fn test_owner_and_name_malformed() {
        assert_eq!(module("not-a-repo").repo_owner_and_name(), None);
        assert_eq!(module("git@host:a/b/c.git").repo_owner_and_name(), None);
    }
}
