//! Task/variant pairs, the flat representation of a selected task graph

use ciplan_core::context::VariantTasks;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// One task on one build variant.
///
/// Ordering is by variant, then task name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TVPair {
    /// Build variant name
    pub variant: String,
    /// Task or display task name
    pub task_name: String,
}

impl TVPair {
    /// Create a pair
    pub fn new(variant: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            task_name: task_name.into(),
        }
    }
}

impl fmt::Display for TVPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.variant, self.task_name)
    }
}

/// An ordered sequence of pairs. Duplicates are allowed until
/// [`TVPairSet::dedup`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TVPairSet(pub Vec<TVPair>);

impl TVPairSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs on the given variant, in order
    pub fn by_variant(&self, variant: &str) -> Self {
        self.0
            .iter()
            .filter(|p| p.variant == variant)
            .cloned()
            .collect()
    }

    /// Unique task names on the given variant, in first-seen order
    pub fn task_names(&self, variant: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .filter(|p| p.variant == variant)
            .map(|p| p.task_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Unique variant names, in first-seen order
    pub fn variants(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .map(|p| p.variant.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Whether the exact pair is present
    pub fn contains_pair(&self, variant: &str, task_name: &str) -> bool {
        self.0
            .iter()
            .any(|p| p.variant == variant && p.task_name == task_name)
    }

    /// Drop repeated pairs, keeping the first occurrence of each
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.0.retain(|p| seen.insert(p.clone()));
    }
}

impl Deref for TVPairSet {
    type Target = Vec<TVPair>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TVPairSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<TVPair>> for TVPairSet {
    fn from(pairs: Vec<TVPair>) -> Self {
        Self(pairs)
    }
}

impl FromIterator<TVPair> for TVPairSet {
    fn from_iter<I: IntoIterator<Item = TVPair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TVPairSet {
    type Item = TVPair;
    type IntoIter = std::vec::IntoIter<TVPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TVPairSet {
    type Item = &'a TVPair;
    type IntoIter = std::slice::Iter<'a, TVPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Execution and display pairs selected for a version
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskVariantPairs {
    /// Pairs that run
    pub exec_tasks: TVPairSet,
    /// Pairs that only aggregate results
    pub display_tasks: TVPairSet,
}

impl TaskVariantPairs {
    /// Group the pairs per variant, in first-seen variant order
    pub fn to_variant_tasks(&self) -> Vec<VariantTasks> {
        let mut out: Vec<VariantTasks> = Vec::new();

        let pairs = self
            .exec_tasks
            .iter()
            .map(|p| (p, false))
            .chain(self.display_tasks.iter().map(|p| (p, true)));

        for (pair, is_display) in pairs {
            let idx = if let Some(i) = out.iter().position(|vt| vt.variant == pair.variant) {
                i
            } else {
                out.push(VariantTasks {
                    variant: pair.variant.clone(),
                    ..VariantTasks::default()
                });
                out.len() - 1
            };

            let vt = &mut out[idx];
            let list = if is_display {
                &mut vt.display_tasks
            } else {
                &mut vt.tasks
            };
            if !list.contains(&pair.task_name) {
                list.push(pair.task_name.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> TVPairSet {
        pairs.iter().map(|(v, t)| TVPair::new(*v, *t)).collect()
    }

    #[test]
    fn test_pair_display_and_order() {
        let a = TVPair::new("linux", "test");
        let b = TVPair::new("linux", "compile");
        let c = TVPair::new("arm", "test");
        assert_eq!(a.to_string(), "linux/test");
        let mut sorted = vec![a.clone(), b.clone(), c.clone()];
        sorted.sort();
        assert_eq!(sorted, vec![c, b, a]);
    }

    #[test]
    fn test_equality_is_case_sensitive() {
        assert_ne!(TVPair::new("Linux", "test"), TVPair::new("linux", "test"));
    }

    #[test]
    fn test_by_variant_and_task_names() {
        let pairs = set(&[
            ("linux", "compile"),
            ("windows", "compile"),
            ("linux", "test"),
            ("linux", "compile"),
        ]);
        assert_eq!(pairs.by_variant("linux").len(), 3);
        assert_eq!(pairs.task_names("linux"), vec!["compile", "test"]);
        assert_eq!(pairs.variants(), vec!["linux", "windows"]);
        assert!(pairs.task_names("macos").is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut pairs = set(&[("b", "x"), ("a", "y"), ("b", "x"), ("a", "z")]);
        pairs.dedup();
        assert_eq!(pairs, set(&[("b", "x"), ("a", "y"), ("a", "z")]));
    }

    #[test]
    fn test_to_variant_tasks() {
        let tvp = TaskVariantPairs {
            exec_tasks: set(&[("linux", "compile"), ("windows", "compile"), ("linux", "test")]),
            display_tasks: set(&[("linux", "suite"), ("macos", "suite")]),
        };
        let vts = tvp.to_variant_tasks();
        assert_eq!(vts.len(), 3);
        assert_eq!(vts[0].variant, "linux");
        assert_eq!(vts[0].tasks, vec!["compile", "test"]);
        assert_eq!(vts[0].display_tasks, vec!["suite"]);
        assert_eq!(vts[1].variant, "windows");
        assert_eq!(vts[2].variant, "macos");
        assert!(vts[2].tasks.is_empty());
    }
}
