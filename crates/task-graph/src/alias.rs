//! Patch aliases: named variant/task patterns stored per project

use crate::pairs::{TVPair, TVPairSet};
use ciplan_core::project::Project;
use ciplan_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// One rule of a patch alias.
///
/// Patterns are matched against whole names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AliasRule {
    /// Alias name the rule belongs to
    pub alias: String,
    /// Pattern for variant names
    pub variant: String,
    /// Pattern for task and display-task names; empty disables name matching
    #[serde(default)]
    pub task: String,
    /// Tasks carrying any of these tags match
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Source of alias rules
pub trait AliasStore: Send + Sync {
    /// Rules of `alias` for the project; empty when the alias is unknown
    fn find(&self, project: &str, alias: &str) -> Result<Vec<AliasRule>>;
}

/// Alias rules kept in memory, keyed by project and alias name
#[derive(Debug, Default)]
pub struct InMemoryAliasStore {
    rules: RwLock<HashMap<(String, String), Vec<AliasRule>>>,
}

impl InMemoryAliasStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for the project under the rule's alias name
    pub fn insert(&self, project: impl Into<String>, rule: AliasRule) -> Result<()> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| Error::alias_store("alias store lock poisoned"))?;
        rules
            .entry((project.into(), rule.alias.clone()))
            .or_default()
            .push(rule);
        Ok(())
    }

    /// Builder-style [`InMemoryAliasStore::insert`]
    pub fn with_rule(self, project: impl Into<String>, rule: AliasRule) -> Result<Self> {
        self.insert(project, rule)?;
        Ok(self)
    }
}

impl AliasStore for InMemoryAliasStore {
    fn find(&self, project: &str, alias: &str) -> Result<Vec<AliasRule>> {
        let rules = self
            .rules
            .read()
            .map_err(|_| Error::alias_store("alias store lock poisoned"))?;
        Ok(rules
            .get(&(project.to_string(), alias.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

struct CompiledRule {
    variant: Regex,
    task: Option<Regex>,
    tags: Vec<String>,
}

fn anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| Error::invalid_pattern(pattern, e))
}

fn compile(rules: Vec<AliasRule>) -> Result<Vec<CompiledRule>> {
    let mut compiled = Vec::with_capacity(rules.len());
    let mut errors = Vec::new();

    for rule in rules {
        let variant = anchored(&rule.variant);
        let task = if rule.task.is_empty() {
            Ok(None)
        } else {
            anchored(&rule.task).map(Some)
        };
        match (variant, task) {
            (Ok(variant), Ok(task)) => compiled.push(CompiledRule {
                variant,
                task,
                tags: rule.tags,
            }),
            (variant, task) => {
                errors.extend(variant.err());
                errors.extend(task.err());
            }
        }
    }

    Error::from_accumulated(errors)?;
    Ok(compiled)
}

/// Pairs selected by a project alias.
///
/// Returns the execution pairs and the display-task pairs. Unpatchable
/// tasks never match. Any malformed pattern fails the whole lookup.
pub fn pairs_for_alias(
    project: &Project,
    store: &dyn AliasStore,
    alias: &str,
) -> Result<(TVPairSet, TVPairSet)> {
    let rules = compile(store.find(&project.identifier, alias)?)?;

    let mut pairs = TVPairSet::new();
    let mut display_pairs = TVPairSet::new();

    for rule in &rules {
        for bv in &project.build_variants {
            if !rule.variant.is_match(&bv.name) {
                continue;
            }

            for task in &project.tasks {
                if !task.is_patchable() {
                    continue;
                }
                let by_name = rule.task.as_ref().is_some_and(|re| re.is_match(&task.name));
                let by_tag = task.has_any_tag(&rule.tags);
                if !(by_name || by_tag) {
                    continue;
                }
                match project.find_task_for_variant(&task.name, &bv.name) {
                    Some(unit) if !unit.is_patchable() => {
                        debug!(variant = %bv.name, task = %task.name, "Skipping unpatchable task");
                    }
                    Some(_) => pairs.push(TVPair::new(bv.name.as_str(), task.name.as_str())),
                    None => {}
                }
            }

            if let Some(task_re) = &rule.task {
                for dt in &bv.display_tasks {
                    if task_re.is_match(&dt.name) {
                        display_pairs.push(TVPair::new(bv.name.as_str(), dt.name.as_str()));
                    }
                }
            }
        }
    }

    debug!(
        alias,
        pairs = pairs.len(),
        display_pairs = display_pairs.len(),
        "Resolved alias"
    );
    Ok((pairs, display_pairs))
}
