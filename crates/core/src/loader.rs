//! Turning configuration documents into a [`Project`]

use crate::project::Project;
use crate::Result;

/// Parses a raw configuration document into a project
pub trait ConfigLoader: Send + Sync {
    /// Load the document, tagging the project with `identifier`
    fn load(&self, document: &[u8], identifier: &str) -> Result<Project>;
}

/// Loader for YAML project documents
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConfigLoader;

impl YamlConfigLoader {
    /// Create a new YAML loader
    pub fn new() -> Self {
        Self
    }
}

impl ConfigLoader for YamlConfigLoader {
    #[tracing::instrument(name = "load_project", skip(self, document), fields(bytes = document.len()))]
    fn load(&self, document: &[u8], identifier: &str) -> Result<Project> {
        let mut project: Project = serde_yaml::from_slice(document)?;
        project.identifier = identifier.to_string();
        mark_task_groups(&mut project);

        tracing::debug!(
            variants = project.build_variants.len(),
            tasks = project.tasks.len(),
            task_groups = project.task_groups.len(),
            "Loaded project"
        );
        Ok(project)
    }
}

/// Flag every variant task unit that names a task group
fn mark_task_groups(project: &mut Project) {
    let groups: Vec<String> = project
        .task_groups
        .iter()
        .map(|tg| tg.name.clone())
        .collect();

    for bv in project.build_variants.iter_mut() {
        for unit in &mut bv.tasks {
            if groups.contains(&unit.name) {
                unit.is_group = true;
                unit.group_name = Some(unit.name.clone());
            }
        }
    }
}
