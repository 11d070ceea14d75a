//! Core model for the ciplan configuration resolver.
//!
//! This crate holds the declarative project model and everything that can
//! be answered from a single project snapshot:
//!
//! - [`project`]: build variants, tasks, task groups, display tasks, the
//!   override merge and structural lookups and validation
//! - [`context`]: read-only version, patch and running-task records
//! - [`expansions`]: the key/value map handed to the task executor
//! - [`loader`]: the [`loader::ConfigLoader`] interface and a YAML loader
//! - [`config`]: resolver settings
//!
//! Graph construction (pair selection, aliases, display expansion,
//! dependency closure and task IDs) lives in `ciplan-task-graph`.
//!
//! # Example
//!
//! ```ignore
//! use ciplan_core::loader::{ConfigLoader, YamlConfigLoader};
//!
//! let project = YamlConfigLoader::new().load(document, "my-project")?;
//! let unit = project.find_task_for_variant("test", "linux");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod expansions;
pub mod loader;
pub mod project;

#[cfg(test)]
mod test_utils;

pub use error::{EntityKind, Error, Result};
