//! Task/variant graph construction for ciplan.
//!
//! This crate turns a [`ciplan_core::project::Project`] and a selection
//! request into the flat set of task instances a scheduler runs, and gives
//! each one a stable identifier.
//!
//! # Key Types
//!
//! - [`TVPair`] / [`TVPairSet`]: one task on one variant, and ordered sets of them
//! - [`TaskVariantPairs`]: execution and display pairs of a version
//! - [`DependencyGraph`]: pairs and their dependency edges, backed by petgraph
//! - [`TaskIdTable`] / [`TaskIdConfig`]: generated IDs keyed by pair
//! - [`Resolver`]: the entry point, with injected [`AliasStore`] and
//!   [`DependencyCloser`]
//!
//! # Example
//!
//! ```ignore
//! use ciplan_core::config::ResolverConfig;
//! use ciplan_task_graph::Resolver;
//!
//! let resolver = Resolver::from_config(ResolverConfig::default());
//! let resolution = resolver.resolve(&project, &version, Some(&patch), "")?;
//! for (pair, id) in resolution.ids.execution_tasks.iter() {
//!     println!("{pair} -> {id}");
//! }
//! ```

mod alias;
mod closure;
mod display;
mod error;
mod graph;
mod pairs;
mod resolver;
mod selector;
mod task_id;

pub use alias::{AliasRule, AliasStore, InMemoryAliasStore, pairs_for_alias};
pub use closure::{DependencyCloser, DependsOnCloser};
pub use display::expand_display_tasks;
pub use error::GraphError;
pub use graph::DependencyGraph;
pub use pairs::{TVPair, TVPairSet, TaskVariantPairs};
pub use resolver::{
    Resolution, ResolutionRequest, Resolver, build_project_tv_pairs, mainline_pairs,
};
pub use selector::{ALL, expand_task_wildcard, expand_variant_wildcard, select_pairs};
pub use task_id::{
    DISPLAY_TASK_PREFIX, TaskIdConfig, TaskIdTable, clean_name, generate_id, id_revision,
    new_patch_task_id_table, new_task_id_table,
};
