//! Error types for dependency graph operations.

use thiserror::Error;

/// Errors raised by [`crate::DependencyGraph`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected in dependency graph at '{pair}'")]
    CycleDetected {
        /// A pair that takes part in the cycle.
        pair: String,
    },
}

impl From<GraphError> for ciplan_core::Error {
    fn from(err: GraphError) -> Self {
        Self::configuration(err.to_string())
    }
}
