//! Pair dependency graph using petgraph.
//!
//! Nodes are task/variant pairs. An edge runs from a dependency to the pair
//! that depends on it, so a topological order is an execution order.

use crate::error::GraphError;
use crate::pairs::TVPair;
use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use std::collections::HashMap;
use tracing::debug;

/// Dependency graph over task/variant pairs
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<TVPair, ()>,
    pair_to_node: HashMap<TVPair, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair, returning the existing node if it is already present.
    pub fn add_pair(&mut self, pair: &TVPair) -> NodeIndex {
        if let Some(&node) = self.pair_to_node.get(pair) {
            return node;
        }
        let node = self.graph.add_node(pair.clone());
        self.pair_to_node.insert(pair.clone(), node);
        debug!(pair = %pair, "Added pair node");
        node
    }

    /// Record that `dependent` waits for `dependency`, adding either pair
    /// if needed. Repeated edges are ignored.
    pub fn add_dependency(&mut self, dependent: &TVPair, dependency: &TVPair) {
        let from = self.add_pair(dependency);
        let to = self.add_pair(dependent);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Whether the pair is in the graph.
    #[must_use]
    pub fn contains(&self, pair: &TVPair) -> bool {
        self.pair_to_node.contains_key(pair)
    }

    /// Number of pairs in the graph.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Pairs in execution order: every pair comes after its dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn topological_sort(&self) -> Result<Vec<TVPair>, GraphError> {
        toposort(&self.graph, None)
            .map(|sorted| {
                sorted
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect()
            })
            .map_err(|cycle| GraphError::CycleDetected {
                pair: self.graph[cycle.node_id()].to_string(),
            })
    }

    /// Direct dependencies of a pair, sorted.
    #[must_use]
    pub fn dependencies_of(&self, pair: &TVPair) -> Vec<TVPair> {
        let Some(&node) = self.pair_to_node.get(pair) else {
            return Vec::new();
        };
        let mut deps: Vec<TVPair> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|idx| self.graph[idx].clone())
            .collect();
        deps.sort();
        deps
    }

    /// Every pair `pair` transitively waits for, sorted.
    #[must_use]
    pub fn transitive_dependencies(&self, pair: &TVPair) -> Vec<TVPair> {
        let Some(&start) = self.pair_to_node.get(pair) else {
            return Vec::new();
        };
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, start);
        let mut deps = Vec::new();
        while let Some(idx) = bfs.next(reversed) {
            if idx != start {
                deps.push(self.graph[idx].clone());
            }
        }
        deps.sort();
        deps
    }

    /// Iterate over all pairs in insertion order.
    pub fn iter_pairs(&self) -> impl Iterator<Item = &TVPair> {
        self.graph.node_weights()
    }
}
