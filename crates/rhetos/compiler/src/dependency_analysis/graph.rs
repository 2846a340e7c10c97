// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Concept dependency graph representation

use crate::concepts::ConceptHandle;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed graph over concept handles; an edge runs from a dependency to its dependent
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<ConceptHandle, ()>,
    indices: HashMap<ConceptHandle, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if not exists, returns its index
    pub fn add_node(&mut self, handle: ConceptHandle) -> NodeIndex {
        if let Some(&index) = self.indices.get(&handle) {
            return index;
        }
        let index = self.graph.add_node(handle);
        self.indices.insert(handle, index);
        index
    }

    /// Record that `dependent` must come after `dependency`; repeated edges are stored once
    pub fn add_edge(&mut self, dependency: ConceptHandle, dependent: ConceptHandle) -> bool {
        let from = self.add_node(dependency);
        let to = self.add_node(dependent);
        if self.graph.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    pub fn contains_edge(&self, dependency: ConceptHandle, dependent: ConceptHandle) -> bool {
        match (self.indices.get(&dependency), self.indices.get(&dependent)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Concepts that must precede `handle`, sorted
    pub fn dependencies_of(&self, handle: ConceptHandle) -> Vec<ConceptHandle> {
        self.neighbors(handle, Direction::Incoming)
    }

    /// Concepts that must follow `handle`, sorted
    pub fn dependents_of(&self, handle: ConceptHandle) -> Vec<ConceptHandle> {
        self.neighbors(handle, Direction::Outgoing)
    }

    fn neighbors(&self, handle: ConceptHandle, direction: Direction) -> Vec<ConceptHandle> {
        let Some(&index) = self.indices.get(&handle) else {
            return Vec::new();
        };
        let mut handles: Vec<_> = self.graph.neighbors_directed(index, direction).map(|n| self.graph[n]).collect();
        handles.sort();
        handles.dedup();
        handles
    }

    pub(crate) fn inner(&self) -> &DiGraph<ConceptHandle, ()> {
        &self.graph
    }

    pub(crate) fn index_of(&self, handle: ConceptHandle) -> Option<NodeIndex> {
        self.indices.get(&handle).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_deduplicated() {
        let mut graph = DependencyGraph::new();
        assert!(graph.add_edge(ConceptHandle(0), ConceptHandle(1)));
        assert!(!graph.add_edge(ConceptHandle(0), ConceptHandle(1)));
        assert!(graph.add_edge(ConceptHandle(2), ConceptHandle(1)));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependencies_of(ConceptHandle(1)), vec![ConceptHandle(0), ConceptHandle(2)]);
        assert_eq!(graph.dependents_of(ConceptHandle(0)), vec![ConceptHandle(1)]);
        assert!(graph.contains_edge(ConceptHandle(2), ConceptHandle(1)));
        assert!(!graph.contains_edge(ConceptHandle(1), ConceptHandle(2)));
    }
}
