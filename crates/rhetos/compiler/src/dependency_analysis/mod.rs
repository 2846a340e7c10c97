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

//! Dependency ordering of the concept graph
//!
//! Edges come from three sources: every concept-valued member (the referenced
//! concept comes first), every `DependsOn` concept, and whatever extra edges the
//! code generator discovers during its dry run. The order is computed with
//! Kahn's algorithm, taking the lowest ready handle first so independent
//! concepts keep their declaration order.

pub mod graph;

pub use graph::DependencyGraph;

use crate::concepts::{ConceptGraph, ConceptHandle, DEPENDENT_MEMBER, DEPENDS_ON_MEMBER, DEPENDS_ON_TYPE, MemberValue};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    /// Shortest cycle through the lowest involved concept, first entry repeated at the end
    #[error("Circular dependency: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

impl DependencyError {
    pub fn code(&self) -> &'static str {
        match self {
            DependencyError::Cycle { .. } => "RH601",
        }
    }
}

/// Computes a total order over the concepts of one graph
pub struct DependencyResolver<'a> {
    concepts: &'a ConceptGraph,
    edges: DependencyGraph,
}

impl<'a> DependencyResolver<'a> {
    /// Resolver seeded with the member references and `DependsOn` concepts of the graph
    pub fn new(concepts: &'a ConceptGraph) -> Self {
        let mut edges = DependencyGraph::new();
        for concept in concepts.iter() {
            edges.add_node(concept.handle);
            for value in concept.info.members.values() {
                let MemberValue::Concept(key) = value else {
                    continue;
                };
                // Dangling references are reported by validation
                if let Some(target) = concepts.find_by_key(key) {
                    if target.handle != concept.handle {
                        edges.add_edge(target.handle, concept.handle);
                    }
                }
            }
            if concept.type_name() == DEPENDS_ON_TYPE {
                let dependent = concept.reference(DEPENDENT_MEMBER).and_then(|key| concepts.find_by_key(key));
                let dependency = concept.reference(DEPENDS_ON_MEMBER).and_then(|key| concepts.find_by_key(key));
                if let (Some(dependent), Some(dependency)) = (dependent, dependency) {
                    edges.add_edge(dependency.handle, dependent.handle);
                }
            }
        }
        debug!("Dependency graph: {} concepts, {} edges", edges.node_count(), edges.edge_count());
        Self { concepts, edges }
    }

    /// Add an extra ordering constraint
    pub fn add_edge(&mut self, dependency: ConceptHandle, dependent: ConceptHandle) -> bool {
        self.edges.add_edge(dependency, dependent)
    }

    pub fn with_edges(mut self, edges: impl IntoIterator<Item = (ConceptHandle, ConceptHandle)>) -> Self {
        for (dependency, dependent) in edges {
            self.edges.add_edge(dependency, dependent);
        }
        self
    }

    pub fn edges(&self) -> &DependencyGraph {
        &self.edges
    }

    /// Every concept exactly once, each after all of its dependencies
    pub fn resolve(&self) -> Result<Vec<ConceptHandle>, DependencyError> {
        let graph = self.edges.inner();
        let mut in_degree: HashMap<NodeIndex, usize> =
            graph.node_indices().map(|node| (node, graph.edges_directed(node, Direction::Incoming).count())).collect();

        let mut ready: BinaryHeap<Reverse<ConceptHandle>> = in_degree.iter().filter(|&(_, &degree)| degree == 0).map(|(&node, _)| Reverse(graph[node])).collect();
        let mut order = Vec::with_capacity(graph.node_count());

        while let Some(Reverse(handle)) = ready.pop() {
            order.push(handle);
            let Some(node) = self.edges.index_of(handle) else {
                continue;
            };
            for edge in graph.edges_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&edge.target()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(graph[edge.target()]));
                    }
                }
            }
        }

        if order.len() < graph.node_count() {
            let path = self.find_cycle().into_iter().map(|handle| self.describe(handle)).collect();
            return Err(DependencyError::Cycle { path });
        }

        info!("Resolved dependency order of {} concepts ({} edges)", order.len(), graph.edge_count());
        Ok(order)
    }

    fn describe(&self, handle: ConceptHandle) -> String {
        match self.concepts.get(handle) {
            Some(concept) => self.concepts.describe(concept),
            None => handle.to_string(),
        }
    }

    /// Shortest cycle through the lowest handle of the first cyclic component
    fn find_cycle(&self) -> Vec<ConceptHandle> {
        let graph = self.edges.inner();
        let component = tarjan_scc(graph)
            .into_iter()
            .filter(|component| component.len() > 1 || graph.contains_edge(component[0], component[0]))
            .min_by_key(|component| component.iter().map(|&node| graph[node]).min());
        let Some(component) = component else {
            return Vec::new();
        };
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let Some(start) = component.iter().copied().min_by_key(|&node| graph[node]) else {
            return Vec::new();
        };

        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let mut targets: Vec<NodeIndex> = graph.neighbors_directed(node, Direction::Outgoing).filter(|target| members.contains(target)).collect();
            targets.sort_by_key(|&target| graph[target]);
            for target in targets {
                if target == start {
                    let mut path = vec![graph[start]];
                    let mut current = node;
                    while current != start {
                        path.push(graph[current]);
                        match previous.get(&current) {
                            Some(&parent) => current = parent,
                            None => break,
                        }
                    }
                    path.push(graph[start]);
                    path.reverse();
                    return path;
                }
                if previous.contains_key(&target) {
                    continue;
                }
                previous.insert(target, node);
                queue.push_back(target);
            }
        }
        vec![graph[start], graph[start]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::ConceptInfo;
    use crate::test_support::{data_structure_key, depends_on, entity, graph_of, module, sample_registry, short_string};
    use proptest::prelude::*;

    #[test]
    fn test_references_come_first() {
        let graph = graph_of(sample_registry(), vec![short_string("Demo", "Person", "Name"), entity("Demo", "Person"), module("Demo")]);
        let order = DependencyResolver::new(&graph).resolve().unwrap();
        assert_eq!(order, vec![ConceptHandle(2), ConceptHandle(1), ConceptHandle(0)]);
    }

    #[test]
    fn test_independent_concepts_keep_declaration_order() {
        let graph = graph_of(sample_registry(), vec![module("C"), module("A"), module("B")]);
        let order = DependencyResolver::new(&graph).resolve().unwrap();
        assert_eq!(order, vec![ConceptHandle(0), ConceptHandle(1), ConceptHandle(2)]);
    }

    #[test]
    fn test_explicit_depends_on() {
        let graph = graph_of(
            sample_registry(),
            vec![
                module("Demo"),
                entity("Demo", "A"),
                entity("Demo", "B"),
                depends_on(data_structure_key("Demo", "A"), data_structure_key("Demo", "B")),
            ],
        );
        let order = DependencyResolver::new(&graph).resolve().unwrap();
        assert_eq!(order, vec![ConceptHandle(0), ConceptHandle(2), ConceptHandle(1), ConceptHandle(3)]);
    }

    #[test]
    fn test_cycle_names_both_concepts() {
        let graph = graph_of(
            sample_registry(),
            vec![
                module("Demo"),
                entity("Demo", "A"),
                entity("Demo", "B"),
                depends_on(data_structure_key("Demo", "A"), data_structure_key("Demo", "B")),
                depends_on(data_structure_key("Demo", "B"), data_structure_key("Demo", "A")),
            ],
        );
        let error = DependencyResolver::new(&graph).resolve().unwrap_err();
        assert_eq!(
            error,
            DependencyError::Cycle {
                path: vec!["Entity Demo.A".to_string(), "Entity Demo.B".to_string(), "Entity Demo.A".to_string()]
            }
        );
        assert_eq!(error.to_string(), "Circular dependency: Entity Demo.A -> Entity Demo.B -> Entity Demo.A");
        assert_eq!(error.code(), "RH601");
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let graph = graph_of(
            sample_registry(),
            vec![module("Demo"), entity("Demo", "A"), depends_on(data_structure_key("Demo", "A"), data_structure_key("Demo", "A"))],
        );
        let error = DependencyResolver::new(&graph).resolve().unwrap_err();
        assert_eq!(error.to_string(), "Circular dependency: Entity Demo.A -> Entity Demo.A");
    }

    #[test]
    fn test_cycle_reports_shortest_path() {
        let graph = graph_of(sample_registry(), vec![module("A"), module("B"), module("C")]);
        let error = DependencyResolver::new(&graph)
            .with_edges([
                (ConceptHandle(0), ConceptHandle(1)),
                (ConceptHandle(1), ConceptHandle(2)),
                (ConceptHandle(2), ConceptHandle(0)),
                (ConceptHandle(1), ConceptHandle(0)),
            ])
            .resolve()
            .unwrap_err();
        assert_eq!(error.to_string(), "Circular dependency: Module A -> Module B -> Module A");
    }

    #[test]
    fn test_dangling_reference_is_ignored() {
        let graph = graph_of(sample_registry(), vec![entity("Missing", "Person")]);
        assert_eq!(DependencyResolver::new(&graph).resolve().unwrap(), vec![ConceptHandle(0)]);
    }

    proptest! {
        #[test]
        fn prop_order_respects_every_edge(size in 1usize..24, raw_edges in prop::collection::vec((0usize..24, 0usize..24), 0..60)) {
            let infos: Vec<ConceptInfo> = (0..size).map(|i| module(&format!("M{}", i))).collect();
            let graph = graph_of(sample_registry(), infos);
            let edges: Vec<(ConceptHandle, ConceptHandle)> = raw_edges
                .into_iter()
                .map(|(a, b)| (a % size, b % size))
                .filter(|(a, b)| a != b)
                .map(|(a, b)| if a < b { (ConceptHandle(a), ConceptHandle(b)) } else { (ConceptHandle(b), ConceptHandle(a)) })
                .collect();
            let order = DependencyResolver::new(&graph).with_edges(edges.clone()).resolve().unwrap();

            prop_assert_eq!(order.len(), size);
            let position: HashMap<ConceptHandle, usize> = order.iter().enumerate().map(|(i, &h)| (h, i)).collect();
            for (dependency, dependent) in edges {
                prop_assert!(position[&dependency] < position[&dependent]);
            }
        }
    }
}
