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

//! Code generator table, ordered once when the DSL syntax is built

use crate::concepts::{ConceptTypeRegistry, RegistryError};
use crate::plugin::ConceptCodeGenerator;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Generators in execution order, indexed by the concrete concept types they apply to
///
/// A generator runs after every generator it depends on; otherwise registration
/// order is kept.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: Vec<Arc<dyn ConceptCodeGenerator>>,
    by_type: HashMap<String, Vec<usize>>,
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry").field("generators", &self.names()).finish()
    }
}

impl GeneratorRegistry {
    pub fn build(registry: &ConceptTypeRegistry, generators: Vec<Arc<dyn ConceptCodeGenerator>>) -> Result<Self, RegistryError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::new();
        for (index, generator) in generators.iter().enumerate() {
            if node_indices.insert(generator.name().to_string(), graph.add_node(index)).is_some() {
                return Err(RegistryError::DuplicatePluginName {
                    kind: "Generator",
                    name: generator.name().to_string(),
                });
            }
        }
        for generator in &generators {
            let to = node_indices[generator.name()];
            for dependency in generator.depends_on() {
                let Some(&from) = node_indices.get(&dependency) else {
                    return Err(RegistryError::UnknownGeneratorDependency {
                        generator: generator.name().to_string(),
                        dependency,
                    });
                };
                graph.update_edge(from, to, ());
            }
        }
        if let Err(cycle) = toposort(&graph, None) {
            return Err(RegistryError::GeneratorCycle(generators[graph[cycle.node_id()]].name().to_string()));
        }

        // Kahn with the registration index as tie-break
        let mut in_degree: Vec<usize> = graph.node_indices().map(|node| graph.edges_directed(node, Direction::Incoming).count()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..generators.len()).filter(|&i| in_degree[i] == 0).map(Reverse).collect();
        let mut order = Vec::with_capacity(generators.len());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for edge in graph.edges_directed(NodeIndex::new(index), Direction::Outgoing) {
                let target = graph[edge.target()];
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }

        let mut slots: Vec<Option<Arc<dyn ConceptCodeGenerator>>> = generators.into_iter().map(Some).collect();
        let generators: Vec<Arc<dyn ConceptCodeGenerator>> = order.iter().filter_map(|&index| slots[index].take()).collect();

        let mut by_type = HashMap::new();
        for concept_type in registry.iter() {
            let applicable: Vec<usize> = generators
                .iter()
                .enumerate()
                .filter(|(_, generator)| concept_type.is_a(generator.implements()))
                .map(|(position, _)| position)
                .collect();
            if !applicable.is_empty() {
                by_type.insert(concept_type.name.clone(), applicable);
            }
        }

        Ok(Self { generators, by_type })
    }

    /// Generators applying to a concrete concept type, in execution order
    pub fn for_type<'a>(&'a self, type_name: &str) -> impl Iterator<Item = &'a Arc<dyn ConceptCodeGenerator>> + 'a {
        let positions = self.by_type.get(type_name).map(Vec::as_slice).unwrap_or_default();
        positions.iter().map(|&position| &self.generators[position])
    }

    /// All generators in execution order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ConceptCodeGenerator>> {
        self.generators.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FnGenerator, sample_registry};

    fn generator(name: &str, implements: &str) -> FnGenerator {
        FnGenerator::new(name, implements, |_, _| Ok(()))
    }

    fn build(generators: Vec<FnGenerator>) -> Result<GeneratorRegistry, RegistryError> {
        let generators = generators.into_iter().map(|g| Arc::new(g) as Arc<dyn ConceptCodeGenerator>).collect();
        GeneratorRegistry::build(&sample_registry(), generators)
    }

    #[test]
    fn test_dependencies_reorder_generators() {
        let registry = build(vec![
            generator("Attributes", "PropertyInfo").after("Properties"),
            generator("Classes", "DataStructureInfo"),
            generator("Properties", "PropertyInfo"),
        ])
        .unwrap();
        assert_eq!(registry.names(), vec!["Classes", "Properties", "Attributes"]);
        assert_eq!(format!("{:?}", registry), r#"GeneratorRegistry { generators: ["Classes", "Properties", "Attributes"] }"#);
    }

    #[test]
    fn test_generators_match_derived_types() {
        let registry = build(vec![generator("Properties", "PropertyInfo"), generator("Strings", "ShortStringInfo")]).unwrap();
        let names = |type_name: &str| registry.for_type(type_name).map(|g| g.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names("ShortStringInfo"), vec!["Properties", "Strings"]);
        assert_eq!(names("IntegerInfo"), vec!["Properties"]);
        assert!(names("ModuleInfo").is_empty());
    }

    #[test]
    fn test_invalid_registrations() {
        let unknown = build(vec![generator("A", "ModuleInfo").after("Missing")]).unwrap_err();
        assert_eq!(unknown.code(), "RH213");

        let duplicate = build(vec![generator("A", "ModuleInfo"), generator("A", "EntityInfo")]).unwrap_err();
        assert!(matches!(duplicate, RegistryError::DuplicatePluginName { kind: "Generator", .. }));

        let cycle = build(vec![generator("A", "ModuleInfo").after("B"), generator("B", "ModuleInfo").after("A")]).unwrap_err();
        assert!(matches!(cycle, RegistryError::GeneratorCycle(_)));
    }
}
