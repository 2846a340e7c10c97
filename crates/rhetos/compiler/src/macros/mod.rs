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

//! Macro expansion to a fixed point
//!
//! Each pass evaluates every macro against every concept of its input type that
//! is in the graph when the pass starts. Evaluation only reads the graph, so it
//! may run on the rayon pool; the derived concepts are then merged one by one in
//! macro registration order and concept insertion order. Expansion ends with the
//! first pass that changes nothing.

use crate::concepts::{ConceptGraph, ConceptHandle, ConceptInfo, ConceptOrigin, GraphError, MergeOutcome};
use crate::plugin::{ConceptMacro, DslSyntax};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while expanding macros
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    #[error("Macro '{macro_name}' failed on {concept}: {message}")]
    Failed { macro_name: String, concept: String, message: String },

    #[error("Macro '{macro_name}' created an invalid concept from {concept}: {source}")]
    InvalidConcept {
        macro_name: String,
        concept: String,
        #[source]
        source: GraphError,
    },

    #[error("Macro expansion did not settle after {iterations} passes, suspected infinite derivation; last pass changed: {}", .last_delta.join(", "))]
    NonTermination { iterations: usize, last_delta: Vec<String> },
}

impl MacroError {
    pub fn code(&self) -> &'static str {
        match self {
            MacroError::Failed { .. } => "RH401",
            MacroError::InvalidConcept { .. } => "RH402",
            MacroError::NonTermination { .. } => "RH403",
        }
    }
}

/// Outcome of a successful expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Passes run, including the final pass without changes
    pub iterations: usize,
    pub created: usize,
    pub updated: usize,
}

/// Applies the macros of a DSL syntax to a concept graph
pub struct MacroExpander<'a> {
    macros: &'a [Arc<dyn ConceptMacro>],
    max_iterations: usize,
    parallel: bool,
}

/// Concepts one macro derived from one concept
struct Derivation {
    macro_index: usize,
    source: ConceptHandle,
    concepts: Vec<ConceptInfo>,
}

impl<'a> MacroExpander<'a> {
    pub fn new(syntax: &'a DslSyntax) -> Self {
        Self {
            macros: syntax.macros(),
            max_iterations: 100,
            parallel: true,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn expand(&self, graph: &mut ConceptGraph) -> Result<ExpansionReport, MacroError> {
        let mut report = ExpansionReport::default();
        let mut last_delta = Vec::new();

        loop {
            if report.iterations >= self.max_iterations {
                return Err(MacroError::NonTermination {
                    iterations: report.iterations,
                    last_delta,
                });
            }
            report.iterations += 1;

            let derivations = self.evaluate(graph)?;
            let mut delta = Vec::new();
            for derivation in derivations {
                let concept_macro = &self.macros[derivation.macro_index];
                let Some(source) = graph.get(derivation.source).map(|c| c.key.clone()) else {
                    continue;
                };
                for info in derivation.concepts {
                    let origin = ConceptOrigin::Derived {
                        macro_name: concept_macro.name().to_string(),
                        source: source.clone(),
                    };
                    let outcome = graph.insert(info, origin).map_err(|error| MacroError::InvalidConcept {
                        macro_name: concept_macro.name().to_string(),
                        concept: graph.describe_key(&source),
                        source: error,
                    })?;
                    match outcome {
                        MergeOutcome::Added(handle) => {
                            report.created += 1;
                            delta.push(handle);
                        }
                        MergeOutcome::Updated(handle) => {
                            report.updated += 1;
                            delta.push(handle);
                        }
                        MergeOutcome::Unchanged(_) => {}
                    }
                }
            }

            debug!("Macro pass {} changed {} concepts", report.iterations, delta.len());
            if delta.is_empty() {
                break;
            }
            last_delta = delta.iter().filter_map(|h| graph.get(*h)).map(|c| graph.describe(c)).collect();
        }

        info!(
            "Macro expansion finished after {} passes: {} concepts created, {} updated, {} total",
            report.iterations,
            report.created,
            report.updated,
            graph.len()
        );
        Ok(report)
    }

    /// Run every applicable macro against the current graph without modifying it
    fn evaluate(&self, graph: &ConceptGraph) -> Result<Vec<Derivation>, MacroError> {
        let work: Vec<(usize, ConceptHandle)> = self
            .macros
            .iter()
            .enumerate()
            .flat_map(|(index, concept_macro)| graph.find_by_type(concept_macro.input_type()).map(move |c| (index, c.handle)))
            .collect();

        let run = |&(macro_index, handle): &(usize, ConceptHandle)| -> Result<Derivation, MacroError> {
            let concept_macro = &self.macros[macro_index];
            let concept = graph.get(handle).ok_or_else(|| MacroError::Failed {
                macro_name: concept_macro.name().to_string(),
                concept: handle.to_string(),
                message: "concept is not in the graph".to_string(),
            })?;
            let concepts = concept_macro.create_new_concepts(concept, graph).map_err(|message| MacroError::Failed {
                macro_name: concept_macro.name().to_string(),
                concept: graph.describe(concept),
                message,
            })?;
            Ok(Derivation {
                macro_index,
                source: handle,
                concepts,
            })
        };

        if self.parallel {
            work.par_iter().map(&run).collect()
        } else {
            work.iter().map(&run).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::ConceptInfo;
    use crate::test_support::{FnMacro, SamplePlugin, entity, graph_of, module, property_key};

    fn id_property() -> FnMacro {
        FnMacro::new("EntityId", "EntityInfo", |concept, _| {
            Ok(vec![ConceptInfo::new("ShortStringInfo").with_reference("DataStructure", concept.key.clone()).with_text("Name", "ID")])
        })
    }

    fn default_length(length: &'static str) -> FnMacro {
        FnMacro::new(&format!("DefaultLength{}", length), "ShortStringInfo", move |concept, _| {
            Ok(vec![ConceptInfo::new("MaxLengthInfo").with_reference("Property", concept.key.clone()).with_text("Length", length)])
        })
    }

    fn sample_graph(syntax: &DslSyntax) -> ConceptGraph {
        graph_of(syntax.registry().clone(), vec![module("Demo"), entity("Demo", "Person")])
    }

    #[test]
    fn test_expansion_reaches_fixpoint() {
        let syntax = SamplePlugin::default().with_macro(id_property()).with_macro(default_length("256")).syntax();
        let mut graph = sample_graph(&syntax);

        let report = MacroExpander::new(&syntax).expand(&mut graph).unwrap();
        assert_eq!(report.iterations, 3);
        assert_eq!(report.created, 2);
        assert!(graph.find_by_key(&property_key("Demo", "Person", "ID")).is_some());
        let limit = graph.find_by_type("MaxLengthInfo").next().unwrap();
        assert_eq!(limit.text("Length"), Some("256"));
        assert!(matches!(limit.origin, ConceptOrigin::Derived { ref macro_name, .. } if macro_name == "DefaultLength256"));
    }

    #[test]
    fn test_second_expansion_is_idempotent() {
        let syntax = SamplePlugin::default().with_macro(id_property()).with_macro(default_length("256")).syntax();
        let mut graph = sample_graph(&syntax);
        let expander = MacroExpander::new(&syntax);
        expander.expand(&mut graph).unwrap();
        let count = graph.len();
        let snapshot = graph.snapshot();

        let report = expander.expand(&mut graph).unwrap();
        assert_eq!(report, ExpansionReport { iterations: 1, created: 0, updated: 0 });
        assert_eq!(graph.len(), count);
        assert_eq!(graph.snapshot(), snapshot);
    }

    #[test]
    fn test_independent_macros_derive_same_concept_once() {
        let twin = FnMacro::new("EntityIdTwin", "EntityInfo", |concept, _| {
            Ok(vec![ConceptInfo::new("ShortStringInfo").with_reference("DataStructure", concept.key.clone()).with_text("Name", "ID")])
        });
        let syntax = SamplePlugin::default().with_macro(id_property()).with_macro(twin).syntax();
        let mut graph = sample_graph(&syntax);
        MacroExpander::new(&syntax).expand(&mut graph).unwrap();
        assert_eq!(graph.find_by_type("PropertyInfo").count(), 1);
    }

    #[test]
    fn test_conflicting_derivations_fail() {
        let syntax = SamplePlugin::default()
            .with_macro(id_property())
            .with_macro(default_length("256"))
            .with_macro(default_length("100"))
            .syntax();
        let mut graph = sample_graph(&syntax);
        let error = MacroExpander::new(&syntax).expand(&mut graph).unwrap_err();
        match error {
            MacroError::InvalidConcept { macro_name, concept, source } => {
                assert_eq!(macro_name, "DefaultLength100");
                assert_eq!(concept, "ShortString Demo.Person.ID");
                assert!(source.is_conflict());
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_runaway_macro_is_non_terminating() {
        let runaway = FnMacro::new("Clone", "EntityInfo", |concept, _| {
            let name = format!("{}X", concept.text("Name").unwrap_or_default());
            Ok(vec![ConceptInfo::new("EntityInfo").with_reference("Module", concept.reference("Module").cloned().unwrap()).with_text("Name", name)])
        });
        let syntax = SamplePlugin::default().with_macro(runaway).syntax();
        let mut graph = sample_graph(&syntax);
        let error = MacroExpander::new(&syntax).with_max_iterations(5).expand(&mut graph).unwrap_err();
        match &error {
            MacroError::NonTermination { iterations, last_delta } => {
                assert_eq!(*iterations, 5);
                assert!(last_delta.contains(&"Entity Demo.PersonXXXXX".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(error.code(), "RH403");
    }

    #[test]
    fn test_macro_failure_names_concept() {
        let failing = FnMacro::new("Failing", "EntityInfo", |_, _| Err("no storage configured".to_string()));
        let syntax = SamplePlugin::default().with_macro(failing).syntax();
        let mut graph = sample_graph(&syntax);
        let error = MacroExpander::new(&syntax).expand(&mut graph).unwrap_err();
        assert_eq!(error.to_string(), "Macro 'Failing' failed on Entity Demo.Person: no storage configured");
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let syntax = SamplePlugin::default().with_macro(id_property()).with_macro(default_length("256")).syntax();
        let mut parallel = sample_graph(&syntax);
        let mut sequential = sample_graph(&syntax);
        MacroExpander::new(&syntax).with_parallel(true).expand(&mut parallel).unwrap();
        MacroExpander::new(&syntax).with_parallel(false).expand(&mut sequential).unwrap();
        let order = |g: &ConceptGraph| g.iter().map(|c| g.describe(c)).collect::<Vec<_>>();
        assert_eq!(order(&parallel), order(&sequential));
    }
}
