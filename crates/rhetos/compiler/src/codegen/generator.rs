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

//! Code generation over the resolved concept order

use super::builder::{CodeBuilder, GeneratedSourceSet};
use super::error::CodegenError;
use crate::concepts::{ConceptGraph, ConceptHandle};
use crate::dependency_analysis::DependencyResolver;
use crate::plugin::DslSyntax;
use tracing::{debug, info};

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub sources: GeneratedSourceSet,
    /// Final concept order, including edges discovered from tag writes
    pub order: Vec<ConceptHandle>,
    pub invocations: usize,
}

/// Runs every applicable generator for every concept
///
/// Generation runs twice. The first run follows the order implied by concept
/// references and `DependsOn` concepts and only records which concepts write
/// into tags of other concepts. Those writes become extra ordering edges, and
/// the second run over the refined order produces the output.
pub struct CodeGenerator<'a> {
    syntax: &'a DslSyntax,
    file_header: Option<String>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(syntax: &'a DslSyntax) -> Self {
        Self { syntax, file_header: None }
    }

    pub fn with_file_header(mut self, file_header: Option<String>) -> Self {
        self.file_header = file_header;
        self
    }

    pub fn generate(&self, graph: &ConceptGraph) -> Result<GenerationOutput, CodegenError> {
        let provisional = DependencyResolver::new(graph).resolve()?;
        let mut dry_run = CodeBuilder::new(graph);
        self.run(graph, &provisional, &mut dry_run)?;
        let discovered: Vec<_> = dry_run.dependency_edges().collect();
        debug!("Dry run discovered {} tag ordering edges", discovered.len());

        let order = DependencyResolver::new(graph).with_edges(discovered).resolve()?;
        let mut builder = CodeBuilder::new(graph);
        let invocations = self.run(graph, &order, &mut builder)?;
        let sources = builder.finish(self.file_header.as_deref())?;

        info!(
            "Generated {} files from {} concepts ({} generator invocations)",
            sources.files.len(),
            order.len(),
            invocations
        );
        Ok(GenerationOutput { sources, order, invocations })
    }

    fn run(&self, graph: &ConceptGraph, order: &[ConceptHandle], builder: &mut CodeBuilder<'_>) -> Result<usize, CodegenError> {
        let mut invocations = 0;
        for &handle in order {
            let Some(concept) = graph.get(handle) else {
                continue;
            };
            for generator in self.syntax.generators().for_type(concept.type_name()) {
                builder.begin(generator.name(), concept);
                let result = generator.generate_code(concept, builder);
                builder.end();
                result.map_err(|message| CodegenError::GeneratorFailed {
                    generator: generator.name().to_string(),
                    concept: graph.describe(concept),
                    message,
                })?;
                if let Some(error) = builder.take_error() {
                    return Err(error);
                }
                invocations += 1;
            }
        }
        Ok(invocations)
    }
}
