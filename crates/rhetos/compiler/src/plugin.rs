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

//! Plugin contract and the DSL syntax built from it
//!
//! Every concept type, macro, validator and code generator enters the compiler
//! through a [`ConceptPlugin`]. A [`PluginSet`] is assembled once at startup and
//! turned into an immutable [`DslSyntax`], which is then passed by reference to
//! every build stage.

use crate::codegen::{CodeBuilder, GeneratorRegistry};
use crate::concepts::{Concept, ConceptGraph, ConceptInfo, ConceptType, ConceptTypeRegistry, RegistryError, core_concept_types};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Derives new concepts from one concept of its input type
pub trait ConceptMacro: Send + Sync {
    fn name(&self) -> &str;

    /// Concept type the macro applies to, including derived types
    fn input_type(&self) -> &str;

    /// Concepts to merge into the graph; returning an existing concept is a no-op
    fn create_new_concepts(&self, concept: &Concept, graph: &ConceptGraph) -> Result<Vec<ConceptInfo>, String>;
}

/// Checks a cross-concept invariant after expansion
pub trait ConceptValidator: Send + Sync {
    fn name(&self) -> &str;

    fn input_type(&self) -> &str;

    fn validate(&self, concept: &Concept, graph: &ConceptGraph) -> Result<(), String>;
}

/// Contributes code for one concept into named tags
pub trait ConceptCodeGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Concept type the generator implements, including derived types
    fn implements(&self) -> &str;

    /// Generators that must run before this one for the same concept
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String>;
}

/// A package of DSL extensions
pub trait ConceptPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn concept_types(&self) -> Vec<ConceptType>;

    fn macros(&self) -> Vec<Arc<dyn ConceptMacro>> {
        Vec::new()
    }

    fn validators(&self) -> Vec<Arc<dyn ConceptValidator>> {
        Vec::new()
    }

    fn generators(&self) -> Vec<Arc<dyn ConceptCodeGenerator>> {
        Vec::new()
    }
}

/// Plugins in registration order
#[derive(Default, Clone)]
pub struct PluginSet {
    plugins: Vec<Arc<dyn ConceptPlugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, plugin: impl ConceptPlugin + 'static) -> Self {
        self.register(Arc::new(plugin));
        self
    }

    pub fn register(&mut self, plugin: Arc<dyn ConceptPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Build the immutable DSL syntax; built-in concept types come first
    pub fn build(&self) -> Result<DslSyntax, RegistryError> {
        let mut types = core_concept_types();
        for plugin in &self.plugins {
            types.extend(plugin.concept_types());
        }
        let registry = Arc::new(ConceptTypeRegistry::build(types)?);

        let mut macros = Vec::new();
        let mut validators = Vec::new();
        let mut generators = Vec::new();
        let mut macro_names = HashSet::new();
        let mut validator_names = HashSet::new();

        for plugin in &self.plugins {
            for concept_macro in plugin.macros() {
                check_plugin_type(&registry, plugin.name(), "Macro", concept_macro.name(), concept_macro.input_type())?;
                if !macro_names.insert(concept_macro.name().to_string()) {
                    return Err(RegistryError::DuplicatePluginName {
                        kind: "Macro",
                        name: concept_macro.name().to_string(),
                    });
                }
                macros.push(concept_macro);
            }
            for validator in plugin.validators() {
                check_plugin_type(&registry, plugin.name(), "Validator", validator.name(), validator.input_type())?;
                if !validator_names.insert(validator.name().to_string()) {
                    return Err(RegistryError::DuplicatePluginName {
                        kind: "Validator",
                        name: validator.name().to_string(),
                    });
                }
                validators.push(validator);
            }
            for generator in plugin.generators() {
                check_plugin_type(&registry, plugin.name(), "Generator", generator.name(), generator.implements())?;
                generators.push(generator);
            }
        }

        let generators = GeneratorRegistry::build(&registry, generators)?;

        info!(
            "DSL syntax built from {} plugins: {} concept types, {} macros, {} validators, {} generators",
            self.plugins.len(),
            registry.len(),
            macros.len(),
            validators.len(),
            generators.len()
        );

        Ok(DslSyntax {
            registry,
            macros,
            validators,
            generators,
            plugin_names: self.plugins.iter().map(|p| p.name().to_string()).collect(),
        })
    }
}

fn check_plugin_type(registry: &ConceptTypeRegistry, plugin: &str, kind: &'static str, name: &str, type_name: &str) -> Result<(), RegistryError> {
    if registry.contains(type_name) {
        return Ok(());
    }
    Err(RegistryError::UnknownPluginType {
        plugin: plugin.to_string(),
        kind,
        name: name.to_string(),
        type_name: type_name.to_string(),
    })
}

/// Everything the build stages need to know about the DSL, fixed for the process lifetime
pub struct DslSyntax {
    registry: Arc<ConceptTypeRegistry>,
    macros: Vec<Arc<dyn ConceptMacro>>,
    validators: Vec<Arc<dyn ConceptValidator>>,
    generators: GeneratorRegistry,
    plugin_names: Vec<String>,
}

impl DslSyntax {
    pub fn registry(&self) -> &Arc<ConceptTypeRegistry> {
        &self.registry
    }

    /// Macros in registration order
    pub fn macros(&self) -> &[Arc<dyn ConceptMacro>] {
        &self.macros
    }

    pub fn validators(&self) -> &[Arc<dyn ConceptValidator>] {
        &self.validators
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    pub fn plugin_names(&self) -> &[String] {
        &self.plugin_names
    }

    /// Empty concept graph over this syntax
    pub fn new_graph(&self) -> ConceptGraph {
        ConceptGraph::new(Arc::clone(&self.registry))
    }
}

impl fmt::Debug for DslSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DslSyntax")
            .field("plugins", &self.plugin_names)
            .field("concept_types", &self.registry.len())
            .field("macros", &self.macros.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("validators", &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>())
            .field("generators", &self.generators.names())
            .finish()
    }
}
