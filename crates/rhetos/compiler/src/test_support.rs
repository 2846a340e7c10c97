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

//! Helpers for building ad hoc concept registries, graphs and plugins in tests

use crate::codegen::CodeBuilder;
use crate::concepts::{Concept, ConceptGraph, ConceptInfo, ConceptKey, ConceptMember, ConceptOrigin, ConceptType, ConceptTypeRegistry, KeyValue, core_concept_types};
use crate::plugin::{ConceptCodeGenerator, ConceptMacro, ConceptPlugin, ConceptValidator, DslSyntax, PluginSet};
use std::sync::Arc;

/// Small module/entity/property schema shaped like the common concepts
pub fn sample_types() -> Vec<ConceptType> {
    let property = |name: &str, keyword: &str| ConceptType::new(name).keyword(keyword).derives_from("PropertyInfo");
    vec![
        ConceptType::new("ModuleInfo").keyword("Module").member(ConceptMember::key_text("Name")),
        ConceptType::new("DataStructureInfo")
            .member(ConceptMember::key_reference("Module", "ModuleInfo"))
            .member(ConceptMember::key_text("Name")),
        ConceptType::new("EntityInfo").keyword("Entity").derives_from("DataStructureInfo"),
        ConceptType::new("PropertyInfo")
            .member(ConceptMember::key_reference("DataStructure", "DataStructureInfo"))
            .member(ConceptMember::key_text("Name")),
        property("ShortStringInfo", "ShortString"),
        property("IntegerInfo", "Integer"),
        property("ReferenceInfo", "Reference").member(ConceptMember::reference("Referenced", "DataStructureInfo")),
        ConceptType::new("MaxLengthInfo")
            .keyword("MaxLength")
            .member(ConceptMember::key_reference("Property", "PropertyInfo"))
            .member(ConceptMember::text("Length")),
    ]
}

/// Registry of the built-in and sample concept types
pub fn sample_registry() -> Arc<ConceptTypeRegistry> {
    registry_with(Vec::new())
}

/// Registry of the built-in, sample and extra concept types
pub fn registry_with(extra: Vec<ConceptType>) -> Arc<ConceptTypeRegistry> {
    let mut types = core_concept_types();
    types.extend(sample_types());
    types.extend(extra);
    match ConceptTypeRegistry::build(types) {
        Ok(registry) => Arc::new(registry),
        Err(error) => panic!("invalid test concept types: {}", error),
    }
}

pub fn module_key(name: &str) -> ConceptKey {
    ConceptKey::new("ModuleInfo", vec![KeyValue::Text(name.into())])
}

pub fn data_structure_key(module: &str, name: &str) -> ConceptKey {
    ConceptKey::new("DataStructureInfo", vec![KeyValue::Concept(module_key(module)), KeyValue::Text(name.into())])
}

pub fn property_key(module: &str, data_structure: &str, name: &str) -> ConceptKey {
    ConceptKey::new("PropertyInfo", vec![KeyValue::Concept(data_structure_key(module, data_structure)), KeyValue::Text(name.into())])
}

pub fn module(name: &str) -> ConceptInfo {
    ConceptInfo::new("ModuleInfo").with_text("Name", name)
}

pub fn entity(module: &str, name: &str) -> ConceptInfo {
    ConceptInfo::new("EntityInfo").with_reference("Module", module_key(module)).with_text("Name", name)
}

pub fn short_string(module: &str, data_structure: &str, name: &str) -> ConceptInfo {
    ConceptInfo::new("ShortStringInfo")
        .with_reference("DataStructure", data_structure_key(module, data_structure))
        .with_text("Name", name)
}

pub fn reference(module: &str, data_structure: &str, name: &str, target: ConceptKey) -> ConceptInfo {
    ConceptInfo::new("ReferenceInfo")
        .with_reference("DataStructure", data_structure_key(module, data_structure))
        .with_text("Name", name)
        .with_reference("Referenced", target)
}

pub fn depends_on(dependent: ConceptKey, dependency: ConceptKey) -> ConceptInfo {
    ConceptInfo::new(crate::concepts::DEPENDS_ON_TYPE)
        .with_reference(crate::concepts::DEPENDENT_MEMBER, dependent)
        .with_reference(crate::concepts::DEPENDS_ON_MEMBER, dependency)
}

/// Graph over `registry` holding the given concepts
pub fn graph_of(registry: Arc<ConceptTypeRegistry>, concepts: Vec<ConceptInfo>) -> ConceptGraph {
    let mut graph = ConceptGraph::new(registry);
    for info in concepts {
        if let Err(error) = graph.insert(info, ConceptOrigin::Provided) {
            panic!("invalid test concept: {}", error);
        }
    }
    graph
}

type MacroFn = dyn Fn(&Concept, &ConceptGraph) -> Result<Vec<ConceptInfo>, String> + Send + Sync;

/// Macro backed by a closure
pub struct FnMacro {
    name: String,
    input_type: String,
    create: Box<MacroFn>,
}

impl FnMacro {
    pub fn new(name: &str, input_type: &str, create: impl Fn(&Concept, &ConceptGraph) -> Result<Vec<ConceptInfo>, String> + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            input_type: input_type.to_string(),
            create: Box::new(create),
        }
    }
}

impl ConceptMacro for FnMacro {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_type(&self) -> &str {
        &self.input_type
    }

    fn create_new_concepts(&self, concept: &Concept, graph: &ConceptGraph) -> Result<Vec<ConceptInfo>, String> {
        (self.create)(concept, graph)
    }
}

type ValidatorFn = dyn Fn(&Concept, &ConceptGraph) -> Result<(), String> + Send + Sync;

/// Validator backed by a closure
pub struct FnValidator {
    name: String,
    input_type: String,
    check: Box<ValidatorFn>,
}

impl FnValidator {
    pub fn new(name: &str, input_type: &str, check: impl Fn(&Concept, &ConceptGraph) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            input_type: input_type.to_string(),
            check: Box::new(check),
        }
    }
}

impl ConceptValidator for FnValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_type(&self) -> &str {
        &self.input_type
    }

    fn validate(&self, concept: &Concept, graph: &ConceptGraph) -> Result<(), String> {
        (self.check)(concept, graph)
    }
}

type GeneratorFn = dyn Fn(&Concept, &mut CodeBuilder<'_>) -> Result<(), String> + Send + Sync;

/// Code generator backed by a closure
pub struct FnGenerator {
    name: String,
    implements: String,
    depends_on: Vec<String>,
    generate: Box<GeneratorFn>,
}

impl FnGenerator {
    pub fn new(name: &str, implements: &str, generate: impl Fn(&Concept, &mut CodeBuilder<'_>) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            implements: implements.to_string(),
            depends_on: Vec::new(),
            generate: Box::new(generate),
        }
    }

    pub fn after(mut self, generator: &str) -> Self {
        self.depends_on.push(generator.to_string());
        self
    }
}

impl ConceptCodeGenerator for FnGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn implements(&self) -> &str {
        &self.implements
    }

    fn depends_on(&self) -> Vec<String> {
        self.depends_on.clone()
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        (self.generate)(concept, builder)
    }
}

/// Plugin exposing [`sample_types`] plus whatever extensions a test adds
#[derive(Default, Clone)]
pub struct SamplePlugin {
    extra_types: Vec<ConceptType>,
    macros: Vec<Arc<dyn ConceptMacro>>,
    validators: Vec<Arc<dyn ConceptValidator>>,
    generators: Vec<Arc<dyn ConceptCodeGenerator>>,
}

impl SamplePlugin {
    pub fn with_type(mut self, concept_type: ConceptType) -> Self {
        self.extra_types.push(concept_type);
        self
    }

    pub fn with_macro(mut self, concept_macro: impl ConceptMacro + 'static) -> Self {
        self.macros.push(Arc::new(concept_macro));
        self
    }

    pub fn with_validator(mut self, validator: impl ConceptValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn with_generator(mut self, generator: impl ConceptCodeGenerator + 'static) -> Self {
        self.generators.push(Arc::new(generator));
        self
    }

    /// Build a DSL syntax containing only this plugin
    pub fn syntax(self) -> DslSyntax {
        match PluginSet::new().with_plugin(self).build() {
            Ok(syntax) => syntax,
            Err(error) => panic!("invalid test plugin: {}", error),
        }
    }
}

impl ConceptPlugin for SamplePlugin {
    fn name(&self) -> &str {
        "Sample"
    }

    fn concept_types(&self) -> Vec<ConceptType> {
        let mut types = sample_types();
        types.extend(self.extra_types.iter().cloned());
        types
    }

    fn macros(&self) -> Vec<Arc<dyn ConceptMacro>> {
        self.macros.clone()
    }

    fn validators(&self) -> Vec<Arc<dyn ConceptValidator>> {
        self.validators.clone()
    }

    fn generators(&self) -> Vec<Arc<dyn ConceptCodeGenerator>> {
        self.generators.clone()
    }
}
