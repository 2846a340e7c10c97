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

//! Properties and their attributes

use super::{CLASS_BODY, PROPERTY_ATTRIBUTES, PROPERTY_TYPE};
use crate::types::{MAX_LENGTH, PRIMARY_KEY, PROPERTY, PROPERTY_STORAGE, REFERENCE, REQUIRED, clr_type, property_extension_key};
use rhetos_compiler::codegen::CodeBuilder;
use rhetos_compiler::concepts::{Concept, ConceptTypeRegistry};
use rhetos_compiler::plugin::ConceptCodeGenerator;

/// CLR type of a property type or of its nearest base with one
fn property_clr_type(registry: &ConceptTypeRegistry, type_name: &str) -> Option<&'static str> {
    registry.get(type_name)?.ancestors.iter().find_map(|ancestor| clr_type(ancestor))
}

pub struct PropertyCodeGenerator;

impl ConceptCodeGenerator for PropertyCodeGenerator {
    fn name(&self) -> &str {
        "Property"
    }

    fn implements(&self) -> &str {
        PROPERTY
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        let graph = builder.graph();
        let owner = concept.reference("DataStructure").ok_or_else(|| format!("{} has no data structure", concept.key))?;
        let name = concept.text("Name").ok_or_else(|| format!("{} has no name", concept.key))?;
        let clr = property_clr_type(graph.registry(), concept.type_name()).ok_or_else(|| format!("no CLR type for {}", concept.type_name()))?;
        let member = if graph.registry().is_a(concept.type_name(), REFERENCE) { format!("{}ID", name) } else { name.to_string() };

        let code = format!(
            "\n        {}public {} {} {{ get; set; }}",
            PROPERTY_ATTRIBUTES.of(&concept.key).marker(),
            PROPERTY_TYPE.of(&concept.key).marker_or(clr),
            member
        );
        // Key properties lead the class body
        if graph.find_by_key(&property_extension_key(PRIMARY_KEY, &concept.key)).is_some() {
            builder.insert_code_before(code, &CLASS_BODY.of(owner));
        } else {
            builder.insert_code(code, &CLASS_BODY.of(owner));
        }
        Ok(())
    }
}

/// Adds one attribute line to the property a concept refers to
pub struct AttributeCodeGenerator {
    name: &'static str,
    implements: &'static str,
    render: fn(&Concept) -> Result<String, String>,
}

impl AttributeCodeGenerator {
    pub fn required() -> Self {
        Self {
            name: "Required",
            implements: REQUIRED,
            render: |_| Ok("[Required]".to_string()),
        }
    }

    pub fn max_length() -> Self {
        Self {
            name: "MaxLength",
            implements: MAX_LENGTH,
            render: |concept| concept.text("Length").map(|length| format!("[MaxLength({})]", length)).ok_or_else(|| "length is not set".to_string()),
        }
    }

    pub fn column() -> Self {
        Self {
            name: "Column",
            implements: PROPERTY_STORAGE,
            render: |concept| concept.text("Column").map(|column| format!("[Column(\"{}\")]", column)).ok_or_else(|| "column is not set".to_string()),
        }
    }
}

impl ConceptCodeGenerator for AttributeCodeGenerator {
    fn name(&self) -> &str {
        self.name
    }

    fn implements(&self) -> &str {
        self.implements
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        let property = concept.reference("Property").ok_or_else(|| format!("{} has no property", concept.key))?;
        let attribute = (self.render)(concept)?;
        builder.insert_code(format!("{}\n        ", attribute), &PROPERTY_ATTRIBUTES.of(property));
        Ok(())
    }
}

/// `[Key]` attribute; the key property is not nullable
pub struct PrimaryKeyCodeGenerator;

impl ConceptCodeGenerator for PrimaryKeyCodeGenerator {
    fn name(&self) -> &str {
        "PrimaryKey"
    }

    fn implements(&self) -> &str {
        PRIMARY_KEY
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        let graph = builder.graph();
        let key = concept.reference("Property").ok_or_else(|| format!("{} has no property", concept.key))?;
        let property = graph.find_by_key(key).ok_or_else(|| format!("{} is not declared", graph.describe_key(key)))?;
        let clr = property_clr_type(graph.registry(), property.type_name()).ok_or_else(|| format!("no CLR type for {}", property.type_name()))?;

        builder.insert_code("[Key]\n        ", &PROPERTY_ATTRIBUTES.of(key));
        builder.replace_code(clr.trim_end_matches('?'), &PROPERTY_TYPE.of(key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;
    use crate::types::{INTEGER, SHORT_STRING};
    use rhetos_common::DslScript;
    use rhetos_compiler::concepts::ConceptType;
    use rhetos_compiler::{CompilerConfig, RhetosCompiler};
    use std::sync::Arc;

    fn generate(script: &str) -> String {
        let compiler = RhetosCompiler::new(Arc::new(syntax().unwrap()), CompilerConfig::default());
        let model = compiler.build_model(vec![DslScript::from_text("Demo.rhe", script)]).unwrap();
        let output = compiler.generate(&model).unwrap();
        output.sources.file("Demo.cs").unwrap().content.clone()
    }

    #[test]
    fn test_reference_property() {
        let content = generate("Module Demo { Entity Person { Reference Manager Demo.Person { Required; } } }");
        assert!(content.contains("        [Required]\n        [Column(\"ManagerID\")]\n        public Guid? ManagerID { get; set; }"));
    }

    #[test]
    fn test_key_property_comes_first() {
        let content = generate("Module Demo { Entity Person { Integer Age; } }");
        let id = content.find("public Guid ID").unwrap();
        let age = content.find("public int? Age").unwrap();
        assert!(id < age);
        assert!(content.contains("[Key]\n        [Column(\"ID\")]\n        public Guid ID { get; set; }"));
    }

    #[test]
    fn test_clr_type_of_derived_property() {
        let mut types = rhetos_compiler::concepts::core_concept_types();
        types.extend(crate::types::concept_types());
        types.push(ConceptType::new("CodePropertyInfo").keyword("Code").derives_from(SHORT_STRING));
        let registry = ConceptTypeRegistry::build(types).unwrap();
        assert_eq!(property_clr_type(&registry, "CodePropertyInfo"), Some("string"));
        assert_eq!(property_clr_type(&registry, INTEGER), Some("int?"));
        assert_eq!(property_clr_type(&registry, PROPERTY), None);
    }
}
