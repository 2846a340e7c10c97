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

//! Cross-concept checks run after macro expansion

use crate::types::{ENTITY, MAX_LENGTH, REFERENCE, is_string_property};
use rhetos_compiler::concepts::{Concept, ConceptGraph};
use rhetos_compiler::plugin::ConceptValidator;
use std::sync::Arc;

pub fn validators() -> Vec<Arc<dyn ConceptValidator>> {
    vec![Arc::new(ReferenceTargetValidator), Arc::new(MaxLengthValidator)]
}

/// A reference must point to a queryable data structure
pub struct ReferenceTargetValidator;

impl ConceptValidator for ReferenceTargetValidator {
    fn name(&self) -> &str {
        "ReferenceTarget"
    }

    fn input_type(&self) -> &str {
        REFERENCE
    }

    fn validate(&self, concept: &Concept, graph: &ConceptGraph) -> Result<(), String> {
        // Missing targets are reported by the built-in reference check
        let Some(target) = concept.reference("Referenced").and_then(|key| graph.find_by_key(key)) else {
            return Ok(());
        };
        if graph.registry().is_a(target.type_name(), ENTITY) {
            Ok(())
        } else {
            Err(format!("{} is not queryable, a reference must point to an entity", graph.describe(target)))
        }
    }
}

pub struct MaxLengthValidator;

impl ConceptValidator for MaxLengthValidator {
    fn name(&self) -> &str {
        "MaxLength"
    }

    fn input_type(&self) -> &str {
        MAX_LENGTH
    }

    fn validate(&self, concept: &Concept, graph: &ConceptGraph) -> Result<(), String> {
        let length = concept.text("Length").unwrap_or_default();
        if !length.parse::<u32>().is_ok_and(|length| length > 0) {
            return Err(format!("MaxLength must be a positive integer, found '{}'", length));
        }
        match concept.reference("Property").and_then(|key| graph.find_by_key(key)) {
            Some(property) if !is_string_property(property.type_name()) => {
                Err(format!("MaxLength applies only to string properties, {} is not one", graph.describe(property)))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::CommonConceptsPlugin;
    use rhetos_common::DslScript;
    use rhetos_compiler::{CompilerConfig, PluginSet, RhetosCompiler, RhetosError};
    use std::sync::Arc;

    fn failures(script: &str) -> Vec<String> {
        let syntax = Arc::new(PluginSet::new().with_plugin(CommonConceptsPlugin).build().unwrap());
        let compiler = RhetosCompiler::new(syntax, CompilerConfig::default());
        match compiler.build_model(vec![DslScript::from_text("Test.rhe", script)]) {
            Ok(_) => Vec::new(),
            Err(RhetosError::Validation(error)) => error.failures.iter().map(|f| f.to_string()).collect(),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_reference_must_target_entity() {
        let found = failures("Module Demo { Computed Report; Entity Person { Reference Report Demo.Report; Reference Boss Demo.Person; } }");
        assert_eq!(found, vec!["Reference Demo.Person.Report: Computed Demo.Report is not queryable, a reference must point to an entity"]);
    }

    #[test]
    fn test_max_length_checks() {
        let found = failures("Module Demo { Entity Person { Integer Age { MaxLength 3; } ShortString Code { MaxLength 0; } LongString Bio { MaxLength 4000; } } }");
        assert_eq!(
            found,
            vec![
                "MaxLength Demo.Person.Age: MaxLength applies only to string properties, Integer Demo.Person.Age is not one",
                "MaxLength Demo.Person.Code: MaxLength must be a positive integer, found '0'",
            ]
        );
    }
}
