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

//! Implicit concepts derived from entities and properties

use crate::types::{ENTITY, GUID, MAX_LENGTH, PRIMARY_KEY, PROPERTY, PROPERTY_STORAGE, REFERENCE, SHORT_STRING, property_extension_key, property_key};
use rhetos_compiler::concepts::{Concept, ConceptGraph, ConceptInfo};
use rhetos_compiler::plugin::ConceptMacro;
use std::sync::Arc;

/// Length applied to a `ShortString` without an explicit `MaxLength`
pub const DEFAULT_SHORT_STRING_LENGTH: &str = "256";

pub fn macros() -> Vec<Arc<dyn ConceptMacro>> {
    vec![Arc::new(EntityIdMacro), Arc::new(ShortStringLengthMacro), Arc::new(PropertyStorageMacro)]
}

/// Every entity gets a `Guid ID` primary key
pub struct EntityIdMacro;

impl ConceptMacro for EntityIdMacro {
    fn name(&self) -> &str {
        "EntityId"
    }

    fn input_type(&self) -> &str {
        ENTITY
    }

    fn create_new_concepts(&self, concept: &Concept, _graph: &ConceptGraph) -> Result<Vec<ConceptInfo>, String> {
        let id = property_key(&concept.key, "ID");
        Ok(vec![
            ConceptInfo::new(GUID).with_reference("DataStructure", concept.key.clone()).with_text("Name", "ID"),
            ConceptInfo::new(PRIMARY_KEY).with_reference("Property", id),
        ])
    }
}

/// `ShortString` properties default to 256 characters
pub struct ShortStringLengthMacro;

impl ConceptMacro for ShortStringLengthMacro {
    fn name(&self) -> &str {
        "ShortStringLength"
    }

    fn input_type(&self) -> &str {
        SHORT_STRING
    }

    fn create_new_concepts(&self, concept: &Concept, graph: &ConceptGraph) -> Result<Vec<ConceptInfo>, String> {
        if graph.find_by_key(&property_extension_key(MAX_LENGTH, &concept.key)).is_some() {
            return Ok(Vec::new());
        }
        Ok(vec![
            ConceptInfo::new(MAX_LENGTH)
                .with_reference("Property", concept.key.clone())
                .with_text("Length", DEFAULT_SHORT_STRING_LENGTH),
        ])
    }
}

/// Entity properties are stored in a column; references store the key of the referenced row
pub struct PropertyStorageMacro;

impl ConceptMacro for PropertyStorageMacro {
    fn name(&self) -> &str {
        "PropertyStorage"
    }

    fn input_type(&self) -> &str {
        PROPERTY
    }

    fn create_new_concepts(&self, concept: &Concept, graph: &ConceptGraph) -> Result<Vec<ConceptInfo>, String> {
        let owner = concept.reference("DataStructure").and_then(|key| graph.find_by_key(key));
        let Some(owner) = owner.filter(|owner| graph.registry().is_a(owner.type_name(), ENTITY)) else {
            return Ok(Vec::new());
        };
        let name = concept.text("Name").ok_or_else(|| format!("{} has no name", graph.describe(concept)))?;
        let column = if graph.registry().is_a(concept.type_name(), REFERENCE) { format!("{}ID", name) } else { name.to_string() };
        tracing::trace!("Storing {} of {} in column {}", name, graph.describe(owner), column);
        Ok(vec![ConceptInfo::new(PROPERTY_STORAGE).with_reference("Property", concept.key.clone()).with_text("Column", column)])
    }
}
