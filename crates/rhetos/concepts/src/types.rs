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

//! Concept types of the common concepts plugin

use rhetos_compiler::concepts::{ConceptKey, ConceptMember, ConceptType, KeyValue};

pub const MODULE: &str = "ModuleInfo";
pub const DATA_STRUCTURE: &str = "DataStructureInfo";
pub const ENTITY: &str = "EntityInfo";
pub const COMPUTED: &str = "ComputedInfo";

pub const PROPERTY: &str = "PropertyInfo";
pub const SHORT_STRING: &str = "ShortStringPropertyInfo";
pub const LONG_STRING: &str = "LongStringPropertyInfo";
pub const INTEGER: &str = "IntegerPropertyInfo";
pub const DECIMAL: &str = "DecimalPropertyInfo";
pub const BOOL: &str = "BoolPropertyInfo";
pub const DATE_TIME: &str = "DateTimePropertyInfo";
pub const GUID: &str = "GuidPropertyInfo";
pub const REFERENCE: &str = "ReferencePropertyInfo";

pub const REQUIRED: &str = "RequiredPropertyInfo";
pub const MAX_LENGTH: &str = "MaxLengthInfo";
pub const PRIMARY_KEY: &str = "PrimaryKeyInfo";
pub const PROPERTY_STORAGE: &str = "PropertyStorageInfo";

/// Property types by keyword, with the CLR type of their generated property
const PROPERTY_TYPES: [(&str, &str, &str); 8] = [
    (SHORT_STRING, "ShortString", "string"),
    (LONG_STRING, "LongString", "string"),
    (INTEGER, "Integer", "int?"),
    (DECIMAL, "Decimal", "decimal?"),
    (BOOL, "Bool", "bool?"),
    (DATE_TIME, "DateTime", "DateTime?"),
    (GUID, "Guid", "Guid?"),
    (REFERENCE, "Reference", "Guid?"),
];

pub fn concept_types() -> Vec<ConceptType> {
    let mut types = vec![
        ConceptType::new(MODULE).keyword("Module").member(ConceptMember::key_text("Name")),
        ConceptType::new(DATA_STRUCTURE)
            .member(ConceptMember::key_reference("Module", MODULE))
            .member(ConceptMember::key_text("Name")),
        ConceptType::new(ENTITY).keyword("Entity").derives_from(DATA_STRUCTURE),
        ConceptType::new(COMPUTED).keyword("Computed").derives_from(DATA_STRUCTURE),
        ConceptType::new(PROPERTY)
            .member(ConceptMember::key_reference("DataStructure", DATA_STRUCTURE))
            .member(ConceptMember::key_text("Name")),
    ];
    for (type_name, keyword, _) in PROPERTY_TYPES {
        let property = ConceptType::new(type_name).keyword(keyword).derives_from(PROPERTY);
        types.push(if type_name == REFERENCE { property.member(ConceptMember::reference("Referenced", DATA_STRUCTURE)) } else { property });
    }
    types.extend([
        ConceptType::new(REQUIRED).keyword("Required").member(ConceptMember::key_reference("Property", PROPERTY)),
        ConceptType::new(MAX_LENGTH)
            .keyword("MaxLength")
            .member(ConceptMember::key_reference("Property", PROPERTY))
            .member(ConceptMember::text("Length")),
        ConceptType::new(PRIMARY_KEY).keyword("PrimaryKey").member(ConceptMember::key_reference("Property", PROPERTY)),
        ConceptType::new(PROPERTY_STORAGE)
            .member(ConceptMember::key_reference("Property", PROPERTY))
            .member(ConceptMember::text("Column").not_parsable()),
    ]);
    types
}

/// CLR type of a generated property, `None` for types that are not properties
pub fn clr_type(type_name: &str) -> Option<&'static str> {
    PROPERTY_TYPES.iter().find(|(name, _, _)| *name == type_name).map(|(_, _, clr)| *clr)
}

pub fn is_string_property(type_name: &str) -> bool {
    type_name == SHORT_STRING || type_name == LONG_STRING
}

pub fn module_key(name: &str) -> ConceptKey {
    ConceptKey::new(MODULE, vec![KeyValue::Text(name.to_string())])
}

pub fn data_structure_key(module: &str, name: &str) -> ConceptKey {
    ConceptKey::new(DATA_STRUCTURE, vec![KeyValue::Concept(module_key(module)), KeyValue::Text(name.to_string())])
}

pub fn property_key(data_structure: &ConceptKey, name: &str) -> ConceptKey {
    ConceptKey::new(PROPERTY, vec![KeyValue::Concept(data_structure.clone()), KeyValue::Text(name.to_string())])
}

/// Key of a concept identified by one property, e.g. `MaxLengthInfo` or `PrimaryKeyInfo`
pub fn property_extension_key(type_name: &str, property: &ConceptKey) -> ConceptKey {
    ConceptKey::new(type_name, vec![KeyValue::Concept(property.clone())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhetos_compiler::concepts::{ConceptTypeRegistry, core_concept_types};

    #[test]
    fn test_types_build_a_registry() {
        let mut types = core_concept_types();
        types.extend(concept_types());
        let registry = ConceptTypeRegistry::build(types).unwrap();

        assert_eq!(registry.root_of(REFERENCE), Some(PROPERTY));
        assert!(registry.is_a(COMPUTED, DATA_STRUCTURE));
        assert!(registry.types_with_keyword("PropertyStorage").is_empty());
        let reference = registry.get(REFERENCE).unwrap();
        assert_eq!(reference.key_members().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["DataStructure", "Name"]);
        assert!(reference.member("Referenced").is_some());
    }

    #[test]
    fn test_clr_types() {
        assert_eq!(clr_type(SHORT_STRING), Some("string"));
        assert_eq!(clr_type(REFERENCE), Some("Guid?"));
        assert_eq!(clr_type(ENTITY), None);
        assert!(is_string_property(LONG_STRING));
        assert!(!is_string_property(INTEGER));
    }
}
