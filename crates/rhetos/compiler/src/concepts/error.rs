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

//! Errors for concept type definitions and concept instances

use thiserror::Error;

/// Invalid concept type or plugin registration, detected while building the DSL syntax
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Concept type '{0}' is registered more than once")]
    DuplicateType(String),

    #[error("Concept type '{type_name}' derives from unknown type '{base}'")]
    UnknownBaseType { type_name: String, base: String },

    #[error("Inheritance cycle through concept type '{0}'")]
    InheritanceCycle(String),

    #[error("Concept type '{type_name}' declares member '{member}' more than once")]
    DuplicateMember { type_name: String, member: String },

    #[error("Concept type '{type_name}' adds key member '{member}' to the key inherited from '{base}'")]
    DerivedKeyMember { type_name: String, member: String, base: String },

    #[error("Member '{member}' of concept type '{type_name}' references unknown type '{referenced}'")]
    UnknownMemberType { type_name: String, member: String, referenced: String },

    #[error("Concept type '{0}' has no key members")]
    NoKeyMembers(String),

    #[error("Key of concept type '{0}' contains itself")]
    RecursiveKey(String),

    #[error("Keyword '{keyword}' of concept type '{type_name}' is not a plain word")]
    InvalidKeyword { type_name: String, keyword: String },

    #[error("Keyword '{keyword}' is ambiguous: '{first}' and '{second}' accept the same parameters")]
    AmbiguousKeyword { keyword: String, first: String, second: String },

    #[error("{kind} '{name}' of plugin '{plugin}' is declared for unknown concept type '{type_name}'")]
    UnknownPluginType {
        plugin: String,
        kind: &'static str,
        name: String,
        type_name: String,
    },

    #[error("{kind} name '{name}' is registered more than once")]
    DuplicatePluginName { kind: &'static str, name: String },

    #[error("Generator '{generator}' depends on unknown generator '{dependency}'")]
    UnknownGeneratorDependency { generator: String, dependency: String },

    #[error("Generator dependency cycle: {0}")]
    GeneratorCycle(String),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::DuplicateType(_) => "RH201",
            RegistryError::UnknownBaseType { .. } => "RH202",
            RegistryError::InheritanceCycle(_) => "RH203",
            RegistryError::DuplicateMember { .. } => "RH204",
            RegistryError::DerivedKeyMember { .. } => "RH205",
            RegistryError::UnknownMemberType { .. } => "RH206",
            RegistryError::NoKeyMembers(_) => "RH207",
            RegistryError::RecursiveKey(_) => "RH208",
            RegistryError::InvalidKeyword { .. } => "RH209",
            RegistryError::AmbiguousKeyword { .. } => "RH210",
            RegistryError::UnknownPluginType { .. } => "RH211",
            RegistryError::DuplicatePluginName { .. } => "RH212",
            RegistryError::UnknownGeneratorDependency { .. } => "RH213",
            RegistryError::GeneratorCycle(_) => "RH214",
        }
    }
}

/// Concept instance that does not fit its schema, or conflicts with the graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown concept type '{0}'")]
    UnknownType(String),

    #[error("Concept type '{type_name}' has no member '{member}'")]
    UnknownMember { type_name: String, member: String },

    #[error("Key member '{member}' of concept type '{type_name}' is not set")]
    MissingKeyMember { type_name: String, member: String },

    #[error("Member '{member}' of concept type '{type_name}' expects {expected}")]
    WrongValueKind { type_name: String, member: String, expected: String },

    #[error("'{description}' is already declared as '{existing_type}', cannot redeclare it as '{new_type}'")]
    TypeConflict { description: String, existing_type: String, new_type: String },

    #[error("'{description}' has conflicting values for '{member}': {existing} and {new}")]
    Conflict {
        description: String,
        member: String,
        existing: String,
        new: String,
    },
}

impl GraphError {
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::UnknownType(_) => "RH301",
            GraphError::UnknownMember { .. } => "RH302",
            GraphError::MissingKeyMember { .. } => "RH303",
            GraphError::WrongValueKind { .. } => "RH304",
            GraphError::TypeConflict { .. } => "RH305",
            GraphError::Conflict { .. } => "RH306",
        }
    }

    /// Whether the error is a disagreement with an already declared concept
    pub fn is_conflict(&self) -> bool {
        matches!(self, GraphError::TypeConflict { .. } | GraphError::Conflict { .. })
    }
}
