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

//! Concept type registry
//!
//! The registry is the schema of the DSL: every concept type with its keyword,
//! inheritance chain and ordered members. It is built once from plugin
//! definitions, validated as a whole, and read-only afterwards.

use super::error::{GraphError, RegistryError};
use super::value::{ConceptInfo, ConceptKey, KeyValue, MemberValue};
use crate::parser::common::utils;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Value type of a concept member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MemberType {
    /// Plain text value
    Text,
    /// Reference to a concept of the named type or any type derived from it
    Concept(String),
    /// Reference to a concept of any type
    AnyConcept,
}

/// Member of a concept type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptMember {
    pub name: String,
    pub value_type: MemberType,
    /// Part of the concept's identity
    pub is_key: bool,
    /// Written in DSL statements; other members are only set by macros
    pub is_parsable: bool,
}

impl ConceptMember {
    fn new(name: impl Into<String>, value_type: MemberType, is_key: bool) -> Self {
        Self {
            name: name.into(),
            value_type,
            is_key,
            is_parsable: true,
        }
    }

    pub fn key_text(name: impl Into<String>) -> Self {
        Self::new(name, MemberType::Text, true)
    }

    pub fn key_reference(name: impl Into<String>, concept_type: impl Into<String>) -> Self {
        Self::new(name, MemberType::Concept(concept_type.into()), true)
    }

    pub fn key_any(name: impl Into<String>) -> Self {
        Self::new(name, MemberType::AnyConcept, true)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, MemberType::Text, false)
    }

    pub fn reference(name: impl Into<String>, concept_type: impl Into<String>) -> Self {
        Self::new(name, MemberType::Concept(concept_type.into()), false)
    }

    /// Hide the member from DSL syntax
    pub fn not_parsable(mut self) -> Self {
        self.is_parsable = false;
        self
    }
}

/// Concept type definition as declared by a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptType {
    pub name: String,
    /// DSL keyword; abstract and macro-only types have none
    pub keyword: Option<String>,
    pub base: Option<String>,
    /// Members declared by this type, in syntax order
    pub members: Vec<ConceptMember>,
}

impl ConceptType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyword: None,
            base: None,
            members: Vec::new(),
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn derives_from(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn member(mut self, member: ConceptMember) -> Self {
        self.members.push(member);
        self
    }
}

/// Concept type with its inheritance resolved
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConceptType {
    pub name: String,
    pub keyword: Option<String>,
    /// Top of the inheritance chain; shared key space of all derived types
    pub root_type: String,
    /// This type followed by its bases, root last
    pub ancestors: Vec<String>,
    /// Inherited members first, then the type's own members
    pub members: Vec<ConceptMember>,
}

impl ResolvedConceptType {
    pub fn key_members(&self) -> impl Iterator<Item = &ConceptMember> {
        self.members.iter().filter(|m| m.is_key)
    }

    pub fn parsable_members(&self) -> impl Iterator<Item = &ConceptMember> {
        self.members.iter().filter(|m| m.is_parsable)
    }

    pub fn member(&self, name: &str) -> Option<&ConceptMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn is_a(&self, ancestor: &str) -> bool {
        self.ancestors.iter().any(|a| a == ancestor)
    }

    /// Keyword, or the type name for types without one
    pub fn display_name(&self) -> &str {
        self.keyword.as_deref().unwrap_or(&self.name)
    }
}

/// Immutable table of all concept types
#[derive(Debug, Clone, Default)]
pub struct ConceptTypeRegistry {
    types: IndexMap<String, ResolvedConceptType>,
    keywords: IndexMap<String, Vec<String>>,
}

impl ConceptTypeRegistry {
    /// Resolve and validate concept type definitions, kept in registration order
    pub fn build(definitions: Vec<ConceptType>) -> Result<Self, RegistryError> {
        let mut declared: IndexMap<String, ConceptType> = IndexMap::new();
        for definition in definitions {
            if declared.contains_key(&definition.name) {
                return Err(RegistryError::DuplicateType(definition.name));
            }
            declared.insert(definition.name.clone(), definition);
        }

        let mut types = IndexMap::new();
        for definition in declared.values() {
            let resolved = Self::resolve(definition, &declared)?;
            types.insert(resolved.name.clone(), resolved);
        }

        let mut registry = Self { types, keywords: IndexMap::new() };
        registry.check_members()?;
        registry.index_keywords()?;
        debug!("Concept type registry built: {} types, {} keywords", registry.types.len(), registry.keywords.len());
        Ok(registry)
    }

    fn resolve(definition: &ConceptType, declared: &IndexMap<String, ConceptType>) -> Result<ResolvedConceptType, RegistryError> {
        let mut chain = vec![definition];
        let mut current = definition;
        while let Some(base) = &current.base {
            let base_type = declared.get(base).ok_or_else(|| RegistryError::UnknownBaseType {
                type_name: current.name.clone(),
                base: base.clone(),
            })?;
            if chain.iter().any(|t| t.name == base_type.name) {
                return Err(RegistryError::InheritanceCycle(definition.name.clone()));
            }
            chain.push(base_type);
            current = base_type;
        }

        let mut members: Vec<ConceptMember> = Vec::new();
        for (depth, concept_type) in chain.iter().enumerate().rev() {
            let is_root = depth == chain.len() - 1;
            for member in &concept_type.members {
                if members.iter().any(|m| m.name == member.name) {
                    return Err(RegistryError::DuplicateMember {
                        type_name: definition.name.clone(),
                        member: member.name.clone(),
                    });
                }
                if member.is_key && !is_root {
                    return Err(RegistryError::DerivedKeyMember {
                        type_name: concept_type.name.clone(),
                        member: member.name.clone(),
                        base: concept_type.base.clone().unwrap_or_default(),
                    });
                }
                members.push(member.clone());
            }
        }

        Ok(ResolvedConceptType {
            name: definition.name.clone(),
            keyword: definition.keyword.clone(),
            root_type: current.name.clone(),
            ancestors: chain.iter().map(|t| t.name.clone()).collect(),
            members,
        })
    }

    fn check_members(&self) -> Result<(), RegistryError> {
        for concept_type in self.types.values() {
            for member in &concept_type.members {
                if let MemberType::Concept(referenced) = &member.value_type {
                    if !self.types.contains_key(referenced) {
                        return Err(RegistryError::UnknownMemberType {
                            type_name: concept_type.name.clone(),
                            member: member.name.clone(),
                            referenced: referenced.clone(),
                        });
                    }
                }
            }
            if concept_type.key_members().next().is_none() {
                return Err(RegistryError::NoKeyMembers(concept_type.name.clone()));
            }
        }

        for concept_type in self.types.values().filter(|t| t.root_type == t.name) {
            if self.key_reaches(&concept_type.name, &concept_type.name, &mut HashSet::new()) {
                return Err(RegistryError::RecursiveKey(concept_type.name.clone()));
            }
        }
        Ok(())
    }

    /// Whether the key of root type `from` contains a key of root type `target`
    fn key_reaches<'a>(&'a self, from: &'a str, target: &str, visited: &mut HashSet<&'a str>) -> bool {
        let Some(concept_type) = self.types.get(from) else {
            return false;
        };
        for member in concept_type.key_members() {
            if let MemberType::Concept(referenced) = &member.value_type {
                let Some(root) = self.root_of(referenced) else {
                    continue;
                };
                if root == target {
                    return true;
                }
                if visited.insert(root) && self.key_reaches(root, target, visited) {
                    return true;
                }
            }
        }
        false
    }

    fn index_keywords(&mut self) -> Result<(), RegistryError> {
        let mut keywords: IndexMap<String, Vec<String>> = IndexMap::new();
        for concept_type in self.types.values() {
            let Some(keyword) = &concept_type.keyword else {
                continue;
            };
            if !utils::is_plain_text(keyword) {
                return Err(RegistryError::InvalidKeyword {
                    type_name: concept_type.name.clone(),
                    keyword: keyword.clone(),
                });
            }
            let signature = self.parse_signature(concept_type);
            let candidates = keywords.entry(keyword.clone()).or_default();
            for other in candidates.iter() {
                if self.types.get(other).map(|t| self.parse_signature(t)).as_ref() == Some(&signature) {
                    return Err(RegistryError::AmbiguousKeyword {
                        keyword: keyword.clone(),
                        first: other.clone(),
                        second: concept_type.name.clone(),
                    });
                }
            }
            candidates.push(concept_type.name.clone());
        }
        self.keywords = keywords;
        Ok(())
    }

    /// Shape of the parameters a type accepts, used to detect indistinguishable keywords
    fn parse_signature(&self, concept_type: &ResolvedConceptType) -> Vec<String> {
        concept_type
            .parsable_members()
            .map(|m| match &m.value_type {
                MemberType::Text => "text".to_string(),
                MemberType::Concept(t) => self.root_of(t).unwrap_or(t).to_string(),
                MemberType::AnyConcept => "*".to_string(),
            })
            .collect()
    }

    pub fn get(&self, type_name: &str) -> Option<&ResolvedConceptType> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// All types in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedConceptType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn root_of(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name).map(|t| t.root_type.as_str())
    }

    /// Whether `type_name` is `ancestor` or derives from it
    pub fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
        self.types.get(type_name).is_some_and(|t| t.is_a(ancestor))
    }

    /// Candidate types for a keyword, in registration order
    pub fn types_with_keyword(&self, keyword: &str) -> &[String] {
        self.keywords.get(keyword).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    /// User-facing description of a concept, e.g. `Entity Demo.Person`
    pub fn describe(&self, type_name: &str, key: &ConceptKey) -> String {
        let name = self.types.get(type_name).map(|t| t.display_name()).unwrap_or(type_name);
        format!("{} {}", name, key.path())
    }

    /// Description of a key whose concrete type is not known
    pub fn describe_key(&self, key: &ConceptKey) -> String {
        self.describe(&key.root_type, key)
    }

    /// Check a concept instance against its type and compute its key
    pub fn validate_instance(&self, info: &ConceptInfo) -> Result<ConceptKey, GraphError> {
        let concept_type = self.types.get(&info.type_name).ok_or_else(|| GraphError::UnknownType(info.type_name.clone()))?;

        for (name, value) in &info.members {
            let member = concept_type.member(name).ok_or_else(|| GraphError::UnknownMember {
                type_name: info.type_name.clone(),
                member: name.clone(),
            })?;
            let expected = match (&member.value_type, value) {
                (MemberType::Text, MemberValue::Text(_)) | (MemberType::AnyConcept, MemberValue::Concept(_)) => None,
                (MemberType::Concept(t), MemberValue::Concept(key)) if self.root_of(t) == Some(key.root_type.as_str()) => None,
                (MemberType::Text, _) => Some("a text value".to_string()),
                (MemberType::Concept(t), _) => Some(format!("a reference to {}", t)),
                (MemberType::AnyConcept, _) => Some("a concept reference".to_string()),
            };
            if let Some(expected) = expected {
                return Err(GraphError::WrongValueKind {
                    type_name: info.type_name.clone(),
                    member: name.clone(),
                    expected,
                });
            }
        }

        let values = concept_type
            .key_members()
            .map(|member| {
                info.members.get(&member.name).cloned().map(KeyValue::from).ok_or_else(|| GraphError::MissingKeyMember {
                    type_name: info.type_name.clone(),
                    member: member.name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConceptKey::new(concept_type.root_type.clone(), values))
    }
}
