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

//! Concept instance values and structural keys

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One element of a concept key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    Text(String),
    Concept(ConceptKey),
}

/// Structural identity of a concept instance.
///
/// `root_type` is the top of the concept type's inheritance chain, so every
/// concrete type deriving from the same root shares one key space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConceptKey {
    pub root_type: String,
    pub values: Vec<KeyValue>,
}

impl ConceptKey {
    pub fn new(root_type: impl Into<String>, values: Vec<KeyValue>) -> Self {
        Self {
            root_type: root_type.into(),
            values,
        }
    }

    /// Flattened text parts of the key, depth first
    pub fn parts(&self) -> Vec<&str> {
        let mut parts = Vec::new();
        self.collect_parts(&mut parts);
        parts
    }

    fn collect_parts<'a>(&'a self, parts: &mut Vec<&'a str>) {
        for value in &self.values {
            match value {
                KeyValue::Text(text) => parts.push(text),
                KeyValue::Concept(key) => key.collect_parts(parts),
            }
        }
    }

    /// Dotted key path, e.g. `Demo.Person.Name`; parts that are not plain
    /// identifiers are quoted the way a script writes them, e.g. `'A.B'.C`
    pub fn path(&self) -> String {
        self.parts().into_iter().map(quote_part).collect::<Vec<_>>().join(".")
    }

    /// Text form of the whole key tree, distinct for every distinct key,
    /// e.g. `DataStructureInfo(ModuleInfo(Demo),Person)`
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        out.push_str(&self.root_type);
        out.push('(');
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            match value {
                KeyValue::Text(text) => out.push_str(&quote_part(text)),
                KeyValue::Concept(key) => key.write_canonical(out),
            }
        }
        out.push(')');
    }

    /// Whether any key value, at any depth, equals `other`
    pub fn references(&self, other: &ConceptKey) -> bool {
        self.values.iter().any(|v| matches!(v, KeyValue::Concept(k) if k == other || k.references(other)))
    }
}

fn quote_part(text: &str) -> String {
    if !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_') {
        text.to_string()
    } else {
        format!("'{}'", text.replace('\'', "''"))
    }
}

impl fmt::Display for ConceptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root_type, self.path())
    }
}

/// Value of a single concept member
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemberValue {
    Text(String),
    Concept(ConceptKey),
}

impl MemberValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MemberValue::Text(text) => Some(text),
            MemberValue::Concept(_) => None,
        }
    }

    pub fn as_concept(&self) -> Option<&ConceptKey> {
        match self {
            MemberValue::Concept(key) => Some(key),
            MemberValue::Text(_) => None,
        }
    }
}

impl From<MemberValue> for KeyValue {
    fn from(value: MemberValue) -> Self {
        match value {
            MemberValue::Text(text) => KeyValue::Text(text),
            MemberValue::Concept(key) => KeyValue::Concept(key),
        }
    }
}

impl fmt::Display for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Text(text) => write!(f, "'{}'", text),
            MemberValue::Concept(key) => write!(f, "{}", key),
        }
    }
}

/// Untyped concept instance: a type name plus member values.
///
/// Produced by the parser and by macros, then checked against the concept type
/// registry when inserted into a [`super::ConceptGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptInfo {
    pub type_name: String,
    pub members: BTreeMap<String, MemberValue>,
}

impl ConceptInfo {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn with_text(mut self, member: impl Into<String>, value: impl Into<String>) -> Self {
        self.members.insert(member.into(), MemberValue::Text(value.into()));
        self
    }

    pub fn with_reference(mut self, member: impl Into<String>, key: ConceptKey) -> Self {
        self.members.insert(member.into(), MemberValue::Concept(key));
        self
    }

    pub fn set(&mut self, member: impl Into<String>, value: MemberValue) {
        self.members.insert(member.into(), value);
    }

    pub fn get(&self, member: &str) -> Option<&MemberValue> {
        self.members.get(member)
    }

    pub fn text(&self, member: &str) -> Option<&str> {
        self.members.get(member).and_then(MemberValue::as_text)
    }

    pub fn reference(&self, member: &str) -> Option<&ConceptKey> {
        self.members.get(member).and_then(MemberValue::as_concept)
    }
}
