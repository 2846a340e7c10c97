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

//! Concept graph
//!
//! Concepts live in an arena addressed by [`ConceptHandle`]; a side table maps
//! structural keys to handles. Handles are assigned in insertion order and
//! concepts are never removed, so iteration order is deterministic and doubles
//! as the declaration-order tie-break for dependency resolution.

use super::error::GraphError;
use super::registry::ConceptTypeRegistry;
use super::value::{ConceptInfo, ConceptKey, MemberValue};
use crate::parser::common::ScriptLocation;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Arena index of a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConceptHandle(pub usize);

impl fmt::Display for ConceptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a concept came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConceptOrigin {
    /// Declared in a DSL script
    Parsed { location: ScriptLocation },
    /// Created by a macro from another concept
    Derived { macro_name: String, source: ConceptKey },
    /// Inserted directly through the API
    Provided,
}

impl fmt::Display for ConceptOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptOrigin::Parsed { location } => write!(f, "declared at {}", location),
            ConceptOrigin::Derived { macro_name, source } => write!(f, "created by macro '{}' from {}", macro_name, source),
            ConceptOrigin::Provided => write!(f, "provided"),
        }
    }
}

/// Concept instance stored in the graph
#[derive(Debug, Clone)]
pub struct Concept {
    pub handle: ConceptHandle,
    pub key: ConceptKey,
    pub info: ConceptInfo,
    pub origin: ConceptOrigin,
}

impl Concept {
    pub fn type_name(&self) -> &str {
        &self.info.type_name
    }

    pub fn text(&self, member: &str) -> Option<&str> {
        self.info.text(member)
    }

    pub fn reference(&self, member: &str) -> Option<&ConceptKey> {
        self.info.reference(member)
    }
}

/// Result of inserting a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New key
    Added(ConceptHandle),
    /// Existing concept received previously unset members
    Updated(ConceptHandle),
    /// Existing concept already had identical values
    Unchanged(ConceptHandle),
}

impl MergeOutcome {
    pub fn handle(&self) -> ConceptHandle {
        match self {
            MergeOutcome::Added(h) | MergeOutcome::Updated(h) | MergeOutcome::Unchanged(h) => *h,
        }
    }

    /// Whether the graph changed
    pub fn is_change(&self) -> bool {
        !matches!(self, MergeOutcome::Unchanged(_))
    }
}

/// Serialisable view of one concept
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ConceptSnapshot {
    pub description: String,
    pub type_name: String,
    pub members: BTreeMap<String, String>,
}

/// Keyed, append-only collection of concept instances
#[derive(Debug, Clone)]
pub struct ConceptGraph {
    registry: Arc<ConceptTypeRegistry>,
    concepts: Vec<Concept>,
    index: HashMap<ConceptKey, ConceptHandle>,
}

impl ConceptGraph {
    pub fn new(registry: Arc<ConceptTypeRegistry>) -> Self {
        Self {
            registry,
            concepts: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ConceptTypeRegistry {
        &self.registry
    }

    /// Insert a concept or merge it into the existing concept with the same key.
    ///
    /// Merging fills members the existing concept does not have yet. A different
    /// concrete type or a different value for a set member is a conflict.
    pub fn insert(&mut self, info: ConceptInfo, origin: ConceptOrigin) -> Result<MergeOutcome, GraphError> {
        let key = self.registry.validate_instance(&info)?;

        let existing_handle = self.index.get(&key).copied();
        let Some(handle) = existing_handle else {
            let handle = ConceptHandle(self.concepts.len());
            self.index.insert(key.clone(), handle);
            self.concepts.push(Concept { handle, key, info, origin });
            return Ok(MergeOutcome::Added(handle));
        };

        let existing = &self.concepts[handle.0];
        if existing.info.type_name != info.type_name {
            return Err(GraphError::TypeConflict {
                description: self.describe(existing),
                existing_type: existing.info.type_name.clone(),
                new_type: info.type_name,
            });
        }

        let mut missing = Vec::new();
        for (member, value) in info.members {
            match existing.info.members.get(&member) {
                None => missing.push((member, value)),
                Some(current) if *current == value => {}
                Some(current) => {
                    return Err(GraphError::Conflict {
                        description: self.describe(existing),
                        member,
                        existing: current.to_string(),
                        new: value.to_string(),
                    });
                }
            }
        }

        if missing.is_empty() {
            return Ok(MergeOutcome::Unchanged(handle));
        }
        let existing = &mut self.concepts[handle.0];
        for (member, value) in missing {
            existing.info.set(member, value);
        }
        Ok(MergeOutcome::Updated(handle))
    }

    pub fn get(&self, handle: ConceptHandle) -> Option<&Concept> {
        self.concepts.get(handle.0)
    }

    pub fn find_by_key(&self, key: &ConceptKey) -> Option<&Concept> {
        self.index.get(key).map(|h| &self.concepts[h.0])
    }

    /// Concepts of the given type or any type derived from it, in insertion order
    pub fn find_by_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Concept> + 'a {
        self.concepts.iter().filter(move |c| self.registry.is_a(&c.info.type_name, type_name))
    }

    /// Concepts with a member referencing the given concept
    pub fn find_referencing(&self, handle: ConceptHandle) -> Vec<&Concept> {
        let Some(target) = self.get(handle) else {
            return Vec::new();
        };
        self.concepts
            .iter()
            .filter(|c| c.handle != handle && c.info.members.values().any(|v| matches!(v, MemberValue::Concept(k) if *k == target.key)))
            .collect()
    }

    /// Concepts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// User-facing description, e.g. `Entity Demo.Person`
    pub fn describe(&self, concept: &Concept) -> String {
        self.registry.describe(&concept.info.type_name, &concept.key)
    }

    /// Description of a key, using the concrete type when the key is in the graph
    pub fn describe_key(&self, key: &ConceptKey) -> String {
        match self.find_by_key(key) {
            Some(concept) => self.describe(concept),
            None => self.registry.describe_key(key),
        }
    }

    /// Sorted, order-independent view of the whole graph
    pub fn snapshot(&self) -> Vec<ConceptSnapshot> {
        let mut snapshot: Vec<_> = self
            .concepts
            .iter()
            .map(|c| ConceptSnapshot {
                description: self.describe(c),
                type_name: c.info.type_name.clone(),
                members: c
                    .info
                    .members
                    .iter()
                    .map(|(name, value)| {
                        let value = match value {
                            MemberValue::Text(text) => text.clone(),
                            MemberValue::Concept(key) => self.describe_key(key),
                        };
                        (name.clone(), value)
                    })
                    .collect(),
            })
            .collect();
        snapshot.sort();
        snapshot
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}
