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

//! Post-expansion validation of the concept graph

use crate::concepts::{ConceptGraph, MemberType, MemberValue};
use crate::plugin::DslSyntax;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// One semantic problem, reported against the concept it concerns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// User description of the concept, e.g. `Reference Demo.Person.Manager`
    pub concept: String,
    /// Validator name; `None` for built-in reference checks
    pub validator: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.concept, self.message)
    }
}

/// All semantic failures of one build
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} validation error(s):\n{}", .failures.len(), .failures.iter().map(|f| format!("  {}", f)).collect::<Vec<_>>().join("\n"))]
pub struct ValidationError {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        "RH501"
    }
}

/// Check references, then run plugin validators; every failure is collected
pub fn validate_graph(syntax: &DslSyntax, graph: &ConceptGraph) -> Result<(), ValidationError> {
    let registry = graph.registry();
    let mut failures = Vec::new();

    for concept in graph.iter() {
        let Some(concept_type) = registry.get(concept.type_name()) else {
            continue;
        };
        for (name, value) in &concept.info.members {
            let (MemberValue::Concept(key), Some(member)) = (value, concept_type.member(name)) else {
                continue;
            };
            match graph.find_by_key(key) {
                None => failures.push(ValidationFailure {
                    concept: graph.describe(concept),
                    validator: None,
                    message: format!("'{}' references {}, which is not declared", name, registry.describe_key(key)),
                }),
                Some(target) => {
                    if let MemberType::Concept(expected) = &member.value_type {
                        if !registry.is_a(target.type_name(), expected) {
                            failures.push(ValidationFailure {
                                concept: graph.describe(concept),
                                validator: None,
                                message: format!("'{}' must reference a {}, but {} is a {}", name, expected, graph.describe(target), target.type_name()),
                            });
                        }
                    }
                }
            }
        }
    }

    for validator in syntax.validators() {
        for concept in graph.find_by_type(validator.input_type()) {
            if let Err(message) = validator.validate(concept, graph) {
                failures.push(ValidationFailure {
                    concept: graph.describe(concept),
                    validator: Some(validator.name().to_string()),
                    message,
                });
            }
        }
    }

    debug!("Validated {} concepts with {} validators: {} failures", graph.len(), syntax.validators().len(), failures.len());
    if failures.is_empty() { Ok(()) } else { Err(ValidationError { failures }) }
}
