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

//! Concept model: type registry, instance values and the concept graph

pub mod builtin;
pub mod error;
pub mod graph;
pub mod registry;
pub mod value;

pub use builtin::{DEPENDS_ON_MEMBER, DEPENDS_ON_TYPE, DEPENDENT_MEMBER, core_concept_types};
pub use error::{GraphError, RegistryError};
pub use graph::{Concept, ConceptGraph, ConceptHandle, ConceptOrigin, ConceptSnapshot, MergeOutcome};
pub use registry::{ConceptMember, ConceptType, ConceptTypeRegistry, MemberType, ResolvedConceptType};
pub use value::{ConceptInfo, ConceptKey, KeyValue, MemberValue};
