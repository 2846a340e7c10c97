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

//! Concept types built into every DSL syntax

use super::registry::{ConceptMember, ConceptType};

/// Type name of the explicit dependency concept
pub const DEPENDS_ON_TYPE: &str = "DependsOnInfo";

/// Member holding the concept that must come later
pub const DEPENDENT_MEMBER: &str = "Dependent";

/// Member holding the concept that must come first
pub const DEPENDS_ON_MEMBER: &str = "DependsOn";

/// `DependsOn <dependent> <dependency>`: an explicit ordering edge between any two concepts
pub fn depends_on_type() -> ConceptType {
    ConceptType::new(DEPENDS_ON_TYPE)
        .keyword("DependsOn")
        .member(ConceptMember::key_any(DEPENDENT_MEMBER))
        .member(ConceptMember::key_any(DEPENDS_ON_MEMBER))
}

pub fn core_concept_types() -> Vec<ConceptType> {
    vec![depends_on_type()]
}
