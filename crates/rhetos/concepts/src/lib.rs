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

//! Common concepts for Rhetos DSL scripts
//!
//! Modules, entities, computed data structures and their properties, with the
//! macros that complete an entity (`ID` key, default lengths, column storage),
//! the validators for references and lengths, and generators producing a C#
//! data model with one file per module.
//!
//! ```text
//! Module Demo
//! {
//!     Entity Person
//!     {
//!         ShortString Name { Required; }
//!         Reference Manager Demo.Person;
//!     }
//! }
//! ```

pub mod codegen;
pub mod macros;
pub mod types;
pub mod validators;

use rhetos_compiler::concepts::{ConceptType, RegistryError};
use rhetos_compiler::plugin::{ConceptCodeGenerator, ConceptMacro, ConceptPlugin, ConceptValidator, DslSyntax, PluginSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct CommonConceptsPlugin;

impl ConceptPlugin for CommonConceptsPlugin {
    fn name(&self) -> &str {
        "CommonConcepts"
    }

    fn concept_types(&self) -> Vec<ConceptType> {
        types::concept_types()
    }

    fn macros(&self) -> Vec<Arc<dyn ConceptMacro>> {
        macros::macros()
    }

    fn validators(&self) -> Vec<Arc<dyn ConceptValidator>> {
        validators::validators()
    }

    fn generators(&self) -> Vec<Arc<dyn ConceptCodeGenerator>> {
        codegen::generators()
    }
}

/// DSL syntax with only the common concepts
pub fn syntax() -> Result<DslSyntax, RegistryError> {
    PluginSet::new().with_plugin(CommonConceptsPlugin).build()
}
