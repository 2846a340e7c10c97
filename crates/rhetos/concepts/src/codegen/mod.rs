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

//! C# data model generators
//!
//! Each module becomes one `<Module>.cs` file. Classes, properties and
//! attributes are assembled through tags owned by the concept they belong to.

pub mod model;
pub mod properties;

use rhetos_compiler::codegen::TagTemplate;
use rhetos_compiler::plugin::ConceptCodeGenerator;
use std::sync::Arc;

/// Classes of a module, inside its namespace
pub const MODULE_MEMBERS: TagTemplate = TagTemplate::appendable("ModuleMembers");
/// Attribute lines above a class
pub const CLASS_ATTRIBUTES: TagTemplate = TagTemplate::appendable("ClassAttributes");
/// Base type list of a class, empty by default
pub const BASE_TYPE: TagTemplate = TagTemplate::replaceable("BaseType");
/// Members of a class
pub const CLASS_BODY: TagTemplate = TagTemplate::appendable("ClassBody");
/// Attribute lines above a property
pub const PROPERTY_ATTRIBUTES: TagTemplate = TagTemplate::appendable("PropertyAttributes");
/// CLR type of a property
pub const PROPERTY_TYPE: TagTemplate = TagTemplate::replaceable("PropertyType");

pub fn generators() -> Vec<Arc<dyn ConceptCodeGenerator>> {
    vec![
        Arc::new(model::ModuleCodeGenerator),
        Arc::new(model::DataStructureCodeGenerator),
        Arc::new(model::EntityCodeGenerator),
        Arc::new(properties::PropertyCodeGenerator),
        Arc::new(properties::AttributeCodeGenerator::required()),
        Arc::new(properties::AttributeCodeGenerator::max_length()),
        Arc::new(properties::AttributeCodeGenerator::column()),
        Arc::new(properties::PrimaryKeyCodeGenerator),
    ]
}
