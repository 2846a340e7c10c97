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

//! Rhetos DSL compiler
//!
//! Turns concept scripts into generated source files:
//!
//! 1. [`parser::tokenizer`] splits scripts into tokens
//! 2. [`parser`] matches statements against the [`concepts::ConceptTypeRegistry`] and fills the [`concepts::ConceptGraph`]
//! 3. [`macros`] derives implicit concepts until nothing changes
//! 4. [`validation`] checks references and plugin invariants
//! 5. [`dependency_analysis`] orders the concepts
//! 6. [`codegen`] runs the code generators and writes the output folder
//!
//! Every concept type, macro, validator and generator is supplied by a
//! [`plugin::ConceptPlugin`]; [`compiler::RhetosCompiler`] runs the stages.

pub mod codegen;
pub mod compiler;
pub mod concepts;
pub mod config;
pub mod dependency_analysis;
pub mod error;
pub mod macros;
pub mod parser;
pub mod plugin;
pub mod test_support;
pub mod validation;

pub use codegen::{CodeBuilder, GeneratedFile, GeneratedSourceSet, OutputTarget, SourceWriter, Tag, TagKind, TagTemplate};
pub use compiler::{BuildReport, DslModel, RhetosCompiler, SourceCompiler};
pub use concepts::{Concept, ConceptGraph, ConceptHandle, ConceptInfo, ConceptKey, ConceptMember, ConceptType, ConceptTypeRegistry, KeyValue, MemberValue};
pub use config::CompilerConfig;
pub use error::{Diagnostic, RhetosError, RhetosResult};
pub use plugin::{ConceptCodeGenerator, ConceptMacro, ConceptPlugin, ConceptValidator, DslSyntax, PluginSet};
pub use rhetos_common::DslScript;
