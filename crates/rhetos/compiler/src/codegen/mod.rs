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

//! Tag-based code generation
//!
//! Generators contribute fragments to named tags owned by concepts and to
//! output files. After every concept is processed the builder flattens all
//! tags into the final file contents, and the [`SourceWriter`] puts them on
//! disk.

pub mod builder;
pub mod error;
pub mod generator;
pub mod registry;
pub mod tags;
pub mod writer;

pub use builder::{CodeBuilder, GeneratedFile, GeneratedSourceSet, OutputTarget};
pub use error::CodegenError;
pub use generator::{CodeGenerator, GenerationOutput};
pub use registry::GeneratorRegistry;
pub use tags::{Tag, TagKind, TagTemplate};
pub use writer::{SourceWriter, StagingDir, WriteReport, WriterError};
