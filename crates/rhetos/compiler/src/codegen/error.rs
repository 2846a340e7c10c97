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

//! Code generation errors

use crate::dependency_analysis::DependencyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("Multiple generators writing the same output: tag '{tag}' is replaced by {first} and by {second}")]
    MultipleWriters { tag: String, first: String, second: String },

    #[error("Tag '{tag}' is used both as an appendable and as a replaceable tag (by {writer})")]
    TagKindConflict { tag: String, writer: String },

    #[error("Output file '{path}' is written by output group '{first_group}' and by output group '{second_group}'")]
    DuplicateOutputFile { path: String, first_group: String, second_group: String },

    #[error("Output group '{group}' is written to '{first_path}' and to '{second_path}'")]
    InconsistentOutputPath { group: String, first_path: String, second_path: String },

    #[error("Tag '{tag}' contains its own marker: {}", .chain.join(" -> "))]
    RecursiveTag { tag: String, chain: Vec<String> },

    #[error("Generator '{generator}' failed on {concept}: {message}")]
    GeneratorFailed { generator: String, concept: String, message: String },

    #[error("Invalid tag marker pattern: {0}")]
    MarkerPattern(String),

    #[error(transparent)]
    Dependency(#[from] DependencyError),
}

impl CodegenError {
    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::MultipleWriters { .. } => "RH701",
            CodegenError::TagKindConflict { .. } => "RH702",
            CodegenError::DuplicateOutputFile { .. } => "RH703",
            CodegenError::InconsistentOutputPath { .. } => "RH704",
            CodegenError::RecursiveTag { .. } => "RH705",
            CodegenError::GeneratorFailed { .. } => "RH706",
            CodegenError::MarkerPattern(_) => "RH707",
            CodegenError::Dependency(error) => error.code(),
        }
    }
}

impl From<regex::Error> for CodegenError {
    fn from(error: regex::Error) -> Self {
        CodegenError::MarkerPattern(error.to_string())
    }
}
