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

//! Build-level error type aggregating every stage

use crate::codegen::{CodegenError, WriterError};
use crate::concepts::{GraphError, RegistryError};
use crate::config::ConfigError;
use crate::dependency_analysis::DependencyError;
use crate::macros::MacroError;
use crate::parser::common::{ParseError, ScriptLocation};
use crate::validation::ValidationError;
use rhetos_common::ScriptLoadError;
use serde::Serialize;
use thiserror::Error;

pub type RhetosResult<T> = Result<T, RhetosError>;

#[derive(Error, Debug)]
pub enum RhetosError {
    #[error("Failed to load DSL scripts: {0}")]
    Scripts(#[from] ScriptLoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Macro(#[from] MacroError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("Compilation of generated sources failed: {0}")]
    Compile(String),
}

impl RhetosError {
    pub fn code(&self) -> &'static str {
        match self {
            RhetosError::Scripts(_) => "RH001",
            RhetosError::Config(_) => "RH002",
            RhetosError::Parse(error) => error.kind.code(),
            RhetosError::Registry(error) => error.code(),
            RhetosError::Graph(error) => error.code(),
            RhetosError::Macro(error) => error.code(),
            RhetosError::Validation(error) => error.code(),
            RhetosError::Dependency(error) => error.code(),
            RhetosError::Codegen(error) => error.code(),
            RhetosError::Writer(error) => error.code(),
            RhetosError::Compile(_) => "RH901",
        }
    }

    /// Structured form for tooling; validation failures become one diagnostic each
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            RhetosError::Parse(error) => {
                let mut diagnostics = vec![Diagnostic::from_parse_error(error)];
                diagnostics.extend(error.related.iter().map(Diagnostic::from_parse_error));
                diagnostics
            }
            RhetosError::Validation(error) => error
                .failures
                .iter()
                .map(|failure| Diagnostic {
                    code: error.code(),
                    message: failure.to_string(),
                    concept: Some(failure.concept.clone()),
                    location: None,
                })
                .collect(),
            other => vec![Diagnostic {
                code: other.code(),
                message: other.to_string(),
                concept: None,
                location: None,
            }],
        }
    }
}

/// One reportable problem, serializable for IDE and CI tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ScriptLocation>,
}

impl Diagnostic {
    fn from_parse_error(error: &ParseError) -> Self {
        let message = match &error.context {
            Some(context) => format!("{} ({})", error.message, context),
            None => error.message.clone(),
        };
        Self {
            code: error.kind.code(),
            message,
            concept: None,
            location: error.location.clone(),
        }
    }
}
