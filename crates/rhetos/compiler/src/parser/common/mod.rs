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

//! Common parsing utilities and types

pub mod error;
pub mod position;
pub mod token;

pub use error::{ParseError, ParseErrorKind, ParseResult, ScriptLocation};
pub use position::{Position, Span};
pub use token::{SPECIAL_CHARACTERS, Token, TokenType};

use serde::{Deserialize, Serialize};

/// Configuration for the DSL parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum depth of nested `{ ... }` blocks
    pub max_nesting_depth: usize,
    /// Attach the failure of every candidate type to a malformed-parameters error
    pub report_candidate_failures: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 64,
            report_candidate_failures: true,
        }
    }
}

impl ParserConfig {
    /// Create a new parser configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum nesting depth
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Enable or disable candidate failure reporting
    pub fn with_candidate_failures(mut self, enable: bool) -> Self {
        self.report_candidate_failures = enable;
        self
    }
}

/// Utility functions for parsing
pub mod utils {
    use super::SPECIAL_CHARACTERS;

    /// Opening or closing quote of a quoted string
    pub fn is_quote(c: char) -> bool {
        c == '"' || c == '\''
    }

    pub fn is_special(c: char) -> bool {
        SPECIAL_CHARACTERS.contains(&c)
    }

    /// Control characters other than whitespace are never valid in a script
    pub fn is_invalid(c: char) -> bool {
        c.is_control() && !c.is_whitespace()
    }

    /// Check if `s` can be written as a single unquoted text token
    pub fn is_plain_text(s: &str) -> bool {
        !s.is_empty() && !s.contains("//") && !s.contains("/*") && s.chars().all(|c| !c.is_whitespace() && !is_special(c) && !is_quote(c) && !is_invalid(c))
    }
}
