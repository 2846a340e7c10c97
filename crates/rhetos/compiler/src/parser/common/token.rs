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

//! Token definitions for DSL scripts

use super::error::ScriptLocation;
use super::position::Span;
use rhetos_common::DslScript;
use std::fmt;
use std::sync::Arc;

/// Characters that always form a token of their own
pub const SPECIAL_CHARACTERS: &[char] = &['{', '}', ';', '.', ':', ','];

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Keyword or identifier text
    Text,
    /// Quoted string, value is unescaped
    QuotedString,
    /// Single structural character
    Special,
    /// Line or block comment
    Comment,
    /// Run of whitespace
    Whitespace,
    /// End of one script; statements never cross it
    EndOfFile,
}

impl TokenType {
    /// Whether the parser looks at tokens of this type
    pub fn is_significant(self) -> bool {
        !matches!(self, TokenType::Comment | TokenType::Whitespace)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Text => "text",
            TokenType::QuotedString => "quoted string",
            TokenType::Special => "special character",
            TokenType::Comment => "comment",
            TokenType::Whitespace => "whitespace",
            TokenType::EndOfFile => "end of script",
        };
        f.write_str(name)
    }
}

/// A token with its position in the originating script
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Token value; quoted strings hold the unescaped content
    pub value: String,
    /// Byte range of the raw lexeme
    pub span: Span,
    pub script: Arc<DslScript>,
}

impl Token {
    pub fn new(token_type: TokenType, value: String, span: Span, script: Arc<DslScript>) -> Self {
        Self { token_type, value, span, script }
    }

    /// Check whether this is the given special character
    pub fn is_special(&self, ch: char) -> bool {
        self.token_type == TokenType::Special && self.value.chars().eq(std::iter::once(ch))
    }

    /// Text or quoted string, the two kinds that may carry a member value
    pub fn is_value(&self) -> bool {
        matches!(self.token_type, TokenType::Text | TokenType::QuotedString)
    }

    pub fn is_end_of_file(&self) -> bool {
        self.token_type == TokenType::EndOfFile
    }

    /// Location of this token for diagnostics
    pub fn location(&self) -> ScriptLocation {
        ScriptLocation::new(&self.script, self.span)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::EndOfFile => write!(f, "end of script '{}'", self.script.name),
            TokenType::QuotedString => write!(f, "\"{}\"", self.value),
            _ => write!(f, "'{}'", self.value),
        }
    }
}
