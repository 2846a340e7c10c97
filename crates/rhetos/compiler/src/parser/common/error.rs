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

//! Parser error types and handling

use super::position::{Position, Span};
use super::token::Token;
use rhetos_common::DslScript;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for tokenizing and parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Exact place in a script an error refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptLocation {
    pub script_name: String,
    pub script_path: PathBuf,
    /// Byte range of the offending text
    pub span: Span,
    /// Line and column of the span start
    pub position: Position,
    /// Full text of the line containing the span start
    pub source_line: String,
}

impl ScriptLocation {
    pub fn new(script: &DslScript, span: Span) -> Self {
        let (line, column) = script.line_column(span.start);
        Self {
            script_name: script.name.clone(),
            script_path: script.path.clone(),
            span,
            position: Position::new(line, column),
            source_line: script.line_text(span.start).to_string(),
        }
    }

    /// Source line with a caret under the error position
    pub fn excerpt(&self) -> String {
        let pad: String = self.source_line.chars().take(self.position.column.saturating_sub(1)).map(|c| if c == '\t' { '\t' } else { ' ' }).collect();
        format!("{}\n{}^", self.source_line, pad)
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.script_name, self.position)
    }
}

/// Error raised by the tokenizer or the parser
#[derive(Error, Debug, Clone)]
pub struct ParseError {
    /// The kind of error
    pub kind: ParseErrorKind,
    /// Where the error occurred, if it can be tied to a script
    pub location: Option<ScriptLocation>,
    /// Human-readable error message
    pub message: String,
    /// Additional context or suggestions
    pub context: Option<String>,
    /// Related errors, e.g. the failure of each candidate concept type
    pub related: Vec<ParseError>,
}

impl ParseError {
    /// Create a new parse error without a location
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: None,
            message: message.into(),
            context: None,
            related: Vec::new(),
        }
    }

    /// Create an error located at a token
    pub fn at_token(kind: ParseErrorKind, token: &Token, message: impl Into<String>) -> Self {
        Self::new(kind, message).with_location(token.location())
    }

    pub fn with_location(mut self, location: ScriptLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Create an error with context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a related error
    pub fn with_related(mut self, related: ParseError) -> Self {
        self.related.push(related);
        self
    }

    /// Add multiple related errors
    pub fn with_related_errors(mut self, related: Vec<ParseError>) -> Self {
        self.related.extend(related);
        self
    }

    /// Byte offset of the error, used to pick the error that got furthest
    pub fn offset(&self) -> usize {
        self.location.as_ref().map(|l| l.span.start).unwrap_or(0)
    }

    /// Check if this error stops parsing regardless of remaining candidates
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::UnterminatedString | ParseErrorKind::UnterminatedComment | ParseErrorKind::InvalidCharacter | ParseErrorKind::RecursionLimitExceeded
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.location {
            Some(location) => format!("{} at {}: {}", self.kind.description(), location, self.message),
            None => format!("{}: {}", self.kind.description(), self.message),
        }
    }

    /// Get detailed error information including the script excerpt
    pub fn debug_message(&self) -> String {
        let mut msg = format!("[{}] {}", self.kind.code(), self.user_message());

        if let Some(location) = &self.location {
            msg.push_str(&format!("\n{}", location.excerpt()));
        }

        if let Some(context) = &self.context {
            msg.push_str(&format!("\nContext: {}", context));
        }

        if !self.related.is_empty() {
            msg.push_str("\nRelated errors:");
            for (i, error) in self.related.iter().enumerate() {
                msg.push_str(&format!("\n  {}: {}", i + 1, error.user_message()));
            }
        }

        msg
    }

    /// Create an unexpected token error
    pub fn unexpected_token(token: &Token, expected: &str) -> Self {
        if token.is_end_of_file() {
            return Self::unexpected_eof(token, expected);
        }
        Self::at_token(ParseErrorKind::UnexpectedToken, token, format!("Found {}, expected {}", token, expected))
    }

    /// Create an unexpected end of script error
    pub fn unexpected_eof(token: &Token, expected: &str) -> Self {
        Self::at_token(ParseErrorKind::UnexpectedEof, token, format!("Script '{}' ended, expected {}", token.script.name, expected))
    }

    /// Create an unknown keyword error
    pub fn unknown_keyword(token: &Token) -> Self {
        Self::at_token(ParseErrorKind::UnknownKeyword, token, format!("Unrecognized concept keyword '{}'", token.value))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// Categories of parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Invalid character")]
    InvalidCharacter,

    #[error("Unexpected token")]
    UnexpectedToken,

    #[error("Unexpected end of script")]
    UnexpectedEof,

    #[error("Unknown keyword")]
    UnknownKeyword,

    #[error("Malformed parameters")]
    MalformedParameters,

    #[error("Ambiguous syntax")]
    AmbiguousSyntax,

    #[error("Conflicting declaration")]
    ConflictingDeclaration,

    #[error("Invalid concept")]
    InvalidConcept,

    #[error("Recursion limit exceeded")]
    RecursionLimitExceeded,
}

impl ParseErrorKind {
    /// Get a short error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::UnterminatedString => "RH101",
            ParseErrorKind::UnterminatedComment => "RH102",
            ParseErrorKind::InvalidCharacter => "RH103",
            ParseErrorKind::UnexpectedToken => "RH104",
            ParseErrorKind::UnexpectedEof => "RH105",
            ParseErrorKind::UnknownKeyword => "RH106",
            ParseErrorKind::MalformedParameters => "RH107",
            ParseErrorKind::AmbiguousSyntax => "RH108",
            ParseErrorKind::ConflictingDeclaration => "RH109",
            ParseErrorKind::InvalidConcept => "RH110",
            ParseErrorKind::RecursionLimitExceeded => "RH111",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ParseErrorKind::UnterminatedString => "Unterminated quoted string",
            ParseErrorKind::UnterminatedComment => "Unterminated block comment",
            ParseErrorKind::InvalidCharacter => "Invalid character",
            ParseErrorKind::UnexpectedToken => "Unexpected token",
            ParseErrorKind::UnexpectedEof => "Unexpected end of script",
            ParseErrorKind::UnknownKeyword => "Unknown keyword",
            ParseErrorKind::MalformedParameters => "Malformed concept parameters",
            ParseErrorKind::AmbiguousSyntax => "Ambiguous syntax",
            ParseErrorKind::ConflictingDeclaration => "Conflicting concept declaration",
            ParseErrorKind::InvalidConcept => "Invalid concept",
            ParseErrorKind::RecursionLimitExceeded => "Nesting limit exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::common::token::TokenType;
    use std::sync::Arc;

    fn token_at(text: &str, start: usize, end: usize) -> Token {
        let script = Arc::new(DslScript::from_text("test.rhe", text));
        Token::new(TokenType::Text, text[start..end].to_string(), Span::new(start, end), script)
    }

    #[test]
    fn test_error_location_and_excerpt() {
        let token = token_at("Module M\n  Entiti E;", 11, 17);
        let error = ParseError::unknown_keyword(&token);

        let location = error.location.as_ref().unwrap();
        assert_eq!(location.position, Position::new(2, 3));
        assert_eq!(location.span, Span::new(11, 17));
        assert_eq!(location.excerpt(), "  Entiti E;\n  ^");
        assert!(error.user_message().contains("test.rhe:2:3"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ParseErrorKind::UnterminatedString.code(), "RH101");
        assert_eq!(ParseErrorKind::UnknownKeyword.code(), "RH106");
        assert_eq!(ParseErrorKind::RecursionLimitExceeded.code(), "RH111");
    }

    #[test]
    fn test_fatal_errors() {
        assert!(ParseError::new(ParseErrorKind::InvalidCharacter, "x").is_fatal());
        assert!(!ParseError::new(ParseErrorKind::UnexpectedToken, "x").is_fatal());
    }

    #[test]
    fn test_debug_message_lists_related() {
        let token = token_at("Entity E", 7, 8);
        let error = ParseError::new(ParseErrorKind::MalformedParameters, "no candidate matched")
            .with_related(ParseError::unexpected_token(&token, "'.'"))
            .with_context("candidates: EntityInfo");

        let debug = error.debug_message();
        assert!(debug.starts_with("[RH107]"));
        assert!(debug.contains("Context: candidates: EntityInfo"));
        assert!(debug.contains("1: Unexpected token at test.rhe:1:8"));
    }

    #[test]
    fn test_unexpected_token_at_end_of_file() {
        let script = Arc::new(DslScript::from_text("test.rhe", "Module"));
        let eof = Token::new(TokenType::EndOfFile, String::new(), Span::empty(6), script);
        let error = ParseError::unexpected_token(&eof, "a module name");
        assert_eq!(error.kind, ParseErrorKind::UnexpectedEof);
    }
}
