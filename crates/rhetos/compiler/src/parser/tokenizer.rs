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

//! DSL tokenizer
//!
//! Tokens are scanned lazily and cached: the token list only grows, so any
//! position handed out by a [`TokenReader`] stays valid and the parser can
//! rewind to it while trying alternative concept types. A lexical error is
//! remembered and reported again to every caller that reaches it.

use crate::parser::common::{ParseError, ParseErrorKind, ParseResult, Span, Token, TokenType, utils};
use rhetos_common::DslScript;
use std::sync::Arc;
use tracing::debug;

/// Lazy, restartable tokenizer over an ordered set of scripts
#[derive(Debug)]
pub struct Tokenizer {
    scripts: Vec<Arc<DslScript>>,
    tokens: Vec<Token>,
    /// Script currently being scanned
    script_index: usize,
    /// Byte offset of the next unscanned character in the current script
    offset: usize,
    failure: Option<ParseError>,
}

impl Tokenizer {
    /// Create a tokenizer over scripts in the given order
    pub fn new(scripts: impl IntoIterator<Item = DslScript>) -> Self {
        Self::from_shared(scripts.into_iter().map(Arc::new).collect())
    }

    pub fn from_shared(scripts: Vec<Arc<DslScript>>) -> Self {
        Self {
            scripts,
            tokens: Vec::new(),
            script_index: 0,
            offset: 0,
            failure: None,
        }
    }

    pub fn scripts(&self) -> &[Arc<DslScript>] {
        &self.scripts
    }

    /// Number of tokens scanned so far
    pub fn scanned(&self) -> usize {
        self.tokens.len()
    }

    /// Whether every script has been scanned
    pub fn is_complete(&self) -> bool {
        self.script_index >= self.scripts.len()
    }

    /// Token at `index`, scanning forward as needed.
    ///
    /// Returns `Ok(None)` past the end of the last script.
    pub fn token(&mut self, index: usize) -> ParseResult<Option<&Token>> {
        while self.tokens.len() <= index {
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            if self.is_complete() {
                return Ok(None);
            }
            if let Err(error) = self.scan_next() {
                debug!("Tokenizer stopped: {}", error);
                self.failure = Some(error.clone());
                return Err(error);
            }
        }
        Ok(self.tokens.get(index))
    }

    /// Scan all remaining input and return every token
    pub fn tokenize_all(&mut self) -> ParseResult<&[Token]> {
        let mut index = self.tokens.len();
        while self.token(index)?.is_some() {
            index += 1;
        }
        Ok(&self.tokens)
    }

    /// Start reading significant tokens from the beginning
    pub fn reader(&mut self) -> TokenReader<'_> {
        TokenReader { tokenizer: self, position: 0 }
    }

    fn scan_next(&mut self) -> ParseResult<()> {
        let script = Arc::clone(&self.scripts[self.script_index]);
        let text = script.script.as_str();
        let start = self.offset;

        let Some(ch) = text[start..].chars().next() else {
            self.push(&script, TokenType::EndOfFile, String::new(), Span::empty(text.len()));
            self.script_index += 1;
            self.offset = 0;
            return Ok(());
        };

        let rest = &text[start..];
        let (token_type, value, end) = if ch.is_whitespace() {
            let len = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
            (TokenType::Whitespace, rest[..len].to_string(), start + len)
        } else if rest.starts_with("//") {
            let len = rest.find('\n').unwrap_or(rest.len());
            (TokenType::Comment, rest[..len].to_string(), start + len)
        } else if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(close) => {
                    let len = close + 4;
                    (TokenType::Comment, rest[..len].to_string(), start + len)
                }
                None => {
                    return Err(self.error(&script, ParseErrorKind::UnterminatedComment, Span::new(start, start + 2), "Block comment is never closed with '*/'"));
                }
            }
        } else if utils::is_quote(ch) {
            let (value, end) = self.scan_quoted(&script, start, ch)?;
            (TokenType::QuotedString, value, end)
        } else if utils::is_special(ch) {
            (TokenType::Special, ch.to_string(), start + ch.len_utf8())
        } else if utils::is_invalid(ch) {
            return Err(self.error(
                &script,
                ParseErrorKind::InvalidCharacter,
                Span::new(start, start + ch.len_utf8()),
                format!("Character U+{:04X} is not allowed", ch as u32),
            ));
        } else {
            let len = text_length(rest);
            (TokenType::Text, rest[..len].to_string(), start + len)
        };

        self.push(&script, token_type, value, Span::new(start, end));
        self.offset = end;
        Ok(())
    }

    /// Scan a quoted string starting at `start`; a doubled quote is an escaped quote
    fn scan_quoted(&self, script: &Arc<DslScript>, start: usize, quote: char) -> ParseResult<(String, usize)> {
        let text = script.script.as_str();
        let mut value = String::new();
        let mut chars = text[start + quote.len_utf8()..].char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != quote {
                value.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, next)) if *next == quote) {
                value.push(quote);
                chars.next();
                continue;
            }
            let end = start + quote.len_utf8() + i + quote.len_utf8();
            return Ok((value, end));
        }

        Err(self.error(
            script,
            ParseErrorKind::UnterminatedString,
            Span::new(start, text.len()),
            format!("Missing closing {} for the string started here", quote),
        ))
    }

    fn push(&mut self, script: &Arc<DslScript>, token_type: TokenType, value: String, span: Span) {
        self.tokens.push(Token::new(token_type, value, span, Arc::clone(script)));
    }

    fn error(&self, script: &DslScript, kind: ParseErrorKind, span: Span, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, message).with_location(crate::parser::common::ScriptLocation::new(script, span))
    }
}

/// Byte length of the text token at the start of `rest`
fn text_length(rest: &str) -> usize {
    let mut previous_slash = false;
    for (i, c) in rest.char_indices() {
        if c.is_whitespace() || utils::is_special(c) || utils::is_quote(c) || utils::is_invalid(c) {
            return i;
        }
        if previous_slash && (c == '/' || c == '*') {
            return i - 1;
        }
        previous_slash = c == '/';
    }
    rest.len()
}

/// Cursor over the significant tokens of a [`Tokenizer`]
#[derive(Debug)]
pub struct TokenReader<'a> {
    tokenizer: &'a mut Tokenizer,
    position: usize,
}

impl<'a> TokenReader<'a> {
    /// Index of the next token to read; pass it to [`TokenReader::reset`] to backtrack
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self, position: usize) {
        self.position = position;
    }

    /// Next significant token without consuming it
    pub fn peek(&mut self) -> ParseResult<Option<Token>> {
        Ok(self.next_significant()?.map(|(_, token)| token))
    }

    /// Consume and return the next significant token
    pub fn next(&mut self) -> ParseResult<Option<Token>> {
        match self.next_significant()? {
            Some((index, token)) => {
                self.position = index + 1;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    /// Consume the next token if it is the given special character
    pub fn accept_special(&mut self, ch: char) -> ParseResult<bool> {
        match self.next_significant()? {
            Some((index, token)) if token.is_special(ch) => {
                self.position = index + 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Whether all scripts are exhausted
    pub fn at_end(&mut self) -> ParseResult<bool> {
        Ok(self.next_significant()?.is_none())
    }

    fn next_significant(&mut self) -> ParseResult<Option<(usize, Token)>> {
        let mut index = self.position;
        loop {
            match self.tokenizer.token(index)? {
                None => return Ok(None),
                Some(token) if token.token_type.is_significant() => return Ok(Some((index, token.clone()))),
                Some(_) => index += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn tokenize(text: &str) -> ParseResult<Vec<Token>> {
        let mut tokenizer = Tokenizer::new(vec![DslScript::from_text("test.rhe", text)]);
        Ok(tokenizer.tokenize_all()?.to_vec())
    }

    fn significant(text: &str) -> Vec<String> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .filter(|t| t.token_type.is_significant() && !t.is_end_of_file())
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_nested_module_tokens() {
        assert_eq!(significant("Module M { Entity E { Integer I; } }"), vec!["Module", "M", "{", "Entity", "E", "{", "Integer", "I", ";", "}", "}"]);
    }

    #[test_case("Entity Demo.Person;", &["Entity", "Demo", ".", "Person", ";"] ; "dotted key path")]
    #[test_case("A//comment\nB", &["A", "B"] ; "line comment")]
    #[test_case("A/*x\ny*/B", &["A", "B"] ; "block comment")]
    #[test_case("A/B", &["A/B"] ; "slash inside text")]
    #[test_case("x:y,z", &["x", ":", "y", ",", "z"] ; "colon and comma")]
    #[test_case("Name 'It''s'", &["Name", "It's"] ; "doubled single quote")]
    #[test_case("\"say \"\"hi\"\"\"", &["say \"hi\""] ; "doubled double quote")]
    #[test_case("Přijmení", &["Přijmení"] ; "non-ascii text")]
    fn test_significant_tokens(text: &str, expected: &[&str]) {
        assert_eq!(significant(text), expected);
    }

    #[test_case("Entity 'unterminated", ParseErrorKind::UnterminatedString, 7 ; "unterminated string")]
    #[test_case("A /* open", ParseErrorKind::UnterminatedComment, 2 ; "unterminated comment")]
    #[test_case("A \u{1} B", ParseErrorKind::InvalidCharacter, 2 ; "control character")]
    fn test_lexical_errors(text: &str, kind: ParseErrorKind, offset: usize) {
        let error = tokenize(text).unwrap_err();
        assert_eq!(error.kind, kind);
        assert_eq!(error.offset(), offset);
        assert_eq!(error.location.unwrap().script_name, "test.rhe");
    }

    #[test]
    fn test_whitespace_and_comments_keep_positions() {
        let tokens = tokenize("A // c\n  B").unwrap();
        let types: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![TokenType::Text, TokenType::Whitespace, TokenType::Comment, TokenType::Whitespace, TokenType::Text, TokenType::EndOfFile]
        );
        let b = &tokens[4];
        assert_eq!(b.span, Span::new(9, 10));
        assert_eq!(b.location().position.line, 2);
    }

    #[test]
    fn test_each_script_ends_with_end_of_file() {
        let mut tokenizer = Tokenizer::new(vec![DslScript::from_text("a.rhe", "A"), DslScript::from_text("b.rhe", "B")]);
        let tokens = tokenizer.tokenize_all().unwrap();
        let summary: Vec<_> = tokens.iter().map(|t| (t.script.name.as_str(), t.token_type)).collect();
        assert_eq!(
            summary,
            vec![("a.rhe", TokenType::Text), ("a.rhe", TokenType::EndOfFile), ("b.rhe", TokenType::Text), ("b.rhe", TokenType::EndOfFile)]
        );
    }

    #[test]
    fn test_scanning_is_lazy() {
        let mut tokenizer = Tokenizer::new(vec![DslScript::from_text("a.rhe", "A B C D")]);
        assert_eq!(tokenizer.token(0).unwrap().unwrap().value, "A");
        assert_eq!(tokenizer.scanned(), 1);
        assert!(!tokenizer.is_complete());
    }

    #[test]
    fn test_reader_backtracking() {
        let mut tokenizer = Tokenizer::new(vec![DslScript::from_text("a.rhe", "Entity  E ;")]);
        let mut reader = tokenizer.reader();
        let start = reader.position();
        assert_eq!(reader.next().unwrap().unwrap().value, "Entity");
        assert_eq!(reader.next().unwrap().unwrap().value, "E");
        reader.reset(start);
        assert_eq!(reader.peek().unwrap().unwrap().value, "Entity");
        reader.next().unwrap();
        reader.next().unwrap();
        assert!(reader.accept_special(';').unwrap());
        assert!(reader.next().unwrap().unwrap().is_end_of_file());
        assert!(reader.at_end().unwrap());
    }

    #[test]
    fn test_error_is_reported_again_after_restart() {
        let mut tokenizer = Tokenizer::new(vec![DslScript::from_text("a.rhe", "A B 'x")]);
        let mut reader = tokenizer.reader();
        reader.next().unwrap();
        reader.next().unwrap();
        let first = reader.next().unwrap_err();
        reader.reset(0);
        assert_eq!(reader.next().unwrap().unwrap().value, "A");
        reader.next().unwrap();
        let second = reader.next().unwrap_err();
        assert_eq!(first.kind, second.kind);
        assert_eq!(first.offset(), second.offset());
    }
}
