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

//! DSL parser
//!
//! A statement is a keyword followed by the parsable members of a concept type
//! and ends with `;` or with a `{ ... }` block of nested statements. Key members
//! are written as one dot-separated path; other members are separated by
//! whitespace. A nested statement may take its first member from the enclosing
//! concept.
//!
//! A keyword can belong to several concept types. Each candidate is tried from
//! the same token position, with and without the enclosing concept, and the
//! [`TokenReader`] is rewound between attempts.

pub mod common;
pub mod tokenizer;

use crate::concepts::{ConceptGraph, ConceptInfo, ConceptKey, ConceptOrigin, ConceptTypeRegistry, GraphError, KeyValue, MemberType, MemberValue, ResolvedConceptType};
use common::{ParseError, ParseErrorKind, ParseResult, ParserConfig, ScriptLocation, Span, Token, TokenType};
use tokenizer::{TokenReader, Tokenizer};
use tracing::debug;

/// Concept declared by one DSL statement
#[derive(Debug, Clone)]
pub struct ParsedConcept {
    pub info: ConceptInfo,
    pub key: ConceptKey,
    pub location: ScriptLocation,
}

/// Enclosing concept of a nested statement
#[derive(Debug, Clone)]
struct Parent {
    type_name: String,
    key: ConceptKey,
}

/// Successful parse of a statement as one candidate type
#[derive(Debug)]
struct Attempt {
    type_name: String,
    info: ConceptInfo,
    used_context: bool,
    /// Reader position of the statement terminator
    end: usize,
    /// Byte offset after the last member token
    last_offset: usize,
}

/// Position within a dot-separated key path
#[derive(Debug, Clone, Copy)]
struct Cursor {
    last_offset: usize,
    needs_dot: bool,
}

/// Parser from tokens to concept declarations
pub struct DslParser<'a> {
    registry: &'a ConceptTypeRegistry,
    config: ParserConfig,
}

impl<'a> DslParser<'a> {
    pub fn new(registry: &'a ConceptTypeRegistry, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    /// Parse every statement of every script, parents before their nested statements
    pub fn parse(&self, tokenizer: &mut Tokenizer) -> ParseResult<Vec<ParsedConcept>> {
        let mut reader = tokenizer.reader();
        let mut parsed = Vec::new();
        while let Some(token) = reader.peek()? {
            if token.is_end_of_file() {
                reader.next()?;
                continue;
            }
            self.parse_statement(&mut reader, None, 0, &mut parsed)?;
        }
        debug!("Parsed {} concept statements", parsed.len());
        Ok(parsed)
    }

    /// Parse and merge the declarations into `graph`; returns the number of statements
    pub fn parse_into(&self, tokenizer: &mut Tokenizer, graph: &mut ConceptGraph) -> ParseResult<usize> {
        let parsed = self.parse(tokenizer)?;
        let count = parsed.len();
        for concept in parsed {
            let location = concept.location.clone();
            let key = concept.key.clone();
            graph.insert(concept.info, ConceptOrigin::Parsed { location: location.clone() }).map_err(|error| self.declaration_error(graph, &key, location, error))?;
        }
        Ok(count)
    }

    fn declaration_error(&self, graph: &ConceptGraph, key: &ConceptKey, location: ScriptLocation, error: GraphError) -> ParseError {
        if !error.is_conflict() {
            return ParseError::new(ParseErrorKind::InvalidConcept, error.to_string()).with_location(location);
        }
        let mut parse_error = ParseError::new(ParseErrorKind::ConflictingDeclaration, error.to_string()).with_location(location);
        if let Some(ConceptOrigin::Parsed { location: previous }) = graph.find_by_key(key).map(|c| &c.origin) {
            parse_error = parse_error.with_related(ParseError::new(ParseErrorKind::ConflictingDeclaration, "Previous declaration").with_location(previous.clone()));
        }
        parse_error
    }

    fn parse_statement(&self, reader: &mut TokenReader<'_>, parent: Option<&Parent>, depth: usize, out: &mut Vec<ParsedConcept>) -> ParseResult<()> {
        let keyword = expect_token(reader, "a concept keyword")?;
        if keyword.token_type != TokenType::Text {
            return Err(ParseError::unexpected_token(&keyword, "a concept keyword"));
        }
        let candidates = self.registry.types_with_keyword(&keyword.value);
        if candidates.is_empty() {
            return Err(ParseError::unknown_keyword(&keyword));
        }

        let start = reader.position();
        let mut attempts = Vec::new();
        let mut failures = Vec::new();
        for type_name in candidates {
            let Some(concept_type) = self.registry.get(type_name) else {
                continue;
            };
            let mut contexts = vec![None];
            if let Some(parent) = parent.filter(|p| self.accepts_context(concept_type, p)) {
                contexts.push(Some(parent));
            }
            for context in contexts {
                reader.reset(start);
                match self.parse_members(reader, concept_type, context, &keyword) {
                    Ok((info, last_offset)) => attempts.push(Attempt {
                        type_name: type_name.clone(),
                        info,
                        used_context: context.is_some(),
                        end: reader.position(),
                        last_offset,
                    }),
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => failures.push(error),
                }
            }
        }

        let Some(attempt) = self.choose(attempts, &keyword)? else {
            return Err(self.malformed(&keyword, candidates, failures));
        };
        reader.reset(attempt.end);

        let location = ScriptLocation::new(&keyword.script, Span::new(keyword.span.start, attempt.last_offset));
        let key = self
            .registry
            .validate_instance(&attempt.info)
            .map_err(|error| ParseError::new(ParseErrorKind::InvalidConcept, error.to_string()).with_location(location.clone()))?;
        let current = Parent {
            type_name: attempt.type_name,
            key: key.clone(),
        };
        out.push(ParsedConcept { info: attempt.info, key, location });

        if reader.accept_special(';')? {
            return Ok(());
        }

        let open = expect_token(reader, "'{'")?;
        if depth + 1 > self.config.max_nesting_depth {
            return Err(ParseError::at_token(
                ParseErrorKind::RecursionLimitExceeded,
                &open,
                format!("Statements are nested deeper than {} levels", self.config.max_nesting_depth),
            ));
        }
        loop {
            let next = expect_token_peek(reader, "'}'")?;
            if next.is_special('}') {
                reader.next()?;
                break;
            }
            if next.is_end_of_file() {
                return Err(ParseError::unexpected_eof(&next, "'}'").with_context(format!("Block opened at {}", open.location())));
            }
            self.parse_statement(reader, Some(&current), depth + 1, out)?;
        }
        reader.accept_special(';')?;
        Ok(())
    }

    /// Whether a nested statement of `concept_type` may take its first member from `parent`
    fn accepts_context(&self, concept_type: &ResolvedConceptType, parent: &Parent) -> bool {
        match concept_type.parsable_members().next().map(|m| &m.value_type) {
            Some(MemberType::Concept(expected)) => self.registry.is_a(&parent.type_name, expected),
            Some(MemberType::AnyConcept) => true,
            _ => false,
        }
    }

    fn parse_members(&self, reader: &mut TokenReader<'_>, concept_type: &ResolvedConceptType, context: Option<&Parent>, keyword: &Token) -> ParseResult<(ConceptInfo, usize)> {
        let mut info = ConceptInfo::new(&concept_type.name);
        let mut cursor = Cursor {
            last_offset: keyword.span.end,
            needs_dot: false,
        };

        let mut members = concept_type.parsable_members();
        if let Some(parent) = context {
            if let Some(first) = members.next() {
                info.set(first.name.clone(), MemberValue::Concept(parent.key.clone()));
            }
        }

        for member in members {
            // only consecutive key members share a dotted path
            let standalone = !member.is_key || member.value_type == MemberType::AnyConcept;
            if standalone {
                cursor.needs_dot = false;
            }
            let value = self.parse_value(reader, &member.value_type, &mut cursor)?;
            if standalone {
                cursor.needs_dot = false;
            }
            info.set(member.name.clone(), value);
        }

        match reader.peek()? {
            Some(token) if token.is_special(';') || token.is_special('{') => Ok((info, cursor.last_offset)),
            Some(token) => Err(ParseError::unexpected_token(&token, "';' or '{'")),
            None => Err(ParseError::new(ParseErrorKind::UnexpectedEof, "Statement is not terminated")),
        }
    }

    fn parse_value(&self, reader: &mut TokenReader<'_>, value_type: &MemberType, cursor: &mut Cursor) -> ParseResult<MemberValue> {
        match value_type {
            MemberType::Text => Ok(MemberValue::Text(self.parse_text(reader, cursor)?)),
            MemberType::Concept(type_name) => {
                let root = self.registry.root_of(type_name).unwrap_or(type_name);
                Ok(MemberValue::Concept(self.parse_key(reader, root, cursor)?))
            }
            MemberType::AnyConcept => Ok(MemberValue::Concept(self.parse_any_reference(reader, cursor)?)),
        }
    }

    fn parse_text(&self, reader: &mut TokenReader<'_>, cursor: &mut Cursor) -> ParseResult<String> {
        if cursor.needs_dot {
            let dot = expect_token(reader, "'.'")?;
            if !dot.is_special('.') {
                return Err(ParseError::unexpected_token(&dot, "'.'"));
            }
        }
        let token = expect_token(reader, "a value")?;
        if !token.is_value() {
            return Err(ParseError::unexpected_token(&token, "a value"));
        }
        cursor.last_offset = token.span.end;
        cursor.needs_dot = true;
        Ok(token.value)
    }

    /// Key path of a concept of the given root type
    fn parse_key(&self, reader: &mut TokenReader<'_>, root_type: &str, cursor: &mut Cursor) -> ParseResult<ConceptKey> {
        let concept_type = self
            .registry
            .get(root_type)
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidConcept, format!("Unknown concept type '{}'", root_type)))?;

        let mut values = Vec::new();
        for member in concept_type.key_members() {
            let value = match &member.value_type {
                MemberType::Text => KeyValue::Text(self.parse_text(reader, cursor)?),
                MemberType::Concept(type_name) => {
                    let root = self.registry.root_of(type_name).unwrap_or(type_name);
                    KeyValue::Concept(self.parse_key(reader, root, cursor)?)
                }
                MemberType::AnyConcept => {
                    if cursor.needs_dot {
                        let dot = expect_token(reader, "'.'")?;
                        if !dot.is_special('.') {
                            return Err(ParseError::unexpected_token(&dot, "'.'"));
                        }
                    }
                    KeyValue::Concept(self.parse_any_reference(reader, cursor)?)
                }
            };
            values.push(value);
        }
        Ok(ConceptKey::new(root_type, values))
    }

    /// `<keyword> <key path>` reference to a concept of any type
    fn parse_any_reference(&self, reader: &mut TokenReader<'_>, cursor: &mut Cursor) -> ParseResult<ConceptKey> {
        let keyword = expect_token(reader, "a concept keyword")?;
        if keyword.token_type != TokenType::Text {
            return Err(ParseError::unexpected_token(&keyword, "a concept keyword"));
        }

        let mut roots: Vec<&str> = Vec::new();
        for type_name in self.registry.types_with_keyword(&keyword.value) {
            if let Some(root) = self.registry.root_of(type_name) {
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }

        cursor.last_offset = keyword.span.end;
        cursor.needs_dot = false;
        let start = reader.position();
        let saved = *cursor;
        let mut first_error = None;
        for root in roots {
            reader.reset(start);
            *cursor = saved;
            match self.parse_key(reader, root, cursor) {
                Ok(key) => return Ok(key),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| ParseError::unknown_keyword(&keyword)))
    }

    /// Pick the winning attempt: longest match, then the one using the enclosing
    /// concept, then the most derived type
    fn choose(&self, attempts: Vec<Attempt>, keyword: &Token) -> ParseResult<Option<Attempt>> {
        let Some(longest) = attempts.iter().map(|a| a.end).max() else {
            return Ok(None);
        };
        let mut best: Vec<Attempt> = attempts.into_iter().filter(|a| a.end == longest).collect();
        if best.iter().any(|a| a.used_context) {
            best.retain(|a| a.used_context);
        }
        if best.len() > 1 {
            let types: Vec<String> = best.iter().map(|a| a.type_name.clone()).collect();
            best.retain(|a| !types.iter().any(|other| *other != a.type_name && self.registry.is_a(other, &a.type_name)));
        }
        if best.len() == 1 {
            return Ok(best.pop());
        }
        let names: Vec<&str> = best.iter().map(|a| a.type_name.as_str()).collect();
        Err(ParseError::at_token(
            ParseErrorKind::AmbiguousSyntax,
            keyword,
            format!("Statement '{}' matches several concept types: {}", keyword.value, names.join(", ")),
        ))
    }

    /// Error for a keyword no candidate could parse, located where parsing got furthest
    fn malformed(&self, keyword: &Token, candidates: &[String], failures: Vec<ParseError>) -> ParseError {
        let furthest = failures.iter().rev().max_by_key(|e| e.offset()).cloned();
        let syntax: Vec<String> = candidates.iter().filter_map(|t| self.registry.get(t)).map(syntax_hint).collect();

        let (location, detail) = match furthest {
            Some(error) => (error.location.unwrap_or_else(|| keyword.location()), error.message),
            None => (keyword.location(), "no candidate concept type".to_string()),
        };
        let mut error = ParseError::new(ParseErrorKind::MalformedParameters, format!("Invalid parameters for '{}': {}", keyword.value, detail))
            .with_location(location)
            .with_context(format!("Expected {}", syntax.join(" or ")));
        if self.config.report_candidate_failures && failures.len() > 1 {
            error = error.with_related_errors(failures);
        }
        error
    }
}

/// Usage line of a concept type, e.g. `ShortString <DataStructure>.<Name>`
fn syntax_hint(concept_type: &ResolvedConceptType) -> String {
    let mut hint = concept_type.display_name().to_string();
    let mut in_path = false;
    for member in concept_type.parsable_members() {
        let standalone = !member.is_key || member.value_type == MemberType::AnyConcept;
        if in_path && !standalone {
            hint.push('.');
        } else {
            hint.push(' ');
        }
        hint.push_str(&format!("<{}>", member.name));
        in_path = !standalone;
    }
    hint
}

fn expect_token(reader: &mut TokenReader<'_>, expected: &str) -> ParseResult<Token> {
    reader
        .next()?
        .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEof, format!("Expected {} after the last script", expected)))
}

fn expect_token_peek(reader: &mut TokenReader<'_>, expected: &str) -> ParseResult<Token> {
    reader
        .peek()?
        .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEof, format!("Expected {} after the last script", expected)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::{ConceptMember, ConceptType};
    use crate::test_support::{data_structure_key, entity, module, module_key, property_key, registry_with, sample_registry, short_string};
    use rhetos_common::DslScript;
    use std::sync::Arc;

    fn parse_with(registry: &ConceptTypeRegistry, scripts: &[(&str, &str)]) -> ParseResult<Vec<ParsedConcept>> {
        let mut tokenizer = Tokenizer::new(scripts.iter().map(|(name, text)| DslScript::from_text(*name, *text)));
        DslParser::new(registry, ParserConfig::default()).parse(&mut tokenizer)
    }

    fn parse(text: &str) -> ParseResult<Vec<ParsedConcept>> {
        parse_with(&sample_registry(), &[("test.rhe", text)])
    }

    fn graph_from(scripts: &[(&str, &str)]) -> ParseResult<ConceptGraph> {
        let registry = sample_registry();
        let mut graph = ConceptGraph::new(Arc::clone(&registry));
        let mut tokenizer = Tokenizer::new(scripts.iter().map(|(name, text)| DslScript::from_text(*name, *text)));
        DslParser::new(&registry, ParserConfig::default()).parse_into(&mut tokenizer, &mut graph)?;
        Ok(graph)
    }

    fn descriptions(graph: &ConceptGraph) -> Vec<String> {
        graph.iter().map(|c| graph.describe(c)).collect()
    }

    #[test]
    fn test_nested_statements() {
        let graph = graph_from(&[("a.rhe", "Module Demo { Entity Person { ShortString Name; Integer Age; } }")]).unwrap();
        assert_eq!(
            descriptions(&graph),
            vec!["Module Demo", "Entity Demo.Person", "ShortString Demo.Person.Name", "Integer Demo.Person.Age"]
        );
        let name = graph.find_by_key(&property_key("Demo", "Person", "Name")).unwrap();
        assert_eq!(name.info, short_string("Demo", "Person", "Name"));
    }

    #[test]
    fn test_flat_syntax_matches_nested() {
        let nested = graph_from(&[("a.rhe", "Module Demo { Entity Person { ShortString Name; } }")]).unwrap();
        let flat = graph_from(&[("a.rhe", "Module Demo; Entity Demo.Person; ShortString Demo.Person.Name;")]).unwrap();
        assert_eq!(nested.snapshot(), flat.snapshot());
    }

    #[test]
    fn test_non_key_members_are_separate_values() {
        let graph = graph_from(&[(
            "a.rhe",
            "Module Demo { Entity Person { Reference Manager Demo.Person; ShortString Name { MaxLength 50; } } }",
        )])
        .unwrap();
        let manager = graph.find_by_key(&property_key("Demo", "Person", "Manager")).unwrap();
        assert_eq!(manager.reference("Referenced"), Some(&data_structure_key("Demo", "Person")));
        let limit = graph.iter().find(|c| c.type_name() == "MaxLengthInfo").unwrap();
        assert_eq!(limit.text("Length"), Some("50"));
        assert_eq!(graph.describe(limit), "MaxLength Demo.Person.Name");
    }

    #[test]
    fn test_quoted_values() {
        let parsed = parse("Module 'My Module';").unwrap();
        assert_eq!(parsed[0].info, module("My Module"));
    }

    #[test]
    fn test_any_concept_references() {
        let graph = graph_from(&[("a.rhe", "Module Demo { Entity A; Entity B { DependsOn Entity Demo.A; } } DependsOn Module Demo Entity Demo.B;")]).unwrap();
        let depends: Vec<_> = graph.find_by_type("DependsOnInfo").collect();
        assert_eq!(depends.len(), 2);
        assert_eq!(depends[0].reference("Dependent"), Some(&data_structure_key("Demo", "B")));
        assert_eq!(depends[0].reference("DependsOn"), Some(&data_structure_key("Demo", "A")));
        assert_eq!(depends[1].reference("Dependent"), Some(&module_key("Demo")));
    }

    #[test]
    fn test_optional_semicolon_after_block() {
        let graph = graph_from(&[("a.rhe", "Module Demo { Entity A; }; Module Other {}")]).unwrap();
        assert_eq!(descriptions(&graph), vec!["Module Demo", "Entity Demo.A", "Module Other"]);
    }

    #[test]
    fn test_statement_location() {
        let parsed = parse("Module Demo\n{\n    Entity Person;\n}").unwrap();
        let location = &parsed[1].location;
        assert_eq!(location.position.line, 3);
        assert_eq!(location.position.column, 5);
        assert_eq!(location.source_line, "    Entity Person;");
    }

    #[test]
    fn test_unknown_keyword() {
        let error = parse("Module Demo {\n  Entiti Person;\n}").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnknownKeyword);
        let location = error.location.unwrap();
        assert_eq!((location.position.line, location.position.column), (2, 3));
    }

    #[test]
    fn test_malformed_parameters() {
        let error = parse("Entity Demo;").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::MalformedParameters);
        assert_eq!(error.offset(), 11);
        assert!(error.context.unwrap().contains("Entity <Module>.<Name>"));
    }

    #[test]
    fn test_missing_terminator() {
        let error = parse("Module Demo Entity").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::MalformedParameters);
        assert_eq!(error.offset(), 12);
    }

    #[test]
    fn test_stray_closing_brace() {
        let error = parse("Module Demo; }").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnexpectedToken);
    }

    #[test]
    fn test_unclosed_block() {
        let error = parse("Module Demo { Entity A;").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_statements_do_not_cross_scripts() {
        let error = parse_with(&sample_registry(), &[("a.rhe", "Module"), ("b.rhe", "Demo;")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::MalformedParameters);
        assert_eq!(error.location.unwrap().script_name, "a.rhe");
    }

    #[test]
    fn test_lexical_error_is_not_masked() {
        let error = parse("Module 'Demo;").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn test_nesting_limit() {
        let registry = sample_registry();
        let mut tokenizer = Tokenizer::new(vec![DslScript::from_text("a.rhe", "Module Demo { Entity A { ShortString B; } }")]);
        let parser = DslParser::new(&registry, ParserConfig::default().with_max_nesting_depth(1));
        let error = parser.parse(&mut tokenizer).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::RecursionLimitExceeded);
    }

    fn hint_types() -> Vec<ConceptType> {
        vec![
            ConceptType::new("ModuleHintInfo")
                .keyword("Hint")
                .member(ConceptMember::key_reference("Module", "ModuleInfo"))
                .member(ConceptMember::key_text("Name")),
            ConceptType::new("DataStructureHintInfo")
                .keyword("Hint")
                .member(ConceptMember::key_reference("DataStructure", "DataStructureInfo"))
                .member(ConceptMember::key_text("Name")),
        ]
    }

    #[test]
    fn test_keyword_candidates_resolved_by_backtracking() {
        let registry = registry_with(hint_types());
        let parsed = parse_with(&registry, &[("a.rhe", "Hint Demo.X; Hint Demo.Person.Y;")]).unwrap();
        let types: Vec<_> = parsed.iter().map(|p| p.info.type_name.as_str()).collect();
        assert_eq!(types, vec!["ModuleHintInfo", "DataStructureHintInfo"]);
    }

    #[test]
    fn test_keyword_candidates_resolved_by_context() {
        let registry = registry_with(hint_types());
        let parsed = parse_with(&registry, &[("a.rhe", "Module Demo { Hint X; Entity Person { Hint Y; } }")]).unwrap();
        let types: Vec<_> = parsed.iter().map(|p| p.info.type_name.as_str()).collect();
        assert_eq!(types, vec!["ModuleInfo", "ModuleHintInfo", "EntityInfo", "DataStructureHintInfo"]);
        assert_eq!(parsed[3].key.path(), "Demo.Person.Y");
    }

    #[test]
    fn test_candidate_failures_are_related() {
        let registry = registry_with(hint_types());
        let error = parse_with(&registry, &[("a.rhe", "Hint Demo;")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::MalformedParameters);
        assert_eq!(error.related.len(), 2);
    }

    #[test]
    fn test_indistinguishable_candidates_are_ambiguous() {
        let registry = registry_with(vec![
            ConceptType::new("TextNoteInfo").keyword("Note").member(ConceptMember::key_text("Text")),
            ConceptType::new("ModuleNoteInfo").keyword("Note").member(ConceptMember::key_reference("Module", "ModuleInfo")),
        ]);
        let error = parse_with(&registry, &[("a.rhe", "Note Demo;")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::AmbiguousSyntax);
        assert!(error.message.contains("TextNoteInfo, ModuleNoteInfo"));
    }

    #[test]
    fn test_repeated_declaration_merges() {
        let graph = graph_from(&[("a.rhe", "Module Demo { Entity Person; }"), ("b.rhe", "Module Demo { Entity Person { ShortString Name; } }")]).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.find_by_key(&data_structure_key("Demo", "Person")).unwrap().info, entity("Demo", "Person"));
    }

    #[test]
    fn test_conflicting_declaration_names_both_locations() {
        let error = graph_from(&[
            ("a.rhe", "Module Demo { Entity Person { Reference Boss Demo.Person; } }"),
            ("b.rhe", "Module Demo { Entity Team; Entity Person { Reference Boss Demo.Team; } }"),
        ])
        .unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::ConflictingDeclaration);
        assert_eq!(error.location.as_ref().unwrap().script_name, "b.rhe");
        assert_eq!(error.related[0].location.as_ref().unwrap().script_name, "a.rhe");
    }

    #[test]
    fn test_same_key_different_type_conflicts() {
        let error = graph_from(&[("a.rhe", "Module Demo { Entity E { ShortString Name; Integer Name; } }")]).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::ConflictingDeclaration);
    }
}
