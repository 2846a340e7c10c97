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

//! Tag-aware code builder handed to code generators
//!
//! Generators never see each other's output. They write fragments into tags and
//! output files; nothing is flattened until [`CodeBuilder::finish`], which
//! substitutes every marker in one recursive pass. Invalid writes do not abort
//! the generator that made them: the first one is kept and surfaced by the
//! orchestrator as soon as that generator returns.

use super::error::CodegenError;
use super::tags::{MARKER_PATTERN, Tag, TagKind};
use crate::concepts::{Concept, ConceptGraph, ConceptHandle};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Logical output group and the file it is written to, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputTarget {
    pub group: String,
    pub path: String,
}

impl OutputTarget {
    pub fn new(group: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            path: normalize_path(&path.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub group: String,
    pub path: String,
    pub content: String,
}

/// In-memory result of code generation, handed to the source writer and the external compiler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedSourceSet {
    /// Sorted by path
    pub files: Vec<GeneratedFile>,
    /// Sorted, without duplicates
    pub references: Vec<String>,
}

impl GeneratedSourceSet {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        let path = normalize_path(path);
        self.files.iter().find(|f| f.path == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Fragment {
    code: String,
    writer: String,
}

#[derive(Debug)]
struct TagContent {
    kind: TagKind,
    display: String,
    before: Vec<Fragment>,
    content: Vec<Fragment>,
    after: Vec<Fragment>,
    replacement: Option<Fragment>,
}

impl TagContent {
    fn new(kind: TagKind, display: String) -> Self {
        Self {
            kind,
            display,
            before: Vec::new(),
            content: Vec::new(),
            after: Vec::new(),
            replacement: None,
        }
    }

    fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.before.iter().chain(&self.content).chain(&self.after).chain(&self.replacement)
    }
}

#[derive(Debug)]
struct OutputFile {
    group: String,
    fragments: Vec<String>,
}

#[derive(Debug, Clone)]
struct Writer {
    generator: String,
    concept: ConceptHandle,
    description: String,
}

pub struct CodeBuilder<'a> {
    graph: &'a ConceptGraph,
    tags: HashMap<String, TagContent>,
    files: BTreeMap<String, OutputFile>,
    groups: HashMap<String, String>,
    references: BTreeSet<String>,
    writer: Option<Writer>,
    edges: BTreeSet<(ConceptHandle, ConceptHandle)>,
    errors: Vec<CodegenError>,
}

impl<'a> CodeBuilder<'a> {
    pub fn new(graph: &'a ConceptGraph) -> Self {
        Self {
            graph,
            tags: HashMap::new(),
            files: BTreeMap::new(),
            groups: HashMap::new(),
            references: BTreeSet::new(),
            writer: None,
            edges: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    /// Read access to the whole concept graph
    pub fn graph(&self) -> &'a ConceptGraph {
        self.graph
    }

    /// Attribute the following writes to `generator` running for `concept`
    pub(crate) fn begin(&mut self, generator: &str, concept: &Concept) {
        self.writer = Some(Writer {
            generator: generator.to_string(),
            concept: concept.handle,
            description: format!("{} for {}", generator, self.graph.describe(concept)),
        });
    }

    pub(crate) fn end(&mut self) {
        self.writer = None;
    }

    /// First invalid write since the last call
    pub(crate) fn take_error(&mut self) -> Option<CodegenError> {
        if self.errors.is_empty() { None } else { Some(self.errors.remove(0)) }
    }

    /// Ordering constraints discovered so far: a tag owner precedes every concept writing into its tags
    pub fn dependency_edges(&self) -> impl Iterator<Item = (ConceptHandle, ConceptHandle)> + '_ {
        self.edges.iter().copied()
    }

    /// Append code to an appendable tag
    pub fn insert_code(&mut self, snippet: impl Into<String>, tag: &Tag) {
        let fragment = self.fragment(snippet);
        if let Some(content) = self.entry(tag, TagKind::Appendable) {
            content.content.push(fragment);
        }
    }

    /// Insert code ahead of everything appended to the tag
    pub fn insert_code_before(&mut self, snippet: impl Into<String>, tag: &Tag) {
        let fragment = self.fragment(snippet);
        if let Some(content) = self.entry(tag, TagKind::Appendable) {
            content.before.push(fragment);
        }
    }

    /// Insert code after everything appended to the tag
    pub fn insert_code_after(&mut self, snippet: impl Into<String>, tag: &Tag) {
        let fragment = self.fragment(snippet);
        if let Some(content) = self.entry(tag, TagKind::Appendable) {
            content.after.push(fragment);
        }
    }

    /// Replace the default text of a replaceable tag; a second replacement is an error
    pub fn replace_code(&mut self, snippet: impl Into<String>, tag: &Tag) {
        let fragment = self.fragment(snippet);
        let second = fragment.writer.clone();
        let Some(content) = self.entry(tag, TagKind::Replaceable) else {
            return;
        };
        let conflict = match &content.replacement {
            Some(first) => Some((content.display.clone(), first.writer.clone())),
            None => {
                content.replacement = Some(fragment);
                None
            }
        };
        if let Some((tag, first)) = conflict {
            self.errors.push(CodegenError::MultipleWriters { tag, first, second });
        }
    }

    /// Append code to an output file; a path belongs to exactly one output group
    pub fn insert_code_to_file(&mut self, snippet: impl Into<String>, target: &OutputTarget) {
        let path = normalize_path(&target.path);
        if let Some(existing) = self.groups.get(&target.group) {
            if *existing != path {
                self.errors.push(CodegenError::InconsistentOutputPath {
                    group: target.group.clone(),
                    first_path: existing.clone(),
                    second_path: path,
                });
                return;
            }
        }
        if let Some(file) = self.files.get(&path) {
            if file.group != target.group {
                self.errors.push(CodegenError::DuplicateOutputFile {
                    path,
                    first_group: file.group.clone(),
                    second_group: target.group.clone(),
                });
                return;
            }
        }
        self.groups.insert(target.group.clone(), path.clone());
        self.files
            .entry(path)
            .or_insert_with(|| OutputFile {
                group: target.group.clone(),
                fragments: Vec::new(),
            })
            .fragments
            .push(snippet.into());
    }

    /// Assembly or package the generated code needs at compile time
    pub fn add_reference(&mut self, reference: impl Into<String>) {
        self.references.insert(reference.into());
    }

    fn fragment(&self, snippet: impl Into<String>) -> Fragment {
        Fragment {
            code: snippet.into(),
            writer: self.writer_description(),
        }
    }

    fn writer_description(&self) -> String {
        match &self.writer {
            Some(writer) => writer.description.clone(),
            None => "code builder".to_string(),
        }
    }

    fn describe_tag(&self, tag: &Tag) -> String {
        format!("{} of {}", tag.name(), self.graph.describe_key(tag.owner()))
    }

    fn entry(&mut self, tag: &Tag, kind: TagKind) -> Option<&mut TagContent> {
        let id = tag.id();
        let tag_display = self.describe_tag(tag);
        let existing = self.tags.get(&id).map(|content| content.kind);
        if tag.kind() != kind || existing.is_some_and(|existing| existing != kind) {
            let writer = self.writer_description();
            self.errors.push(CodegenError::TagKindConflict { tag: tag_display, writer });
            return None;
        }

        if let (Some(writer), Some(owner)) = (&self.writer, self.graph.find_by_key(tag.owner())) {
            if owner.handle != writer.concept {
                self.edges.insert((owner.handle, writer.concept));
            }
        }
        if let Some(writer) = &self.writer {
            debug!("{} writes into {}", writer.generator, tag_display);
        }
        Some(self.tags.entry(id).or_insert_with(|| TagContent::new(kind, tag_display)))
    }

    /// Flatten every output file; consumes the builder
    pub fn finish(mut self, file_header: Option<&str>) -> Result<GeneratedSourceSet, CodegenError> {
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        let mut flattener = Flattener {
            pattern: Regex::new(MARKER_PATTERN)?,
            tags: &self.tags,
            used: HashSet::new(),
            stack: Vec::new(),
        };

        let mut files = Vec::with_capacity(self.files.len());
        for (path, file) in &self.files {
            let mut content = String::new();
            if let Some(header) = file_header {
                content.push_str(header);
                content.push('\n');
            }
            for fragment in &file.fragments {
                flattener.expand(fragment, &mut content)?;
            }
            files.push(GeneratedFile {
                group: file.group.clone(),
                path: path.clone(),
                content,
            });
        }

        let mut orphaned: Vec<_> = self
            .tags
            .iter()
            .filter(|(id, content)| !flattener.used.contains(*id) && content.fragments().next().is_some())
            .map(|(_, content)| content)
            .collect();
        orphaned.sort_by(|a, b| a.display.cmp(&b.display));
        for content in orphaned {
            let writers: BTreeSet<&str> = content.fragments().map(|f| f.writer.as_str()).collect();
            warn!(
                "Code written to tag {} is not part of any output file (written by {})",
                content.display,
                writers.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        Ok(GeneratedSourceSet {
            files,
            references: self.references.into_iter().collect(),
        })
    }
}

struct Flattener<'t> {
    pattern: Regex,
    tags: &'t HashMap<String, TagContent>,
    used: HashSet<String>,
    stack: Vec<String>,
}

enum Marker {
    Appendable(String),
    Replaceable(String),
    Closing,
}

impl Flattener<'_> {
    fn expand(&mut self, text: &str, out: &mut String) -> Result<(), CodegenError> {
        let mut cursor = 0;
        while let Some(captures) = self.pattern.captures_at(text, cursor) {
            let (start, end) = match captures.get(0) {
                Some(whole) => (whole.start(), whole.end()),
                None => break,
            };
            let marker = match (captures.get(1), captures.get(2), captures.get(3)) {
                (Some(id), _, _) => Marker::Appendable(id.as_str().to_string()),
                (None, Some(slash), Some(_)) if !slash.as_str().is_empty() => Marker::Closing,
                (None, _, Some(id)) => Marker::Replaceable(id.as_str().to_string()),
                _ => Marker::Closing,
            };
            out.push_str(&text[cursor..start]);
            cursor = end;

            match marker {
                Marker::Appendable(id) => self.expand_appendable(&id, out)?,
                Marker::Replaceable(id) => {
                    let closing = format!("/*[/{}]*/", id);
                    let default = match text[cursor..].find(&closing) {
                        Some(offset) => {
                            let default = &text[cursor..cursor + offset];
                            cursor += offset + closing.len();
                            default
                        }
                        None => "",
                    };
                    self.expand_replaceable(&id, default, out)?;
                }
                // Stray closing markers are dropped
                Marker::Closing => {}
            }
        }
        out.push_str(&text[cursor..]);
        Ok(())
    }

    fn enter(&mut self, id: &str) -> Result<(), CodegenError> {
        if self.stack.iter().any(|open| open == id) {
            let display = |id: &str| self.tags.get(id).map(|c| c.display.clone()).unwrap_or_else(|| id.to_string());
            let mut chain: Vec<String> = self.stack.iter().map(|open| display(open)).collect();
            chain.push(display(id));
            return Err(CodegenError::RecursiveTag { tag: display(id), chain });
        }
        self.stack.push(id.to_string());
        Ok(())
    }

    fn expand_appendable(&mut self, id: &str, out: &mut String) -> Result<(), CodegenError> {
        let tags = self.tags;
        let Some(content) = tags.get(id) else {
            return Ok(());
        };
        self.used.insert(id.to_string());
        self.enter(id)?;
        for fragment in content.before.iter().chain(&content.content).chain(&content.after) {
            self.expand(&fragment.code, out)?;
        }
        self.stack.pop();
        Ok(())
    }

    fn expand_replaceable(&mut self, id: &str, default: &str, out: &mut String) -> Result<(), CodegenError> {
        let tags = self.tags;
        let replacement = tags.get(id).and_then(|content| content.replacement.as_ref());
        self.used.insert(id.to_string());
        self.enter(id)?;
        match replacement {
            Some(fragment) => self.expand(&fragment.code, out)?,
            None => self.expand(default, out)?,
        }
        self.stack.pop();
        Ok(())
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tags::TagTemplate;
    use crate::test_support::{data_structure_key, entity, graph_of, module, module_key, sample_registry, short_string};

    const MEMBERS: TagTemplate = TagTemplate::appendable("Members");
    const PROPERTIES: TagTemplate = TagTemplate::appendable("Properties");
    const BASE_TYPE: TagTemplate = TagTemplate::replaceable("BaseType");

    fn sample_graph() -> ConceptGraph {
        graph_of(sample_registry(), vec![module("Demo"), entity("Demo", "Person"), short_string("Demo", "Person", "Name")])
    }

    fn target() -> OutputTarget {
        OutputTarget::new("Demo", "Demo.cs")
    }

    #[test]
    fn test_tags_are_flattened_in_order() {
        let graph = sample_graph();
        let person = data_structure_key("Demo", "Person");
        let mut builder = CodeBuilder::new(&graph);
        builder.insert_code_to_file(format!("namespace Demo {{{}}}", MEMBERS.of(&module_key("Demo")).marker()), &target());
        builder.insert_code(
            format!(" class Person : {} {{{}}}", BASE_TYPE.of(&person).marker_or("object"), PROPERTIES.of(&person).marker()),
            &MEMBERS.of(&module_key("Demo")),
        );
        builder.insert_code(" B", &PROPERTIES.of(&person));
        builder.insert_code_after(" Z", &PROPERTIES.of(&person));
        builder.insert_code(" C", &PROPERTIES.of(&person));
        builder.insert_code_before(" A", &PROPERTIES.of(&person));

        let sources = builder.finish(None).unwrap();
        assert_eq!(sources.file("Demo.cs").unwrap().content, "namespace Demo { class Person : object { A B C Z}}");
    }

    #[test]
    fn test_replaceable_tag() {
        let graph = sample_graph();
        let person = data_structure_key("Demo", "Person");
        let mut builder = CodeBuilder::new(&graph);
        builder.insert_code_to_file(format!("class Person : {}", BASE_TYPE.of(&person).marker_or("object")), &target());
        builder.replace_code("IEntity", &BASE_TYPE.of(&person));
        let sources = builder.finish(Some("// header")).unwrap();
        assert_eq!(sources.files[0].content, "// header\nclass Person : IEntity");
    }

    #[test]
    fn test_second_replacement_fails() {
        let graph = sample_graph();
        let person = graph.find_by_key(&data_structure_key("Demo", "Person")).unwrap();
        let mut builder = CodeBuilder::new(&graph);
        builder.begin("First", person);
        builder.replace_code("IEntity", &BASE_TYPE.of(&person.key));
        builder.begin("Second", person);
        builder.replace_code("IQueryable", &BASE_TYPE.of(&person.key));
        match builder.take_error() {
            Some(CodegenError::MultipleWriters { tag, first, second }) => {
                assert_eq!(tag, "BaseType of Entity Demo.Person");
                assert_eq!(first, "First for Entity Demo.Person");
                assert_eq!(second, "Second for Entity Demo.Person");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_tag_kind_conflict() {
        let graph = sample_graph();
        let person = data_structure_key("Demo", "Person");
        let mut builder = CodeBuilder::new(&graph);
        builder.insert_code("x", &TagTemplate::appendable("BaseType").of(&person));
        builder.replace_code("y", &BASE_TYPE.of(&person));
        assert!(matches!(builder.finish(None), Err(CodegenError::TagKindConflict { .. })));
    }

    #[test]
    fn test_output_file_conflicts() {
        let graph = sample_graph();
        let mut builder = CodeBuilder::new(&graph);
        builder.insert_code_to_file("a", &OutputTarget::new("Model", "Demo.cs"));
        builder.insert_code_to_file("b", &OutputTarget::new("Orm", "./Demo.cs"));
        assert_eq!(
            builder.take_error(),
            Some(CodegenError::DuplicateOutputFile {
                path: "Demo.cs".to_string(),
                first_group: "Model".to_string(),
                second_group: "Orm".to_string(),
            })
        );
        builder.insert_code_to_file("c", &OutputTarget::new("Model", "Other.cs"));
        assert!(matches!(builder.take_error(), Some(CodegenError::InconsistentOutputPath { .. })));
        builder.insert_code_to_file("d", &OutputTarget::new("Model", "Demo.cs"));
        assert_eq!(builder.finish(None).unwrap().files[0].content, "ad");
    }

    #[test]
    fn test_recursive_tag() {
        let graph = sample_graph();
        let person = data_structure_key("Demo", "Person");
        let mut builder = CodeBuilder::new(&graph);
        builder.insert_code_to_file(PROPERTIES.of(&person).marker(), &target());
        builder.insert_code(MEMBERS.of(&person).marker(), &PROPERTIES.of(&person));
        builder.insert_code(PROPERTIES.of(&person).marker(), &MEMBERS.of(&person));
        match builder.finish(None) {
            Err(CodegenError::RecursiveTag { tag, chain }) => {
                assert_eq!(tag, "Properties of Entity Demo.Person");
                assert_eq!(chain.len(), 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_markers_and_references() {
        let graph = sample_graph();
        let mut builder = CodeBuilder::new(&graph);
        builder.insert_code_to_file(format!("[{}]", PROPERTIES.of(&data_structure_key("Demo", "Nobody")).marker()), &target());
        builder.add_reference("System.Runtime");
        builder.add_reference("System.ComponentModel.DataAnnotations");
        builder.add_reference("System.Runtime");
        let sources = builder.finish(None).unwrap();
        assert_eq!(sources.files[0].content, "[]");
        assert_eq!(sources.references, vec!["System.ComponentModel.DataAnnotations".to_string(), "System.Runtime".to_string()]);
    }

    #[test]
    fn test_writes_record_owner_dependencies() {
        let graph = sample_graph();
        let person = graph.find_by_key(&data_structure_key("Demo", "Person")).unwrap();
        let name = graph.find_by_type("ShortStringInfo").next().unwrap();
        let mut builder = CodeBuilder::new(&graph);
        builder.begin("Property", name);
        builder.insert_code("string Name;", &PROPERTIES.of(&person.key));
        builder.end();
        builder.begin("Class", person);
        builder.insert_code("// own tag", &PROPERTIES.of(&person.key));
        builder.end();
        assert_eq!(builder.dependency_edges().collect::<Vec<_>>(), vec![(person.handle, name.handle)]);
    }
}
