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

//! Named insertion points in generated code
//!
//! A tag belongs to one concept and is written into generated text as a marker.
//! Appendable tags collect fragments from any number of generators; a
//! replaceable tag has a default text between an opening and a closing marker
//! and accepts a single replacement. Markers are plain comments, so text with
//! unfilled markers still compiles.

use crate::concepts::ConceptKey;
use serde::Serialize;
use std::fmt;

/// Matches `/*<id>*/` (appendable), `/*[id]*/` and `/*[/id]*/` (replaceable)
pub(crate) const MARKER_PATTERN: &str = r"/\*(?:<([^*]*)>|\[(/?)([^*]*)\])\*/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TagKind {
    Appendable,
    Replaceable,
}

/// A tag name not bound to a concept yet, usually declared as a plugin constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagTemplate {
    name: &'static str,
    kind: TagKind,
}

impl TagTemplate {
    pub const fn appendable(name: &'static str) -> Self {
        Self {
            name,
            kind: TagKind::Appendable,
        }
    }

    pub const fn replaceable(name: &'static str) -> Self {
        Self {
            name,
            kind: TagKind::Replaceable,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// The tag of one concept
    pub fn of(&self, owner: &ConceptKey) -> Tag {
        Tag::new(self.name, self.kind, owner.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    name: String,
    kind: TagKind,
    owner: ConceptKey,
}

impl Tag {
    pub fn new(name: impl Into<String>, kind: TagKind, owner: ConceptKey) -> Self {
        Self { name: name.into(), kind, owner }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn owner(&self) -> &ConceptKey {
        &self.owner
    }

    /// Identity used inside markers; distinct owner keys always give distinct ids
    /// and neither part contains marker delimiters
    pub fn id(&self) -> String {
        format!("{} {}", escape(&self.name, true), escape(&self.owner.canonical(), false))
    }

    /// Marker to embed in generated text; a replaceable tag gets an empty default
    pub fn marker(&self) -> String {
        self.marker_or("")
    }

    /// Marker with default text
    ///
    /// For a replaceable tag the default is kept when nobody replaces it. For an
    /// appendable tag the default precedes the inserted fragments.
    pub fn marker_or(&self, default: &str) -> String {
        let id = self.id();
        match self.kind {
            TagKind::Appendable => format!("{}/*<{}>*/", default, id),
            TagKind::Replaceable => format!("/*[{}]*/{}/*[/{}]*/", id, default, id),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.name, self.owner)
    }
}

fn escape(text: &str, escape_space: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' | '*' | '/' | '<' | '>' | '[' | ']' => escaped.push_str(&format!("%{:02X}", c as u32)),
            ' ' if escape_space => escaped.push_str("%20"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::data_structure_key;
    use regex::Regex;

    const PROPERTIES: TagTemplate = TagTemplate::appendable("Properties");
    const BASE_TYPE: TagTemplate = TagTemplate::replaceable("BaseType");

    #[test]
    fn test_markers() {
        let key = data_structure_key("Demo", "Person");
        assert_eq!(PROPERTIES.of(&key).marker(), "/*<Properties DataStructureInfo(ModuleInfo(Demo),Person)>*/");
        assert_eq!(
            BASE_TYPE.of(&key).marker_or("object"),
            "/*[BaseType DataStructureInfo(ModuleInfo(Demo),Person)]*/object/*[/BaseType DataStructureInfo(ModuleInfo(Demo),Person)]*/"
        );
        assert_eq!(PROPERTIES.of(&key).to_string(), "Properties of DataStructureInfo Demo.Person");
    }

    #[test]
    fn test_delimiters_are_escaped() {
        let key = data_structure_key("Demo", "a*/b<c>");
        let tag = Tag::new("Odd name]", TagKind::Appendable, key);
        assert_eq!(tag.id(), "Odd%20name%5D DataStructureInfo(ModuleInfo(Demo),'a%2A%2Fb%3Cc%3E')");

        let pattern = Regex::new(MARKER_PATTERN).unwrap();
        let marker = tag.marker();
        let captures = pattern.captures(&marker).unwrap();
        assert_eq!(captures.get(0).unwrap().as_str(), marker);
        assert_eq!(captures.get(1).unwrap().as_str(), tag.id());
    }

    #[test]
    fn test_owners_with_dotted_names_get_distinct_ids() {
        let dotted_module = BASE_TYPE.of(&data_structure_key("A.B", "C"));
        let dotted_entity = BASE_TYPE.of(&data_structure_key("A", "B.C"));
        assert_ne!(dotted_module.id(), dotted_entity.id());
        assert_eq!(dotted_module.to_string(), "BaseType of DataStructureInfo 'A.B'.C");
    }

    #[test]
    fn test_plain_comments_are_not_markers() {
        let pattern = Regex::new(MARKER_PATTERN).unwrap();
        assert!(!pattern.is_match("/* a comment */ int x; // <b> [c]"));
        let closing = pattern.captures("/*[/BaseType X]*/").unwrap();
        assert_eq!(closing.get(2).unwrap().as_str(), "/");
        assert_eq!(closing.get(3).unwrap().as_str(), "BaseType X");
    }
}
