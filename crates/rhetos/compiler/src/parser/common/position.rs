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

//! Source position tracking for parsing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Line/column position in a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number in characters (1-based)
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Create a position at the beginning of a file
    pub fn start() -> Self {
        Self::new(1, 1)
    }

    /// Create an invalid/unknown position
    pub fn unknown() -> Self {
        Self::new(0, 0)
    }

    /// Check if this is a valid position
    pub fn is_valid(&self) -> bool {
        self.line > 0 && self.column > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

/// Byte range within a single script, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: end.max(start) }
    }

    /// Empty span at an offset
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains an offset
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Smallest span covering both spans
    pub fn merge(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_validity() {
        assert!(Position::start().is_valid());
        assert!(!Position::unknown().is_valid());
        assert_eq!(Position::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn test_span_merge_and_contains() {
        let a = Span::new(4, 8);
        let b = Span::new(10, 12);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(4, 12));
        assert!(merged.contains(11));
        assert!(!merged.contains(12));
        assert_eq!(merged.len(), 8);
        assert!(Span::empty(5).is_empty());
    }

    #[test]
    fn test_span_never_inverted() {
        let span = Span::new(9, 2);
        assert_eq!(span.start, 9);
        assert_eq!(span.end, 9);
    }
}
