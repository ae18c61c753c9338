//! Source position types.
//!
//! Positions record where a node came from in the parsed input.

use serde::{Deserialize, Serialize};

/// A position in source text.
///
/// Lines and columns are both 1-indexed. A zero line means "unknown", which is
/// what nodes built through the mutation API carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in bytes).
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The start and end positions of a node, both inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sourcepos {
    /// Start position.
    pub start: Position,
    /// End position.
    pub end: Position,
}

impl Sourcepos {
    /// Creates a new source range.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates a range that starts and ends on the given position.
    #[inline]
    pub const fn at(line: usize, column: usize) -> Self {
        Self {
            start: Position::new(line, column),
            end: Position::new(line, column),
        }
    }

    /// Returns true if the range is unknown.
    #[inline]
    pub const fn is_unknown(&self) -> bool {
        self.start.line == 0
    }
}

impl std::fmt::Display for Sourcepos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}
