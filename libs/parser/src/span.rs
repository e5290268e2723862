//! # Source Spans
//!
//! Positions and spans into Ruby source text.
//!
//! Positions are 0-based internally (byte, line, column). Columns count
//! characters, not bytes, so multi-byte identifiers report the column a
//! reader would count. Diagnostics convert to 1-based on output.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::span::{Position, Span};
//!
//! let span = Span::new(Position::new(0, 0, 0), Position::new(3, 0, 3));
//! assert_eq!(span.len(), 3);
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// POSITION
// =============================================================================

/// A single point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the source.
    pub byte: usize,
    /// Line number (0-indexed).
    pub line: usize,
    /// Column in characters (0-indexed).
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub const fn new(byte: usize, line: usize, column: usize) -> Self {
        Self { byte, line, column }
    }

    /// 1-based line number, as shown to users.
    pub const fn display_line(&self) -> usize {
        self.line + 1
    }

    /// 1-based column number, as shown to users.
    pub const fn display_column(&self) -> usize {
        self.column + 1
    }
}

// =============================================================================
// SPAN
// =============================================================================

/// A half-open range `[start, end)` in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    /// Create a span from two positions.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at the start of the source.
    pub const fn zero() -> Self {
        Self::new(Position::new(0, 0, 0), Position::new(0, 0, 0))
    }

    /// Zero-width span at `position`.
    pub const fn point(position: Position) -> Self {
        Self::new(position, position)
    }

    /// Span length in bytes.
    pub fn len(&self) -> usize {
        self.end.byte.saturating_sub(self.start.byte)
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use ruby_parser::span::{Position, Span};
    ///
    /// let a = Span::new(Position::new(0, 0, 0), Position::new(2, 0, 2));
    /// let b = Span::new(Position::new(5, 0, 5), Position::new(7, 0, 7));
    /// assert_eq!(a.merge(&b).len(), 7);
    /// ```
    pub fn merge(&self, other: &Span) -> Span {
        let start = if other.start.byte < self.start.byte { other.start } else { self.start };
        let end = if other.end.byte > self.end.byte { other.end } else { self.end };
        Span::new(start, end)
    }

    /// Check whether a byte offset falls inside the span.
    pub fn contains(&self, byte: usize) -> bool {
        byte >= self.start.byte && byte < self.end.byte
    }
}

/// Anything that occupies a region of source text.
pub trait Spanned {
    /// Source region covered by `self`.
    fn span(&self) -> Span;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_positions_are_one_based() {
        let pos = Position::new(10, 2, 4);
        assert_eq!(pos.display_line(), 3);
        assert_eq!(pos.display_column(), 5);
    }

    #[test]
    fn test_merge_and_contains() {
        let a = Span::new(Position::new(4, 0, 4), Position::new(6, 0, 6));
        let b = Span::new(Position::new(1, 0, 1), Position::new(3, 0, 3));
        let merged = a.merge(&b);
        assert_eq!(merged.start.byte, 1);
        assert_eq!(merged.end.byte, 6);
        assert!(merged.contains(5));
        assert!(!merged.contains(6));
    }

    #[test]
    fn test_point_is_empty() {
        assert!(Span::point(Position::new(3, 1, 0)).is_empty());
        assert!(Span::zero().is_empty());
    }
}
