//! # Character Cursor
//!
//! Peekable character cursor for the lexer.
//! Tracks position (byte, line, column) as it advances.
//!
//! A cursor may be limited to a sub-range of the source, which is how
//! heredoc bodies are lexed in place. Cursors are cheap to clone, so the
//! lexer snapshots one to rewind after an unterminated string.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::lexer::Cursor;
//!
//! let mut cursor = Cursor::new("hello");
//! assert_eq!(cursor.peek(), Some('h'));
//! cursor.advance();
//! assert_eq!(cursor.peek(), Some('e'));
//! ```

use crate::span::Position;

// =============================================================================
// CURSOR
// =============================================================================

/// Character cursor with position tracking.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Source text.
    source: &'a str,
    /// Current byte offset.
    byte: usize,
    /// Current line (0-indexed).
    line: usize,
    /// Current column (0-indexed, in characters).
    column: usize,
    /// Byte offset the cursor may not advance past.
    limit: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor over the whole source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            byte: 0,
            line: 0,
            column: 0,
            limit: source.len(),
        }
    }

    /// Create a cursor starting at `start` that stops at byte `limit`.
    ///
    /// `limit` is clamped to the source length.
    pub fn with_range(source: &'a str, start: Position, limit: usize) -> Self {
        Self {
            source,
            byte: start.byte,
            line: start.line,
            column: start.column,
            limit: limit.min(source.len()),
        }
    }

    /// Get current position.
    pub fn position(&self) -> Position {
        Position::new(self.byte, self.line, self.column)
    }

    /// Check if at end of the cursor's range.
    pub fn is_eof(&self) -> bool {
        self.byte >= self.limit
    }

    /// Peek at current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Peek at next character (one ahead of current).
    pub fn peek_next(&self) -> Option<char> {
        self.peek_nth(1)
    }

    /// Peek `n` characters ahead; `peek_nth(0)` is `peek()`.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Remaining text up to the cursor's limit.
    pub fn rest(&self) -> &'a str {
        self.source.get(self.byte..self.limit).unwrap_or("")
    }

    /// Whether the remaining text starts with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Whether the cursor sits at the first column of a line.
    pub fn at_line_start(&self) -> bool {
        self.column == 0
    }

    /// Advance to next character.
    ///
    /// ## Returns
    ///
    /// Character that was consumed, or None if at the limit
    ///
    /// ## Example
    ///
    /// ```rust
    /// use ruby_parser::lexer::Cursor;
    ///
    /// let mut cursor = Cursor::new("a\nb");
    /// cursor.advance();
    /// cursor.advance();
    /// assert_eq!(cursor.position().line, 1);
    /// assert_eq!(cursor.position().column, 0);
    /// ```
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.byte += c.len_utf8();

        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    /// Advance while predicate matches.
    ///
    /// ## Returns
    ///
    /// Slice of consumed characters
    pub fn advance_while<F>(&mut self, mut predicate: F) -> &'a str
    where
        F: FnMut(char) -> bool,
    {
        let start = self.byte;
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
        &self.source[start..self.byte]
    }

    /// Advance until the cursor reaches byte offset `target` (or its limit).
    pub fn advance_to(&mut self, target: usize) {
        while self.byte < target && self.advance().is_some() {}
    }

    /// Consume `expected` if it is the current character.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Get slice of source from start byte to current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        self.source.get(start..self.byte).unwrap_or("")
    }

    /// Source text the cursor reads from.
    pub fn source(&self) -> &'a str {
        self.source
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance();
        cursor.advance();
        cursor.advance();
        cursor.advance();
        let pos = cursor.position();
        assert_eq!(pos.byte, 4);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_cursor_columns_count_characters() {
        let mut cursor = Cursor::new("é=1");
        cursor.advance();
        assert_eq!(cursor.position().byte, 2);
        assert_eq!(cursor.position().column, 1);
    }

    #[test]
    fn test_cursor_respects_limit() {
        let source = "abc\ndef\nghi";
        let mut cursor = Cursor::with_range(source, Position::new(4, 1, 0), 8);
        assert_eq!(cursor.advance_while(|_| true), "def\n");
        assert!(cursor.is_eof());
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn test_cursor_clone_is_independent() {
        let mut cursor = Cursor::new("xyz");
        let snapshot = cursor.clone();
        cursor.advance();
        assert_eq!(snapshot.peek(), Some('x'));
        assert_eq!(cursor.peek(), Some('y'));
    }
}
