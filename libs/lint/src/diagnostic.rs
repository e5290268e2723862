//! # Diagnostics
//!
//! One reported error or warning: severity, kind, message and 1-based
//! source position.
//!
//! ## Example
//!
//! ```rust
//! use ruby_lint::diagnostic::{Diagnostic, DiagnosticKind};
//!
//! let warning = Diagnostic::warning(DiagnosticKind::LegacyOctal, "leading zero", 3, 7);
//! assert_eq!(warning.to_string(), "3:7: leading zero");
//! ```

use ruby_parser::{ParseError, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// SEVERITY AND KIND
// =============================================================================

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Closed set of things the linter reports.
///
/// Declaration order is the tie-break when two diagnostics share a
/// position: lexical before syntax errors, then the warning rules in the
/// order they are listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed token (unterminated string, regexp, heredoc...).
    Lexical,
    /// Token stream does not match the grammar.
    Syntax,
    /// A `when` value repeats one from an earlier clause.
    DuplicateWhenValue,
    /// A local is written but never read.
    UnusedVariable,
    /// A variable reference whose value is thrown away.
    VoidValue,
    /// A block parameter hides a local of an enclosing scope.
    ShadowedVariable,
    /// `p /re/`: a regexp that could be read as division.
    AmbiguousRegex,
    /// `0123`: octal written with a bare leading zero.
    LegacyOctal,
    /// `END { }` inside a method body.
    EndInMethod,
}

impl DiagnosticKind {
    /// Severity implied by the kind.
    pub const fn severity(self) -> Severity {
        match self {
            Self::Lexical | Self::Syntax => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

// =============================================================================
// DIAGNOSTIC
// =============================================================================

/// A diagnostic message with severity and location.
///
/// `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message: message.into(),
            line,
            column,
        }
    }

    /// Warning at a 1-based position.
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(kind, message, line, column)
    }

    /// Warning at a source position.
    pub fn warning_at(kind: DiagnosticKind, message: impl Into<String>, position: Position) -> Self {
        Self::new(kind, message, position.display_line(), position.display_column())
    }

    /// Error from the lexer or parser, placed where the error's span starts.
    pub fn from_parse_error(error: &ParseError) -> Self {
        let kind = if error.is_lexical() { DiagnosticKind::Lexical } else { DiagnosticKind::Syntax };
        let start = error.span.start;
        Self::new(kind, error.kind.to_string(), start.display_line(), start.display_column())
    }

    /// Ordering key: position first, then kind.
    pub fn sort_key(&self) -> (usize, usize, DiagnosticKind) {
        (self.line, self.column, self.kind)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ruby_parser::{ParseErrorKind, Span};

    #[test]
    fn test_kind_decides_severity() {
        assert_eq!(DiagnosticKind::Syntax.severity(), Severity::Error);
        assert_eq!(DiagnosticKind::VoidValue.severity(), Severity::Warning);
    }

    #[test]
    fn test_from_parse_error_is_one_based() {
        let span = Span::point(Position::new(10, 10, 6));
        let error = ParseError::new(ParseErrorKind::UnterminatedString, span);
        let diagnostic = Diagnostic::from_parse_error(&error);
        assert_eq!(diagnostic.kind, DiagnosticKind::Lexical);
        assert_eq!(diagnostic.to_string(), "11:7: unterminated string literal");
    }

    #[test]
    fn test_lexical_sorts_before_syntax_at_same_position() {
        let lexical = Diagnostic::new(DiagnosticKind::Lexical, "a", 1, 1);
        let syntax = Diagnostic::new(DiagnosticKind::Syntax, "b", 1, 1);
        assert!(lexical.sort_key() < syntax.sort_key());
    }
}
