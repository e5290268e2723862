//! # Parse Errors
//!
//! Lexical and syntax errors produced while reading Ruby source.
//!
//! Errors never abort parsing. The lexer and parser record them and keep
//! going, so a single pass reports every independent problem.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::error::ParseError;
//!
//! let error = ParseError::unexpected_token(")", "expression");
//! assert!(error.to_string().contains("unexpected `)`"));
//! ```

use crate::span::Span;
use std::fmt;
use thiserror::Error;

// =============================================================================
// PARSE ERROR
// =============================================================================

/// A parse error with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Error kind with details.
    pub kind: ParseErrorKind,
    /// Source location of error.
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub const fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create unexpected token error.
    ///
    /// ## Parameters
    ///
    /// - `found`: Token that was found
    /// - `expected`: Description of expected token
    pub fn unexpected_token(found: &str, expected: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken {
                found: found.to_string(),
                expected: expected.to_string(),
            },
            Span::zero(),
        )
    }

    /// Create unexpected end-of-input error.
    pub fn unexpected_eof(expected: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            Span::zero(),
        )
    }

    /// Create an error for a construct whose closing token never arrived.
    ///
    /// The span should point at the opener, not where parsing gave up.
    pub fn unclosed(opener: &str, expected: &str, at_eof: bool) -> Self {
        Self::new(
            ParseErrorKind::Unclosed {
                opener: opener.to_string(),
                expected: expected.to_string(),
                at_eof,
            },
            Span::zero(),
        )
    }

    /// Create error with span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether this error came from the lexer rather than the parser.
    pub fn is_lexical(&self) -> bool {
        self.kind.is_lexical()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.kind,
            self.span.start.display_line(),
            self.span.start.display_column()
        )
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// PARSE ERROR KIND
// =============================================================================

/// Kinds of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Found a token that cannot appear here.
    #[error("unexpected `{found}`, expected {expected}")]
    UnexpectedToken {
        /// Token that was found.
        found: String,
        /// Description of what was expected.
        expected: String,
    },

    /// Input ended in the middle of an expression.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// Description of what was expected.
        expected: String,
    },

    /// An opener (`def`, `do`, `[`, `(`...) was never closed.
    #[error("{}", unclosed_message(.opener, .expected, .at_eof))]
    Unclosed {
        /// Text of the opening token.
        opener: String,
        /// Text of the token that would have closed it.
        expected: String,
        /// True when input ran out; false when a line break cut the list short.
        at_eof: bool,
    },

    /// A condition was followed by something other than `then` or a newline.
    #[error("expected `then` or newline after `{keyword}` condition")]
    MissingSeparator {
        /// Keyword that introduced the condition.
        keyword: String,
    },

    /// `|params|` written after a call without `do` or `{`.
    #[error("expected `do` or `{{` before block parameters")]
    MissingBlockOpener,

    /// Assignment to something that cannot be assigned.
    #[error("cannot assign to {target}")]
    CannotAssign {
        /// Description of the target.
        target: String,
    },

    /// Nesting exceeded the configured depth.
    #[error("nesting too deep (limit {limit})")]
    NestingTooDeep {
        /// Configured nesting limit.
        limit: usize,
    },

    /// String literal with no closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// Regular expression literal with no closing `/`.
    #[error("unterminated regexp literal")]
    UnterminatedRegex,

    /// Heredoc whose terminator line never appears.
    #[error("unterminated heredoc, expected `{terminator}`")]
    UnterminatedHeredoc {
        /// Terminator identifier.
        terminator: String,
    },

    /// `=begin` block with no matching `=end`.
    #[error("embedded document meets end of input, expected `=end`")]
    UnterminatedComment,

    /// Malformed numeric literal.
    #[error("invalid number `{text}`")]
    InvalidNumber {
        /// The invalid text.
        text: String,
    },

    /// Character that cannot start any token.
    #[error("unexpected character `{ch}`")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
    },
}

impl ParseErrorKind {
    /// Lexical errors are found while tokenizing; everything else is syntax.
    pub const fn is_lexical(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedString
                | Self::UnterminatedRegex
                | Self::UnterminatedHeredoc { .. }
                | Self::UnterminatedComment
                | Self::InvalidNumber { .. }
                | Self::UnexpectedCharacter { .. }
        )
    }
}

fn unclosed_message(opener: &str, expected: &str, at_eof: &bool) -> String {
    if *at_eof {
        format!("unexpected end of input, expected `{expected}` to close `{opener}`")
    } else {
        format!("unclosed `{opener}`, expected `{expected}` before line break")
    }
}

// =============================================================================
// TESTS
// =============================================================================
