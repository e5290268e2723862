//! # Ruby Parser (Pure Rust)
//!
//! An error-recovering lexer and parser for Ruby source code.
//! No C dependencies - compiles directly to WASM.
//!
//! ## Architecture
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → CST (+ lexical and syntax errors)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::parse;
//!
//! let cst = parse("puts 'hello'");
//! assert!(cst.errors.is_empty());
//! ```
//!
//! ## Pipeline Integration
//!
//! This crate is the first layer of the linter:
//!
//! ```text
//! ruby-parser → ruby-lint → ruby-lint-wasm / ruby-lint-cli
//! ```

pub mod cst;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

// Re-export public API
pub use config::constants::LintLimits;
pub use cst::{Cst, Node, NodeId, NodeKind};
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Token, TokenFlags, TokenKind};
pub use span::{Position, Span, Spanned};

// =============================================================================
// PUBLIC API
// =============================================================================

/// Tokens and tree for one source buffer.
///
/// The rule engine needs both: the tree for scope analysis and the tokens
/// for flags the tree does not keep.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    /// Every token, ending with EOF.
    pub tokens: Vec<Token>,
    /// The tree. Its `errors` hold lexical errors first, then syntax errors.
    pub cst: Cst,
}

/// Split Ruby source into tokens.
///
/// Never fails: lexical problems come back as errors next to a token
/// stream that still runs to EOF.
///
/// ## Example
///
/// ```rust
/// let (tokens, errors) = ruby_parser::tokenize("x = \"open");
/// assert_eq!(errors.len(), 1);
/// assert!(tokens.last().is_some_and(|token| token.is_eof()));
/// ```
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<ParseError>) {
    let (tokens, errors) = lexer::Lexer::new(source).tokenize();
    tracing::debug!(tokens = tokens.len(), errors = errors.len(), "lexed");
    (tokens, errors)
}

/// Parse Ruby source code into a Concrete Syntax Tree.
///
/// This is the main entry point for the parser.
///
/// ## Parameters
///
/// - `source`: Ruby source code string
///
/// ## Returns
///
/// `Cst` containing the root node and any lexical or syntax errors
///
/// ## Example
///
/// ```rust
/// use ruby_parser::parse;
///
/// let cst = parse("def greet(name)\n  puts name\nend");
/// assert!(cst.is_ok());
/// assert_eq!(cst.kind(cst.root), ruby_parser::NodeKind::Program);
/// ```
///
/// ## Error Handling
///
/// The parser recovers from errors and continues. Errors are collected
/// in `cst.errors`.
///
/// ```rust
/// let cst = ruby_parser::parse("list = [1, 2\nputs list");
/// assert_eq!(cst.errors.len(), 1);
/// assert_eq!(cst.children(cst.root).len(), 2);
/// ```
pub fn parse(source: &str) -> Cst {
    parse_source(source, LintLimits::default()).cst
}

/// Parse with explicit error and nesting limits.
pub fn parse_with_limits(source: &str, limits: LintLimits) -> Cst {
    parse_source(source, limits).cst
}

/// Lex and parse, keeping the token stream.
pub fn parse_source(source: &str, limits: LintLimits) -> ParsedSource {
    let (tokens, lexical_errors) = tokenize(source);
    let mut cst = parser::Parser::with_limits(source, tokens.clone(), limits).parse();

    if !lexical_errors.is_empty() {
        let syntax_errors = std::mem::take(&mut cst.errors);
        cst.errors = lexical_errors;
        cst.errors.extend(syntax_errors);
    }

    ParsedSource { tokens, cst }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_method_call() {
        let cst = parse("puts 'hello'");
        assert!(cst.is_ok(), "Expected no errors, got: {:?}", cst.errors);
        assert_eq!(cst.children(cst.root).len(), 1);
    }

    #[test]
    fn test_parse_class_with_methods() {
        let cst = parse("class Greeter\n  def initialize(name)\n    @name = name\n  end\n\n  def greet = \"hi #{@name}\"\nend");
        assert!(cst.is_ok(), "Expected no errors, got: {:?}", cst.errors);
    }

    #[test]
    fn test_lexical_errors_come_first() {
        let cst = parse("x = [1\ny = \"open");
        assert_eq!(cst.errors.len(), 2);
        assert!(cst.errors[0].is_lexical());
        assert!(!cst.errors[1].is_lexical());
    }

    #[test]
    fn test_parse_source_keeps_tokens() {
        let parsed = parse_source("a = 07", LintLimits::default());
        assert!(parsed.tokens.iter().any(|token| token.kind == TokenKind::LegacyOctalInteger));
        assert!(parsed.cst.is_ok());
    }

    #[test]
    fn test_error_recovery() {
        let cst = parse("def a(\nputs 1\n");
        assert!(!cst.is_ok());
    }

    #[test]
    fn test_error_limit_is_honoured() {
        let limits = LintLimits::new(3, 64).unwrap();
        let cst = parse_with_limits(")\n)\n)\n)\n)\n)", limits);
        assert_eq!(cst.errors.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(source in "\\PC{0,200}") {
            let _ = parse(&source);
        }

        #[test]
        fn prop_ruby_like_input_keeps_spans_ordered(
            source in "(def |end|do |\\{|\\}|\\[|\\]|\\(|\\)|x|=|1|\\||,|\\.| |\n|if |case |when ){0,60}"
        ) {
            let cst = parse(&source);
            let mut previous = None;
            for id in cst.preorder() {
                let start = cst.node(id).span.start.byte;
                if let Some(before) = previous {
                    prop_assert!(start >= before || cst.kind(id) == NodeKind::Program);
                }
                previous = Some(start);
            }
        }
    }
}
