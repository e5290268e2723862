//! # Ruby Parser
//!
//! Recursive descent parser for Ruby.
//! Produces an arena-allocated Concrete Syntax Tree (CST).
//!
//! The parser never stops at the first problem. Some errors are reported
//! in place and parsing carries on (a missing `then`, a list cut short by a
//! line break); the rest bubble up as `Err` to the nearest statement list,
//! which records the error, discards the half-built statement, skips to the
//! next statement boundary and resumes.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::lexer::Lexer;
//! use ruby_parser::parser::Parser;
//!
//! let source = "puts 10";
//! let (tokens, _) = Lexer::new(source).tokenize();
//! let cst = Parser::new(source, tokens).parse();
//! assert!(cst.is_ok());
//! ```

mod calls;
mod collections;
mod control_flow;
mod declarations;
mod expressions;
mod operators;
mod postfix;
mod primaries;
mod statements;

use crate::cst::{Cst, Node, NodeId, NodeKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind};
use crate::span::{Position, Span};
use config::constants::{LintLimits, STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use std::collections::HashSet;

/// Tokens that close some enclosing construct and can never start a statement.
const CLOSERS: &[TokenKind] = &[
    TokenKind::End,
    TokenKind::RBrace,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::Else,
    TokenKind::Elsif,
    TokenKind::When,
    TokenKind::In,
    TokenKind::Rescue,
    TokenKind::Ensure,
    TokenKind::Then,
    TokenKind::InterpolationEnd,
];

/// Local variable names visible in one lexical scope.
#[derive(Debug, Default)]
struct LocalScope {
    names: HashSet<String>,
    /// `def`, `class` and `module` bodies do not see enclosing locals.
    opaque: bool,
}

// =============================================================================
// PARSER
// =============================================================================

/// Recursive descent parser for Ruby.
///
/// ## Example
///
/// ```rust
/// use ruby_parser::lexer::Lexer;
/// use ruby_parser::parser::Parser;
///
/// let (tokens, _) = Lexer::new("[1, 2").tokenize();
/// let cst = Parser::new("[1, 2", tokens).parse();
/// assert_eq!(cst.errors.len(), 1);
/// ```
pub struct Parser<'a> {
    /// Source text (for error messages).
    source: &'a str,
    /// Token stream, always ending with EOF.
    tokens: Vec<Token>,
    /// Current token index.
    current: usize,
    /// Node arena.
    nodes: Vec<Node>,
    /// Collected syntax errors.
    errors: Vec<ParseError>,
    limits: LintLimits,
    depth: usize,
    scopes: Vec<LocalScope>,
    /// Nonzero while `do` belongs to an enclosing construct
    /// (a `while` condition or a command call's arguments).
    no_do: usize,
    /// The error cap was reached; everything else is skipped.
    gave_up: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default limits.
    ///
    /// ## Parameters
    ///
    /// - `source`: Original source text
    /// - `tokens`: Tokens from lexer
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self::with_limits(source, tokens, LintLimits::default())
    }

    /// Create a parser with explicit error and nesting limits.
    pub fn with_limits(source: &'a str, mut tokens: Vec<Token>, limits: LintLimits) -> Self {
        if tokens.last().map_or(true, |token| token.kind != TokenKind::Eof) {
            let end = tokens.last().map_or_else(Position::default, |token| token.span.end);
            tokens.push(Token::new(TokenKind::Eof, Span::point(end), String::new()));
        }
        Self {
            source,
            tokens,
            current: 0,
            nodes: Vec::new(),
            errors: Vec::new(),
            limits,
            depth: 0,
            scopes: Vec::new(),
            no_do: 0,
            gave_up: false,
        }
    }

    /// Parse the entire token stream into a CST.
    ///
    /// ## Returns
    ///
    /// CST with the node arena, root `Program` node, and syntax errors
    pub fn parse(mut self) -> Cst {
        let start = self.current_position();
        self.push_scope(true);
        let statements = self.parse_statement_list(&[]);
        self.pop_scope();

        let end = self.peek().span.end;
        let children = self.node(statements).children.clone();
        let root = self.add(Node::new(NodeKind::Program, Span::new(start, end.max(start))).with_children(children));

        tracing::debug!(
            nodes = self.nodes.len(),
            errors = self.errors.len(),
            bytes = self.source.len(),
            "parsed"
        );
        Cst::new(self.nodes, root, self.errors)
    }

    // =========================================================================
    // TOKEN ACCESS
    // =========================================================================

    /// Get current token.
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Token `offset` positions ahead, clamped to EOF.
    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + offset).min(last)]
    }

    /// Get current token kind.
    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Check if current token matches kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Check if at end of file.
    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// Get current position.
    fn current_position(&self) -> Position {
        self.peek().span.start
    }

    /// Advance to next token.
    ///
    /// ## Returns
    ///
    /// The token that was consumed
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Get previous token.
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Consume token if it matches expected kind.
    fn expect(&mut self, kind: TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.display()))
        }
    }

    /// Try to consume token if it matches.
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Kind of the first token after any run of newlines.
    fn kind_after_newlines(&self) -> TokenKind {
        let mut offset = 0;
        while self.peek_at(offset).kind == TokenKind::Newline {
            offset += 1;
        }
        self.peek_at(offset).kind
    }

    // =========================================================================
    // NODES
    // =========================================================================

    /// Allocate a node and return its id.
    fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn kind_of(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Leaf node for the token just consumed.
    fn leaf(&mut self, kind: NodeKind, text: impl Into<String>) -> NodeId {
        let span = self.previous().span;
        self.add(Node::new(kind, span).with_text(text))
    }

    /// Node spanning from `start` to the end of the last consumed token.
    fn finish(&mut self, kind: NodeKind, start: Position, children: Vec<NodeId>) -> NodeId {
        let span = self.span_from(start);
        self.add(Node::new(kind, span).with_children(children))
    }

    // =========================================================================
    // LOCAL SCOPES
    // =========================================================================

    fn push_scope(&mut self, opaque: bool) {
        self.scopes.push(LocalScope { names: HashSet::new(), opaque });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.to_string());
        }
    }

    /// Whether `name` is a local variable here, looking through block scopes.
    fn is_local(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.names.contains(name) {
                return true;
            }
            if scope.opaque {
                return false;
            }
        }
        false
    }

    // =========================================================================
    // ERROR RECOVERY
    // =========================================================================

    /// Record an error without unwinding.
    ///
    /// Once the configured cap is reached the parser jumps to EOF so every
    /// open production finishes quickly and no further errors are kept.
    fn report(&mut self, error: ParseError) {
        if self.gave_up {
            return;
        }
        self.errors.push(error);
        if self.errors.len() >= self.limits.max_syntax_errors {
            tracing::debug!(limit = self.limits.max_syntax_errors, "syntax error cap reached");
            self.gave_up = true;
            self.current = self.tokens.len() - 1;
        }
    }

    /// Error for the current token when `expected` was wanted.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            return ParseError::unexpected_eof(expected).with_span(Span::point(self.previous().span.end));
        }
        ParseError::unexpected_token(&describe(token), expected).with_span(token.span)
    }

    /// Error for a construct opened by `opener` that never saw `closer`.
    fn unclosed(&self, opener: &Token, closer: TokenKind, at_eof: bool) -> ParseError {
        ParseError::unclosed(&opener.text, closer.display(), at_eof).with_span(opener.span)
    }

    /// Run `parse` one level deeper, refusing to recurse past the nesting limit.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= self.limits.max_nesting_depth {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep { limit: self.limits.max_nesting_depth },
                self.peek().span,
            ));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || parse(self));
        self.depth -= 1;
        result
    }

    /// Run `parse` inside brackets, where `do` starts a block again.
    fn allowing_do<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::take(&mut self.no_do);
        let result = parse(self);
        self.no_do = saved;
        result
    }

    /// Run `parse` where a `do` belongs to the enclosing construct.
    fn forbidding_do<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        self.no_do += 1;
        let result = parse(self);
        self.no_do -= 1;
        result
    }

    /// Synchronize parser state after an error.
    ///
    /// Skips tokens until a line break or `;` outside brackets, or a
    /// `def`/`class`/`module`/`end` keyword.
    fn synchronize(&mut self) {
        let start = self.current;
        let mut depth = 0usize;

        while !self.is_at_end() {
            let kind = self.peek_kind();
            match kind {
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Def | TokenKind::Class | TokenKind::Module | TokenKind::End
                    if depth == 0 && self.current > start =>
                {
                    return;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Error node covering tokens from index `first` up to the current token.
    fn error_node(&mut self, first: usize) -> NodeId {
        let start = self.tokens[first.min(self.tokens.len() - 1)].span.start;
        let end = if self.current > first { self.previous().span.end } else { start };
        self.add(Node::new(NodeKind::Error, Span::new(start, end.max(start))))
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Create span from start to current position.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.previous().span.end.max(start))
    }
}

/// Human-readable name of a token for error messages.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Newline | TokenKind::Eof => token.kind.display().to_string(),
        _ if token.text.is_empty() => token.kind.display().to_string(),
        _ => token.text.clone(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lexer::Lexer;

    pub(crate) fn parse(source: &str) -> Cst {
        let (tokens, _) = Lexer::new(source).tokenize();
        Parser::new(source, tokens).parse()
    }

    /// Parse and assert the source is free of syntax errors.
    pub(crate) fn parse_ok(source: &str) -> Cst {
        let cst = parse(source);
        assert!(cst.errors.is_empty(), "Errors: {:?}", cst.errors);
        cst
    }

    /// Kinds of the top-level statements.
    pub(crate) fn top_kinds(cst: &Cst) -> Vec<NodeKind> {
        cst.children(cst.root).iter().map(|id| cst.kind(*id)).collect()
    }

    /// First node of `kind` in pre-order.
    pub(crate) fn find(cst: &Cst, kind: NodeKind) -> NodeId {
        cst.preorder()
            .into_iter()
            .find(|id| cst.kind(*id) == kind)
            .unwrap_or_else(|| panic!("no {kind:?} node"))
    }

    #[test]
    fn test_parse_empty() {
        let cst = parse_ok("");
        assert_eq!(cst.kind(cst.root), NodeKind::Program);
        assert!(cst.children(cst.root).is_empty());
    }

    #[test]
    fn test_parse_multiple_statements() {
        let cst = parse_ok("a = 1; b = 2\nputs a");
        assert_eq!(cst.children(cst.root).len(), 3);
    }

    #[test]
    fn test_parse_recovers_from_error() {
        let cst = parse("x = )\nputs 5");
        assert_eq!(cst.errors.len(), 1);
        assert_eq!(top_kinds(&cst), vec![NodeKind::Error, NodeKind::Call]);
    }

    #[test]
    fn test_stray_end_is_reported_and_skipped() {
        let cst = parse("end\nputs 1");
        assert_eq!(cst.errors.len(), 1);
        assert!(cst.errors[0].to_string().contains("unexpected `end`"));
        assert_eq!(top_kinds(&cst), vec![NodeKind::Call]);
    }

    #[test]
    fn test_error_cap_stops_parsing() {
        let source = ")\n".repeat(20);
        let (tokens, _) = Lexer::new(&source).tokenize();
        let limits = LintLimits::new(5, 64).unwrap();
        let cst = Parser::with_limits(&source, tokens, limits).parse();
        assert_eq!(cst.errors.len(), 5);
    }

    #[test]
    fn test_nesting_limit_reports_once() {
        let source = format!("x = {}1{}", "[".repeat(40), "]".repeat(40));
        let (tokens, _) = Lexer::new(&source).tokenize();
        let limits = LintLimits::new(100, 16).unwrap();
        let cst = Parser::with_limits(&source, tokens, limits).parse();
        assert_eq!(cst.errors.len(), 1);
        assert!(matches!(cst.errors[0].kind, ParseErrorKind::NestingTooDeep { limit: 16 }));
    }

    #[test]
    fn test_spans_are_monotonic_in_preorder() {
        let cst = parse_ok("def f(a)\n  b = a + 1 if a\n  [b, {k: b}]\nend\nf(2)");
        let starts: Vec<usize> = cst.preorder().iter().map(|id| cst.node(*id).span.start.byte).collect();
        assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]), "{starts:?}");
    }

    #[test]
    fn test_missing_eof_token_is_supplied() {
        let cst = Parser::new("", Vec::new()).parse();
        assert!(cst.is_ok());
    }
}
