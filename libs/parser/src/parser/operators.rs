//! # Operator Parsing
//!
//! Parses ternary, range, binary and unary operators using precedence
//! climbing.
//!
//! ## Example
//!
//! ```rust,ignore
//! let expr = parser.parse_binary(Precedence::LogicalOr)?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::TokenKind;

// =============================================================================
// PRECEDENCE
// =============================================================================

/// Binary operator precedence levels.
///
/// Higher values bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    /// Logical or: `||`
    LogicalOr = 1,
    /// Logical and: `&&`
    LogicalAnd = 2,
    /// Equality and matching: `<=> == === != =~ !~`
    Equality = 3,
    /// Comparison: `< > <= >=`
    Comparison = 4,
    /// Bitwise or/xor: `| ^`
    BitOr = 5,
    /// Bitwise and: `&`
    BitAnd = 6,
    /// Shifts: `<< >>`
    Shift = 7,
    /// Addition/subtraction: `+ -`
    Term = 8,
    /// Multiplication/division: `* / %`
    Factor = 9,
}

impl Precedence {
    /// Get precedence for binary operator.
    ///
    /// ## Returns
    ///
    /// Precedence level if token is a binary operator, None otherwise
    pub(super) fn of_binary(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::PipePipe => Some(Self::LogicalOr),
            TokenKind::AmpAmp => Some(Self::LogicalAnd),
            TokenKind::Cmp
            | TokenKind::EqEq
            | TokenKind::EqEqEq
            | TokenKind::NotEq
            | TokenKind::Match
            | TokenKind::NotMatch => Some(Self::Equality),
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Some(Self::Comparison),
            TokenKind::Pipe | TokenKind::Caret => Some(Self::BitOr),
            TokenKind::Amp => Some(Self::BitAnd),
            TokenKind::Shl | TokenKind::Shr => Some(Self::Shift),
            TokenKind::Plus | TokenKind::Minus => Some(Self::Term),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(Self::Factor),
            _ => None,
        }
    }

    /// Get next higher precedence level.
    ///
    /// Used for left-associative operators.
    pub(super) fn next(self) -> Option<Self> {
        match self {
            Self::LogicalOr => Some(Self::LogicalAnd),
            Self::LogicalAnd => Some(Self::Equality),
            Self::Equality => Some(Self::Comparison),
            Self::Comparison => Some(Self::BitOr),
            Self::BitOr => Some(Self::BitAnd),
            Self::BitAnd => Some(Self::Shift),
            Self::Shift => Some(Self::Term),
            Self::Term => Some(Self::Factor),
            Self::Factor => None,
        }
    }
}

// =============================================================================
// OPERATOR PARSING
// =============================================================================

impl<'a> Parser<'a> {
    /// Parse `cond ? a : b`.
    pub(super) fn parse_ternary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let condition = self.parse_range()?;
        if !self.check(TokenKind::Question) {
            return Ok(condition);
        }

        self.advance();
        self.skip_newlines();
        let then_branch = self.nested(|parser| parser.parse_ternary())?;
        self.skip_newlines();
        self.expect(TokenKind::Colon)?;
        self.skip_newlines();
        let else_branch = self.nested(|parser| parser.parse_ternary())?;
        Ok(self.finish(NodeKind::Ternary, start, vec![condition, then_branch, else_branch]))
    }

    /// Parse `a..b`, `a...b`, and the beginless and endless forms.
    fn parse_range(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();

        if matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotDot) {
            let operator = self.advance().text.clone();
            let upper = self.parse_binary(Precedence::LogicalOr)?;
            let node = self.finish(NodeKind::Range, start, vec![upper]);
            self.node_mut(node).text = Some(operator);
            return Ok(node);
        }

        let lower = self.parse_binary(Precedence::LogicalOr)?;
        if !matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotDot) {
            return Ok(lower);
        }

        let operator = self.advance().text.clone();
        let mut children = vec![lower];
        if self.starts_value() {
            children.push(self.parse_binary(Precedence::LogicalOr)?);
        }
        let node = self.finish(NodeKind::Range, start, children);
        self.node_mut(node).text = Some(operator);
        Ok(node)
    }

    /// Parse expression with minimum precedence.
    ///
    /// ## Parameters
    ///
    /// - `min_prec`: Minimum precedence level to parse
    pub(super) fn parse_binary(&mut self, min_prec: Precedence) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let mut left = self.parse_unary()?;

        while let Some(prec) = Precedence::of_binary(self.peek_kind()) {
            if prec < min_prec {
                break;
            }

            let operator = self.advance().kind;
            let right = match prec.next() {
                Some(tighter) => self.nested(|parser| parser.parse_binary(tighter))?,
                None => self.nested(|parser| parser.parse_unary())?,
            };

            left = match operator {
                TokenKind::AmpAmp => self.finish(NodeKind::And, start, vec![left, right]),
                TokenKind::PipePipe => self.finish(NodeKind::Or, start, vec![left, right]),
                _ => {
                    let node = self.finish(NodeKind::Binary, start, vec![left, right]);
                    self.node_mut(node).text = Some(operator.display().to_string());
                    node
                }
            };
        }

        Ok(left)
    }

    /// Parse unary operators.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// unary = ("!" | "~" | "+") unary
    ///       | "-" unary
    ///       | power
    /// ```
    ///
    /// Unary minus binds looser than `**`, so `-2 ** 2` is `-(2 ** 2)`.
    pub(super) fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let kind = match self.peek_kind() {
            TokenKind::Bang => NodeKind::Not,
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde => NodeKind::Unary,
            _ => return self.parse_power(),
        };

        let operator = self.advance().text.clone();
        let operand = self.nested(|parser| parser.parse_unary())?;
        let node = self.finish(kind, start, vec![operand]);
        if kind == NodeKind::Unary {
            self.node_mut(node).text = Some(operator);
        }
        Ok(node)
    }

    /// Parse `base ** exponent` (right associative).
    fn parse_power(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let base = self.parse_postfix_expression()?;
        if !self.check(TokenKind::Pow) {
            return Ok(base);
        }

        self.advance();
        let exponent = self.nested(|parser| parser.parse_unary())?;
        let node = self.finish(NodeKind::Binary, start, vec![base, exponent]);
        self.node_mut(node).text = Some("**".to_string());
        Ok(node)
    }
}

// =============================================================================
// TESTS
// =============================================================================
