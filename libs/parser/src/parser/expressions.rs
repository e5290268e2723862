//! # Expression Parsing
//!
//! Facade module for parsing Ruby expressions, plus assignment.
//!
//! ## Module Structure (SRP)
//!
//! - `operators` - Ternary, range, binary and unary operators with precedence
//! - `primaries` - Literals, variables, keywords that start expressions
//! - `postfix` - Method calls, indexing, `::`, and attached blocks
//! - `calls` - Arguments, blocks, lambdas
//! - `collections` - Arrays and hashes
//!
//! ## Operator Precedence (loosest first)
//!
//! | Operators | Associativity |
//! |-----------|---------------|
//! | `not` `and` `or` (statements) | Left |
//! | `=` `+=` ... | Right |
//! | `? :` | Right |
//! | `..` `...` | None |
//! | `\|\|` | Left |
//! | `&&` | Left |
//! | `<=>` `==` `===` `!=` `=~` `!~` | None |
//! | `<` `<=` `>` `>=` | Left |
//! | `\|` `^` | Left |
//! | `&` | Left |
//! | `<<` `>>` | Left |
//! | `+` `-` | Left |
//! | `*` `/` `%` | Left |
//! | unary `-` | Right |
//! | `**` | Right |
//! | `!` `~` unary `+` | Right |
//!
//! ## Example
//!
//! ```rust,ignore
//! let expr = parser.parse_expression()?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parse an expression, including assignment.
    ///
    /// ## Example
    ///
    /// ```text
    /// total = price * quantity
    /// cache[key] ||= compute(key)
    /// x > 0 ? 1 : 0
    /// ```
    pub(super) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.nested(|parser| parser.parse_assignment())
    }

    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let target = self.parse_ternary()?;

        match self.peek_kind() {
            TokenKind::Eq => {
                let target = self.assignment_target(target)?;
                self.advance();
                let value = self.parse_assignment_value()?;
                Ok(self.finish(NodeKind::Assignment, start, vec![target, value]))
            }
            TokenKind::OpAssign => {
                let target = self.assignment_target(target)?;
                let operator = self.advance().text.clone();
                let value = self.parse_assignment_value()?;
                let node = self.finish(NodeKind::OpAssignment, start, vec![target, value]);
                self.node_mut(node).text = Some(operator);
                Ok(node)
            }
            _ => Ok(target),
        }
    }

    /// Right-hand side of `=`: an expression or a splat.
    pub(super) fn parse_assignment_value(&mut self) -> Result<NodeId, ParseError> {
        if self.check(TokenKind::Star) {
            let start = self.current_position();
            self.advance();
            let inner = self.parse_ternary()?;
            return Ok(self.finish(NodeKind::Splat, start, vec![inner]));
        }
        self.parse_expression()
    }

    /// Turn an already-parsed node into an assignment target.
    ///
    /// A bare identifier becomes a `LocalTarget` and is declared in the
    /// current scope before the right-hand side is parsed, so the value may
    /// refer to it.
    pub(super) fn assignment_target(&mut self, target: NodeId) -> Result<NodeId, ParseError> {
        let node = self.node(target);
        match node.kind {
            NodeKind::LocalVariable | NodeKind::LocalTarget => {
                self.node_mut(target).kind = NodeKind::LocalTarget;
                Ok(target)
            }
            NodeKind::Call if node.children.is_empty() && is_local_name(node.text.as_deref()) => {
                let name = node.text.clone().unwrap_or_default();
                self.declare(&name);
                self.node_mut(target).kind = NodeKind::LocalTarget;
                Ok(target)
            }
            // `recv.attr = value`
            NodeKind::Call
                if node.children.len() == 1
                    && !matches!(self.kind_of(node.children[0]), NodeKind::Arguments | NodeKind::Block) =>
            {
                Ok(target)
            }
            NodeKind::InstanceVariable
            | NodeKind::ClassVariable
            | NodeKind::GlobalVariable
            | NodeKind::Constant
            | NodeKind::ScopedConstant
            | NodeKind::Index => Ok(target),
            kind => Err(ParseError::new(
                ParseErrorKind::CannotAssign {
                    target: target_description(kind).to_string(),
                },
                node.span,
            )),
        }
    }
}

/// Whether a call name could also be a local variable (`foo`, not `foo?` or `Foo`).
fn is_local_name(name: Option<&str>) -> bool {
    match name {
        Some(name) => {
            let first = name.chars().next().unwrap_or('A');
            (first == '_' || first.is_lowercase() || !first.is_ascii())
                && !name.ends_with(['?', '!', '='])
        }
        None => false,
    }
}

fn target_description(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Call => "method call",
        NodeKind::SelfNode => "self",
        NodeKind::Nil => "nil",
        NodeKind::True | NodeKind::False => "boolean literal",
        kind if kind.is_literal() => "literal",
        _ => "expression",
    }
}

// =============================================================================
// TESTS
// =============================================================================
