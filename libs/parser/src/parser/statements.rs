//! # Statement Parsing
//!
//! Statement lists, statement modifiers, `and`/`or`/`not`, and multiple
//! assignment.
//!
//! ## Grammar
//!
//! ```text
//! statements = (statement (NEWLINE | ";"))*
//! statement  = expr_stmt (("if" | "unless" | "while" | "until" | "rescue") expr_stmt)*
//! expr_stmt  = not_expr (("and" | "or") not_expr)*
//!            | mlhs "=" rhs
//! not_expr   = "not" not_expr | expression
//! ```

use super::{Parser, CLOSERS};
use crate::cst::{Node, NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::TokenKind;
use crate::span::Span;

impl<'a> Parser<'a> {
    /// Parse statements until one of `terminators` (or EOF).
    ///
    /// This is the recovery point: a statement that fails is reported,
    /// its nodes are discarded, and an `Error` node stands in for the
    /// skipped tokens. The terminator itself is left for the caller.
    ///
    /// ## Returns
    ///
    /// Id of a `Statements` node
    pub(super) fn parse_statement_list(&mut self, terminators: &[TokenKind]) -> NodeId {
        let list_start = self.current_position();
        let mut children = Vec::new();

        loop {
            self.skip_terminators();
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                break;
            }

            if CLOSERS.contains(&kind) {
                let error = self.unexpected("statement");
                self.report(error);
                self.advance();
                continue;
            }

            let first = self.current;
            let mark = self.nodes.len();
            match self.parse_statement() {
                Ok(statement) => {
                    children.push(statement);
                    let next = self.peek_kind();
                    if !next.is_terminator() && !terminators.contains(&next) {
                        let error = self.unexpected("newline or `;`");
                        self.report(error);
                        let skipped = self.current;
                        self.synchronize();
                        children.push(self.error_node(skipped));
                    }
                }
                Err(error) => {
                    self.report(error);
                    self.nodes.truncate(mark);
                    self.synchronize();
                    children.push(self.error_node(first));
                }
            }
        }

        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => Span::new(self.node(*first).span.start, self.node(*last).span.end),
            _ => Span::point(list_start),
        };
        self.add(Node::new(NodeKind::Statements, span).with_children(children))
    }

    /// Parse a statement.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// statement = expr_stmt (modifier expr_stmt)*
    /// ```
    ///
    /// ## Example
    ///
    /// ```text
    /// puts x if x > 0
    /// retry_count += 1 while busy?
    /// ```
    pub(super) fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        self.nested(|parser| {
            let start = parser.current_position();
            let mut statement = parser.parse_expression_statement()?;

            loop {
                let kind = match parser.peek_kind() {
                    TokenKind::If => NodeKind::IfModifier,
                    TokenKind::Unless => NodeKind::UnlessModifier,
                    TokenKind::While => NodeKind::WhileModifier,
                    TokenKind::Until => NodeKind::UntilModifier,
                    TokenKind::Rescue => NodeKind::RescueModifier,
                    _ => break,
                };
                parser.advance();
                let condition = parser.parse_expression_statement()?;
                statement = parser.finish(kind, start, vec![statement, condition]);
            }

            Ok(statement)
        })
    }

    /// Parse `and`/`or` chains, the loosest binding operators.
    pub(super) fn parse_expression_statement(&mut self) -> Result<NodeId, ParseError> {
        if self.at_multiple_assignment() {
            return self.parse_multiple_assignment();
        }

        let start = self.current_position();
        let mut left = self.parse_not_expression()?;
        loop {
            let kind = match self.peek_kind() {
                TokenKind::And => NodeKind::And,
                TokenKind::Or => NodeKind::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_not_expression()?;
            left = self.finish(kind, start, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<NodeId, ParseError> {
        if self.check(TokenKind::Not) {
            let start = self.current_position();
            self.advance();
            let operand = self.nested(|parser| parser.parse_not_expression())?;
            return Ok(self.finish(NodeKind::Not, start, vec![operand]));
        }
        self.parse_expression()
    }

    // =========================================================================
    // MULTIPLE ASSIGNMENT
    // =========================================================================

    /// Look ahead for `a, b = ...` / `*a, b = ...` on the current line.
    ///
    /// Only names, `.`/`::` chains, splats, bracketed subexpressions and
    /// commas may precede the `=`, and two names may not be adjacent
    /// (`puts a, b = 1` is a command call).
    fn at_multiple_assignment(&self) -> bool {
        let mut offset = 0;
        let mut depth = 0usize;
        let mut saw_comma = false;
        let mut previous_was_name = false;

        loop {
            let token = self.peek_at(offset);
            if depth > 0 {
                match token.kind {
                    TokenKind::LParen | TokenKind::LBracket => depth += 1,
                    TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                    TokenKind::Eof => return false,
                    _ => {}
                }
                offset += 1;
                continue;
            }

            match token.kind {
                TokenKind::Identifier
                | TokenKind::Constant
                | TokenKind::InstanceVariable
                | TokenKind::ClassVariable
                | TokenKind::GlobalVariable
                | TokenKind::SelfKw => {
                    if previous_was_name {
                        return false;
                    }
                    previous_was_name = true;
                }
                TokenKind::Comma => {
                    saw_comma = true;
                    previous_was_name = false;
                }
                TokenKind::Star | TokenKind::Dot | TokenKind::AmpDot | TokenKind::ColonColon => {
                    previous_was_name = false;
                }
                TokenKind::LParen | TokenKind::LBracket => {
                    depth += 1;
                    previous_was_name = false;
                }
                // `a, b = ...` but not `a, b == c`
                TokenKind::Eq => return saw_comma,
                _ => return false,
            }
            offset += 1;
        }
    }

    /// Parse `a, (b, *c) = value, other`.
    fn parse_multiple_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let targets = self.parse_multiple_targets(None)?;
        self.expect(TokenKind::Eq)?;

        let value_start = self.current_position();
        let mut values = vec![self.parse_assignment_value()?];
        while self.match_token(TokenKind::Comma) {
            values.push(self.parse_assignment_value()?);
        }
        let value = if values.len() == 1 {
            values[0]
        } else {
            self.finish(NodeKind::Array, value_start, values)
        };

        Ok(self.finish(NodeKind::MultipleAssignment, start, vec![targets, value]))
    }

    /// Parse a comma-separated target list, up to `closer` when nested in parentheses.
    pub(super) fn parse_multiple_targets(&mut self, closer: Option<TokenKind>) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let mut targets = Vec::new();

        loop {
            let target_start = self.current_position();
            let target = match self.peek_kind() {
                TokenKind::Star => {
                    self.advance();
                    let mut children = Vec::new();
                    if !matches!(self.peek_kind(), TokenKind::Comma | TokenKind::Eq | TokenKind::RParen) {
                        let inner = self.parse_postfix_expression()?;
                        children.push(self.assignment_target(inner)?);
                    }
                    self.finish(NodeKind::Splat, target_start, children)
                }
                TokenKind::LParen => {
                    self.advance();
                    let nested = self.parse_multiple_targets(Some(TokenKind::RParen))?;
                    self.expect(TokenKind::RParen)?;
                    nested
                }
                _ => {
                    let inner = self.parse_postfix_expression()?;
                    self.assignment_target(inner)?
                }
            };
            targets.push(target);

            if !self.match_token(TokenKind::Comma) {
                break;
            }
            // Trailing comma: `a, = list`
            if self.check(TokenKind::Eq) || closer.map_or(false, |kind| self.check(kind)) {
                break;
            }
        }

        Ok(self.finish(NodeKind::MultiTargets, start, targets))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::cst::NodeKind;
    use crate::parser::tests::{find, parse, parse_ok, top_kinds};

    #[test]
    fn test_modifiers_wrap_body_first() {
        let cst = parse_ok("x = 1 if y\nz unless w\nbusy while waiting");
        assert_eq!(
            top_kinds(&cst),
            vec![NodeKind::IfModifier, NodeKind::UnlessModifier, NodeKind::WhileModifier]
        );
        let modifier = cst.children(cst.root)[0];
        assert_eq!(cst.kind(cst.children(modifier)[0]), NodeKind::Assignment);
    }

    #[test]
    fn test_rescue_modifier() {
        let cst = parse_ok("value = fetch rescue nil");
        assert_eq!(top_kinds(&cst), vec![NodeKind::RescueModifier]);
    }

    #[test]
    fn test_and_or_not() {
        let cst = parse_ok("ready and go or not stop");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Or]);
        find(&cst, NodeKind::And);
        find(&cst, NodeKind::Not);
    }

    #[test]
    fn test_multiple_assignment_declares_locals() {
        let cst = parse_ok("a, (b, *c) = 1, [2, 3]\nputs a, b, c");
        assert_eq!(top_kinds(&cst), vec![NodeKind::MultipleAssignment, NodeKind::Call]);
        let reads = cst
            .preorder()
            .into_iter()
            .filter(|id| cst.kind(*id) == NodeKind::LocalVariable)
            .count();
        assert_eq!(reads, 3);
    }

    #[test]
    fn test_command_call_with_comma_is_not_multiple_assignment() {
        let cst = parse_ok("puts a, b");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Call]);
    }

    #[test]
    fn test_two_statements_on_one_line_is_an_error() {
        let cst = parse("x = 1 2");
        assert_eq!(cst.errors.len(), 1);
        assert_eq!(top_kinds(&cst), vec![NodeKind::Assignment, NodeKind::Error]);
    }

    #[test]
    fn test_stray_closers_are_each_reported() {
        let cst = parse("]\n}\nputs 1");
        assert_eq!(cst.errors.len(), 2);
        assert_eq!(top_kinds(&cst), vec![NodeKind::Call]);
    }
}
