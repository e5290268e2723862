//! # Control Flow Parsing
//!
//! Parses conditionals, loops, `case`, `begin`/`rescue`/`ensure`, and the
//! jump keywords.
//!
//! ## Responsibilities
//!
//! - Conditionals: `if`/`elsif`/`else`, `unless`
//! - Loops: `while`, `until`, `for ... in`
//! - `case` with `when` or `in` clauses
//! - `begin ... rescue ... else ... ensure ... end` and method/block bodies
//! - `return`, `break`, `next`, `yield`, `super`, `defined?`
//!
//! ## Example
//!
//! ```rust,ignore
//! let node = parser.parse_if()?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind};

impl<'a> Parser<'a> {
    // =========================================================================
    // CONDITIONALS
    // =========================================================================

    /// Parse `if` statement.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// if = "if" expr sep statements ("elsif" expr sep statements)* ("else" statements)? "end"
    /// sep = "then" | NEWLINE | ";"
    /// ```
    ///
    /// ## Example
    ///
    /// ```text
    /// if x > 0 then :positive
    /// elsif x < 0
    ///   :negative
    /// else
    ///   :zero
    /// end
    /// ```
    pub(super) fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let node = self.parse_if_branch(&opener)?;
        self.expect_end(&opener)?;
        self.node_mut(node).span.end = self.previous().span.end;
        Ok(node)
    }

    /// Condition and body of an `if` or `elsif`; a following `elsif`
    /// nests as the last child.
    fn parse_if_branch(&mut self, keyword: &Token) -> Result<NodeId, ParseError> {
        let condition = self.parse_condition(keyword, false)?;
        let body = self.parse_statement_list(&[TokenKind::Elsif, TokenKind::Else, TokenKind::End]);
        let mut children = vec![condition, body];

        if self.check(TokenKind::Elsif) {
            let elsif = self.advance().clone();
            children.push(self.nested(|parser| parser.parse_if_branch(&elsif))?);
        } else if self.check(TokenKind::Else) {
            children.push(self.parse_else(&[TokenKind::End]));
        }
        Ok(self.finish(NodeKind::If, keyword.span.start, children))
    }

    /// Parse `unless cond ... else ... end`.
    pub(super) fn parse_unless(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let condition = self.parse_condition(&opener, false)?;
        let body = self.parse_statement_list(&[TokenKind::Else, TokenKind::End]);
        let mut children = vec![condition, body];
        if self.check(TokenKind::Else) {
            children.push(self.parse_else(&[TokenKind::End]));
        }
        self.expect_end(&opener)?;
        Ok(self.finish(NodeKind::Unless, opener.span.start, children))
    }

    /// Parse `else` and its statements.
    fn parse_else(&mut self, terminators: &[TokenKind]) -> NodeId {
        let start = self.current_position();
        self.advance();
        let body = self.parse_statement_list(terminators);
        self.finish(NodeKind::Else, start, vec![body])
    }

    /// Parse a condition and the separator after it.
    fn parse_condition(&mut self, keyword: &Token, allow_do: bool) -> Result<NodeId, ParseError> {
        let condition = if allow_do {
            self.forbidding_do(|parser| parser.parse_expression_statement())?
        } else {
            self.parse_expression_statement()?
        };
        self.parse_separator(keyword, allow_do);
        Ok(condition)
    }

    /// Consume `then`, a line break or `;` (or `do` for loops).
    ///
    /// Anything else is reported and parsing continues with the body.
    fn parse_separator(&mut self, keyword: &Token, allow_do: bool) {
        match self.peek_kind() {
            TokenKind::Then => {
                self.advance();
            }
            TokenKind::Do if allow_do => {
                self.advance();
            }
            TokenKind::Newline | TokenKind::Semicolon => {
                self.skip_terminators();
                self.match_token(TokenKind::Then);
            }
            // The missing `end` is reported instead
            TokenKind::Eof => {}
            _ => {
                let error = ParseError::new(
                    ParseErrorKind::MissingSeparator { keyword: keyword.text.clone() },
                    self.peek().span,
                );
                self.report(error);
            }
        }
    }

    /// Consume the `end` closing `opener`.
    pub(super) fn expect_end(&mut self, opener: &Token) -> Result<(), ParseError> {
        if self.is_at_end() {
            return Err(self.unclosed(opener, TokenKind::End, true));
        }
        self.expect(TokenKind::End)?;
        Ok(())
    }

    // =========================================================================
    // LOOPS
    // =========================================================================

    /// Parse `while cond [do] ... end` or `until cond [do] ... end`.
    pub(super) fn parse_loop(&mut self, kind: NodeKind) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let condition = self.parse_condition(&opener, true)?;
        let body = self.parse_statement_list(&[TokenKind::End]);
        self.expect_end(&opener)?;
        Ok(self.finish(kind, opener.span.start, vec![condition, body]))
    }

    /// Parse `for target in iterable [do] ... end`.
    ///
    /// The loop variable belongs to the enclosing scope.
    pub(super) fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let target = if self.peek_at(1).kind == TokenKind::Comma {
            self.parse_multiple_targets(None)?
        } else {
            let target = self.parse_postfix_expression()?;
            self.assignment_target(target)?
        };
        self.expect(TokenKind::In)?;
        let iterable = self.parse_condition(&opener, true)?;
        let body = self.parse_statement_list(&[TokenKind::End]);
        self.expect_end(&opener)?;
        Ok(self.finish(NodeKind::For, opener.span.start, vec![target, iterable, body]))
    }

    // =========================================================================
    // CASE
    // =========================================================================

    /// Parse `case` with `when` or `in` clauses.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// case = "case" expr? sep (when | in)* ("else" statements)? "end"
    /// when = "when" argument ("," argument)* sep statements
    /// in   = "in" pattern (("if" | "unless") expr)? sep statements
    /// ```
    pub(super) fn parse_case(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let mut children = Vec::new();
        // The newline after a bare `case` is not significant, so a missing
        // subject shows up as `when`/`in` directly.
        let subject = self.peek_kind();
        if !subject.is_terminator() && !matches!(subject, TokenKind::When | TokenKind::In) {
            children.push(self.parse_expression_statement()?);
        }
        self.skip_terminators();

        loop {
            match self.peek_kind() {
                TokenKind::When => children.push(self.parse_when()?),
                TokenKind::In => children.push(self.parse_in_clause()?),
                _ => break,
            }
        }
        if self.check(TokenKind::Else) {
            children.push(self.parse_else(&[TokenKind::End]));
        }

        self.expect_end(&opener)?;
        Ok(self.finish(NodeKind::Case, opener.span.start, children))
    }

    fn parse_when(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.advance().clone();
        let values_start = self.current_position();
        let mut values = vec![self.parse_argument()?];
        while self.match_token(TokenKind::Comma) {
            self.skip_newlines();
            values.push(self.parse_argument()?);
        }
        let values = self.finish(NodeKind::Arguments, values_start, values);

        self.parse_separator(&keyword, false);
        let body = self.parse_statement_list(&[TokenKind::When, TokenKind::In, TokenKind::Else, TokenKind::End]);
        Ok(self.finish(NodeKind::When, keyword.span.start, vec![values, body]))
    }

    fn parse_in_clause(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.advance().clone();
        let pattern_start = self.current_position();
        let mut pattern = self.parse_argument()?;
        if self.check(TokenKind::Comma) {
            let mut elements = vec![pattern];
            while self.match_token(TokenKind::Comma) {
                elements.push(self.parse_argument()?);
            }
            pattern = self.finish(NodeKind::Array, pattern_start, elements);
        }

        // Guard: `in [x, y] if x > y`
        let guard = match self.peek_kind() {
            TokenKind::If => Some(NodeKind::IfModifier),
            TokenKind::Unless => Some(NodeKind::UnlessModifier),
            _ => None,
        };
        if let Some(kind) = guard {
            self.advance();
            let condition = self.parse_expression()?;
            pattern = self.finish(kind, pattern_start, vec![pattern, condition]);
        }

        self.parse_separator(&keyword, false);
        let body = self.parse_statement_list(&[TokenKind::When, TokenKind::In, TokenKind::Else, TokenKind::End]);
        Ok(self.finish(NodeKind::In, keyword.span.start, vec![pattern, body]))
    }

    // =========================================================================
    // BEGIN / RESCUE / ENSURE
    // =========================================================================

    /// Parse `begin ... end`.
    pub(super) fn parse_begin(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let children = self.parse_body(&opener)?;
        Ok(self.finish(NodeKind::Begin, opener.span.start, children))
    }

    /// Parse a body that may carry `rescue`/`else`/`ensure` clauses, through
    /// the `end` that closes `opener`.
    ///
    /// Shared by `begin`, `def`, `class`, `module` and `do` blocks.
    ///
    /// ## Returns
    ///
    /// `[Statements, RescueClause*, Else?, EnsureClause?]`
    pub(super) fn parse_body(&mut self, opener: &Token) -> Result<Vec<NodeId>, ParseError> {
        let mut children = vec![self.parse_statement_list(&[
            TokenKind::Rescue,
            TokenKind::Else,
            TokenKind::Ensure,
            TokenKind::End,
        ])];

        while self.check(TokenKind::Rescue) {
            children.push(self.parse_rescue_clause()?);
        }
        if self.check(TokenKind::Else) {
            children.push(self.parse_else(&[TokenKind::Ensure, TokenKind::End]));
        }
        if self.check(TokenKind::Ensure) {
            let start = self.current_position();
            self.advance();
            let body = self.parse_statement_list(&[TokenKind::End]);
            children.push(self.finish(NodeKind::EnsureClause, start, vec![body]));
        }

        self.expect_end(opener)?;
        Ok(children)
    }

    /// Parse `rescue A, B => e` and its statements.
    fn parse_rescue_clause(&mut self) -> Result<NodeId, ParseError> {
        let keyword = self.advance().clone();
        let classes_start = self.current_position();
        let mut classes = Vec::new();
        if !matches!(
            self.peek_kind(),
            TokenKind::FatArrow | TokenKind::Then | TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
        ) {
            classes.push(self.parse_ternary()?);
            while self.match_token(TokenKind::Comma) {
                self.skip_newlines();
                classes.push(self.parse_ternary()?);
            }
        }
        let mut children = vec![self.finish(NodeKind::Arguments, classes_start, classes)];

        if self.match_token(TokenKind::FatArrow) {
            let target = self.parse_postfix_expression()?;
            children.push(self.assignment_target(target)?);
        }

        self.parse_separator(&keyword, false);
        children.push(self.parse_statement_list(&[
            TokenKind::Rescue,
            TokenKind::Else,
            TokenKind::Ensure,
            TokenKind::End,
        ]));
        Ok(self.finish(NodeKind::RescueClause, keyword.span.start, children))
    }

    // =========================================================================
    // JUMPS AND KEYWORD CALLS
    // =========================================================================

    /// Parse `return`, `break` or `next` with an optional value.
    ///
    /// Several values become an array: `return a, b`.
    pub(super) fn parse_jump(&mut self, kind: NodeKind) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        self.advance();

        let mut children = Vec::new();
        if self.starts_value() {
            let values_start = self.current_position();
            let mut values = vec![self.parse_argument()?];
            while self.match_token(TokenKind::Comma) {
                self.skip_newlines();
                values.push(self.parse_argument()?);
            }
            let value = if values.len() == 1 {
                values[0]
            } else {
                self.finish(NodeKind::Array, values_start, values)
            };
            children.push(value);
        }
        Ok(self.finish(kind, start, children))
    }

    /// Parse `yield`, `yield x`, `yield(x)`.
    pub(super) fn parse_yield(&mut self) -> Result<NodeId, ParseError> {
        self.parse_keyword_call(NodeKind::Yield)
    }

    /// Parse `super`, `super(x)`, `super x`.
    pub(super) fn parse_super(&mut self) -> Result<NodeId, ParseError> {
        self.parse_keyword_call(NodeKind::Super)
    }

    fn parse_keyword_call(&mut self, kind: NodeKind) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        self.advance();
        let mut children = Vec::new();
        if let Some(arguments) = self.parse_call_arguments()? {
            children.push(arguments);
        }
        Ok(self.finish(kind, start, children))
    }

    /// Parse `defined?(expr)` or `defined? expr`.
    pub(super) fn parse_defined(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        self.advance();
        let operand = if self.check(TokenKind::LParen) {
            let opener = self.advance().clone();
            let operand = self.allowing_do(|parser| parser.parse_expression_statement())?;
            self.skip_newlines();
            if self.is_at_end() {
                return Err(self.unclosed(&opener, TokenKind::RParen, true));
            }
            self.expect(TokenKind::RParen)?;
            operand
        } else {
            self.parse_unary()?
        };
        Ok(self.finish(NodeKind::Defined, start, vec![operand]))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::cst::NodeKind;
    use crate::error::ParseErrorKind;
    use crate::parser::tests::{find, parse, parse_ok, top_kinds};

    fn child_kinds(cst: &crate::cst::Cst, id: crate::cst::NodeId) -> Vec<NodeKind> {
        cst.children(id).iter().map(|child| cst.kind(*child)).collect()
    }

    #[test]
    fn test_if_elsif_else_chain() {
        let cst = parse_ok("if a then 1\nelsif b\n  2\nelse\n  3\nend");
        let outer = cst.children(cst.root)[0];
        assert_eq!(child_kinds(&cst, outer), vec![NodeKind::Call, NodeKind::Statements, NodeKind::If]);
        let inner = cst.children(outer)[2];
        assert_eq!(child_kinds(&cst, inner), vec![NodeKind::Call, NodeKind::Statements, NodeKind::Else]);
        assert_eq!(cst.node(outer).span.end.line, 5);
    }

    #[test]
    fn test_else_with_odd_indentation_is_fine() {
        let cst = parse_ok("if true\n  puts \"x\"\n  else\nend");
        assert_eq!(top_kinds(&cst), vec![NodeKind::If]);
    }

    #[test]
    fn test_missing_then_is_reported_once() {
        let cst = parse("if (ready) puts 1\nend\nputs 2");
        assert_eq!(cst.errors.len(), 1);
        assert_eq!(
            cst.errors[0].kind,
            ParseErrorKind::MissingSeparator { keyword: "if".into() }
        );
        assert_eq!(cst.errors[0].span.start.column, 11);
        assert_eq!(top_kinds(&cst), vec![NodeKind::If, NodeKind::Call]);
    }

    #[test]
    fn test_unclosed_if_points_at_if() {
        let cst = parse("x = 1\nif x\n  puts x\n");
        assert_eq!(cst.errors.len(), 1);
        let error = &cst.errors[0];
        assert!(matches!(error.kind, ParseErrorKind::Unclosed { at_eof: true, .. }));
        assert_eq!((error.span.start.line, error.span.start.column), (1, 0));
    }

    #[test]
    fn test_unless_and_loops() {
        let cst = parse_ok("unless a\n  b\nelse\n  c\nend\nwhile busy do\n  wait\nend\nuntil done\n  work\nend");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Unless, NodeKind::While, NodeKind::Until]);
    }

    #[test]
    fn test_while_condition_call_does_not_take_do() {
        let cst = parse_ok("while queue.pop do\n  step\nend");
        assert!(!cst.preorder().iter().any(|id| cst.kind(*id) == NodeKind::Block));
    }

    #[test]
    fn test_for_loop_declares_target() {
        let cst = parse_ok("for a, b in pairs\n  puts a\nend\nputs b");
        let node = find(&cst, NodeKind::For);
        assert_eq!(cst.kind(cst.children(node)[0]), NodeKind::MultiTargets);
        let reads = cst.preorder().into_iter().filter(|id| cst.kind(*id) == NodeKind::LocalVariable).count();
        assert_eq!(reads, 2);
    }

    #[test]
    fn test_case_when() {
        let cst = parse_ok("case x\nwhen 1, 2 then :low\nwhen *big\n  :high\nelse\n  :none\nend");
        let case = find(&cst, NodeKind::Case);
        assert_eq!(
            child_kinds(&cst, case),
            vec![NodeKind::Call, NodeKind::When, NodeKind::When, NodeKind::Else]
        );
        let first_when = cst.children(case)[1];
        let values = cst.children(first_when)[0];
        assert_eq!(cst.children(values).len(), 2);
    }

    #[test]
    fn test_case_without_subject_and_pattern_clauses() {
        let cst = parse_ok("case\nwhen ready? then go\nend\ncase point\nin [x, y] if x > 0\n  x\nin Integer | Float\n  1\nend");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Case, NodeKind::Case]);
        find(&cst, NodeKind::In);
    }

    #[test]
    fn test_begin_rescue_else_ensure() {
        let cst = parse_ok(
            "begin\n  risky\nrescue ArgumentError, TypeError => e\n  puts e\nrescue\n  retry\nelse\n  ok\nensure\n  done\nend",
        );
        let begin = find(&cst, NodeKind::Begin);
        assert_eq!(
            child_kinds(&cst, begin),
            vec![
                NodeKind::Statements,
                NodeKind::RescueClause,
                NodeKind::RescueClause,
                NodeKind::Else,
                NodeKind::EnsureClause,
            ]
        );
        let clause = cst.children(begin)[1];
        assert_eq!(
            child_kinds(&cst, clause),
            vec![NodeKind::Arguments, NodeKind::LocalTarget, NodeKind::Statements]
        );
    }

    #[test]
    fn test_jumps() {
        let cst = parse_ok("def f\n  return 1, 2 if x\n  return\nend\nloop do\n  break\n  next 3\nend");
        find(&cst, NodeKind::IfModifier);
        find(&cst, NodeKind::Break);
        let next = find(&cst, NodeKind::Next);
        assert_eq!(cst.children(next).len(), 1);
        let returned = find(&cst, NodeKind::Return);
        assert_eq!(cst.kind(cst.children(returned)[0]), NodeKind::Array);
    }

    #[test]
    fn test_yield_super_defined() {
        let cst = parse_ok("def f(a)\n  yield a\n  super(a)\n  defined?(@x)\n  defined? a\nend");
        find(&cst, NodeKind::Yield);
        find(&cst, NodeKind::Super);
        let defined = cst.preorder().into_iter().filter(|id| cst.kind(*id) == NodeKind::Defined).count();
        assert_eq!(defined, 2);
    }
}
