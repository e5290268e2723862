//! # Call Parsing
//!
//! Parses method calls on bare names, their arguments, blocks and lambdas.
//!
//! ## Responsibilities
//!
//! - Local variable or method call: `x`, `puts x, y`, `foo(1)`
//! - Arguments: positional, `key: value`, `k => v`, `*splat`, `**opts`, `&blk`
//! - Blocks: `{ |x| ... }`, `do |x| ... end`
//! - Lambdas: `->(x) { x * 2 }`
//!
//! ## Example
//!
//! ```rust,ignore
//! let call = parser.parse_identifier()?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

impl<'a> Parser<'a> {
    /// Parse a bare name: a local variable read or a method call.
    ///
    /// A name is a local only when an assignment to it was already seen
    /// in a visible scope, which is how Ruby decides too.
    ///
    /// ## Example
    ///
    /// ```text
    /// count          # local if `count = ...` came earlier, else a call
    /// puts count, 2  # command call
    /// format("%d", 2)
    /// ```
    pub(super) fn parse_identifier(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let name = self.advance().text.clone();
        let paren_follows = self.check(TokenKind::LParen) && !self.peek().flags.spaced;

        if self.is_local(&name) && !paren_follows {
            return Ok(self.leaf(NodeKind::LocalVariable, name));
        }

        let mut children = Vec::new();
        if let Some(arguments) = self.parse_call_arguments()? {
            children.push(arguments);
        }
        let node = self.finish(NodeKind::Call, start, children);
        self.node_mut(node).text = Some(name);
        Ok(node)
    }

    /// Parse `(args)` written right after a name, or command arguments.
    pub(super) fn parse_call_arguments(&mut self) -> Result<Option<NodeId>, ParseError> {
        if self.check(TokenKind::LParen) && !self.peek().flags.spaced {
            return self.parse_paren_arguments().map(Some);
        }
        if self.at_command_argument() {
            return self.parse_command_arguments().map(Some);
        }
        Ok(None)
    }

    /// Whether the current token starts the first argument of a command call.
    ///
    /// The token must be separated from the name by a space. Operators that
    /// double as prefixes (`-`, `*`, `&`, `::`, `**`) count only when glued to
    /// what follows, so `foo -1` passes `-1` while `foo - 1` subtracts.
    fn at_command_argument(&self) -> bool {
        let token = self.peek();
        if !token.flags.spaced {
            return false;
        }
        let glued = !self.peek_at(1).flags.spaced;

        match token.kind {
            kind if kind.is_literal() => true,
            TokenKind::Identifier
            | TokenKind::Constant
            | TokenKind::InstanceVariable
            | TokenKind::ClassVariable
            | TokenKind::GlobalVariable
            | TokenKind::Label
            | TokenKind::LBracket
            | TokenKind::LParen
            | TokenKind::Arrow
            | TokenKind::Bang
            | TokenKind::Def
            | TokenKind::Case
            | TokenKind::Yield
            | TokenKind::Super
            | TokenKind::SelfKw
            | TokenKind::Nil
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Not
            | TokenKind::Defined => true,
            TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Amp
            | TokenKind::ColonColon
            | TokenKind::Pow
            | TokenKind::Tilde => glued,
            _ => false,
        }
    }

    /// Parse `( args )`.
    ///
    /// ## Returns
    ///
    /// An `Arguments` node spanning the parentheses
    pub(super) fn parse_paren_arguments(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let items =
            self.allowing_do(|parser| parser.parse_list_items(&opener, TokenKind::RParen, Self::parse_argument))?;
        Ok(self.finish(NodeKind::Arguments, opener.span.start, items))
    }

    /// Parse unparenthesized arguments up to the end of the statement.
    fn parse_command_arguments(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let items = self.forbidding_do(|parser| {
            let mut items = vec![parser.parse_argument()?];
            while parser.match_token(TokenKind::Comma) {
                parser.skip_newlines();
                items.push(parser.parse_argument()?);
            }
            Ok(items)
        })?;
        Ok(self.finish(NodeKind::Arguments, start, items))
    }

    /// Parse a single argument.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// argument = "*" expr? | "**" expr? | "&" expr?
    ///          | LABEL expr?
    ///          | expr ("=>" expr)?
    /// ```
    pub(super) fn parse_argument(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let prefix = match self.peek_kind() {
            TokenKind::Star => Some(NodeKind::Splat),
            TokenKind::Pow => Some(NodeKind::DoubleSplat),
            TokenKind::Amp => Some(NodeKind::BlockPass),
            _ => None,
        };
        if let Some(kind) = prefix {
            self.advance();
            // Anonymous forwarding: `f(*)`, `f(**)`, `f(&)`
            let mut children = Vec::new();
            if self.starts_value() {
                children.push(self.parse_ternary()?);
            }
            return Ok(self.finish(kind, start, children));
        }

        if self.check(TokenKind::Label) {
            return self.parse_label_pair();
        }

        let value = self.parse_expression()?;
        if self.match_token(TokenKind::FatArrow) {
            self.skip_newlines();
            let associated = self.parse_expression()?;
            return Ok(self.finish(NodeKind::Pair, start, vec![value, associated]));
        }
        Ok(value)
    }

    /// Parse `key: value`, or the shorthand `key:` that reads `key`.
    pub(super) fn parse_label_pair(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let label = self.advance().text.clone();
        let name = label.trim_end_matches(':').to_string();
        let key = self.leaf(NodeKind::Symbol, name.clone());

        let shorthand = matches!(
            self.peek_kind(),
            TokenKind::Comma | TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace | TokenKind::Newline | TokenKind::Eof
        );
        let value = if shorthand {
            let kind = if self.is_local(&name) { NodeKind::LocalVariable } else { NodeKind::Call };
            self.leaf(kind, name)
        } else {
            self.parse_expression()?
        };
        Ok(self.finish(NodeKind::Pair, start, vec![key, value]))
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Parse `{ |params| statements }` attached to a call.
    pub(super) fn parse_brace_block(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        self.push_scope(false);
        let result = self.allowing_do(|parser| {
            let mut children = Vec::new();
            if let Some(parameters) = parser.parse_block_parameters()? {
                children.push(parameters);
            }
            children.push(parser.parse_statement_list(&[TokenKind::RBrace]));
            if parser.is_at_end() {
                return Err(parser.unclosed(&opener, TokenKind::RBrace, true));
            }
            parser.expect(TokenKind::RBrace)?;
            Ok(parser.finish(NodeKind::Block, opener.span.start, children))
        });
        self.pop_scope();
        result
    }

    /// Parse `do |params| statements end` attached to a call.
    pub(super) fn parse_do_block(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        self.parse_do_block_body(&opener)
    }

    /// Parse parameters and body of a `do` block; `opener` is the `do`
    /// (or where it should have been).
    pub(super) fn parse_do_block_body(&mut self, opener: &Token) -> Result<NodeId, ParseError> {
        self.push_scope(false);
        let result = self.allowing_do(|parser| {
            let mut children = Vec::new();
            if let Some(parameters) = parser.parse_block_parameters()? {
                children.push(parameters);
            }
            children.extend(parser.parse_body(opener)?);
            Ok(parser.finish(NodeKind::Block, opener.span.start, children))
        });
        self.pop_scope();
        result
    }

    /// Parse `|a, (b, c), *rest; local|` if present.
    ///
    /// `||` is an empty parameter list.
    fn parse_block_parameters(&mut self) -> Result<Option<NodeId>, ParseError> {
        let start = self.current_position();
        if self.match_token(TokenKind::PipePipe) {
            return Ok(Some(self.finish(NodeKind::BlockParameters, start, Vec::new())));
        }
        if !self.check(TokenKind::Pipe) {
            return Ok(None);
        }
        let opener = self.advance().clone();

        let mut parameters = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Pipe | TokenKind::Semicolon) {
            parameters.push(self.parse_parameter(true)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        // Block-local variables
        if self.match_token(TokenKind::Semicolon) {
            loop {
                let name = self.expect(TokenKind::Identifier)?.text.clone();
                self.declare(&name);
                parameters.push(self.leaf(NodeKind::BlockLocal, name));
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        // `{ |x` followed by a line break: report at the `|` and keep the body.
        if self.check(TokenKind::Newline) {
            let error = self.unclosed(&opener, TokenKind::Pipe, false);
            self.report(error);
        } else {
            self.expect(TokenKind::Pipe)?;
        }
        Ok(Some(self.finish(NodeKind::BlockParameters, start, parameters)))
    }

    // =========================================================================
    // LAMBDAS
    // =========================================================================

    /// Parse `->(params) { body }` or `-> x do body end`.
    pub(super) fn parse_lambda(&mut self) -> Result<NodeId, ParseError> {
        let arrow = self.advance().clone();
        self.push_scope(false);
        let result = self.allowing_do(|parser| parser.parse_lambda_rest(&arrow));
        self.pop_scope();
        result
    }

    fn parse_lambda_rest(&mut self, arrow: &Token) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        let parameters_start = self.current_position();
        if self.check(TokenKind::LParen) {
            let paren = self.advance().clone();
            let parameters = self.parse_parameter_list(&paren)?;
            children.push(self.finish(NodeKind::BlockParameters, parameters_start, parameters));
        } else if !matches!(self.peek_kind(), TokenKind::LBrace | TokenKind::Do) {
            let mut parameters = Vec::new();
            loop {
                parameters.push(self.parse_parameter(false)?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            children.push(self.finish(NodeKind::BlockParameters, parameters_start, parameters));
        }

        match self.peek_kind() {
            TokenKind::LBrace => {
                let opener = self.advance().clone();
                children.push(self.parse_statement_list(&[TokenKind::RBrace]));
                if self.is_at_end() {
                    return Err(self.unclosed(&opener, TokenKind::RBrace, true));
                }
                self.expect(TokenKind::RBrace)?;
            }
            TokenKind::Do => {
                let opener = self.advance().clone();
                children.extend(self.parse_body(&opener)?);
            }
            _ => return Err(self.unexpected("`{` or `do`")),
        }
        Ok(self.finish(NodeKind::Lambda, arrow.span.start, children))
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

    #[test]
    fn test_command_call_arguments() {
        let cst = parse_ok("puts 1, \"two\", :three");
        let call = find(&cst, NodeKind::Call);
        assert_eq!(cst.text(call), "puts");
        let arguments = cst.children(call)[0];
        assert_eq!(cst.children(arguments).len(), 3);
    }

    #[test]
    fn test_spacing_decides_between_argument_and_operator() {
        let cst = parse_ok("foo -1\nbar - 1");
        let first = cst.children(cst.root)[0];
        assert_eq!(cst.kind(first), NodeKind::Call);
        assert_eq!(cst.kind(cst.children(cst.children(first)[0])[0]), NodeKind::Unary);
        let second = cst.children(cst.root)[1];
        assert_eq!(cst.kind(second), NodeKind::Binary);
    }

    #[test]
    fn test_keyword_and_hash_rocket_arguments() {
        let cst = parse_ok("render(json: data, :status => 200, **opts, &blk)");
        let arguments = find(&cst, NodeKind::Arguments);
        let kinds: Vec<NodeKind> = cst.children(arguments).iter().map(|id| cst.kind(*id)).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Pair, NodeKind::Pair, NodeKind::DoubleSplat, NodeKind::BlockPass]
        );
    }

    #[test]
    fn test_label_shorthand_reads_local() {
        let cst = parse_ok("x = 1\nf(x:)");
        let pair = find(&cst, NodeKind::Pair);
        assert_eq!(cst.kind(cst.children(pair)[1]), NodeKind::LocalVariable);
    }

    #[test]
    fn test_do_binds_to_command_call() {
        let cst = parse_ok("foo bar do |x|\n  x\nend");
        let call = cst.children(cst.root)[0];
        assert_eq!(cst.text(call), "foo");
        let kinds: Vec<NodeKind> = cst.children(call).iter().map(|id| cst.kind(*id)).collect();
        assert_eq!(kinds, vec![NodeKind::Arguments, NodeKind::Block]);
    }

    #[test]
    fn test_block_parameters_are_block_locals() {
        let cst = parse_ok("list.each { |item, (a, b); tmp| puts item }\nitem");
        let params = find(&cst, NodeKind::BlockParameters);
        assert_eq!(cst.children(params).len(), 3);
        assert_eq!(cst.kind(cst.children(params)[2]), NodeKind::BlockLocal);
        // `item` is not visible after the block
        let last = *cst.children(cst.root).last().unwrap_or(&cst.root);
        assert_eq!(cst.kind(last), NodeKind::Call);
    }

    #[test]
    fn test_empty_block_parameters() {
        let cst = parse_ok("loop { || break }");
        find(&cst, NodeKind::BlockParameters);
    }

    #[test]
    fn test_lambda_forms() {
        let cst = parse_ok("a = ->(x) { x * 2 }\nb = -> y do y end\nc = -> { 1 }");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Assignment; 3]);
        let lambdas = cst
            .preorder()
            .into_iter()
            .filter(|id| cst.kind(*id) == NodeKind::Lambda)
            .count();
        assert_eq!(lambdas, 3);
    }

    #[test]
    fn test_unclosed_do_block_reports_do() {
        let cst = parse("list.each do |x|\n  puts x\n");
        assert_eq!(cst.errors.len(), 1);
        assert_eq!(
            cst.errors[0].kind,
            ParseErrorKind::Unclosed { opener: "do".into(), expected: "end".into(), at_eof: true }
        );
        assert_eq!(cst.errors[0].span.start.column, 10);
    }

    #[test]
    fn test_unclosed_brace_block() {
        let cst = parse("list.map { |x| x");
        assert_eq!(cst.errors.len(), 1);
        assert!(matches!(cst.errors[0].kind, ParseErrorKind::Unclosed { at_eof: true, .. }));
    }

    #[test]
    fn test_block_parameters_closed_by_line_break() {
        for (source, column) in [("[1].each { |x\n  x\n}\n", 11), ("[1].each do |x\n  x\nend\n", 12)] {
            let cst = parse(source);
            assert_eq!(cst.errors.len(), 1, "{source:?}: {:?}", cst.errors);
            let error = &cst.errors[0];
            assert_eq!(
                error.kind,
                ParseErrorKind::Unclosed { opener: "|".into(), expected: "|".into(), at_eof: false }
            );
            assert_eq!((error.span.start.line, error.span.start.column), (0, column));
            find(&cst, NodeKind::Block);
        }
    }
}
