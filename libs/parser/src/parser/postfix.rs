//! # Postfix Expression Parsing
//!
//! Parses postfix expressions: method calls, index access, scope
//! resolution, and blocks attached to calls.
//!
//! ## Responsibilities
//!
//! - Method calls: `list.map(&:to_s)`, `user&.name`, `puts.call`
//! - Index access: `arr[0]`
//! - Scope resolution: `Foo::Bar`, `Foo::bar`
//! - Blocks: `each { |x| }`, `each do |x| end`
//!
//! ## Example
//!
//! ```rust,ignore
//! let expr = parser.parse_postfix_expression()?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind};
use crate::span::Position;

impl<'a> Parser<'a> {
    /// Parse postfix expressions (call, index, scope, block).
    ///
    /// ## Grammar
    ///
    /// ```text
    /// postfix = primary ( ("." | "&.") name args?
    ///                   | "::" (CONSTANT | name args?)
    ///                   | "[" args "]"
    ///                   | block )*
    /// ```
    ///
    /// ## Example
    ///
    /// ```text
    /// list.first
    /// user&.profile.name
    /// matrix[i][j]
    /// File::SEPARATOR
    /// items.each { |item| puts item }
    /// ```
    pub(super) fn parse_postfix_expression(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let mut expr = self.parse_primary()?;

        loop {
            let token = self.peek();
            let spaced = token.flags.spaced;
            match token.kind {
                TokenKind::Dot | TokenKind::AmpDot => {
                    self.advance();
                    expr = self.parse_method_call(expr, start)?;
                }
                TokenKind::ColonColon if !spaced => {
                    self.advance();
                    expr = self.parse_scope_resolution(expr, start)?;
                }
                TokenKind::LBracket if !spaced || self.kind_of(expr) != NodeKind::Call => {
                    expr = self.parse_index(expr, start)?;
                }
                TokenKind::LBrace if self.accepts_block(expr) => {
                    let block = self.parse_brace_block()?;
                    self.attach_block(expr, block);
                }
                TokenKind::Do if self.no_do == 0 && self.accepts_block(expr) => {
                    let block = self.parse_do_block()?;
                    self.attach_block(expr, block);
                }
                TokenKind::Pipe if self.accepts_block(expr) && self.at_block_parameters_without_opener() => {
                    let pipe = self.peek().span;
                    self.report(ParseError::new(ParseErrorKind::MissingBlockOpener, pipe));
                    // Read the rest as if `do` had been written at the pipe.
                    let opener = Token::new(TokenKind::Do, pipe, "do".to_string());
                    let block = self.parse_do_block_body(&opener)?;
                    self.attach_block(expr, block);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse the method name and arguments after `.` or `&.`.
    fn parse_method_call(&mut self, receiver: NodeId, start: Position) -> Result<NodeId, ParseError> {
        let token = self.peek().clone();
        let name = match token.kind {
            TokenKind::Identifier | TokenKind::Constant => token.text,
            // `proc.()`
            TokenKind::LParen => "call".to_string(),
            kind if kind.is_operator_method() || kind.is_keyword() => token.text,
            _ => return Err(self.unexpected("method name")),
        };
        if token.kind != TokenKind::LParen {
            self.advance();
        }

        let mut children = vec![receiver];
        if let Some(arguments) = self.parse_call_arguments()? {
            children.push(arguments);
        }
        let node = self.finish(NodeKind::Call, start, children);
        self.node_mut(node).text = Some(name);
        Ok(node)
    }

    /// Parse what follows an unspaced `::`.
    fn parse_scope_resolution(&mut self, scope: NodeId, start: Position) -> Result<NodeId, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            // `Foo::Bar`, unless called like a method: `Foo::Bar(1)`
            TokenKind::Constant if !(self.peek_at(1).kind == TokenKind::LParen && !self.peek_at(1).flags.spaced) => {
                self.advance();
                let node = self.finish(NodeKind::ScopedConstant, start, vec![scope]);
                self.node_mut(node).text = Some(token.text);
                Ok(node)
            }
            TokenKind::Constant | TokenKind::Identifier => self.parse_method_call(scope, start),
            _ => Err(self.unexpected("constant or method name")),
        }
    }

    /// Parse `[args]` after a receiver.
    fn parse_index(&mut self, receiver: NodeId, start: Position) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let items = self.allowing_do(|parser| parser.parse_list_items(&opener, TokenKind::RBracket, Self::parse_argument))?;
        let arguments = self.finish(NodeKind::Arguments, opener.span.start, items);
        Ok(self.finish(NodeKind::Index, start, vec![receiver, arguments]))
    }

    /// Calls (and `super`) take a block unless they already have one.
    fn accepts_block(&self, expr: NodeId) -> bool {
        let node = self.node(expr);
        matches!(node.kind, NodeKind::Call | NodeKind::Super)
            && node.children.last().map_or(true, |last| self.kind_of(*last) != NodeKind::Block)
    }

    /// Append a block to a call and stretch the call's span over it.
    fn attach_block(&mut self, call: NodeId, block: NodeId) {
        let end = self.node(block).span.end;
        let node = self.node_mut(call);
        node.children.push(block);
        node.span.end = end;
    }

    /// `each |x|` followed by a line break: block parameters with no `do`.
    fn at_block_parameters_without_opener(&self) -> bool {
        let mut offset = 1;
        loop {
            match self.peek_at(offset).kind {
                TokenKind::Identifier | TokenKind::Comma | TokenKind::Star | TokenKind::Amp => offset += 1,
                TokenKind::Pipe => break,
                _ => return false,
            }
        }
        if offset == 1 {
            return false;
        }

        let closing = self.peek_at(offset);
        let after = self.peek_at(offset + 1);
        matches!(after.kind, TokenKind::Newline | TokenKind::Eof)
            || after.span.start.line > closing.span.end.line
    }
}

// =============================================================================
// TESTS
// =============================================================================
