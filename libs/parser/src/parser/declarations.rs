//! # Declaration Parsing
//!
//! Parses definitions: methods, classes, modules, and the statements that
//! name methods (`alias`, `undef`) or hook into program start and exit
//! (`BEGIN`, `END`).
//!
//! ## Responsibilities
//!
//! - Method definitions: `def name(params) ... end`, `def self.name`, `def name = expr`
//! - Parameter lists for methods, blocks and lambdas
//! - Class and module definitions: `class Foo < Bar`, `class << self`, `module Foo::Bar`
//! - `alias`, `undef`, `BEGIN { }`, `END { }`
//!
//! ## Example
//!
//! ```rust,ignore
//! let node = parser.parse_method_def()?;
//! ```

use super::primaries::symbol_name;
use super::Parser;
use crate::cst::{Node, NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

impl<'a> Parser<'a> {
    // =========================================================================
    // METHODS
    // =========================================================================

    /// Parse method definition.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// def        = "def" method_name params? (body | "=" statement)
    /// method_name = (("self" | IDENT) ".")? (IDENT | CONSTANT | operator)
    /// params     = "(" parameter_list ")" | parameter ("," parameter)*
    /// body       = statements rescue* else? ensure? "end"
    /// ```
    ///
    /// ## Example
    ///
    /// ```text
    /// def greet(name, greeting: "hello")
    ///   puts "#{greeting}, #{name}"
    /// end
    ///
    /// def self.build(*args, &block) = new(*args, &block)
    /// ```
    pub(super) fn parse_method_def(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let name = self.parse_method_name()?;

        // Method bodies never see the caller's locals.
        self.push_scope(true);
        let result = self.allowing_do(|parser| parser.parse_method_def_rest(&opener));
        self.pop_scope();

        let node = result?;
        self.node_mut(node).text = Some(name);
        Ok(node)
    }

    /// Name after `def`, with its singleton prefix: `self.name`, `obj.name`.
    fn parse_method_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        let singleton = matches!(
            self.peek_kind(),
            TokenKind::SelfKw | TokenKind::Identifier | TokenKind::Constant
        ) && self.peek_at(1).kind == TokenKind::Dot;
        if singleton {
            name.push_str(&self.advance().text);
            name.push('.');
            self.advance();
        }

        let token = self.peek();
        let valid = matches!(token.kind, TokenKind::Identifier | TokenKind::Constant)
            || token.kind.is_operator_method()
            || token.kind.is_keyword();
        if !valid {
            return Err(self.unexpected("method name"));
        }
        name.push_str(&token.text);
        self.advance();
        Ok(name)
    }

    fn parse_method_def_rest(&mut self, opener: &Token) -> Result<NodeId, ParseError> {
        let parameters_start = self.current_position();
        let mut parameters = Vec::new();
        if self.check(TokenKind::LParen) {
            let paren = self.advance().clone();
            parameters = self.parse_parameter_list(&paren)?;
        } else if !self.peek_kind().is_terminator() && !self.check(TokenKind::Eq) {
            // `def method_missing name, *args`
            loop {
                parameters.push(self.parse_parameter(false)?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        let mut children = vec![self.finish(NodeKind::Parameters, parameters_start, parameters)];

        if self.match_token(TokenKind::Eq) {
            // Endless definition: `def area = width * height`
            self.skip_newlines();
            let value = self.parse_statement()?;
            let span = self.node(value).span;
            children.push(self.add(Node::new(NodeKind::Statements, span).with_children(vec![value])));
        } else {
            children.extend(self.parse_body(opener)?);
        }

        Ok(self.finish(NodeKind::MethodDef, opener.span.start, children))
    }

    // =========================================================================
    // PARAMETERS
    // =========================================================================

    /// Parse a parenthesized parameter list after its `(`, consuming the `)`.
    ///
    /// Line breaks are allowed between parameters. A list left open before
    /// the body starts is reported at the `(` and closed there.
    pub(super) fn parse_parameter_list(&mut self, paren: &Token) -> Result<Vec<NodeId>, ParseError> {
        self.parse_list_items(paren, TokenKind::RParen, |parser| parser.parse_parameter(false))
    }

    /// Parse one parameter and declare its name.
    ///
    /// The node's text is the bare name: `rest` for `*rest`, `key` for
    /// `key:`. Anonymous `*`, `**` and `&` have empty text.
    ///
    /// ## Parameters
    ///
    /// - `in_block`: Inside `|...|`, where a default value cannot contain `|`
    ///
    /// ## Example
    ///
    /// ```text
    /// name
    /// count = 1
    /// key:
    /// key: :default
    /// *rest, **options, &block
    /// (first, second)
    /// ...
    /// ```
    pub(super) fn parse_parameter(&mut self, in_block: bool) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                self.declare(&token.text);
                let mut children = Vec::new();
                if self.match_token(TokenKind::Eq) {
                    children.push(self.parse_default_value(in_block)?);
                }
                let node = self.finish(NodeKind::Parameter, start, children);
                self.node_mut(node).text = Some(token.text);
                Ok(node)
            }
            TokenKind::Label => {
                self.advance();
                let name = token.text.trim_end_matches(':').to_string();
                self.declare(&name);
                let mut children = Vec::new();
                let required = matches!(
                    self.peek_kind(),
                    TokenKind::Comma | TokenKind::RParen | TokenKind::Pipe | TokenKind::Semicolon
                ) || self.peek_kind().is_terminator();
                if !required {
                    children.push(self.parse_default_value(in_block)?);
                }
                let node = self.finish(NodeKind::Parameter, start, children);
                self.node_mut(node).text = Some(name);
                Ok(node)
            }
            TokenKind::Star | TokenKind::Pow | TokenKind::Amp => {
                self.advance();
                let mut name = String::new();
                if self.check(TokenKind::Identifier) {
                    name = self.advance().text.clone();
                    self.declare(&name);
                }
                let node = self.finish(NodeKind::Parameter, start, Vec::new());
                self.node_mut(node).text = Some(name);
                Ok(node)
            }
            TokenKind::DotDotDot => {
                self.advance();
                Ok(self.leaf(NodeKind::Parameter, "..."))
            }
            // Destructuring: `|(key, value), index|`
            TokenKind::LParen => {
                let paren = self.advance().clone();
                let parameters = self.parse_parameter_list(&paren)?;
                Ok(self.finish(NodeKind::MultiTargets, start, parameters))
            }
            _ => Err(self.unexpected("parameter")),
        }
    }

    fn parse_default_value(&mut self, in_block: bool) -> Result<NodeId, ParseError> {
        if in_block {
            self.parse_unary()
        } else {
            self.parse_ternary()
        }
    }

    // =========================================================================
    // CLASSES AND MODULES
    // =========================================================================

    /// Parse class definition.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// class = "class" constant_path ("<" expression)? body
    ///       | "class" "<<" expression body
    /// ```
    ///
    /// ## Example
    ///
    /// ```text
    /// class Parser::Error < StandardError
    /// end
    ///
    /// class << self
    ///   def instance; end
    /// end
    /// ```
    pub(super) fn parse_class(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();

        if self.match_token(TokenKind::Shl) {
            let target = self.parse_expression()?;
            let body = self.parse_scoped_body(&opener)?;
            let mut children = vec![target];
            children.extend(body);
            return Ok(self.finish(NodeKind::SingletonClass, opener.span.start, children));
        }

        let name = self.parse_constant_path()?;
        let mut children = Vec::new();
        if self.match_token(TokenKind::Lt) {
            children.push(self.parse_expression()?);
        }
        children.extend(self.parse_scoped_body(&opener)?);

        let node = self.finish(NodeKind::ClassDef, opener.span.start, children);
        self.node_mut(node).text = Some(name);
        Ok(node)
    }

    /// Parse module definition: `module Name ... end`.
    pub(super) fn parse_module(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let name = self.parse_constant_path()?;
        let children = self.parse_scoped_body(&opener)?;
        let node = self.finish(NodeKind::ModuleDef, opener.span.start, children);
        self.node_mut(node).text = Some(name);
        Ok(node)
    }

    /// `Name`, `Outer::Name` or `::Name`, as written.
    fn parse_constant_path(&mut self) -> Result<String, ParseError> {
        let mut path = String::new();
        if self.match_token(TokenKind::ColonColon) {
            path.push_str("::");
        }
        path.push_str(&self.expect(TokenKind::Constant)?.text);
        while self.check(TokenKind::ColonColon) && !self.peek().flags.spaced {
            self.advance();
            path.push_str("::");
            path.push_str(&self.expect(TokenKind::Constant)?.text);
        }
        Ok(path)
    }

    /// Body of a class or module, in a fresh scope.
    fn parse_scoped_body(&mut self, opener: &Token) -> Result<Vec<NodeId>, ParseError> {
        self.push_scope(true);
        let result = self.allowing_do(|parser| parser.parse_body(opener));
        self.pop_scope();
        result
    }

    // =========================================================================
    // ALIAS, UNDEF, BEGIN/END
    // =========================================================================

    /// Parse `alias new_name old_name`.
    pub(super) fn parse_alias(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        self.advance();
        let new_name = self.parse_method_reference()?;
        let old_name = self.parse_method_reference()?;
        Ok(self.finish(NodeKind::Alias, start, vec![new_name, old_name]))
    }

    /// Parse `undef name, other`.
    pub(super) fn parse_undef(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        self.advance();
        let mut names = vec![self.parse_method_reference()?];
        while self.match_token(TokenKind::Comma) {
            names.push(self.parse_method_reference()?);
        }
        Ok(self.finish(NodeKind::Undef, start, names))
    }

    /// A method named by `alias` or `undef`: bare, as a symbol, or a global.
    fn parse_method_reference(&mut self) -> Result<NodeId, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::GlobalVariable => {
                self.advance();
                Ok(self.leaf(NodeKind::GlobalVariable, token.text))
            }
            TokenKind::Symbol => {
                self.advance();
                Ok(self.leaf(NodeKind::Symbol, symbol_name(&token.text)))
            }
            kind if matches!(kind, TokenKind::Identifier | TokenKind::Constant)
                || kind.is_operator_method()
                || kind.is_keyword() =>
            {
                self.advance();
                Ok(self.leaf(NodeKind::Symbol, token.text))
            }
            _ => Err(self.unexpected("method name")),
        }
    }

    /// Parse `BEGIN { ... }` or `END { ... }`.
    pub(super) fn parse_hook_block(&mut self, kind: NodeKind) -> Result<NodeId, ParseError> {
        let keyword = self.advance().clone();
        let opener = self.expect(TokenKind::LBrace)?.clone();
        self.push_scope(false);
        let body = self.allowing_do(|parser| parser.parse_statement_list(&[TokenKind::RBrace]));
        self.pop_scope();
        if self.is_at_end() {
            return Err(self.unclosed(&opener, TokenKind::RBrace, true));
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.finish(kind, keyword.span.start, vec![body]))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::cst::{Cst, NodeId, NodeKind};
    use crate::error::ParseErrorKind;
    use crate::parser::tests::{find, parse, parse_ok, top_kinds};

    fn parameter_names(cst: &Cst, definition: NodeId) -> Vec<String> {
        let parameters = cst.children(definition)[0];
        cst.children(parameters).iter().map(|id| cst.text(*id).to_string()).collect()
    }

    #[test]
    fn test_method_def_with_parameters() {
        let cst = parse_ok("def greet(name, count = 1, *rest, key:, opt: 2, **options, &block)\n  name\nend");
        let def = find(&cst, NodeKind::MethodDef);
        assert_eq!(cst.text(def), "greet");
        assert_eq!(
            parameter_names(&cst, def),
            vec!["name", "count", "rest", "key", "opt", "options", "block"]
        );
        // Parameters are locals inside the body.
        find(&cst, NodeKind::LocalVariable);
    }

    #[test]
    fn test_method_def_without_parens_and_singleton() {
        let cst = parse_ok("def self.build a, b\n  a + b\nend\ndef obj.size; 0; end");
        let names: Vec<&str> = cst.children(cst.root).iter().map(|id| cst.text(*id)).collect();
        assert_eq!(names, vec!["self.build", "obj.size"]);
    }

    #[test]
    fn test_operator_and_setter_methods() {
        let cst = parse_ok("def ==(other)\n  true\nend\ndef value=(v)\n  @value = v\nend\ndef [](i) = i");
        let names: Vec<&str> = cst.children(cst.root).iter().map(|id| cst.text(*id)).collect();
        assert_eq!(names, vec!["==", "value=", "[]"]);
    }

    #[test]
    fn test_endless_method() {
        let cst = parse_ok("def area = width * height");
        let def = find(&cst, NodeKind::MethodDef);
        let body = cst.children(def)[1];
        assert_eq!(cst.kind(body), NodeKind::Statements);
        assert_eq!(cst.kind(cst.children(body)[0]), NodeKind::Binary);
    }

    #[test]
    fn test_method_body_does_not_see_outer_locals() {
        let cst = parse_ok("x = 1\ndef f\n  x\nend");
        let def = find(&cst, NodeKind::MethodDef);
        let body = cst.children(def)[1];
        assert_eq!(cst.kind(cst.children(body)[0]), NodeKind::Call);
    }

    #[test]
    fn test_method_with_rescue() {
        let cst = parse_ok("def f\n  risky\nrescue => e\n  log e\nensure\n  close\nend");
        let def = find(&cst, NodeKind::MethodDef);
        let kinds: Vec<NodeKind> = cst.children(def).iter().map(|id| cst.kind(*id)).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Parameters, NodeKind::Statements, NodeKind::RescueClause, NodeKind::EnsureClause]
        );
    }

    #[test]
    fn test_unclosed_def_at_eof() {
        let cst = parse("def broken\n  puts 1\n");
        assert_eq!(cst.errors.len(), 1);
        assert_eq!(
            cst.errors[0].kind,
            ParseErrorKind::Unclosed { opener: "def".into(), expected: "end".into(), at_eof: true }
        );
    }

    #[test]
    fn test_parameter_list_closed_by_line_break() {
        let cst = parse("def f(a, b\n  a\nend\nputs 1\n");
        assert_eq!(cst.errors.len(), 1, "{:?}", cst.errors);
        let error = &cst.errors[0];
        assert_eq!(
            error.kind,
            ParseErrorKind::Unclosed { opener: "(".into(), expected: ")".into(), at_eof: false }
        );
        assert_eq!((error.span.start.line, error.span.start.column), (0, 5));
        assert_eq!(top_kinds(&cst), vec![NodeKind::MethodDef, NodeKind::Call]);
        let parameters = cst.children(find(&cst, NodeKind::MethodDef))[0];
        assert_eq!(cst.children(parameters).len(), 2);
    }

    #[test]
    fn test_class_and_module() {
        let cst = parse_ok("module Outer::Inner\n  class Thing < Base\n    def go; end\n  end\nend\nclass << self\nend");
        assert_eq!(top_kinds(&cst), vec![NodeKind::ModuleDef, NodeKind::SingletonClass]);
        let module = cst.children(cst.root)[0];
        assert_eq!(cst.text(module), "Outer::Inner");
        let class = find(&cst, NodeKind::ClassDef);
        assert_eq!(cst.text(class), "Thing");
        assert_eq!(cst.kind(cst.children(class)[0]), NodeKind::Constant);
    }

    #[test]
    fn test_block_parameters_with_defaults_and_destructuring() {
        let cst = parse_ok("pairs.each_with_index { |(key, value), i = 0| key }");
        let parameters = find(&cst, NodeKind::BlockParameters);
        let kinds: Vec<NodeKind> = cst.children(parameters).iter().map(|id| cst.kind(*id)).collect();
        assert_eq!(kinds, vec![NodeKind::MultiTargets, NodeKind::Parameter]);
        let block = find(&cst, NodeKind::Block);
        let body = *cst.children(block).last().expect("block body");
        assert_eq!(cst.kind(cst.children(body)[0]), NodeKind::LocalVariable);
    }

    #[test]
    fn test_alias_undef_and_hooks() {
        let cst = parse_ok("alias new_name old_name\nalias :a :b\nalias $NEW $OLD\nundef foo, :bar\nBEGIN { setup }\nEND { teardown }");
        assert_eq!(
            top_kinds(&cst),
            vec![
                NodeKind::Alias,
                NodeKind::Alias,
                NodeKind::Alias,
                NodeKind::Undef,
                NodeKind::BeginBlock,
                NodeKind::EndBlock,
            ]
        );
        let second = cst.children(cst.root)[1];
        assert_eq!(cst.text(cst.children(second)[0]), "a");
    }
}
