//! # Primary Expression Parsing
//!
//! Parses primary expressions: literals, variables, parenthesized
//! expressions, and dispatches to the keyword constructs.
//!
//! ## Responsibilities
//!
//! - Number literals: `42`, `0x1f`, `3.14`
//! - Strings, regexps and heredocs, with interpolation
//! - Symbols and character literals: `:name`, `?a`
//! - Variables: `x`, `@x`, `@@x`, `$x`, `Const`, `::Const`
//! - Parenthesized expressions: `(1 + 2)`
//! - Keyword constructs: `def`, `if`, `case`, `begin`, ...
//!
//! ## Example
//!
//! ```rust,ignore
//! let expr = parser.parse_primary()?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parse primary expression.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// primary = literal | string | variable | call | array | hash
    ///         | "(" statements ")" | "::" CONSTANT | lambda | keyword_construct
    /// ```
    pub(super) fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let token = self.peek().clone();
        let start = self.current_position();

        match token.kind {
            // Literals
            TokenKind::Integer | TokenKind::LegacyOctalInteger => {
                self.advance();
                Ok(self.leaf(NodeKind::Integer, token.text))
            }
            TokenKind::Float => {
                self.advance();
                Ok(self.leaf(NodeKind::Float, token.text))
            }
            TokenKind::Character => {
                self.advance();
                Ok(self.leaf(NodeKind::Character, token.text))
            }
            TokenKind::PercentLiteral => {
                self.advance();
                let kind = if token.text.starts_with("%q") { NodeKind::String } else { NodeKind::Words };
                Ok(self.leaf(kind, token.text))
            }
            TokenKind::StringBegin => self.parse_string(NodeKind::String),
            TokenKind::RegexBegin => self.parse_string(NodeKind::Regex),
            TokenKind::Symbol => {
                self.advance();
                Ok(self.leaf(NodeKind::Symbol, symbol_name(&token.text)))
            }

            // Variables and calls
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Constant => self.parse_constant(),
            TokenKind::InstanceVariable => {
                self.advance();
                Ok(self.leaf(NodeKind::InstanceVariable, token.text))
            }
            TokenKind::ClassVariable => {
                self.advance();
                Ok(self.leaf(NodeKind::ClassVariable, token.text))
            }
            TokenKind::GlobalVariable => {
                self.advance();
                Ok(self.leaf(NodeKind::GlobalVariable, token.text))
            }
            TokenKind::ColonColon => {
                self.advance();
                let name = self.expect(TokenKind::Constant)?.text.clone();
                let node = self.finish(NodeKind::ScopedConstant, start, Vec::new());
                self.node_mut(node).text = Some(name);
                Ok(node)
            }

            // Keyword values
            TokenKind::Nil => {
                self.advance();
                Ok(self.leaf(NodeKind::Nil, "nil"))
            }
            TokenKind::True => {
                self.advance();
                Ok(self.leaf(NodeKind::True, "true"))
            }
            TokenKind::False => {
                self.advance();
                Ok(self.leaf(NodeKind::False, "false"))
            }
            TokenKind::SelfKw => {
                self.advance();
                Ok(self.leaf(NodeKind::SelfNode, "self"))
            }

            // Brackets
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_hash(),
            TokenKind::LParen => self.parse_paren(),
            TokenKind::Arrow => self.parse_lambda(),

            // Definitions
            TokenKind::Def => self.parse_method_def(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Module => self.parse_module(),
            TokenKind::Alias => self.parse_alias(),
            TokenKind::Undef => self.parse_undef(),
            TokenKind::BeginUpper => self.parse_hook_block(NodeKind::BeginBlock),
            TokenKind::EndUpper => self.parse_hook_block(NodeKind::EndBlock),

            // Control flow
            TokenKind::If => self.parse_if(),
            TokenKind::Unless => self.parse_unless(),
            TokenKind::While => self.parse_loop(NodeKind::While),
            TokenKind::Until => self.parse_loop(NodeKind::Until),
            TokenKind::For => self.parse_for(),
            TokenKind::Case => self.parse_case(),
            TokenKind::Begin => self.parse_begin(),
            TokenKind::Return => self.parse_jump(NodeKind::Return),
            TokenKind::Break => self.parse_jump(NodeKind::Break),
            TokenKind::Next => self.parse_jump(NodeKind::Next),
            TokenKind::Redo => {
                self.advance();
                Ok(self.leaf(NodeKind::Redo, "redo"))
            }
            TokenKind::Retry => {
                self.advance();
                Ok(self.leaf(NodeKind::Retry, "retry"))
            }
            TokenKind::Yield => self.parse_yield(),
            TokenKind::Super => self.parse_super(),
            TokenKind::Defined => self.parse_defined(),
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_expression()?;
                Ok(self.finish(NodeKind::Not, start, vec![operand]))
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse a string or regexp from its begin token to its end token.
    ///
    /// Without interpolation the node's text is the literal content, so
    /// `when "a"` clauses can be compared.
    fn parse_string(&mut self, kind: NodeKind) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        self.advance();
        let mut parts = Vec::new();
        let mut content = String::new();

        loop {
            match self.peek_kind() {
                TokenKind::StringContent => content.push_str(&self.advance().text),
                TokenKind::InterpolationBegin => {
                    let interpolation_start = self.current_position();
                    self.advance();
                    let body = self.allowing_do(|parser| parser.parse_statement_list(&[TokenKind::InterpolationEnd]));
                    self.expect(TokenKind::InterpolationEnd)?;
                    parts.push(self.finish(NodeKind::Interpolation, interpolation_start, vec![body]));
                }
                TokenKind::StringEnd => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("end of string")),
            }
        }

        let interpolated = !parts.is_empty();
        let node = self.finish(kind, start, parts);
        if !interpolated {
            self.node_mut(node).text = Some(content);
        }
        Ok(node)
    }

    /// Parse `Const`, or `Const(args)` which calls a method named like a constant.
    fn parse_constant(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        let name = self.advance().text.clone();

        if self.check(TokenKind::LParen) && !self.peek().flags.spaced {
            let arguments = self.parse_paren_arguments()?;
            let node = self.finish(NodeKind::Call, start, vec![arguments]);
            self.node_mut(node).text = Some(name);
            return Ok(node);
        }
        Ok(self.leaf(NodeKind::Constant, name))
    }

    /// Parse `( statements )`.
    fn parse_paren(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let start = opener.span.start;
        let body = self.allowing_do(|parser| parser.parse_statement_list(&[TokenKind::RParen]));
        if self.is_at_end() {
            return Err(self.unclosed(&opener, TokenKind::RParen, true));
        }
        self.expect(TokenKind::RParen)?;
        Ok(self.finish(NodeKind::Paren, start, vec![body]))
    }

    /// Whether the current token can begin an operand.
    ///
    /// Used where an operand is optional: `return`, `break`, endless ranges.
    /// Modifier keywords never start one, so `return if done` stays a modifier.
    pub(super) fn starts_value(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Integer
                | TokenKind::LegacyOctalInteger
                | TokenKind::Float
                | TokenKind::StringBegin
                | TokenKind::Symbol
                | TokenKind::RegexBegin
                | TokenKind::Character
                | TokenKind::PercentLiteral
                | TokenKind::Identifier
                | TokenKind::Constant
                | TokenKind::InstanceVariable
                | TokenKind::ClassVariable
                | TokenKind::GlobalVariable
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::ColonColon
                | TokenKind::Arrow
                | TokenKind::Bang
                | TokenKind::Minus
                | TokenKind::Tilde
                | TokenKind::Star
                | TokenKind::Nil
                | TokenKind::True
                | TokenKind::False
                | TokenKind::SelfKw
                | TokenKind::Not
                | TokenKind::Defined
                | TokenKind::Def
                | TokenKind::Case
                | TokenKind::Begin
                | TokenKind::Yield
                | TokenKind::Super
        )
    }
}

/// Symbol name without the leading colon or quotes.
pub(super) fn symbol_name(text: &str) -> String {
    if let Some(rest) = text.strip_prefix("%s") {
        return rest.get(1..rest.len().saturating_sub(1)).unwrap_or("").to_string();
    }
    let name = text.strip_prefix(':').unwrap_or(text);
    name.strip_prefix(['"', '\''])
        .and_then(|quoted| quoted.strip_suffix(['"', '\'']))
        .unwrap_or(name)
        .to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use crate::parser::tests::{find, parse, parse_ok, top_kinds};

    #[test]
    fn test_literals() {
        let cst = parse_ok("1\n2.5\n?a\n:sym\nnil\ntrue\nfalse\nself\n%w[a b]");
        assert_eq!(
            top_kinds(&cst),
            vec![
                NodeKind::Integer,
                NodeKind::Float,
                NodeKind::Character,
                NodeKind::Symbol,
                NodeKind::Nil,
                NodeKind::True,
                NodeKind::False,
                NodeKind::SelfNode,
                NodeKind::Words,
            ]
        );
    }

    #[test]
    fn test_symbol_text_drops_colon_and_quotes() {
        assert_eq!(symbol_name(":name"), "name");
        assert_eq!(symbol_name(":\"two words\""), "two words");
        assert_eq!(symbol_name("%s(x)"), "x");
        assert_eq!(symbol_name(":+"), "+");
    }

    #[test]
    fn test_plain_string_keeps_content() {
        let cst = parse_ok("\"hello\"");
        let string = find(&cst, NodeKind::String);
        assert_eq!(cst.text(string), "hello");
    }

    #[test]
    fn test_interpolation_is_parsed_as_code() {
        let cst = parse_ok("name = 1\n\"hi #{name}!\"");
        let string = find(&cst, NodeKind::String);
        assert_eq!(cst.node(string).text, None);
        let interpolation = find(&cst, NodeKind::Interpolation);
        let body = cst.children(interpolation)[0];
        assert_eq!(cst.kind(cst.children(body)[0]), NodeKind::LocalVariable);
    }

    #[test]
    fn test_regex_literal() {
        let cst = parse_ok("r = /a+b/i");
        let regex = find(&cst, NodeKind::Regex);
        assert_eq!(cst.text(regex), "a+b");
    }

    #[test]
    fn test_heredoc_is_a_string() {
        let cst = parse_ok("text = <<~EOS\n  body\nEOS\nputs text");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Assignment, NodeKind::Call]);
        find(&cst, NodeKind::String);
    }

    #[test]
    fn test_variables_and_constants() {
        let cst = parse_ok("@a\n@@b\n$c\nFoo\n::Bar\nFoo::Baz");
        assert_eq!(
            top_kinds(&cst),
            vec![
                NodeKind::InstanceVariable,
                NodeKind::ClassVariable,
                NodeKind::GlobalVariable,
                NodeKind::Constant,
                NodeKind::ScopedConstant,
                NodeKind::ScopedConstant,
            ]
        );
    }

    #[test]
    fn test_constant_with_parens_is_a_call() {
        let cst = parse_ok("Integer(\"3\")");
        let call = find(&cst, NodeKind::Call);
        assert_eq!(cst.text(call), "Integer");
    }

    #[test]
    fn test_parenthesized_statements() {
        let cst = parse_ok("x = (a = 1; a + 1)");
        find(&cst, NodeKind::Paren);
    }

    #[test]
    fn test_unclosed_paren_at_eof() {
        let cst = parse("x = (1 + 2");
        assert_eq!(cst.errors.len(), 1);
        assert!(matches!(cst.errors[0].kind, ParseErrorKind::Unclosed { at_eof: true, .. }));
    }

    #[test]
    fn test_unexpected_token_in_expression_position() {
        let cst = parse("x = ,");
        assert_eq!(cst.errors.len(), 1);
        assert!(cst.errors[0].to_string().contains("expected expression"));
    }
}
