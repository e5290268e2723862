//! # Collection Parsing
//!
//! Parses array and hash literals, and the comma-separated item lists
//! shared with call arguments and index access.
//!
//! ## Responsibilities
//!
//! - Array literals: `[1, 2, 3]`, `[*a, b]`
//! - Hash literals: `{a: 1, "b" => 2, **rest}`
//! - Lists cut short by a line break or the end of input
//!
//! ## Example
//!
//! ```rust,ignore
//! let array = parser.parse_array()?;
//! ```

use super::Parser;
use crate::cst::{NodeId, NodeKind};
use crate::error::ParseError;
use crate::lexer::{Token, TokenKind};

impl<'a> Parser<'a> {
    /// Parse items up to and including `closer`.
    ///
    /// A line break after an item that is followed by neither `,` nor the
    /// closer ends the list: the opener is reported once as unclosed and
    /// the items read so far are kept, so the next line parses normally.
    ///
    /// ## Parameters
    ///
    /// - `opener`: The opening bracket, for error positions
    /// - `closer`: The matching closing token
    /// - `item`: Parses one item
    ///
    /// ## Example
    ///
    /// ```text
    /// [1, 2, 3,]      // trailing comma
    /// [1,
    ///  2]             // items across lines
    /// [1, 2, 3        // unclosed, closed at the line break
    /// ```
    pub(super) fn parse_list_items(
        &mut self,
        opener: &Token,
        closer: TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<NodeId, ParseError>,
    ) -> Result<Vec<NodeId>, ParseError> {
        let mut items = Vec::new();

        loop {
            self.skip_newlines();
            if self.match_token(closer) {
                return Ok(items);
            }
            if self.is_at_end() {
                return Err(self.unclosed(opener, closer, true));
            }

            items.push(item(self)?);

            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                kind if kind == closer => {}
                TokenKind::Newline => match self.kind_after_newlines() {
                    kind if kind == closer => {}
                    TokenKind::Comma => {
                        self.skip_newlines();
                        self.advance();
                    }
                    TokenKind::Eof => return Err(self.unclosed(opener, closer, true)),
                    _ => {
                        let error = self.unclosed(opener, closer, false);
                        self.report(error);
                        return Ok(items);
                    }
                },
                TokenKind::Eof => return Err(self.unclosed(opener, closer, true)),
                _ => return Err(self.unexpected(&format!("`,` or `{}`", closer.display()))),
            }
        }
    }

    /// Parse `[items]`.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// array = "[" (argument ("," argument)* ","?)? "]"
    /// ```
    pub(super) fn parse_array(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let items =
            self.allowing_do(|parser| parser.parse_list_items(&opener, TokenKind::RBracket, Self::parse_argument))?;
        Ok(self.finish(NodeKind::Array, opener.span.start, items))
    }

    /// Parse `{pairs}`.
    ///
    /// ## Grammar
    ///
    /// ```text
    /// hash      = "{" (hash_item ("," hash_item)* ","?)? "}"
    /// hash_item = LABEL expression? | "**" expression | expression "=>" expression
    /// ```
    pub(super) fn parse_hash(&mut self) -> Result<NodeId, ParseError> {
        let opener = self.advance().clone();
        let items =
            self.allowing_do(|parser| parser.parse_list_items(&opener, TokenKind::RBrace, Self::parse_hash_item))?;
        Ok(self.finish(NodeKind::Hash, opener.span.start, items))
    }

    fn parse_hash_item(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current_position();
        match self.peek_kind() {
            TokenKind::Label => self.parse_label_pair(),
            TokenKind::Pow => {
                self.advance();
                let value = self.parse_ternary()?;
                Ok(self.finish(NodeKind::DoubleSplat, start, vec![value]))
            }
            _ => {
                let key = self.parse_expression()?;
                self.expect(TokenKind::FatArrow)?;
                self.skip_newlines();
                let value = self.parse_expression()?;
                Ok(self.finish(NodeKind::Pair, start, vec![key, value]))
            }
        }
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
    fn test_array_items() {
        let cst = parse_ok("x = [1, [2, 3], *rest,]");
        let array = find(&cst, NodeKind::Array);
        let kinds: Vec<NodeKind> = cst.children(array).iter().map(|id| cst.kind(*id)).collect();
        assert_eq!(kinds, vec![NodeKind::Integer, NodeKind::Array, NodeKind::Splat]);
    }

    #[test]
    fn test_multiline_array() {
        let cst = parse_ok("x = [\n  1,\n  2\n]\ny = [1\n, 2]");
        assert_eq!(top_kinds(&cst), vec![NodeKind::Assignment, NodeKind::Assignment]);
    }

    #[test]
    fn test_array_closed_by_line_break() {
        let cst = parse("array = [1, 2, 3\n\nputs array");
        assert_eq!(cst.errors.len(), 1);
        let error = &cst.errors[0];
        assert_eq!(
            error.kind,
            ParseErrorKind::Unclosed { opener: "[".into(), expected: "]".into(), at_eof: false }
        );
        assert_eq!((error.span.start.line, error.span.start.column), (0, 8));
        assert_eq!(top_kinds(&cst), vec![NodeKind::Assignment, NodeKind::Call]);
    }

    #[test]
    fn test_array_unclosed_at_eof() {
        let cst = parse("x = [1, 2");
        assert_eq!(cst.errors.len(), 1);
        assert!(matches!(cst.errors[0].kind, ParseErrorKind::Unclosed { at_eof: true, .. }));
    }

    #[test]
    fn test_missing_comma_is_reported() {
        let cst = parse("x = [1 2]\ny = 1");
        assert_eq!(cst.errors.len(), 1);
        assert!(cst.errors[0].to_string().contains("expected `,` or `]`"));
        assert_eq!(top_kinds(&cst), vec![NodeKind::Error, NodeKind::Assignment]);
    }

    #[test]
    fn test_hash_items() {
        let cst = parse_ok("h = {a: 1, \"b\" => 2, **rest}\nempty = {}");
        let hash = find(&cst, NodeKind::Hash);
        let kinds: Vec<NodeKind> = cst.children(hash).iter().map(|id| cst.kind(*id)).collect();
        assert_eq!(kinds, vec![NodeKind::Pair, NodeKind::Pair, NodeKind::DoubleSplat]);
    }

    #[test]
    fn test_multiline_hash() {
        let cst = parse_ok("config = {\n  name: \"x\",\n  size: 2\n}");
        let hash = find(&cst, NodeKind::Hash);
        assert_eq!(cst.children(hash).len(), 2);
    }
}
