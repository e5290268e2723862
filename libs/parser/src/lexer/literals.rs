//! # Literal Scanning
//!
//! Numbers, variables, symbols, character literals, percent literals, and
//! heredocs. String bodies themselves are scanned by the mode machinery in
//! the parent module.

use super::{is_ident_char, is_ident_start, ExprState, Lexer, LiteralKind, Opening, TokenKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::span::{Position, Span};

/// Operator names usable as symbols (`:+`, `:[]=`, `:<=>`), longest first.
const SYMBOL_OPERATORS: &[&str] = &[
    "[]=", "<=>", "===", "[]", "==", "=~", "!~", "!=", "<<", ">>", "<=", ">=", "**", "+@", "-@",
    "+", "-", "*", "/", "%", "<", ">", "!", "&", "|", "^", "~",
];

/// Parsed `<<~ID` opener.
struct HeredocOpener {
    terminator: String,
    indented: bool,
    interpolate: bool,
    len: usize,
}

impl<'a> Lexer<'a> {
    // =========================================================================
    // NUMBERS
    // =========================================================================

    /// Scan an integer or float literal.
    ///
    /// A leading zero followed by more digits is a legacy octal literal;
    /// `8` or `9` among its digits makes it invalid.
    pub(super) fn scan_number(&mut self, start: Position, spaced: bool) {
        let first = self.cursor.advance();
        let mut kind = TokenKind::Integer;
        let mut invalid = false;
        let mut prefixed = false;

        if first == Some('0') {
            match self.cursor.peek() {
                Some('x' | 'X') => {
                    prefixed = true;
                    self.cursor.advance();
                    invalid = self.cursor.advance_while(|c| c.is_ascii_hexdigit() || c == '_').is_empty();
                }
                Some('b' | 'B') => {
                    prefixed = true;
                    self.cursor.advance();
                    invalid = self.cursor.advance_while(|c| c == '0' || c == '1' || c == '_').is_empty();
                }
                Some('o' | 'O') => {
                    prefixed = true;
                    self.cursor.advance();
                    let digits = self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
                    invalid = digits.is_empty() || digits.contains(['8', '9']);
                }
                Some('d' | 'D') => {
                    prefixed = true;
                    self.cursor.advance();
                    invalid = self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_').is_empty();
                }
                Some(c) if c.is_ascii_digit() || c == '_' => {
                    prefixed = true;
                    let digits = self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
                    if digits.contains(['8', '9']) {
                        invalid = true;
                    } else {
                        kind = TokenKind::LegacyOctalInteger;
                    }
                }
                _ => {}
            }
        }

        if !prefixed {
            self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
            if self.cursor.peek() == Some('.') && self.cursor.peek_next().map_or(false, |c| c.is_ascii_digit()) {
                self.cursor.advance();
                self.cursor.advance_while(|c| c.is_ascii_digit() || c == '_');
                kind = TokenKind::Float;
            }
            if matches!(self.cursor.peek(), Some('e' | 'E')) {
                let exponent = match self.cursor.peek_next() {
                    Some(c) if c.is_ascii_digit() => true,
                    Some('+' | '-') => self.cursor.peek_nth(2).map_or(false, |c| c.is_ascii_digit()),
                    _ => false,
                };
                if exponent {
                    self.cursor.advance();
                    self.cursor.eat('+');
                    self.cursor.eat('-');
                    self.cursor.advance_while(|c| c.is_ascii_digit());
                    kind = TokenKind::Float;
                }
            }
        }

        // Rational and imaginary suffixes
        if matches!(self.cursor.peek(), Some('r' | 'i')) && !self.cursor.peek_next().map_or(false, is_ident_char) {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(start.byte);
        if invalid || text.contains("__") || text.ends_with('_') {
            let span = Span::new(start, self.cursor.position());
            self.errors.push(ParseError::new(
                ParseErrorKind::InvalidNumber { text: text.to_string() },
                span,
            ));
        }

        self.push(kind, start, spaced);
        self.state = ExprState::End;
    }

    // =========================================================================
    // VARIABLES
    // =========================================================================

    /// Scan `@ivar` or `@@cvar`.
    pub(super) fn scan_instance_variable(&mut self, start: Position, spaced: bool) {
        self.cursor.advance();
        let kind = if self.cursor.eat('@') { TokenKind::ClassVariable } else { TokenKind::InstanceVariable };
        if !self.cursor.peek().map_or(false, is_ident_start) {
            let span = Span::new(start, self.cursor.position());
            self.errors.push(ParseError::new(ParseErrorKind::UnexpectedCharacter { ch: '@' }, span));
            return;
        }
        self.cursor.advance_while(is_ident_char);
        self.push(kind, start, spaced);
        self.state = ExprState::End;
    }

    /// Scan `$global`, `$1`, `$!` and friends.
    pub(super) fn scan_global_variable(&mut self, start: Position, spaced: bool) {
        self.cursor.advance();
        match self.cursor.peek() {
            Some(c) if is_ident_start(c) => {
                self.cursor.advance_while(is_ident_char);
            }
            Some(c) if c.is_ascii_digit() => {
                self.cursor.advance_while(|c| c.is_ascii_digit());
            }
            Some('-') => {
                self.cursor.advance();
                if self.cursor.peek().map_or(false, is_ident_char) {
                    self.cursor.advance();
                }
            }
            Some(c) if "!@&`'+~=/\\,;.<>*$?:\"0".contains(c) => {
                self.cursor.advance();
            }
            _ => {
                let span = Span::new(start, self.cursor.position());
                self.errors.push(ParseError::new(ParseErrorKind::UnexpectedCharacter { ch: '$' }, span));
                return;
            }
        }
        self.push(TokenKind::GlobalVariable, start, spaced);
        self.state = ExprState::End;
    }

    // =========================================================================
    // SYMBOLS AND CHARACTERS
    // =========================================================================

    /// Scan `:name`, `:"quoted"`, `:@ivar`, or `:+`.
    ///
    /// ## Returns
    ///
    /// `false` (consuming nothing) when the colon does not start a symbol.
    pub(super) fn scan_symbol(&mut self, start: Position, spaced: bool) -> bool {
        let Some(next) = self.cursor.peek_next() else {
            return false;
        };

        if is_ident_start(next) {
            self.cursor.advance();
            self.cursor.advance_while(is_ident_char);
            match (self.cursor.peek(), self.cursor.peek_next()) {
                (Some('?' | '!'), after) if after != Some('=') => {
                    self.cursor.advance();
                }
                (Some('='), after) if !matches!(after, Some('=' | '~' | '>')) => {
                    self.cursor.advance();
                }
                _ => {}
            }
        } else if next == '@' || next == '$' {
            let sigils = if self.cursor.starts_with(":@@") { 3 } else { 2 };
            if !self.cursor.peek_nth(sigils).map_or(false, is_ident_start) {
                return false;
            }
            self.cursor.advance_to(start.byte + sigils);
            self.cursor.advance_while(is_ident_char);
        } else if next == '"' || next == '\'' {
            self.cursor.advance();
            self.cursor.advance();
            loop {
                match self.cursor.peek() {
                    None => {
                        let span = Span::new(start, self.cursor.position());
                        self.errors.push(ParseError::new(ParseErrorKind::UnterminatedString, span));
                        break;
                    }
                    Some('\\') => {
                        self.cursor.advance();
                        self.cursor.advance();
                    }
                    Some(c) if c == next => {
                        self.cursor.advance();
                        break;
                    }
                    Some(_) => {
                        self.cursor.advance();
                    }
                }
            }
        } else {
            let rest = self.cursor.rest().get(1..).unwrap_or("");
            let Some(op) = SYMBOL_OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
                return false;
            };
            self.cursor.advance_to(start.byte + 1 + op.len());
        }

        // `alias :new :old` takes a second method name.
        let aliasing = self.tokens.last().is_some_and(|token| token.kind == TokenKind::Alias);
        self.push(TokenKind::Symbol, start, spaced);
        self.state = if aliasing { ExprState::Fname } else { ExprState::End };
        true
    }

    /// Scan a character literal such as `?a` or `?\n`.
    pub(super) fn scan_character(&mut self, start: Position, spaced: bool) -> bool {
        let Some(next) = self.cursor.peek_next() else {
            return false;
        };
        if next.is_whitespace() {
            return false;
        }
        if next == '\\' {
            self.cursor.advance();
            self.cursor.advance();
            self.cursor.advance();
        } else {
            if self.cursor.peek_nth(2).map_or(false, is_ident_char) {
                return false;
            }
            self.cursor.advance();
            self.cursor.advance();
        }
        self.push(TokenKind::Character, start, spaced);
        self.state = ExprState::End;
        true
    }

    // =========================================================================
    // PERCENT LITERALS
    // =========================================================================

    /// Scan `%w[...]`, `%i(...)`, `%q{...}`, `%Q(...)`, `%r{...}`, `%(...)`.
    ///
    /// Interpolating forms open a string mode; the others are one token.
    pub(super) fn scan_percent(&mut self, start: Position, spaced: bool) -> bool {
        let (letter, delimiter) = match self.cursor.peek_next() {
            Some(c) if c.is_ascii_alphabetic() => (Some(c), self.cursor.peek_nth(2)),
            other => (None, other),
        };
        let Some(delimiter) = delimiter else {
            return false;
        };
        if delimiter.is_alphanumeric() || delimiter.is_whitespace() || delimiter == '=' {
            return false;
        }
        if letter.map_or(false, |l| !"qQwWiIrsx".contains(l)) {
            return false;
        }

        let close = match delimiter {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        };
        let open = (close != delimiter).then_some(delimiter);
        let width = if letter.is_some() { 3 } else { 2 };

        match letter {
            Some('q' | 'w' | 'i' | 's') => {
                let kind = if letter == Some('s') { TokenKind::Symbol } else { TokenKind::PercentLiteral };
                self.scan_verbatim_percent(start, spaced, width, (open, close), kind);
            }
            _ => {
                let kind = if letter == Some('r') { LiteralKind::Regex } else { LiteralKind::String };
                let opening = Opening {
                    kind,
                    open,
                    close,
                    interpolate: true,
                    single_line: false,
                    width,
                    ambiguous: false,
                };
                self.begin_literal(start, spaced, opening);
            }
        }
        true
    }

    fn scan_verbatim_percent(
        &mut self,
        start: Position,
        spaced: bool,
        width: usize,
        (open, close): (Option<char>, char),
        kind: TokenKind,
    ) {
        for _ in 0..width {
            self.cursor.advance();
        }
        let opener = Span::new(start, self.cursor.position());
        let mut nesting = 0usize;
        loop {
            match self.cursor.peek() {
                None => {
                    self.errors.push(ParseError::new(ParseErrorKind::UnterminatedString, opener));
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(c) if c == close && nesting == 0 => {
                    self.cursor.advance();
                    break;
                }
                Some(c) if c == close => {
                    nesting -= 1;
                    self.cursor.advance();
                }
                Some(c) if Some(c) == open => {
                    nesting += 1;
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        self.push(kind, start, spaced);
        self.state = ExprState::End;
    }

    // =========================================================================
    // HEREDOCS
    // =========================================================================

    /// Scan a heredoc opener and its body.
    ///
    /// The body lives on the lines after the opener. Its tokens are lexed
    /// in place by a nested lexer and spliced in right after the opener so
    /// the parser sees an ordinary string; the rest of the opener's line is
    /// lexed afterwards, and the main cursor jumps past the body at the next
    /// line break.
    pub(super) fn scan_heredoc(&mut self, start: Position, spaced: bool) -> bool {
        let Some(opener) = self.heredoc_opener() else {
            return false;
        };

        self.cursor.advance_to(start.byte + opener.len);
        let opener_span = Span::new(start, self.cursor.position());
        self.push(TokenKind::StringBegin, start, spaced);

        let body = match self.heredoc_resume.clone() {
            Some(resume) => resume,
            None => {
                let mut line = self.cursor.clone();
                line.advance_while(|c| c != '\n');
                line.eat('\n');
                line
            }
        };

        let mut scan = body.clone();
        let mut terminator_line = None;
        while !scan.is_eof() {
            let line_start = scan.position().byte;
            let line = scan.advance_while(|c| c != '\n');
            scan.eat('\n');
            let candidate = line.trim_end_matches('\r');
            let candidate = if opener.indented { candidate.trim_start() } else { candidate };
            if candidate == opener.terminator {
                terminator_line = Some(line_start);
                break;
            }
        }

        let limit = match terminator_line {
            Some(limit) => limit,
            None => {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnterminatedHeredoc { terminator: opener.terminator.clone() },
                    opener_span,
                ));
                scan.position().byte
            }
        };

        let nested = Lexer::for_heredoc_body(
            self.source,
            body.position(),
            limit,
            opener.interpolate,
            opener_span,
            self.locals.clone(),
        );
        let (tokens, errors) = nested.tokenize();
        self.tokens.extend(tokens);
        self.errors.extend(errors);

        self.push_synthetic(TokenKind::StringEnd, opener_span.end);
        self.heredoc_resume = Some(scan);
        self.state = ExprState::End;
        true
    }

    fn heredoc_opener(&self) -> Option<HeredocOpener> {
        let after = self.cursor.rest().strip_prefix("<<")?;
        let (indented, after) = match after.strip_prefix(['~', '-']) {
            Some(rest) => (true, rest),
            None => (false, after),
        };
        let prefix = 2 + usize::from(indented);
        let first = after.chars().next()?;

        if matches!(first, '"' | '\'' | '`') {
            let quoted = &after[1..];
            let end = quoted.find(first)?;
            let terminator = &quoted[..end];
            if terminator.is_empty() || terminator.contains('\n') {
                return None;
            }
            return Some(HeredocOpener {
                terminator: terminator.to_string(),
                indented,
                interpolate: first != '\'',
                len: prefix + end + 2,
            });
        }

        if !is_ident_start(first) {
            return None;
        }
        // `foo <<bar` in argument position is a shift unless the name looks like a heredoc id.
        if !indented && self.state == ExprState::Arg && !(first.is_uppercase() || first == '_') {
            return None;
        }
        let terminator: String = after.chars().take_while(|c| is_ident_char(*c)).collect();
        Some(HeredocOpener {
            len: prefix + terminator.len(),
            terminator,
            indented,
            interpolate: true,
        })
    }
}
