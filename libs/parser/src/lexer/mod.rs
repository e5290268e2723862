//! # Ruby Lexer
//!
//! Tokenizes Ruby source code into tokens.
//!
//! Ruby's lexical grammar depends on what came before: `/` starts a regexp
//! where an expression is expected and divides after a complete operand,
//! `foo [1]` passes an array while `foo[1]` indexes. The lexer tracks an
//! expression state to make those calls, and a mode stack so that string
//! interpolation (`"a #{b} c"`) can nest code inside strings inside code.
//!
//! Errors never stop the scan. An unterminated string rewinds to the most
//! recent string that spanned a line break (or to the failing string) and
//! re-lexes with that opener closed at the end of its own line, so one
//! stray quote does not swallow the rest of the file.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::lexer::{Lexer, TokenKind};
//!
//! let (tokens, errors) = Lexer::new("puts 10").tokenize();
//! assert!(errors.is_empty());
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! ```

mod cursor;
mod literals;
mod token;

pub use cursor::Cursor;
pub use token::{Token, TokenFlags, TokenKind};

use crate::error::{ParseError, ParseErrorKind};
use crate::span::{Position, Span};
use std::collections::HashSet;

// =============================================================================
// LEXER STATE
// =============================================================================

/// What the lexer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprState {
    /// Start of an expression: `/` is a regexp, newlines are insignificant.
    Beg,
    /// After a keyword like `return` that may take an argument on the same line.
    Mid,
    /// After a method name: a spaced operand may start a command argument.
    Arg,
    /// After a complete operand.
    End,
    /// After `def` or `.`: the next name is a method name, even if it is a keyword.
    Fname,
}

/// Flavor of an open literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    String,
    Regex,
    Heredoc,
}

impl LiteralKind {
    fn unterminated(self) -> ParseErrorKind {
        match self {
            Self::Regex => ParseErrorKind::UnterminatedRegex,
            Self::String | Self::Heredoc => ParseErrorKind::UnterminatedString,
        }
    }
}

/// An open string-like literal.
#[derive(Debug, Clone)]
struct StringMode {
    kind: LiteralKind,
    /// Nesting opener for bracketed percent literals, e.g. `(` in `%Q(...)`.
    open: Option<char>,
    /// Closing delimiter; `None` for heredoc bodies, which end at the cursor limit.
    close: Option<char>,
    interpolate: bool,
    opener: Span,
    single_line: bool,
    has_newline: bool,
    nesting: usize,
}

#[derive(Debug, Clone)]
enum Mode {
    Code { brace_depth: usize },
    Str(StringMode),
}

/// Everything needed to resume lexing at a string opener.
///
/// Only stack lengths are kept. Entries below `depth` in `open_strings`
/// and below the saved top of `modes` cannot change while this opener can
/// still be restored, so truncating back to the lengths is enough.
#[derive(Debug, Clone)]
struct Checkpoint<'a> {
    cursor: Cursor<'a>,
    tokens: usize,
    errors: usize,
    /// `modes.len()` at the opener.
    modes: usize,
    /// The top two modes at the opener; the only ones that may have been
    /// mutated since.
    top_modes: Vec<Mode>,
    /// `open_strings.len()` at the opener.
    depth: usize,
    heredoc_resume: Option<Cursor<'a>>,
    state: ExprState,
    spaced: bool,
    opener: usize,
    line: usize,
}

/// How a string-like literal opens.
struct Opening {
    kind: LiteralKind,
    open: Option<char>,
    close: char,
    interpolate: bool,
    single_line: bool,
    width: usize,
    ambiguous: bool,
}

const OPERATORS: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::OpAssign),
    ("<=>", TokenKind::Cmp),
    ("===", TokenKind::EqEqEq),
    ("...", TokenKind::DotDotDot),
    ("<<=", TokenKind::OpAssign),
    (">>=", TokenKind::OpAssign),
    ("&&=", TokenKind::OpAssign),
    ("||=", TokenKind::OpAssign),
    ("**", TokenKind::Pow),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("=~", TokenKind::Match),
    ("!~", TokenKind::NotMatch),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("::", TokenKind::ColonColon),
    ("&.", TokenKind::AmpDot),
    ("..", TokenKind::DotDot),
    ("->", TokenKind::Arrow),
    ("=>", TokenKind::FatArrow),
    ("+=", TokenKind::OpAssign),
    ("-=", TokenKind::OpAssign),
    ("*=", TokenKind::OpAssign),
    ("/=", TokenKind::OpAssign),
    ("%=", TokenKind::OpAssign),
    ("|=", TokenKind::OpAssign),
    ("&=", TokenKind::OpAssign),
    ("^=", TokenKind::OpAssign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("=", TokenKind::Eq),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("!", TokenKind::Bang),
    ("~", TokenKind::Tilde),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
];

/// Operator method names that only make sense right after `def`.
const DEF_OPERATOR_NAMES: &[&str] = &["[]=", "[]", "+@", "-@", "!@", "~@"];

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || !c.is_ascii()
}

// =============================================================================
// LEXER
// =============================================================================

/// Ruby lexer.
///
/// Converts source text into a stream of tokens plus lexical errors.
pub struct Lexer<'a> {
    /// Source text being lexed.
    source: &'a str,
    /// Character cursor.
    cursor: Cursor<'a>,
    /// Collected tokens.
    tokens: Vec<Token>,
    /// Collected lexical errors.
    errors: Vec<ParseError>,
    modes: Vec<Mode>,
    state: ExprState,
    space_seen: bool,
    in_def_name: bool,
    in_block_params: bool,
    /// `__END__` reached.
    finished: bool,
    /// Lexing the body of a heredoc: no EOF token, no rewinding.
    heredoc_body: bool,
    /// Names seen on the left of `=`, so `x /2` divides.
    locals: HashSet<String>,
    open_strings: Vec<Checkpoint<'a>>,
    last_multiline: Option<Checkpoint<'a>>,
    forced_single_line: HashSet<usize>,
    /// Where lexing continues after the current line when a heredoc body follows it.
    heredoc_resume: Option<Cursor<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for source text.
    pub fn new(source: &'a str) -> Self {
        Self::with_cursor(source, Cursor::new(source), vec![Mode::Code { brace_depth: 0 }])
    }

    fn with_cursor(source: &'a str, cursor: Cursor<'a>, modes: Vec<Mode>) -> Self {
        Self {
            source,
            cursor,
            tokens: Vec::new(),
            errors: Vec::new(),
            modes,
            state: ExprState::Beg,
            space_seen: false,
            in_def_name: false,
            in_block_params: false,
            finished: false,
            heredoc_body: false,
            locals: HashSet::new(),
            open_strings: Vec::new(),
            last_multiline: None,
            forced_single_line: HashSet::new(),
            heredoc_resume: None,
        }
    }

    /// Lexer for a heredoc body spanning `[start, limit)`.
    fn for_heredoc_body(
        source: &'a str,
        start: Position,
        limit: usize,
        interpolate: bool,
        opener: Span,
        locals: HashSet<String>,
    ) -> Self {
        let body = StringMode {
            kind: LiteralKind::Heredoc,
            open: None,
            close: None,
            interpolate,
            opener,
            single_line: false,
            has_newline: false,
            nesting: 0,
        };
        let modes = vec![Mode::Code { brace_depth: 0 }, Mode::Str(body)];
        let mut lexer = Self::with_cursor(source, Cursor::with_range(source, start, limit), modes);
        lexer.heredoc_body = true;
        lexer.locals = locals;
        lexer
    }

    /// Tokenize the entire source.
    ///
    /// ## Returns
    ///
    /// Tokens ending with a single EOF token, and every lexical error found.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use ruby_parser::lexer::{Lexer, TokenKind};
    ///
    /// let (tokens, _) = Lexer::new("x = 1").tokenize();
    /// assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    /// ```
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<ParseError>) {
        loop {
            if matches!(self.modes.last(), Some(Mode::Str(_))) {
                self.scan_string_segment();
                continue;
            }

            self.skip_trivia();
            if self.at_end() {
                if self.handle_eof() {
                    continue;
                }
                break;
            }
            self.scan_token();
        }

        if !self.heredoc_body {
            let eof = self.cursor.position();
            self.tokens
                .push(Token::new(TokenKind::Eof, Span::point(eof), String::new()).spaced(true));
            tracing::trace!(tokens = self.tokens.len(), errors = self.errors.len(), "tokenized");
        }

        (self.tokens, self.errors)
    }

    fn at_end(&self) -> bool {
        self.finished || self.cursor.is_eof()
    }

    // =========================================================================
    // TRIVIA
    // =========================================================================

    /// Skip whitespace, comments, and embedded documents, emitting
    /// significant newlines as it goes.
    fn skip_trivia(&mut self) {
        loop {
            if self.cursor.at_line_start() && self.modes.len() == 1 && !self.heredoc_body {
                if self.at_end_marker() {
                    self.finished = true;
                    return;
                }
                if self.at_embedded_doc() {
                    self.skip_embedded_doc();
                    continue;
                }
            }

            match self.cursor.peek() {
                Some(' ' | '\t' | '\r' | '\x0b' | '\x0c') => {
                    self.cursor.advance();
                    self.space_seen = true;
                }
                Some('\\') if self.cursor.peek_next() == Some('\n') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    self.space_seen = true;
                }
                Some('#') => {
                    self.cursor.advance_while(|c| c != '\n');
                    self.space_seen = true;
                }
                Some('\n') => self.scan_newline(),
                _ => return,
            }
        }
    }

    fn at_end_marker(&self) -> bool {
        match self.cursor.rest().strip_prefix("__END__") {
            Some(rest) => rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n"),
            None => false,
        }
    }

    fn at_embedded_doc(&self) -> bool {
        match self.cursor.rest().strip_prefix("=begin") {
            Some(rest) => rest.chars().next().map_or(true, char::is_whitespace),
            None => false,
        }
    }

    fn skip_embedded_doc(&mut self) {
        let start = self.cursor.position();
        loop {
            self.cursor.advance_while(|c| c != '\n');
            if !self.cursor.eat('\n') {
                let span = Span::new(start, self.cursor.position());
                self.errors.push(ParseError::new(ParseErrorKind::UnterminatedComment, span));
                return;
            }
            let rest = self.cursor.rest();
            if let Some(after) = rest.strip_prefix("=end") {
                if after.chars().next().map_or(true, char::is_whitespace) {
                    self.cursor.advance_while(|c| c != '\n');
                    return;
                }
            }
        }
    }

    fn scan_newline(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();

        let significant = matches!(self.state, ExprState::End | ExprState::Arg | ExprState::Mid)
            && !self.continues_on_next_line();
        if significant {
            self.push(TokenKind::Newline, start, false);
            self.state = ExprState::Beg;
        }

        self.space_seen = true;
        self.in_def_name = false;
        self.in_block_params = false;
        if let Some(resume) = self.heredoc_resume.take() {
            self.cursor = resume;
        }
    }

    /// A line starting with `.method` or `&.method` continues the previous one.
    fn continues_on_next_line(&self) -> bool {
        let mut rest = self
            .heredoc_resume
            .as_ref()
            .map_or_else(|| self.cursor.rest(), |resume| resume.rest());
        loop {
            let trimmed = rest.trim_start();
            if let Some(comment) = trimmed.strip_prefix('#') {
                match comment.find('\n') {
                    Some(index) => {
                        rest = &comment[index..];
                        continue;
                    }
                    None => return false,
                }
            }
            return (trimmed.starts_with('.') && !trimmed.starts_with("..")) || trimmed.starts_with("&.");
        }
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    /// Scan a single token in code mode.
    fn scan_token(&mut self) {
        let start = self.cursor.position();
        let spaced = std::mem::take(&mut self.space_seen);
        let c = match self.cursor.peek() {
            Some(c) => c,
            None => return,
        };

        if self.in_def_name {
            if let Some(name) = DEF_OPERATOR_NAMES.iter().find(|name| self.cursor.starts_with(name)) {
                self.cursor.advance_to(start.byte + name.len());
                self.push(TokenKind::Identifier, start, spaced);
                self.in_def_name = false;
                self.state = ExprState::Arg;
                return;
            }
        }

        match c {
            '0'..='9' => self.scan_number(start, spaced),
            '"' | '`' => self.begin_literal(start, spaced, Opening::quoted(c, true)),
            '\'' => self.begin_literal(start, spaced, Opening::quoted(c, false)),
            '@' => self.scan_instance_variable(start, spaced),
            '$' => self.scan_global_variable(start, spaced),
            ':' if !self.cursor.starts_with("::") && self.state != ExprState::End => {
                if !self.scan_symbol(start, spaced) {
                    self.scan_operator(start, spaced);
                }
            }
            '?' => {
                if !(self.value_expected(spaced) && self.scan_character(start, spaced)) {
                    self.scan_operator(start, spaced);
                }
            }
            '%' => {
                if !(self.value_expected(spaced) && self.scan_percent(start, spaced)) {
                    self.scan_operator(start, spaced);
                }
            }
            '/' if self.value_expected(spaced) => {
                let ambiguous = self.state == ExprState::Arg;
                let mut opening = Opening::quoted('/', true);
                opening.kind = LiteralKind::Regex;
                opening.single_line = true;
                opening.ambiguous = ambiguous;
                self.begin_literal(start, spaced, opening);
            }
            '<' => {
                if !(self.value_expected(spaced) && self.scan_heredoc(start, spaced)) {
                    self.scan_operator(start, spaced);
                }
            }
            '{' => {
                self.cursor.advance();
                if let Some(Mode::Code { brace_depth }) = self.modes.last_mut() {
                    *brace_depth += 1;
                }
                self.push(TokenKind::LBrace, start, spaced);
                self.state = ExprState::Beg;
            }
            '}' => self.scan_closing_brace(start, spaced),
            c if is_ident_start(c) => self.scan_identifier(start, spaced),
            _ => self.scan_operator(start, spaced),
        }
    }

    /// Whether a value (not an operator) may start here.
    ///
    /// In argument position a spaced token followed by a non-space
    /// character (`foo -1`, `p /x/`) starts an argument.
    fn value_expected(&self, spaced: bool) -> bool {
        match self.state {
            ExprState::Beg | ExprState::Mid => true,
            ExprState::Arg => {
                spaced && self.cursor.peek_next().map_or(false, |next| !next.is_whitespace() && next != '=')
            }
            ExprState::End | ExprState::Fname => false,
        }
    }

    fn scan_closing_brace(&mut self, start: Position, spaced: bool) {
        self.cursor.advance();
        let closes_interpolation =
            self.modes.len() > 1 && matches!(self.modes.last(), Some(Mode::Code { brace_depth: 0 }));
        if closes_interpolation {
            self.modes.pop();
            self.push(TokenKind::InterpolationEnd, start, spaced);
            return;
        }
        if let Some(Mode::Code { brace_depth }) = self.modes.last_mut() {
            *brace_depth = brace_depth.saturating_sub(1);
        }
        self.push(TokenKind::RBrace, start, spaced);
        self.state = ExprState::End;
    }

    fn scan_operator(&mut self, start: Position, spaced: bool) {
        let matched = OPERATORS.iter().find(|(text, _)| self.cursor.starts_with(text));
        let Some(&(text, kind)) = matched else {
            let ch = self.cursor.advance().unwrap_or('\0');
            let span = Span::new(start, self.cursor.position());
            self.errors.push(ParseError::new(ParseErrorKind::UnexpectedCharacter { ch }, span));
            return;
        };

        self.cursor.advance_to(start.byte + text.len());
        let previous = self.tokens.last().map(|token| token.kind);
        self.push(kind, start, spaced);

        if self.in_def_name && kind.is_operator_method() {
            self.in_def_name = false;
            self.state = ExprState::Arg;
            return;
        }

        if kind == TokenKind::Pipe {
            self.in_block_params = matches!(previous, Some(TokenKind::Do | TokenKind::LBrace));
        }

        self.state = match kind {
            TokenKind::RParen | TokenKind::RBracket => ExprState::End,
            TokenKind::Dot | TokenKind::AmpDot | TokenKind::ColonColon => ExprState::Fname,
            _ => ExprState::Beg,
        };
    }

    fn scan_identifier(&mut self, start: Position, spaced: bool) {
        self.cursor.advance_while(is_ident_char);
        if matches!(self.cursor.peek(), Some('?' | '!')) && self.cursor.peek_next() != Some('=') {
            self.cursor.advance();
        }

        let after_dot = self.state == ExprState::Fname && !self.in_def_name;

        // `key: value`
        if !after_dot
            && !self.in_def_name
            && self.state != ExprState::End
            && self.cursor.peek() == Some(':')
            && self.cursor.peek_next() != Some(':')
        {
            self.cursor.advance();
            self.push(TokenKind::Label, start, spaced);
            self.state = ExprState::Beg;
            return;
        }

        // `def value=(v)`
        if self.in_def_name && self.cursor.peek() == Some('=') && self.cursor.peek_next() == Some('(') {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(start.byte);
        let dot_follows = self.cursor.peek() == Some('.');
        let keyword = if after_dot || (self.in_def_name && !(text == "self" && dot_follows)) {
            None
        } else {
            TokenKind::keyword(text)
        };

        if let Some(kind) = keyword {
            self.push(kind, start, spaced);
            self.in_def_name = kind == TokenKind::Def || (self.in_def_name && kind == TokenKind::SelfKw);
            self.state = keyword_state(kind);
            return;
        }

        let first = text.chars().next().unwrap_or('_');
        let kind = if first.is_uppercase() { TokenKind::Constant } else { TokenKind::Identifier };
        let name = text.to_string();
        self.push(kind, start, spaced);

        if self.in_def_name {
            self.in_def_name = dot_follows;
            self.state = ExprState::Arg;
            return;
        }
        if after_dot {
            self.state = ExprState::Arg;
            return;
        }

        if kind == TokenKind::Constant {
            self.state = ExprState::End;
            return;
        }

        if self.in_block_params || self.followed_by_assignment() {
            self.locals.insert(name.clone());
        }
        self.state = if self.locals.contains(&name) { ExprState::End } else { ExprState::Arg };
    }

    /// `name = ...` or `name += ...` ahead on the same line.
    fn followed_by_assignment(&self) -> bool {
        let rest = self.cursor.rest().trim_start_matches([' ', '\t']);
        if let Some(after) = rest.strip_prefix('=') {
            return !matches!(after.chars().next(), Some('=' | '~' | '>'));
        }
        ["+=", "-=", "*=", "/=", "||=", "&&=", "<<=", "**=", "%=", "|=", "&="]
            .iter()
            .any(|op| rest.starts_with(op))
    }

    // =========================================================================
    // STRINGS
    // =========================================================================

    /// Open a string-like literal and push its mode.
    fn begin_literal(&mut self, start: Position, spaced: bool, opening: Opening) {
        let checkpoint = self.checkpoint(start, spaced);
        for _ in 0..opening.width {
            self.cursor.advance();
        }

        let kind = match opening.kind {
            LiteralKind::Regex => TokenKind::RegexBegin,
            LiteralKind::String | LiteralKind::Heredoc => TokenKind::StringBegin,
        };
        let mut token = self.token(kind, start, spaced);
        token.flags.ambiguous = opening.ambiguous;
        self.tokens.push(token);

        if opening.single_line {
            // Single-line literals close themselves at the line end; they
            // are never rewind targets.
            self.forced_single_line.insert(start.byte);
        }
        let single_line = self.forced_single_line.contains(&start.byte);

        self.modes.push(Mode::Str(StringMode {
            kind: opening.kind,
            open: opening.open,
            close: Some(opening.close),
            interpolate: opening.interpolate,
            opener: Span::new(start, self.cursor.position()),
            single_line,
            has_newline: false,
            nesting: 0,
        }));
        self.open_strings.push(checkpoint);
        self.state = ExprState::Beg;
    }

    /// Scan string content up to the next token boundary inside the literal.
    fn scan_string_segment(&mut self) {
        let segment = self.cursor.position();
        loop {
            let Some(Mode::Str(mode)) = self.modes.last() else {
                return;
            };
            let (open, close, interpolate, single_line, nesting) =
                (mode.open, mode.close, mode.interpolate, mode.single_line, mode.nesting);

            match self.cursor.peek() {
                None => {
                    self.flush_content(segment);
                    if close.is_none() {
                        self.modes.pop();
                    } else {
                        self.handle_eof();
                    }
                    return;
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('\n') {
                        self.mark_newline();
                    }
                    self.cursor.advance();
                }
                Some('#') if interpolate && self.cursor.peek_next() == Some('{') => {
                    self.flush_content(segment);
                    let start = self.cursor.position();
                    self.cursor.advance();
                    self.cursor.advance();
                    self.push(TokenKind::InterpolationBegin, start, false);
                    self.modes.push(Mode::Code { brace_depth: 0 });
                    self.state = ExprState::Beg;
                    return;
                }
                Some('\n') if single_line => {
                    self.flush_content(segment);
                    self.abandon_single_line();
                    return;
                }
                Some('\n') => {
                    self.mark_newline();
                    self.cursor.advance();
                }
                Some(c) if Some(c) == close && nesting == 0 => {
                    self.flush_content(segment);
                    self.close_string();
                    return;
                }
                Some(c) if Some(c) == close => {
                    self.adjust_nesting(false);
                    self.cursor.advance();
                }
                Some(c) if Some(c) == open => {
                    self.adjust_nesting(true);
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn adjust_nesting(&mut self, deeper: bool) {
        if let Some(Mode::Str(mode)) = self.modes.last_mut() {
            mode.nesting = if deeper { mode.nesting + 1 } else { mode.nesting.saturating_sub(1) };
        }
    }

    fn mark_newline(&mut self) {
        if let Some(Mode::Str(mode)) = self.modes.last_mut() {
            mode.has_newline = true;
        }
    }

    fn flush_content(&mut self, segment: Position) {
        if self.cursor.position().byte > segment.byte {
            self.push(TokenKind::StringContent, segment, false);
        }
    }

    fn close_string(&mut self) {
        let start = self.cursor.position();
        let Some(Mode::Str(mode)) = self.modes.pop() else {
            return;
        };
        self.cursor.advance();
        if mode.kind == LiteralKind::Regex {
            self.cursor.advance_while(|c| c.is_ascii_alphabetic());
        }
        self.push(TokenKind::StringEnd, start, false);

        let plain = mode.kind == LiteralKind::String;
        let checkpoint = self.pop_open_string(plain);
        if mode.has_newline && plain {
            self.last_multiline = checkpoint;
        }
        self.state = ExprState::End;
    }

    /// A single-line literal reached a line break: report and close it here.
    fn abandon_single_line(&mut self) {
        let Some(Mode::Str(mode)) = self.modes.pop() else {
            return;
        };
        self.errors.push(ParseError::new(mode.kind.unterminated(), mode.opener));
        let here = self.cursor.position();
        self.push_synthetic(TokenKind::StringEnd, here);
        self.pop_open_string(false);
        self.state = ExprState::End;
    }

    /// Forget the innermost open string.
    ///
    /// A remembered multi-line string nested inside it can no longer be
    /// restored on its own. When `promote` is set the enclosing string,
    /// which spans the same line break, becomes the rewind target instead.
    fn pop_open_string(&mut self, promote: bool) -> Option<Checkpoint<'a>> {
        let checkpoint = self.open_strings.pop()?;
        if self.last_multiline.as_ref().is_some_and(|inner| inner.depth > checkpoint.depth) {
            self.last_multiline = promote.then(|| checkpoint.clone());
        }
        Some(checkpoint)
    }

    // =========================================================================
    // END OF INPUT AND REWINDING
    // =========================================================================

    /// Handle running out of input with literals still open.
    ///
    /// ## Returns
    ///
    /// `true` when the lexer rewound and should keep scanning.
    fn handle_eof(&mut self) -> bool {
        if self.modes.len() <= 1 {
            return false;
        }
        if !self.heredoc_body {
            if let Some(checkpoint) = self.rewind_target() {
                tracing::trace!(opener = checkpoint.opener, "rewinding unterminated string");
                self.forced_single_line.insert(checkpoint.opener);
                self.restore(checkpoint);
                return true;
            }
        }
        self.close_open_modes();
        false
    }

    /// The opener to terminate at the end of its line, if that changes anything.
    ///
    /// An opener on the current (last) line would end exactly where input
    /// ends, so it is closed in place instead of re-lexed.
    fn rewind_target(&mut self) -> Option<Checkpoint<'a>> {
        let line = self.cursor.position().line;
        let forced = &self.forced_single_line;
        let usable = |checkpoint: &Checkpoint<'a>| checkpoint.line < line && !forced.contains(&checkpoint.opener);
        if let Some(checkpoint) = self.last_multiline.take() {
            if usable(&checkpoint) {
                return Some(checkpoint);
            }
        }
        self.open_strings.iter().find(|checkpoint| usable(checkpoint)).cloned()
    }

    fn close_open_modes(&mut self) {
        while self.modes.len() > 1 {
            let here = self.cursor.position();
            match self.modes.pop() {
                Some(Mode::Code { .. }) => self.push_synthetic(TokenKind::InterpolationEnd, here),
                Some(Mode::Str(mode)) => {
                    if mode.close.is_some() {
                        self.errors.push(ParseError::new(mode.kind.unterminated(), mode.opener));
                        self.push_synthetic(TokenKind::StringEnd, here);
                        self.pop_open_string(false);
                    }
                }
                None => break,
            }
        }
        self.state = ExprState::End;
    }

    fn checkpoint(&self, opener: Position, spaced: bool) -> Checkpoint<'a> {
        let top = self.modes.len().saturating_sub(2);
        Checkpoint {
            cursor: self.cursor.clone(),
            tokens: self.tokens.len(),
            errors: self.errors.len(),
            modes: self.modes.len(),
            top_modes: self.modes[top..].to_vec(),
            depth: self.open_strings.len(),
            heredoc_resume: self.heredoc_resume.clone(),
            state: self.state,
            spaced,
            opener: opener.byte,
            line: opener.line,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<'a>) {
        self.cursor = checkpoint.cursor;
        self.tokens.truncate(checkpoint.tokens);
        self.errors.truncate(checkpoint.errors);
        self.modes.truncate(checkpoint.modes - checkpoint.top_modes.len());
        self.modes.extend(checkpoint.top_modes);
        self.open_strings.truncate(checkpoint.depth);
        self.heredoc_resume = checkpoint.heredoc_resume;
        self.state = checkpoint.state;
        self.space_seen = checkpoint.spaced;
        self.last_multiline = None;
        self.in_def_name = false;
        self.in_block_params = false;
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn token(&self, kind: TokenKind, start: Position, spaced: bool) -> Token {
        let span = Span::new(start, self.cursor.position());
        Token::new(kind, span, self.cursor.slice_from(start.byte).to_string()).spaced(spaced)
    }

    fn push(&mut self, kind: TokenKind, start: Position, spaced: bool) {
        let token = self.token(kind, start, spaced);
        self.tokens.push(token);
    }

    /// Zero-width token standing in for a delimiter the source never wrote.
    fn push_synthetic(&mut self, kind: TokenKind, at: Position) {
        self.tokens.push(Token::new(kind, Span::point(at), String::new()));
    }
}

impl Opening {
    fn quoted(quote: char, interpolate: bool) -> Self {
        Self {
            kind: LiteralKind::String,
            open: None,
            close: quote,
            interpolate,
            single_line: false,
            width: 1,
            ambiguous: false,
        }
    }
}

fn keyword_state(kind: TokenKind) -> ExprState {
    match kind {
        TokenKind::End
        | TokenKind::SelfKw
        | TokenKind::Nil
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Redo
        | TokenKind::Retry
        | TokenKind::BeginUpper
        | TokenKind::EndUpper => ExprState::End,
        TokenKind::Return
        | TokenKind::Break
        | TokenKind::Next
        | TokenKind::Yield
        | TokenKind::Super
        | TokenKind::Rescue
        | TokenKind::Defined => ExprState::Mid,
        TokenKind::Def | TokenKind::Alias | TokenKind::Undef => ExprState::Fname,
        _ => ExprState::Beg,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().0.into_iter().map(|t| t.kind).collect()
    }

    fn lex(source: &str) -> (Vec<Token>, Vec<ParseError>) {
        Lexer::new(source).tokenize()
    }

    #[test]
    fn test_tokenize_method_call() {
        use TokenKind::*;
        assert_eq!(kinds("puts(10)"), vec![Identifier, LParen, Integer, RParen, Eof]);
    }

    #[test]
    fn test_newlines_are_collapsed_and_skipped_after_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = 1 +\n  2\n\n\ny = 3"),
            vec![Identifier, Eq, Integer, Plus, Integer, Newline, Identifier, Eq, Integer, Eof]
        );
    }

    #[test]
    fn test_leading_dot_continues_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("list\n  .map\n  # note\n  &.size"),
            vec![Identifier, Dot, Identifier, AmpDot, Identifier, Eof]
        );
    }

    #[test]
    fn test_keywords_after_dot_are_method_names() {
        use TokenKind::*;
        assert_eq!(kinds("self.class"), vec![SelfKw, Dot, Identifier, Eof]);
    }

    #[test]
    fn test_interpolated_string_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("\"a #{b} c\""),
            vec![StringBegin, StringContent, InterpolationBegin, Identifier, InterpolationEnd, StringContent, StringEnd, Eof]
        );
    }

    #[test]
    fn test_braces_inside_interpolation_nest() {
        use TokenKind::*;
        assert_eq!(
            kinds("\"#{ {a: 1}[:a] }\""),
            vec![
                StringBegin,
                InterpolationBegin,
                LBrace,
                Label,
                Integer,
                RBrace,
                LBracket,
                Symbol,
                RBracket,
                InterpolationEnd,
                StringEnd,
                Eof
            ]
        );
    }

    #[test]
    fn test_single_quoted_string_does_not_interpolate() {
        use TokenKind::*;
        assert_eq!(kinds("'#{x}'"), vec![StringBegin, StringContent, StringEnd, Eof]);
    }

    #[test]
    fn test_unterminated_string_rewinds_to_multiline_string() {
        let source = "a = \"open\n\nb = 1\nputs \"x\"\n";
        let (tokens, errors) = lex(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedString);
        assert_eq!(errors[0].span.start.line, 0);
        assert_eq!(errors[0].span.start.column, 4);
        // `b = 1` is lexed as code again after the rewind
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Identifier && t.text == "b"));
    }

    #[test]
    fn test_unterminated_string_without_earlier_multiline_string() {
        let (tokens, errors) = lex("x = 1\ny = \"never closed");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.start.line, 1);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_string_enclosing_a_multiline_string_becomes_the_rewind_target() {
        let source = "x = \"#{ \"a\nb\" }\"\ny = \"open\nz = 1";
        let (tokens, errors) = lex(source);
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].span.start.line, errors[0].span.start.column), (2, 4));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Identifier && t.text == "z"));
    }

    #[test]
    fn test_nested_unterminated_interpolation_is_linear() {
        let source = "\"#{".repeat(2000);
        let (tokens, errors) = lex(&source);
        assert_eq!(errors.len(), 2000);
        assert!(errors.iter().all(|e| e.kind == ParseErrorKind::UnterminatedString));
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_nested_unterminated_interpolation_across_lines() {
        let source = "\"#{\n".repeat(500);
        let (tokens, errors) = lex(&source);
        assert!(!errors.is_empty());
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_regex_versus_division() {
        let (tokens, errors) = lex("x = 4\nx /2\np /re/");
        assert!(errors.is_empty(), "{errors:?}");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Slash));
        let regex = tokens.iter().find(|t| t.kind == TokenKind::RegexBegin);
        assert!(regex.map_or(false, |t| t.flags.ambiguous));
    }

    #[test]
    fn test_regex_in_expression_position_is_not_ambiguous() {
        let (tokens, _) = lex("m = /ab+c/i");
        let regex = tokens.iter().find(|t| t.kind == TokenKind::RegexBegin);
        assert!(regex.map_or(false, |t| !t.flags.ambiguous));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::StringEnd && t.text == "/i"));
    }

    #[test]
    fn test_unterminated_regex_stops_at_line_end() {
        let (tokens, errors) = lex("r = /abc\nputs 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedRegex);
        assert!(tokens.iter().any(|t| t.text == "puts"));
    }

    #[test]
    fn test_numbers() {
        use TokenKind::*;
        assert_eq!(
            kinds("1_000 0x1F 3.14 1e5 0123 0o17"),
            vec![Integer, Integer, Float, Float, LegacyOctalInteger, Integer, Eof]
        );
    }

    #[test]
    fn test_invalid_octal_digit_is_an_error() {
        let (tokens, errors) = lex("n = 089");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ParseErrorKind::InvalidNumber { .. }));
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::LegacyOctalInteger));
    }

    #[test]
    fn test_range_after_integer() {
        use TokenKind::*;
        assert_eq!(kinds("1..5"), vec![Integer, DotDot, Integer, Eof]);
    }

    #[test]
    fn test_symbols_and_ternary_colon() {
        use TokenKind::*;
        assert_eq!(
            kinds("x ? :a : :b"),
            vec![Identifier, Question, Symbol, Colon, Symbol, Eof]
        );
        assert_eq!(kinds("Foo::Bar"), vec![Constant, ColonColon, Constant, Eof]);
    }

    #[test]
    fn test_alias_takes_two_symbols() {
        use TokenKind::*;
        assert_eq!(
            kinds("alias :a :b\nx"),
            vec![Alias, Symbol, Symbol, Newline, Identifier, Eof]
        );
    }

    #[test]
    fn test_labels_and_keyword_labels() {
        use TokenKind::*;
        assert_eq!(
            kinds("f(if: 1, key: 2)"),
            vec![Identifier, LParen, Label, Integer, Comma, Label, Integer, RParen, Eof]
        );
    }

    #[test]
    fn test_character_literal() {
        use TokenKind::*;
        assert_eq!(kinds("c = ?a"), vec![Identifier, Eq, Character, Eof]);
    }

    #[test]
    fn test_percent_literals() {
        use TokenKind::*;
        assert_eq!(kinds("%w[a b]"), vec![PercentLiteral, Eof]);
        assert_eq!(kinds("x % 3"), vec![Identifier, Percent, Integer, Eof]);
        assert_eq!(
            kinds("%Q(a (b) #{c})"),
            vec![StringBegin, StringContent, InterpolationBegin, Identifier, InterpolationEnd, StringEnd, Eof]
        );
    }

    #[test]
    fn test_heredoc_body_is_spliced_after_opener() {
        let source = "text = <<~EOS.strip\n  hello #{name}\nEOS\nputs text\n";
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "{errors:?}");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let begin = texts.iter().position(|t| *t == "<<~EOS");
        let name = texts.iter().position(|t| *t == "name");
        let strip = texts.iter().position(|t| *t == "strip");
        assert!(begin < name && name < strip);
        assert!(texts.contains(&"puts"));
        assert!(!texts.contains(&"EOS"));
    }

    #[test]
    fn test_unterminated_heredoc() {
        let (_, errors) = lex("x = <<EOS\nbody\n");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ParseErrorKind::UnterminatedHeredoc { .. }));
    }

    #[test]
    fn test_shift_is_not_heredoc() {
        use TokenKind::*;
        assert_eq!(kinds("a = []\na << b"), vec![Identifier, Eq, LBracket, RBracket, Newline, Identifier, Shl, Identifier, Eof]);
    }

    #[test]
    fn test_comments_and_embedded_docs_are_skipped() {
        use TokenKind::*;
        assert_eq!(kinds("# c\n=begin\nx\n=end\ny"), vec![Identifier, Eof]);
    }

    #[test]
    fn test_end_marker_stops_lexing() {
        use TokenKind::*;
        assert_eq!(kinds("a\n__END__\n\"unterminated"), vec![Identifier, Newline, Eof]);
    }

    #[test]
    fn test_def_operator_and_setter_names() {
        let (tokens, errors) = lex("def ==(o) end\ndef value=(v) end\ndef [](i) end");
        assert!(errors.is_empty());
        let names: Vec<&str> = tokens
            .windows(2)
            .filter(|pair| pair[0].kind == TokenKind::Def)
            .map(|pair| pair[1].text.as_str())
            .collect();
        assert_eq!(names, vec!["==", "value=", "[]"]);
    }

    #[test]
    fn test_spaced_flag() {
        let (tokens, _) = lex("foo [1]\nfoo[1]");
        let brackets: Vec<bool> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::LBracket)
            .map(|t| t.flags.spaced)
            .collect();
        assert_eq!(brackets, vec![true, false]);
    }

    #[test]
    fn test_unexpected_character() {
        let (_, errors) = lex("x = 1 \\ 2");
        assert!(matches!(errors[0].kind, ParseErrorKind::UnexpectedCharacter { ch: '\\' }));
    }
}
