//! # Tokens
//!
//! Token types for the Ruby lexer.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::lexer::{Token, TokenKind};
//! use ruby_parser::span::Span;
//!
//! let token = Token::new(TokenKind::Integer, Span::zero(), "10".to_string());
//! assert_eq!(token.kind, TokenKind::Integer);
//! ```

use crate::span::{Span, Spanned};

// =============================================================================
// TOKEN
// =============================================================================

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token type.
    pub kind: TokenKind,
    /// Source span.
    pub span: Span,
    /// Token text.
    pub text: String,
    /// Layout and classification flags.
    pub flags: TokenFlags,
}

/// Extra facts about a token that the parser and token rules consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenFlags {
    /// Whitespace (or a comment) precedes the token on its line.
    pub spaced: bool,
    /// A `/` regexp that could also have been read as division,
    /// e.g. `p /x/` where `p` is a method call.
    pub ambiguous: bool,
}

impl Token {
    /// Create a new token.
    ///
    /// ## Parameters
    ///
    /// - `kind`: Token type
    /// - `span`: Source location
    /// - `text`: Token text
    pub fn new(kind: TokenKind, span: Span, text: String) -> Self {
        Self {
            kind,
            span,
            text,
            flags: TokenFlags::default(),
        }
    }

    /// Builder for the `spaced` flag.
    pub fn spaced(mut self, spaced: bool) -> Self {
        self.flags.spaced = spaced;
        self
    }

    /// Check if token is EOF.
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span
    }
}

// =============================================================================
// TOKEN KIND
// =============================================================================

/// Types of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Integer literal like `10`, `0x1f`, `1_000`
    Integer,
    /// Integer with a leading zero and more digits, like `0123`
    LegacyOctalInteger,
    /// Float literal like `3.14` or `1e5`
    Float,
    /// Opening quote of a string, or a heredoc opener like `<<~EOS`
    StringBegin,
    /// Literal text inside a string
    StringContent,
    /// Closing quote of a string
    StringEnd,
    /// `#{` inside a double-quoted string
    InterpolationBegin,
    /// `}` closing an interpolation
    InterpolationEnd,
    /// Symbol like `:name` or `:"quoted"`
    Symbol,
    /// Opening of a regexp, `/` or `%r{`; shares content and end tokens with strings
    RegexBegin,
    /// Character literal like `?a`
    Character,
    /// Percent array like `%w[a b]` or `%i[a b]`, or `%q()` string
    PercentLiteral,

    // Names
    /// Local variable or method name, including `name?` and `name!`
    Identifier,
    /// Capitalized name
    Constant,
    /// `@name`
    InstanceVariable,
    /// `@@name`
    ClassVariable,
    /// `$name`
    GlobalVariable,
    /// `name:` in hash literals and keyword arguments
    Label,

    // Keywords
    /// `def`
    Def,
    /// `class`
    Class,
    /// `module`
    Module,
    /// `if`
    If,
    /// `unless`
    Unless,
    /// `elsif`
    Elsif,
    /// `else`
    Else,
    /// `then`
    Then,
    /// `end`
    End,
    /// `case`
    Case,
    /// `when`
    When,
    /// `in`
    In,
    /// `while`
    While,
    /// `until`
    Until,
    /// `for`
    For,
    /// `do`
    Do,
    /// `begin`
    Begin,
    /// `rescue`
    Rescue,
    /// `ensure`
    Ensure,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `next`
    Next,
    /// `redo`
    Redo,
    /// `retry`
    Retry,
    /// `yield`
    Yield,
    /// `super`
    Super,
    /// `self`
    SelfKw,
    /// `nil`
    Nil,
    /// `true`
    True,
    /// `false`
    False,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `defined?`
    Defined,
    /// `alias`
    Alias,
    /// `undef`
    Undef,
    /// `BEGIN`
    BeginUpper,
    /// `END`
    EndUpper,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    Pow,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    NotEq,
    /// `=~`
    Match,
    /// `!~`
    NotMatch,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `<=>`
    Cmp,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `.`
    Dot,
    /// `&.`
    AmpDot,
    /// `..`
    DotDot,
    /// `...`
    DotDotDot,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,
    /// Compound assignment: `+=`, `||=`, `<<=`, ...
    OpAssign,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// Significant line break
    Newline,

    // Special
    /// End of file
    Eof,
}

impl TokenKind {
    /// Check if this is a literal token.
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::LegacyOctalInteger
                | Self::Float
                | Self::StringBegin
                | Self::Symbol
                | Self::RegexBegin
                | Self::Character
                | Self::PercentLiteral
        )
    }

    /// Look up the keyword for an identifier's text.
    pub fn keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "def" => Self::Def,
            "class" => Self::Class,
            "module" => Self::Module,
            "if" => Self::If,
            "unless" => Self::Unless,
            "elsif" => Self::Elsif,
            "else" => Self::Else,
            "then" => Self::Then,
            "end" => Self::End,
            "case" => Self::Case,
            "when" => Self::When,
            "in" => Self::In,
            "while" => Self::While,
            "until" => Self::Until,
            "for" => Self::For,
            "do" => Self::Do,
            "begin" => Self::Begin,
            "rescue" => Self::Rescue,
            "ensure" => Self::Ensure,
            "return" => Self::Return,
            "break" => Self::Break,
            "next" => Self::Next,
            "redo" => Self::Redo,
            "retry" => Self::Retry,
            "yield" => Self::Yield,
            "super" => Self::Super,
            "self" => Self::SelfKw,
            "nil" => Self::Nil,
            "true" => Self::True,
            "false" => Self::False,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "defined?" => Self::Defined,
            "alias" => Self::Alias,
            "undef" => Self::Undef,
            "BEGIN" => Self::BeginUpper,
            "END" => Self::EndUpper,
            _ => return None,
        };
        Some(kind)
    }

    /// Check if this is a keyword token.
    pub const fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Def
                | Self::Class
                | Self::Module
                | Self::If
                | Self::Unless
                | Self::Elsif
                | Self::Else
                | Self::Then
                | Self::End
                | Self::Case
                | Self::When
                | Self::In
                | Self::While
                | Self::Until
                | Self::For
                | Self::Do
                | Self::Begin
                | Self::Rescue
                | Self::Ensure
                | Self::Return
                | Self::Break
                | Self::Next
                | Self::Redo
                | Self::Retry
                | Self::Yield
                | Self::Super
                | Self::SelfKw
                | Self::Nil
                | Self::True
                | Self::False
                | Self::And
                | Self::Or
                | Self::Not
                | Self::Defined
                | Self::Alias
                | Self::Undef
                | Self::BeginUpper
                | Self::EndUpper
        )
    }

    /// Operators that may be defined as methods (`def ==(other)`).
    pub const fn is_operator_method(&self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Pow
                | Self::Slash
                | Self::Percent
                | Self::EqEq
                | Self::EqEqEq
                | Self::NotEq
                | Self::Match
                | Self::NotMatch
                | Self::Lt
                | Self::Gt
                | Self::LtEq
                | Self::GtEq
                | Self::Cmp
                | Self::Bang
                | Self::Tilde
                | Self::Amp
                | Self::Pipe
                | Self::Caret
                | Self::Shl
                | Self::Shr
        )
    }

    /// Tokens that end a statement.
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Self::Newline | Self::Semicolon | Self::Eof)
    }

    /// Get display string for error messages.
    pub const fn display(&self) -> &'static str {
        match self {
            Self::Integer | Self::LegacyOctalInteger => "integer",
            Self::Float => "float",
            Self::StringBegin => "string",
            Self::StringContent => "string content",
            Self::StringEnd => "end of string",
            Self::InterpolationBegin => "#{",
            Self::InterpolationEnd => "}",
            Self::Symbol => "symbol",
            Self::RegexBegin => "regexp",
            Self::Character => "character literal",
            Self::PercentLiteral => "percent literal",
            Self::Identifier => "identifier",
            Self::Constant => "constant",
            Self::InstanceVariable => "instance variable",
            Self::ClassVariable => "class variable",
            Self::GlobalVariable => "global variable",
            Self::Label => "label",
            Self::Def => "def",
            Self::Class => "class",
            Self::Module => "module",
            Self::If => "if",
            Self::Unless => "unless",
            Self::Elsif => "elsif",
            Self::Else => "else",
            Self::Then => "then",
            Self::End => "end",
            Self::Case => "case",
            Self::When => "when",
            Self::In => "in",
            Self::While => "while",
            Self::Until => "until",
            Self::For => "for",
            Self::Do => "do",
            Self::Begin => "begin",
            Self::Rescue => "rescue",
            Self::Ensure => "ensure",
            Self::Return => "return",
            Self::Break => "break",
            Self::Next => "next",
            Self::Redo => "redo",
            Self::Retry => "retry",
            Self::Yield => "yield",
            Self::Super => "super",
            Self::SelfKw => "self",
            Self::Nil => "nil",
            Self::True => "true",
            Self::False => "false",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Defined => "defined?",
            Self::Alias => "alias",
            Self::Undef => "undef",
            Self::BeginUpper => "BEGIN",
            Self::EndUpper => "END",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Pow => "**",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::EqEqEq => "===",
            Self::NotEq => "!=",
            Self::Match => "=~",
            Self::NotMatch => "!~",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Cmp => "<=>",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::Bang => "!",
            Self::Tilde => "~",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Question => "?",
            Self::Colon => ":",
            Self::ColonColon => "::",
            Self::Dot => ".",
            Self::AmpDot => "&.",
            Self::DotDot => "..",
            Self::DotDotDot => "...",
            Self::Arrow => "->",
            Self::FatArrow => "=>",
            Self::OpAssign => "operator assignment",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Newline => "newline",
            Self::Eof => "end of input",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
