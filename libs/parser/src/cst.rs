//! # Concrete Syntax Tree (CST)
//!
//! Arena-allocated syntax tree for Ruby source.
//!
//! Nodes live in one `Vec` and refer to their children by [`NodeId`].
//! Everything a half-parsed statement created sits at the end of the
//! arena, so error recovery discards it with a single `truncate`.
//!
//! ## Example
//!
//! ```rust
//! use ruby_parser::cst::NodeKind;
//!
//! let cst = ruby_parser::parse("x = 1");
//! assert_eq!(cst.kind(cst.root), NodeKind::Program);
//! ```

use crate::error::ParseError;
use crate::span::{Span, Spanned};
use serde::{Deserialize, Serialize};

// =============================================================================
// NODE ID
// =============================================================================

/// Index of a node in its [`Cst`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// CST
// =============================================================================

/// Concrete Syntax Tree result.
///
/// Contains the node arena, the root, and every lexical and syntax error.
///
/// ## Example
///
/// ```rust
/// let cst = ruby_parser::parse("def f\n  1\nend");
/// assert!(cst.is_ok());
/// assert_eq!(cst.children(cst.root).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Cst {
    /// Node arena.
    pub nodes: Vec<Node>,
    /// Root `Program` node.
    pub root: NodeId,
    /// Lexical and syntax errors in the order they were found.
    pub errors: Vec<ParseError>,
}

impl Cst {
    /// Create a new CST.
    pub fn new(nodes: Vec<Node>, root: NodeId, errors: Vec<ParseError>) -> Self {
        Self { nodes, root, errors }
    }

    /// Check if parsing was successful (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. A parsed tree always has a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node.
    ///
    /// Ids come from this arena, so the lookup is in bounds; a foreign id
    /// falls back to the root.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id.index())
            .unwrap_or_else(|| &self.nodes[self.root.index()])
    }

    /// Kind of a node.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Children of a node, in source order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Text of a node, or the empty string.
    pub fn text(&self, id: NodeId) -> &str {
        self.node(id).text.as_deref().unwrap_or("")
    }

    /// Nodes in pre-order, starting at the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Spans of every `Error` node reachable from the root.
    pub fn error_spans(&self) -> Vec<Span> {
        self.preorder()
            .into_iter()
            .filter(|id| self.kind(*id) == NodeKind::Error)
            .map(|id| self.node(id).span)
            .collect()
    }
}

// =============================================================================
// CST NODE
// =============================================================================

/// A node in the Concrete Syntax Tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node type.
    pub kind: NodeKind,
    /// Source span.
    pub span: Span,
    /// Child nodes.
    pub children: Vec<NodeId>,
    /// Name or literal text (identifiers, operators, literal values).
    pub text: Option<String>,
}

impl Node {
    /// Create a new CST node.
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
            text: None,
        }
    }

    /// Set children.
    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    /// Set text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl Spanned for Node {
    fn span(&self) -> Span {
        self.span
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// Types of CST nodes.
///
/// Child layout is noted where it is not just "operands in source order".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // Structure
    /// Root node containing all top-level statements.
    Program,
    /// Sequence of statements forming a body.
    Statements,
    /// Region discarded by error recovery.
    Error,

    // Literals
    /// Integer literal; text is the source lexeme.
    Integer,
    /// Float literal.
    Float,
    /// String or heredoc; text holds the content when there is no interpolation.
    String,
    /// Regular expression literal.
    Regex,
    /// Symbol; text is the name without the leading colon.
    Symbol,
    /// Character literal like `?a`.
    Character,
    /// `%w[]` / `%i[]` / `%q()` literal.
    Words,
    /// `[a, b]`
    Array,
    /// `{k => v}`
    Hash,
    /// `key => value` or `key: value` inside a hash or argument list.
    Pair,
    /// `a..b` or `a...b`; text is the operator.
    Range,
    /// `nil`
    Nil,
    /// `true`
    True,
    /// `false`
    False,
    /// `self`
    SelfNode,

    // Variables
    /// Read of a local variable.
    LocalVariable,
    /// Write target that declares or updates a local variable.
    LocalTarget,
    /// `@ivar`
    InstanceVariable,
    /// `@@cvar`
    ClassVariable,
    /// `$global`
    GlobalVariable,
    /// `Const`
    Constant,
    /// `Scope::Const` or `::Const`; children `[scope?]`.
    ScopedConstant,

    // Calls
    /// Method call; text is the method name, children `[receiver?, Arguments?, Block?]`.
    Call,
    /// Call arguments.
    Arguments,
    /// `*expr`
    Splat,
    /// `**expr`
    DoubleSplat,
    /// `&blk`
    BlockPass,
    /// `do |x| ... end` or `{ |x| ... }`; children `[BlockParameters?, Statements]`.
    Block,
    /// `|a, b|`
    BlockParameters,
    /// Method parameter list.
    Parameters,
    /// One parameter; text is the name, children `[default?]`.
    Parameter,
    /// Block-local variable after `;` in `|a; tmp|`; text is the name.
    BlockLocal,
    /// `->(x) { ... }`; children `[BlockParameters?, Statements]`.
    Lambda,

    // Assignment
    /// `target = value`
    Assignment,
    /// `target op= value`; text is the operator.
    OpAssignment,
    /// `a, b = value`; children `[MultiTargets, value]`.
    MultipleAssignment,
    /// Left-hand side of a multiple assignment.
    MultiTargets,
    /// `recv[args]`; children `[receiver, Arguments]`.
    Index,

    // Operators
    /// Binary operator; text is the operator.
    Binary,
    /// Unary operator; text is the operator.
    Unary,
    /// `!x` or `not x`
    Not,
    /// `a && b` or `a and b`
    And,
    /// `a || b` or `a or b`
    Or,
    /// `defined?(x)`
    Defined,
    /// `c ? a : b`
    Ternary,

    // Conditionals and loops
    /// `if`/`elsif`; children `[cond, Statements, (If | Else)?]`.
    If,
    /// `unless`; children `[cond, Statements, Else?]`.
    Unless,
    /// `body if cond`; children `[body, cond]`.
    IfModifier,
    /// `body unless cond`
    UnlessModifier,
    /// `body while cond`
    WhileModifier,
    /// `body until cond`
    UntilModifier,
    /// `body rescue fallback`
    RescueModifier,
    /// `while cond ... end`; children `[cond, Statements]`.
    While,
    /// `until cond ... end`
    Until,
    /// `for x in list ... end`; children `[target, iterable, Statements]`.
    For,

    // Case
    /// `case`; children `[subject?, (When | In)*, Else?]`.
    Case,
    /// `when a, b`; children `[Arguments, Statements]`.
    When,
    /// `in pattern`; children `[pattern, Statements]`.
    In,
    /// `else` branch; children `[Statements]`.
    Else,

    // Exceptions
    /// `begin ... end`; children `[Statements, RescueClause*, Else?, EnsureClause?]`.
    Begin,
    /// `rescue E => e`; children `[Arguments, LocalTarget?, Statements]`.
    RescueClause,
    /// `ensure`; children `[Statements]`.
    EnsureClause,

    // Definitions
    /// `def name(params) ... end`; text is the name, children
    /// `[Parameters, Statements, RescueClause*, Else?, EnsureClause?]`.
    MethodDef,
    /// `class Name < Super ... end`; children `[superclass?, Statements]`.
    ClassDef,
    /// `module Name ... end`; children `[Statements]`.
    ModuleDef,
    /// `class << self ... end`; children `[target, Statements]`.
    SingletonClass,

    // Control flow
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
    /// `alias new old`
    Alias,
    /// `undef name`
    Undef,
    /// `BEGIN { ... }`
    BeginBlock,
    /// `END { ... }`
    EndBlock,
    /// `#{...}` inside a string; children `[Statements]`.
    Interpolation,
    /// `( ... )`; children `[Statements]`.
    Paren,
}

impl NodeKind {
    /// Check if this is a literal node.
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::Float
                | Self::String
                | Self::Regex
                | Self::Symbol
                | Self::Character
                | Self::Words
                | Self::Nil
                | Self::True
                | Self::False
        )
    }

    /// Definitions open a fresh local variable scope.
    pub const fn is_definition(&self) -> bool {
        matches!(
            self,
            Self::MethodDef | Self::ClassDef | Self::ModuleDef | Self::SingletonClass
        )
    }

    /// Statement modifiers (`x if y`).
    pub const fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::IfModifier
                | Self::UnlessModifier
                | Self::WhileModifier
                | Self::UntilModifier
                | Self::RescueModifier
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn span(start: usize, end: usize) -> Span {
        Span::new(Position::new(start, 0, start), Position::new(end, 0, end))
    }

    fn sample() -> Cst {
        let nodes = vec![
            Node::new(NodeKind::LocalTarget, span(0, 1)).with_text("x"),
            Node::new(NodeKind::Integer, span(4, 5)).with_text("1"),
            Node::new(NodeKind::Assignment, span(0, 5)).with_children(vec![NodeId::new(0), NodeId::new(1)]),
            Node::new(NodeKind::Program, span(0, 5)).with_children(vec![NodeId::new(2)]),
        ];
        Cst::new(nodes, NodeId::new(3), Vec::new())
    }

    #[test]
    fn test_node_builders() {
        let node = Node::new(NodeKind::Call, Span::zero()).with_text("puts");
        assert_eq!(node.kind, NodeKind::Call);
        assert!(node.children.is_empty());
        assert_eq!(node.text.as_deref(), Some("puts"));
    }

    #[test]
    fn test_preorder_visits_parents_first() {
        let cst = sample();
        let kinds: Vec<NodeKind> = cst.preorder().into_iter().map(|id| cst.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Program, NodeKind::Assignment, NodeKind::LocalTarget, NodeKind::Integer]
        );
    }

    #[test]
    fn test_text_accessors() {
        let cst = sample();
        assert_eq!(cst.text(NodeId::new(0)), "x");
        assert_eq!(cst.text(cst.root), "");
        assert_eq!(cst.len(), 4);
        assert!(cst.is_ok());
    }

    #[test]
    fn test_node_kind_classification() {
        assert!(NodeKind::Integer.is_literal());
        assert!(!NodeKind::LocalVariable.is_literal());
        assert!(NodeKind::MethodDef.is_definition());
        assert!(NodeKind::IfModifier.is_modifier());
    }
}
