//! # Variable Scope
//!
//! Lexical scoping of Ruby locals, for the unused and shadowing rules.
//!
//! ## Ruby Scoping Rules
//!
//! - A local exists from its first assignment (or as a parameter)
//! - Blocks see the locals of the scope around them
//! - `def`, `class` and `module` bodies start from nothing
//! - Assigning inside a block to a visible name writes the outer variable
//!
//! ## Example
//!
//! ```rust
//! use ruby_lint::scope::{FrameKind, ScopeStack};
//! use ruby_parser::Position;
//!
//! let mut scopes = ScopeStack::new();
//! scopes.write("x", Position::new(0, 0, 0));
//!
//! scopes.push(FrameKind::Block);
//! assert!(scopes.read("x")); // blocks see outer locals
//! scopes.pop();
//!
//! scopes.push(FrameKind::Method);
//! assert!(!scopes.read("x")); // methods do not
//! ```

use ruby_parser::Position;
use std::collections::HashMap;

// =============================================================================
// FRAMES
// =============================================================================

/// What opened a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Top level of the file.
    Program,
    /// `def` body.
    Method,
    /// `class`, `module` or `class << obj` body.
    Class,
    /// `do`/`{}` block, lambda, `BEGIN`/`END` body.
    Block,
}

/// Bookkeeping for one local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Where the name first appeared in this frame.
    pub declared_at: Position,
    pub reads: usize,
    pub writes: usize,
    /// Parameters are bound by the caller, never by assignment.
    pub parameter: bool,
}

impl Variable {
    /// Written at least once and never read.
    pub fn is_unused(&self) -> bool {
        !self.parameter && self.writes > 0 && self.reads == 0
    }
}

/// Locals of one lexical scope.
#[derive(Debug, Clone)]
pub struct ScopeFrame {
    pub kind: FrameKind,
    variables: HashMap<String, Variable>,
}

impl ScopeFrame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            variables: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> Vec<(&str, &Variable)> {
        let mut variables: Vec<(&str, &Variable)> =
            self.variables.iter().map(|(name, variable)| (name.as_str(), variable)).collect();
        variables.sort_by_key(|(_, variable)| variable.declared_at.byte);
        variables
    }
}

// =============================================================================
// SCOPE STACK
// =============================================================================

/// Stack of frames (innermost last).
///
/// A frame is pushed on entering a body and popped on leaving it; nothing
/// refers to a frame after it is popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a stack holding the `Program` frame.
    pub fn new() -> Self {
        Self {
            frames: vec![ScopeFrame::new(FrameKind::Program)],
        }
    }

    /// Push a new frame.
    pub fn push(&mut self, kind: FrameKind) {
        self.frames.push(ScopeFrame::new(kind));
    }

    /// Pop the innermost frame and hand it back for inspection.
    ///
    /// The `Program` frame is never popped.
    pub fn pop(&mut self) -> Option<ScopeFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Kind of the innermost frame that is not a block.
    pub fn enclosing_definition(&self) -> FrameKind {
        self.frames
            .iter()
            .rev()
            .map(|frame| frame.kind)
            .find(|kind| *kind != FrameKind::Block)
            .unwrap_or(FrameKind::Program)
    }

    /// Frames visible from the innermost one, innermost first.
    fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let mut open = true;
        (0..self.frames.len()).rev().take_while(move |index| {
            let visible = open;
            open = self.frames[*index].kind == FrameKind::Block;
            visible
        })
    }

    fn resolve(&self, name: &str) -> Option<usize> {
        self.visible_indices().find(|index| self.frames[*index].variables.contains_key(name))
    }

    fn variable_mut(&mut self, index: usize, name: &str) -> Option<&mut Variable> {
        self.frames.get_mut(index).and_then(|frame| frame.variables.get_mut(name))
    }

    /// Record an assignment to `name`.
    ///
    /// Writes the visible variable of that name, or declares it in the
    /// innermost frame.
    pub fn write(&mut self, name: &str, at: Position) {
        match self.resolve(name) {
            Some(index) => {
                if let Some(variable) = self.variable_mut(index, name) {
                    variable.writes += 1;
                }
            }
            None => self.declare(name, at, false),
        }
    }

    /// Record a read. Returns false when no visible variable has that name.
    pub fn read(&mut self, name: &str) -> bool {
        let Some(index) = self.resolve(name) else {
            return false;
        };
        if let Some(variable) = self.variable_mut(index, name) {
            variable.reads += 1;
        }
        true
    }

    /// Bind a parameter in the innermost frame.
    pub fn bind_parameter(&mut self, name: &str, at: Position) {
        self.declare(name, at, true);
    }

    /// Declare a block-local (`|x; tmp|`) in the innermost frame without writing it.
    pub fn bind_block_local(&mut self, name: &str, at: Position) {
        if let Some(frame) = self.frames.last_mut() {
            frame.variables.entry(name.to_string()).or_insert(Variable {
                declared_at: at,
                reads: 0,
                writes: 0,
                parameter: false,
            });
        }
    }

    /// A variable of that name in a frame visible from, but enclosing, the
    /// innermost one.
    pub fn outer(&self, name: &str) -> Option<&Variable> {
        self.visible_indices().skip(1).find_map(|index| self.frames[index].get(name))
    }

    /// Mark an enclosing variable as referenced.
    pub fn touch_outer(&mut self, name: &str) {
        let index = self.visible_indices().skip(1).find(|index| self.frames[*index].variables.contains_key(name));
        if let Some(variable) = index.and_then(|index| self.variable_mut(index, name)) {
            variable.reads += 1;
        }
    }

    /// Declare in the innermost frame. A name already in that frame keeps
    /// its first declaration site.
    fn declare(&mut self, name: &str, at: Position, parameter: bool) {
        if let Some(frame) = self.frames.last_mut() {
            let variable = frame.variables.entry(name.to_string()).or_insert(Variable {
                declared_at: at,
                reads: 0,
                writes: 0,
                parameter,
            });
            if !parameter {
                variable.writes += 1;
            }
        }
    }

    /// Number of frames, including `Program`.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> Position {
        Position::new(line * 10, line, 0)
    }

    #[test]
    fn test_block_writes_outer_variable() {
        let mut scopes = ScopeStack::new();
        scopes.push(FrameKind::Method);
        scopes.write("total", at(1));
        scopes.push(FrameKind::Block);
        scopes.write("total", at(2));
        let block = scopes.pop().unwrap();
        assert!(block.get("total").is_none());
        let method = scopes.pop().unwrap();
        assert_eq!(method.get("total").unwrap().writes, 2);
    }

    #[test]
    fn test_method_frame_hides_outer_variables() {
        let mut scopes = ScopeStack::new();
        scopes.write("x", at(0));
        scopes.push(FrameKind::Method);
        scopes.push(FrameKind::Block);
        assert!(!scopes.read("x"));
        assert!(scopes.outer("x").is_none());
        assert_eq!(scopes.enclosing_definition(), FrameKind::Method);
    }

    #[test]
    fn test_outer_skips_innermost_frame() {
        let mut scopes = ScopeStack::new();
        scopes.write("x", at(3));
        scopes.push(FrameKind::Block);
        scopes.bind_parameter("x", at(4));
        assert_eq!(scopes.outer("x").map(|variable| variable.declared_at.line), Some(3));
        scopes.touch_outer("x");
        scopes.pop();
        assert!(scopes.read("x"));
    }

    #[test]
    fn test_unused_excludes_parameters_and_reads() {
        let mut scopes = ScopeStack::new();
        scopes.push(FrameKind::Method);
        scopes.bind_parameter("arg", at(1));
        scopes.write("kept", at(2));
        scopes.write("dropped", at(3));
        scopes.read("kept");
        let frame = scopes.pop().unwrap();
        let unused: Vec<&str> =
            frame.variables().into_iter().filter(|(_, v)| v.is_unused()).map(|(name, _)| name).collect();
        assert_eq!(unused, vec!["dropped"]);
    }

    #[test]
    fn test_program_frame_is_never_popped() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.pop().is_none());
        assert_eq!(scopes.depth(), 1);
    }
}
