//! # CST Analyzer
//!
//! Walks the syntax tree with a [`ScopeStack`] and collects warnings from
//! the rules in [`crate::rules`].
//!
//! `Error` nodes have no children, so regions the parser already reported
//! are never visited.
//!
//! ## Example
//!
//! ```rust
//! use ruby_lint::analyzer::analyze;
//!
//! let parsed = ruby_parser::parse_source("def f\n  unused = 1\nend", Default::default());
//! let warnings = analyze(&parsed.cst, &parsed.tokens);
//! assert_eq!(warnings.len(), 1);
//! ```

use crate::diagnostic::Diagnostic;
use crate::rules::{self, duplicate_when, literals, variables};
use crate::scope::{FrameKind, ScopeStack};
use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use ruby_parser::{Cst, NodeId, NodeKind, Token};

// =============================================================================
// PUBLIC API
// =============================================================================

/// Run every rule over a parsed file.
///
/// ## Parameters
///
/// - `cst`: Tree from `ruby_parser`
/// - `tokens`: The token stream the tree was built from
///
/// ## Returns
///
/// Warnings in discovery order; the report sorts them.
pub fn analyze(cst: &Cst, tokens: &[Token]) -> Vec<Diagnostic> {
    let mut analyzer = Analyzer::new(cst);
    analyzer.visit_statements(cst.children(cst.root));

    let mut warnings = analyzer.warnings;
    warnings.extend(literals::check_tokens(tokens, &cst.error_spans()));
    tracing::debug!(warnings = warnings.len(), "analyzed");
    warnings
}

// =============================================================================
// ANALYZER
// =============================================================================

/// Walk state.
struct Analyzer<'a> {
    cst: &'a Cst,
    scopes: ScopeStack,
    /// Collected warnings.
    warnings: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    fn new(cst: &'a Cst) -> Self {
        Self {
            cst,
            scopes: ScopeStack::new(),
            warnings: Vec::new(),
        }
    }

    /// Visit a statement list.
    ///
    /// A bare variable that is not the last statement is never used.
    fn visit_statements(&mut self, statements: &[NodeId]) {
        let cst = self.cst;
        let last = statements.len().saturating_sub(1);
        for (index, statement) in statements.iter().enumerate() {
            let node = cst.node(*statement);
            if node.kind == NodeKind::LocalVariable && index < last {
                let warning = variables::void_value(cst.text(*statement), node.span.start);
                self.warnings.push(warning);
            }
            self.visit(*statement);
        }
    }

    fn visit_children(&mut self, id: NodeId) {
        let cst = self.cst;
        for child in cst.children(id) {
            self.visit(*child);
        }
    }

    /// Visit a single node.
    fn visit(&mut self, id: NodeId) {
        stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || self.visit_node(id));
    }

    fn visit_node(&mut self, id: NodeId) {
        let cst = self.cst;
        let node = cst.node(id);

        match node.kind {
            NodeKind::Error => {}
            NodeKind::Statements => self.visit_statements(&node.children),
            NodeKind::LocalVariable => {
                self.scopes.read(cst.text(id));
            }
            NodeKind::LocalTarget => self.scopes.write(cst.text(id), node.span.start),
            // `count += 1` reads before it writes
            NodeKind::OpAssignment => {
                if let Some(target) = node.children.first() {
                    if cst.kind(*target) == NodeKind::LocalTarget {
                        self.scopes.read(cst.text(*target));
                    }
                }
                self.visit_children(id);
            }
            NodeKind::Case => {
                self.warnings.extend(duplicate_when::check_case(cst, id));
                self.visit_children(id);
            }

            NodeKind::MethodDef => self.visit_in_frame(FrameKind::Method, &node.children),
            NodeKind::ModuleDef => self.visit_in_frame(FrameKind::Class, &node.children),
            // The superclass and `class << target` are evaluated outside the body.
            NodeKind::ClassDef | NodeKind::SingletonClass => {
                let (outside, body) = match node.children.first() {
                    Some(first) if cst.kind(*first) != NodeKind::Statements => node.children.split_at(1),
                    _ => node.children.split_at(0),
                };
                for child in outside {
                    self.visit(*child);
                }
                self.visit_in_frame(FrameKind::Class, body);
            }
            NodeKind::Block | NodeKind::Lambda | NodeKind::BeginBlock => {
                self.visit_in_frame(FrameKind::Block, &node.children);
            }
            NodeKind::EndBlock => {
                let enclosing = self.scopes.enclosing_definition();
                self.warnings.extend(rules::end_in_method(enclosing, node.span.start));
                self.visit_in_frame(FrameKind::Block, &node.children);
            }

            NodeKind::Parameters => {
                for parameter in &node.children {
                    self.bind_parameter(*parameter, false);
                }
            }
            NodeKind::BlockParameters => {
                for parameter in &node.children {
                    self.bind_parameter(*parameter, true);
                }
            }

            _ => self.visit_children(id),
        }
    }

    /// Visit `children` in a fresh frame, reporting its unused locals on exit.
    fn visit_in_frame(&mut self, kind: FrameKind, children: &[NodeId]) {
        self.scopes.push(kind);
        for child in children {
            self.visit(*child);
        }
        if let Some(frame) = self.scopes.pop() {
            self.warnings.extend(variables::unused_variables(&frame));
        }
    }

    /// Bind a parameter (or each name of a destructuring pattern).
    ///
    /// Block parameters that hide an enclosing local are reported, and the
    /// hidden local counts as referenced.
    fn bind_parameter(&mut self, id: NodeId, in_block: bool) {
        let cst = self.cst;
        let node = cst.node(id);
        match node.kind {
            NodeKind::MultiTargets => {
                for inner in &node.children {
                    self.bind_parameter(*inner, in_block);
                }
            }
            NodeKind::Parameter => {
                // Default values are evaluated before the name is bound.
                self.visit_children(id);

                let name = cst.text(id);
                if name.is_empty() || name == "..." {
                    return;
                }
                if in_block {
                    if let Some(outer) = self.scopes.outer(name) {
                        let warning = variables::shadowed(name, node.span.start, outer.declared_at);
                        self.warnings.push(warning);
                        self.scopes.touch_outer(name);
                    }
                }
                self.scopes.bind_parameter(name, node.span.start);
            }
            NodeKind::BlockLocal => self.scopes.bind_block_local(cst.text(id), node.span.start),
            _ => self.visit(id),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn warnings(source: &str) -> Vec<Diagnostic> {
        let parsed = ruby_parser::parse_source(source, Default::default());
        assert!(parsed.cst.is_ok(), "{:?}", parsed.cst.errors);
        analyze(&parsed.cst, &parsed.tokens)
    }

    fn kinds(source: &str) -> Vec<DiagnosticKind> {
        warnings(source).into_iter().map(|warning| warning.kind).collect()
    }

    #[test]
    fn test_unused_locals_in_method() {
        let found = warnings("def unused_vars\n  unused_var = 42\n  another = \"hello\"\n  puts \"Done\"\nend");
        let positions: Vec<(usize, usize)> = found.iter().map(|w| (w.line, w.column)).collect();
        assert_eq!(positions, vec![(2, 3), (3, 3)]);
        assert!(found.iter().all(|w| w.kind == DiagnosticKind::UnusedVariable));
    }

    #[test]
    fn test_top_level_locals_are_exempt() {
        assert!(warnings("calc = 1\nresult = 2").is_empty());
    }

    #[test]
    fn test_last_statement_is_a_use() {
        assert!(warnings("def f\n  x = 1\n  x\nend").is_empty());
    }

    #[test]
    fn test_void_variable_is_not_also_unused() {
        let found = warnings("def void_context\n  x = 10\n  x\n  puts \"End\"\nend");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiagnosticKind::VoidValue);
        assert_eq!((found[0].line, found[0].column), (3, 3));
    }

    #[test]
    fn test_reads_in_interpolation_and_op_assign_count() {
        assert!(warnings("def f(name)\n  greeting = \"hi\"\n  puts \"#{greeting} #{name}\"\nend").is_empty());
        assert!(warnings("def f\n  count = 0\n  count += 1\nend").is_empty());
    }

    #[test]
    fn test_block_parameter_shadowing() {
        let found = warnings("x = 1\n[1, 2, 3].each do |x|\n  puts x\nend");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiagnosticKind::ShadowedVariable);
        assert_eq!((found[0].line, found[0].column), (2, 20));
        assert!(found[0].message.contains("line 1"));
    }

    #[test]
    fn test_shadowed_local_in_method_is_not_unused() {
        assert_eq!(
            kinds("def f\n  x = 1\n  [1].each { |x| p x }\nend"),
            vec![DiagnosticKind::ShadowedVariable]
        );
    }

    #[test]
    fn test_method_parameters_do_not_shadow() {
        assert!(warnings("x = 1\ndef f(x)\n  x\nend").is_empty());
    }

    #[test]
    fn test_block_assignment_writes_outer_local() {
        assert!(warnings("def total(items)\n  sum = 0\n  items.each { |i| sum = sum + i }\n  sum\nend").is_empty());
    }

    #[test]
    fn test_unused_block_local() {
        assert_eq!(kinds("[1].each do |i|\n  tmp = i\nend"), vec![DiagnosticKind::UnusedVariable]);
    }

    #[test]
    fn test_block_local_written_but_never_read() {
        let found = warnings("[1].each { |i; j| j = i }\n[1].each { |i; k| k = i\n  p k }\n[1].each { |i; m| p i }");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiagnosticKind::UnusedVariable);
        assert!(found[0].message.contains("`j`"), "{}", found[0].message);
    }

    #[test]
    fn test_end_block_in_method() {
        let found = warnings("def method_with_end\n  END { puts \"END block\" }\nend\nEND { puts 1 }");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiagnosticKind::EndInMethod);
        assert_eq!((found[0].line, found[0].column), (2, 3));
    }

    #[test]
    fn test_class_body_is_its_own_frame() {
        assert_eq!(
            kinds("class Foo < Bar\n  helper = 1\nend"),
            vec![DiagnosticKind::UnusedVariable]
        );
    }

    #[test]
    fn test_error_regions_are_not_analyzed() {
        let parsed = ruby_parser::parse_source("def f\n  unused = 1\n", Default::default());
        assert_eq!(parsed.cst.errors.len(), 1);
        assert!(analyze(&parsed.cst, &parsed.tokens).is_empty());
    }
}
