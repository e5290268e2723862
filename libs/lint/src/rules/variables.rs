//! # Local Variable Rules
//!
//! Unused locals, variables read for nothing, and block parameters that
//! hide an enclosing local. The analyzer decides when each applies; this
//! module owns the conditions on a finished frame and the messages.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::scope::{FrameKind, ScopeFrame};
use ruby_parser::Position;

/// Locals of a popped frame that were assigned and never read.
///
/// Top-level locals and names starting with `_` are exempt.
pub fn unused_variables(frame: &ScopeFrame) -> Vec<Diagnostic> {
    if frame.kind == FrameKind::Program {
        return Vec::new();
    }
    frame
        .variables()
        .into_iter()
        .filter(|(name, variable)| variable.is_unused() && !name.starts_with('_'))
        .map(|(name, variable)| {
            Diagnostic::warning_at(
                DiagnosticKind::UnusedVariable,
                format!("variable `{name}` assigned but never used"),
                variable.declared_at,
            )
        })
        .collect()
}

/// A bare variable reference that is not the value of its body.
pub fn void_value(name: &str, at: Position) -> Diagnostic {
    Diagnostic::warning_at(
        DiagnosticKind::VoidValue,
        format!("possibly useless use of variable `{name}` in void context"),
        at,
    )
}

/// A block parameter named like a local of an enclosing scope.
pub fn shadowed(name: &str, at: Position, outer: Position) -> Diagnostic {
    Diagnostic::warning_at(
        DiagnosticKind::ShadowedVariable,
        format!(
            "shadowing outer local variable `{name}` (declared on line {})",
            outer.display_line()
        ),
        at,
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeStack;

    #[test]
    fn test_underscore_names_are_exempt() {
        let mut scopes = ScopeStack::new();
        scopes.push(FrameKind::Block);
        scopes.write("_ignored", Position::new(0, 0, 0));
        scopes.write("value", Position::new(12, 1, 2));
        let frame = scopes.pop().unwrap();
        let found = unused_variables(&frame);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].to_string(), "2:3: variable `value` assigned but never used");
    }

    #[test]
    fn test_shadow_message_names_outer_line() {
        let warning = shadowed("x", Position::new(40, 31, 19), Position::new(30, 30, 0));
        assert_eq!(warning.to_string(), "32:20: shadowing outer local variable `x` (declared on line 31)");
    }
}
