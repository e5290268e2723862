//! # Lint Rules
//!
//! Each rule is a pure function of a subtree (or the token stream) and,
//! where it needs one, the scope chain handed in by the analyzer.
//!
//! ## Rules
//!
//! | Kind | Module |
//! |------|--------|
//! | `DuplicateWhenValue` | [`duplicate_when`] |
//! | `UnusedVariable`, `VoidValue`, `ShadowedVariable` | [`variables`] |
//! | `AmbiguousRegex`, `LegacyOctal` | [`literals`] |
//! | `EndInMethod` | [`end_in_method`] |

pub mod duplicate_when;
pub mod literals;
pub mod variables;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::scope::FrameKind;
use ruby_parser::Position;

/// `END { }` runs at exit however often the method is called.
pub fn end_in_method(enclosing: FrameKind, at: Position) -> Option<Diagnostic> {
    (enclosing == FrameKind::Method).then(|| {
        Diagnostic::warning_at(DiagnosticKind::EndInMethod, "END in method; use at_exit", at)
    })
}
