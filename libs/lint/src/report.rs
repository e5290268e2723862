//! # Lint Report
//!
//! Merges syntax errors and warnings into one immutable [`LintResult`].
//! Each list is sorted by `(line, column, kind)` with a stable sort, so
//! identical input always yields identical output.
//!
//! ## Example
//!
//! ```rust
//! use ruby_lint::report::LintResult;
//!
//! let result = LintResult::new(Vec::new(), Vec::new(), None);
//! assert_eq!(result.summary(), "no errors found, no warnings found");
//! ```

use crate::diagnostic::Diagnostic;
use config::constants::{NO_ERRORS_MESSAGE, NO_WARNINGS_MESSAGE};
use std::fmt::Write;

// =============================================================================
// LINT RESULT
// =============================================================================

/// Outcome of one lint invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintResult {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    parse_dump: Option<String>,
}

impl LintResult {
    /// Assemble a result, ordering both lists by source position.
    pub fn new(mut errors: Vec<Diagnostic>, mut warnings: Vec<Diagnostic>, parse_dump: Option<String>) -> Self {
        errors.sort_by_key(Diagnostic::sort_key);
        warnings.sort_by_key(Diagnostic::sort_key);
        Self {
            errors,
            warnings,
            parse_dump,
        }
    }

    /// Lexical and syntax errors in source order.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Style warnings in source order.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Indented parse tree, present only when requested.
    pub fn parse_dump(&self) -> Option<&str> {
        self.parse_dump.as_deref()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// One-line explicit summary, e.g. `"2 errors found, no warnings found"`.
    pub fn summary(&self) -> String {
        format!(
            "{}, {}",
            count_phrase(self.errors.len(), "error", NO_ERRORS_MESSAGE),
            count_phrase(self.warnings.len(), "warning", NO_WARNINGS_MESSAGE)
        )
    }

    /// Render the sectioned text report printed by the command-line tool.
    ///
    /// ## Returns
    ///
    /// The dump section (when present) followed by the error and warning
    /// sections; an empty list gets a `=== NO ... ===` header instead.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if let Some(dump) = &self.parse_dump {
            out.push_str("=== PARSE DUMP ===\n");
            out.push_str(dump);
            if !dump.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }

        render_section(&mut out, "ERRORS", &self.errors);
        out.push('\n');
        render_section(&mut out, "WARNINGS", &self.warnings);
        out
    }
}

fn count_phrase(count: usize, noun: &str, none: &str) -> String {
    match count {
        0 => none.to_string(),
        1 => format!("1 {noun} found"),
        n => format!("{n} {noun}s found"),
    }
}

fn render_section(out: &mut String, title: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        let _ = writeln!(out, "=== NO {title} ===");
        return;
    }
    let _ = writeln!(out, "=== {title} ===");
    for diagnostic in diagnostics {
        let _ = writeln!(out, "{diagnostic}");
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn warning(kind: DiagnosticKind, line: usize, column: usize) -> Diagnostic {
        Diagnostic::warning(kind, format!("{kind:?}"), line, column)
    }

    #[test]
    fn test_lists_are_sorted_by_position_then_kind() {
        let result = LintResult::new(
            Vec::new(),
            vec![
                warning(DiagnosticKind::LegacyOctal, 3, 1),
                warning(DiagnosticKind::ShadowedVariable, 1, 5),
                warning(DiagnosticKind::DuplicateWhenValue, 1, 5),
            ],
            None,
        );
        let kinds: Vec<DiagnosticKind> = result.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::DuplicateWhenValue,
                DiagnosticKind::ShadowedVariable,
                DiagnosticKind::LegacyOctal
            ]
        );
    }

    #[test]
    fn test_summary_counts() {
        let errors = vec![
            Diagnostic::new(DiagnosticKind::Syntax, "a", 1, 1),
            Diagnostic::new(DiagnosticKind::Syntax, "b", 2, 1),
        ];
        let warnings = vec![warning(DiagnosticKind::VoidValue, 1, 1)];
        let result = LintResult::new(errors, warnings, None);
        assert_eq!(result.summary(), "2 errors found, 1 warning found");
        assert!(!result.is_clean());
    }

    #[test]
    fn test_render_text_sections() {
        let clean = LintResult::new(Vec::new(), Vec::new(), Some("Program 1:1-1:1".into()));
        assert_eq!(
            clean.render_text(),
            "=== PARSE DUMP ===\nProgram 1:1-1:1\n\n=== NO ERRORS ===\n\n=== NO WARNINGS ===\n"
        );

        let noisy = LintResult::new(Vec::new(), vec![warning(DiagnosticKind::VoidValue, 2, 3)], None);
        assert_eq!(
            noisy.render_text(),
            "=== NO ERRORS ===\n\n=== WARNINGS ===\n2:3: VoidValue\n"
        );
    }
}
