//! # Ruby Lint
//!
//! Scope-aware lint rules over the `ruby-parser` CST, plus report assembly
//! and the JSON boundary codec.
//!
//! ## Architecture
//!
//! ```text
//! Source → ruby_parser::parse_source → (tokens, CST + errors)
//!        → analyzer::analyze → warnings
//!        → LintResult → codec::encode
//! ```
//!
//! Every call owns all of its intermediate state; nothing is kept between
//! calls.
//!
//! ## Example
//!
//! ```rust
//! use ruby_lint::{lint, LintOptions};
//!
//! let result = lint("def f\n  unused = 1\nend\n", LintOptions::default());
//! assert!(result.errors().is_empty());
//! assert_eq!(result.warnings()[0].to_string(), "2:3: variable `unused` assigned but never used");
//! ```

pub mod analyzer;
pub mod codec;
pub mod diagnostic;
pub mod error;
pub mod printer;
pub mod report;
pub mod rules;
pub mod scope;

pub use codec::WireReport;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use error::LintError;
pub use report::LintResult;

use ruby_parser::LintLimits;

// =============================================================================
// OPTIONS
// =============================================================================

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintOptions {
    /// Attach the indented parse tree to the result.
    pub include_parse_dump: bool,
}

impl LintOptions {
    pub fn with_parse_dump(mut self, include: bool) -> Self {
        self.include_parse_dump = include;
        self
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Lint Ruby source text.
///
/// Never fails: lexical and syntax problems are part of the result.
///
/// ## Parameters
///
/// - `source`: Ruby source code
/// - `options`: Whether to attach a parse dump
///
/// ## Returns
///
/// Errors and warnings, each in source order.
pub fn lint(source: &str, options: LintOptions) -> LintResult {
    let parsed = ruby_parser::parse_source(source, LintLimits::default());

    let errors: Vec<Diagnostic> = parsed.cst.errors.iter().map(Diagnostic::from_parse_error).collect();
    let warnings = analyzer::analyze(&parsed.cst, &parsed.tokens);
    let dump = options.include_parse_dump.then(|| printer::dump(&parsed.cst));

    tracing::debug!(errors = errors.len(), warnings = warnings.len(), "linted");
    LintResult::new(errors, warnings, dump)
}

/// Lint raw bytes, rejecting anything that is not UTF-8.
///
/// ## Example
///
/// ```rust
/// use ruby_lint::{lint_bytes, LintError, LintOptions};
///
/// let error = lint_bytes(b"x = \xff", LintOptions::default()).unwrap_err();
/// assert!(matches!(error, LintError::InvalidUtf8 { valid_up_to: 4 }));
/// ```
pub fn lint_bytes(source: &[u8], options: LintOptions) -> Result<LintResult, LintError> {
    let source = std::str::from_utf8(source)?;
    Ok(lint(source, options))
}

/// Lint and encode in one step.
pub fn lint_to_json(source: &str, options: LintOptions) -> Result<String, LintError> {
    codec::encode(&lint(source, options))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_source() {
        let result = lint("def greet(name)\n  puts \"Hello, #{name}!\"\nend\n", LintOptions::default());
        assert!(result.is_clean());
        assert_eq!(result.parse_dump(), None);
    }

    #[test]
    fn test_errors_and_warnings_are_independent() {
        let result = lint("num = 0123\nlist = [1, 2\n", LintOptions::default());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(result.warnings()[0].kind, DiagnosticKind::LegacyOctal);
    }

    #[test]
    fn test_dump_on_request() {
        let result = lint("x = 1", LintOptions::default().with_parse_dump(true));
        assert!(result.parse_dump().is_some_and(|dump| dump.starts_with("Program")));
    }

    #[test]
    fn test_unclosed_def_is_one_error() {
        let result = lint("def broken\n  puts 1\n", LintOptions::default());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.errors()[0].to_string(),
            "1:1: unexpected end of input, expected `end` to close `def`"
        );
    }

    #[test]
    fn test_lint_to_json_is_deterministic() {
        let source = "case x\nwhen 1\nwhen 1\nend\np /re/\n";
        let first = lint_to_json(source, LintOptions::default()).unwrap();
        let second = lint_to_json(source, LintOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
