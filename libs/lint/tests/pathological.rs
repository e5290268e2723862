//! Deeply nested and unterminated input must finish quickly with bounded output.

use ruby_lint::{lint, LintOptions, LintResult};
use std::time::{Duration, Instant};

const BUDGET: Duration = Duration::from_secs(10);

fn timed(source: &str) -> LintResult {
    let started = Instant::now();
    let result = lint(source, LintOptions::default().with_parse_dump(true));
    let elapsed = started.elapsed();
    assert!(elapsed < BUDGET, "took {elapsed:?} for {} bytes", source.len());
    result
}

#[test]
fn test_nested_unterminated_interpolation() {
    let result = timed(&"\"#{".repeat(2000));
    assert!(!result.errors().is_empty());
}

#[test]
fn test_nested_unterminated_interpolation_across_lines() {
    let result = timed(&"x = \"#{\n".repeat(1000));
    assert!(!result.errors().is_empty());
}

#[test]
fn test_terminated_nested_interpolation() {
    let depth = 100;
    let source = format!("{}x{}", "\"#{".repeat(depth), "}\"".repeat(depth));
    let result = timed(&source);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
}

#[test]
fn test_deep_open_parens() {
    let result = timed(&"(".repeat(100_000));
    assert!(!result.errors().is_empty());
}

#[test]
fn test_deep_open_brackets() {
    let result = timed(&"[".repeat(100_000));
    assert!(!result.errors().is_empty());
}

#[test]
fn test_deep_unclosed_definitions() {
    let result = timed(&"def f\n".repeat(5000));
    assert!(!result.errors().is_empty());
}

#[test]
fn test_errors_are_capped() {
    let result = timed(&")\n".repeat(10_000));
    assert!(result.errors().len() <= config::constants::MAX_SYNTAX_ERRORS, "{}", result.errors().len());
}
