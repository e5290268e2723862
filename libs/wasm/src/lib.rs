//! WASM-facing entry points for the Ruby linter.
//!
//! This crate is compiled to a `cdylib`. Hosts either call the raw
//! allocate/transfer/free exports in [`boundary`] or the `wasm-bindgen`
//! functions below. Native tests use `lint_ruby_internal`, which exposes
//! Rust error types directly and needs no JS host.
//!
//! ```
//! let json = ruby_lint_wasm::lint_ruby_internal("puts 1", false).unwrap();
//! assert!(json.contains("no errors found"));
//! ```

pub mod boundary;
mod report_handle;

pub use boundary::{BoundaryError, RentedBuffer};
pub use report_handle::ReportHandle;

use ruby_lint::LintOptions;
use wasm_bindgen::prelude::*;

/// Installs a panic hook that forwards Rust panics to the browser console.
///
/// # Examples
/// ```no_run
/// // In JavaScript: import and call once at startup.
/// // import { init_panic_hook } from "ruby_lint_wasm";
/// // init_panic_hook();
/// ```
#[wasm_bindgen]
pub fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Lints Ruby source and returns the JSON report.
///
/// # Errors
/// Returns a JavaScript error value when the report cannot be produced.
/// Syntax errors and warnings are never errors here: they are the report.
///
/// # Examples
/// ```no_run
/// // In JavaScript:
/// // const report = JSON.parse(lint_ruby("def f\nend"));
/// // console.log(report.summary);
/// ```
#[wasm_bindgen]
pub fn lint_ruby(source: &str) -> Result<String, JsValue> {
    lint_ruby_internal(source, false).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Lints Ruby source and returns the JSON report with `parse_dump` set.
#[wasm_bindgen]
pub fn lint_ruby_with_dump(source: &str) -> Result<String, JsValue> {
    lint_ruby_internal(source, true).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Lints Ruby source into a handle with per-line accessors.
///
/// # Examples
/// ```no_run
/// // In JavaScript:
/// // const report = lint_ruby_report(source, false);
/// // report.warnings().forEach((line) => console.warn(line));
/// ```
#[wasm_bindgen]
pub fn lint_ruby_report(source: &str, include_parse_dump: bool) -> ReportHandle {
    let options = LintOptions::default().with_parse_dump(include_parse_dump);
    ReportHandle::from_result(&ruby_lint::lint(source, options))
}

/// Host-only helper that lints source and returns the JSON report.
///
/// # Examples
/// ```
/// let json = ruby_lint_wasm::lint_ruby_internal("x = [1, 2", true).unwrap();
/// assert!(json.contains("\"parse_dump\""));
/// ```
pub fn lint_ruby_internal(source: &str, include_parse_dump: bool) -> Result<String, BoundaryError> {
    let options = LintOptions::default().with_parse_dump(include_parse_dump);
    let bytes = boundary::lint_encoded(source.as_bytes(), options)?;
    String::from_utf8(bytes).map_err(|err| BoundaryError::InvalidUtf8 {
        valid_up_to: err.utf8_error().valid_up_to(),
    })
}

#[cfg(test)]
mod tests;
