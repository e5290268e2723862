//! # Report Handle
//!
//! WASM-friendly view of a lint report for hosts using generated bindings.
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! const report = lint_ruby_report(source, false);
//!
//! if (report.is_clean()) {
//!   status.textContent = report.summary();
//! } else {
//!   for (const line of report.errors()) console.error(line);
//!   for (const line of report.warnings()) console.warn(line);
//! }
//! ```

use ruby_lint::LintResult;
use wasm_bindgen::prelude::*;

/// Diagnostic lines of one report, ready for display.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct ReportHandle {
    /// `"{line}:{column}: {message}"` per error
    errors: Vec<String>,
    warnings: Vec<String>,
    summary: String,
    parse_dump: Option<String>,
}

#[wasm_bindgen]
impl ReportHandle {
    #[wasm_bindgen(getter)]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    #[wasm_bindgen(getter)]
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Error lines as a JS array of strings.
    #[wasm_bindgen]
    pub fn errors(&self) -> js_sys::Array {
        to_js_array(&self.errors)
    }

    /// Warning lines as a JS array of strings.
    #[wasm_bindgen]
    pub fn warnings(&self) -> js_sys::Array {
        to_js_array(&self.warnings)
    }

    /// `"no errors found, no warnings found"` style summary.
    #[wasm_bindgen]
    pub fn summary(&self) -> String {
        self.summary.clone()
    }

    #[wasm_bindgen]
    pub fn parse_dump(&self) -> Option<String> {
        self.parse_dump.clone()
    }

    #[wasm_bindgen]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

impl ReportHandle {
    /// Creates a handle from a finished lint result.
    pub fn from_result(result: &LintResult) -> Self {
        Self {
            errors: result.errors().iter().map(ToString::to_string).collect(),
            warnings: result.warnings().iter().map(ToString::to_string).collect(),
            summary: result.summary(),
            parse_dump: result.parse_dump().map(str::to_string),
        }
    }

    pub fn error_lines(&self) -> &[String] {
        &self.errors
    }

    pub fn warning_lines(&self) -> &[String] {
        &self.warnings
    }
}

fn to_js_array(lines: &[String]) -> js_sys::Array {
    lines.iter().map(|line| JsValue::from_str(line)).collect()
}
