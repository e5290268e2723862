//! # Boundary Codec
//!
//! JSON form of a [`LintResult`] for crossing the host boundary:
//!
//! ```json
//! {"errors":["4:1: ..."],"warnings":[],"summary":"1 error found, no warnings found"}
//! ```
//!
//! Each diagnostic travels as its `"{line}:{column}: {message}"` line;
//! severity is implied by the list it sits in. `parse_dump` is present only
//! when the dump was requested.

use crate::error::LintError;
use crate::report::LintResult;
use serde::{Deserialize, Serialize};

/// Serialized shape of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_dump: Option<String>,
}

impl From<&LintResult> for WireReport {
    fn from(result: &LintResult) -> Self {
        Self {
            errors: result.errors().iter().map(ToString::to_string).collect(),
            warnings: result.warnings().iter().map(ToString::to_string).collect(),
            summary: result.summary(),
            parse_dump: result.parse_dump().map(str::to_string),
        }
    }
}

/// Encode a report as a JSON string.
pub fn encode(result: &LintResult) -> Result<String, LintError> {
    Ok(serde_json::to_string(&WireReport::from(result))?)
}

/// Encode a report as UTF-8 JSON bytes.
pub fn encode_bytes(result: &LintResult) -> Result<Vec<u8>, LintError> {
    Ok(serde_json::to_vec(&WireReport::from(result))?)
}

/// Decode a report produced by [`encode`].
pub fn decode(json: &str) -> Result<WireReport, LintError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, DiagnosticKind};

    #[test]
    fn test_dump_is_omitted_unless_present() {
        let result = LintResult::new(Vec::new(), Vec::new(), None);
        let json = encode(&result).unwrap();
        assert_eq!(
            json,
            r#"{"errors":[],"warnings":[],"summary":"no errors found, no warnings found"}"#
        );
        assert_eq!(decode(&json).unwrap().parse_dump, None);
    }

    #[test]
    fn test_diagnostics_travel_as_lines() {
        let errors = vec![Diagnostic::new(DiagnosticKind::Syntax, "unexpected `)`", 2, 4)];
        let result = LintResult::new(errors, Vec::new(), Some("Program 1:1-1:1\n".into()));
        let wire = decode(&encode(&result).unwrap()).unwrap();
        assert_eq!(wire.errors, vec!["2:4: unexpected `)`"]);
        assert_eq!(wire.summary, "1 error found, no warnings found");
        assert_eq!(wire.parse_dump.as_deref(), Some("Program 1:1-1:1\n"));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(matches!(decode("{\"errors\":"), Err(LintError::Encode(_))));
    }
}
