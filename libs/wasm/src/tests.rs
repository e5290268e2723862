//! Tests for the WASM-facing entry points and the raw boundary protocol.

use super::boundary::*;
use super::*;
use ruby_lint::codec;

/// Drive the raw protocol the way a host does and return the decoded report.
fn lint_through_boundary(source: &str) -> ruby_lint::WireReport {
    let bytes = source.as_bytes();
    unsafe {
        let input = alloc_input(bytes.len());
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), input, bytes.len());

        let output = lint_source(input, bytes.len());
        assert!(!output.is_null());
        let len = result_len();
        let json = std::str::from_utf8(std::slice::from_raw_parts(output, len))
            .expect("report is UTF-8")
            .to_string();

        free_result(output, len);
        free_input(input, bytes.len());
        codec::decode(&json).expect("report decodes")
    }
}

/// Confirms the internal helper returns an explicit clean summary.
#[test]
fn lint_internal_reports_clean_source() {
    let json = lint_ruby_internal("puts 'hi'", false).expect("lint succeeds");
    let report = codec::decode(&json).unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(report.summary, "no errors found, no warnings found");
    assert!(!json.contains("parse_dump"));
}

#[test]
fn lint_internal_attaches_dump_on_request() {
    let report = codec::decode(&lint_ruby_internal("x = 1", true).unwrap()).unwrap();
    assert!(report.parse_dump.is_some_and(|dump| dump.starts_with("Program")));
}

/// Syntax errors are part of the report, not a boundary fault.
#[test]
fn raw_protocol_round_trips_errors_and_warnings() {
    let report = lint_through_boundary("def broken\n  num = 0123\n");
    assert_eq!(
        report.errors,
        vec!["1:1: unexpected end of input, expected `end` to close `def`"]
    );
    assert!(report.warnings.is_empty());

    let report = lint_through_boundary("num = 0123\n");
    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn raw_protocol_handles_empty_input() {
    let report = lint_through_boundary("");
    assert_eq!(report.summary, "no errors found, no warnings found");
}

#[test]
fn raw_protocol_includes_dump_when_requested() {
    let source = b"x = 1";
    unsafe {
        let output = lint_source_with_dump(source.as_ptr(), source.len());
        let len = result_len();
        let json = std::str::from_utf8(std::slice::from_raw_parts(output, len)).unwrap().to_string();
        free_result(output, len);
        assert!(codec::decode(&json).unwrap().parse_dump.is_some());
    }
}

/// Invalid UTF-8 is a distinct fault, never an empty report.
#[test]
fn raw_protocol_signals_invalid_utf8() {
    let source = [b'x', b' ', b'=', 0xff];
    unsafe {
        let output = lint_source(source.as_ptr(), source.len());
        assert!(output.is_null());
        assert_eq!(result_len(), 0);

        let message = std::slice::from_raw_parts(last_error_ptr(), last_error_len());
        let message = std::str::from_utf8(message).unwrap();
        assert!(message.contains("valid up to byte 3"), "{message}");
    }
}

#[test]
fn raw_protocol_rejects_null_input() {
    unsafe {
        assert!(lint_source(std::ptr::null(), 4).is_null());
        let message = std::slice::from_raw_parts(last_error_ptr(), last_error_len());
        assert_eq!(message, b"input pointer is null");
    }
}

#[test]
fn successful_call_clears_previous_fault() {
    unsafe {
        let _ = lint_source(std::ptr::null(), 0);
    }
    let _ = lint_through_boundary("puts 1");
    assert_eq!(last_error_len(), 0);
}

#[test]
fn rented_buffer_returns_what_it_lent() {
    let buffer = RentedBuffer::from(b"abc".to_vec());
    let len = buffer.len();
    let ptr = buffer.into_raw();
    let back = unsafe { RentedBuffer::from_raw(ptr, len) }.unwrap();
    assert_eq!(back.as_bytes(), b"abc");
    assert!(unsafe { RentedBuffer::from_raw(std::ptr::null_mut(), 0) }.is_none());
}

#[test]
fn report_handle_lines_match_codec() {
    let handle = lint_ruby_report("p /re/\n", false);
    assert_eq!(handle.error_count(), 0);
    assert_eq!(handle.warning_lines().len(), 1);
    assert!(handle.warning_lines()[0].starts_with("1:3: ambiguous first argument"));
    assert!(!handle.is_clean());
}
