//! # Literal Token Rules
//!
//! Warnings that only need the token stream: ambiguous regexp openers and
//! leading-zero octal integers. Tokens inside a region the parser already
//! reported and discarded are skipped.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use ruby_parser::{Span, Token, TokenKind};

/// Check every token outside `error_spans`.
pub fn check_tokens(tokens: &[Token], error_spans: &[Span]) -> Vec<Diagnostic> {
    tokens
        .iter()
        .filter(|token| !inside_error(token, error_spans))
        .filter_map(check_token)
        .collect()
}

fn check_token(token: &Token) -> Option<Diagnostic> {
    match token.kind {
        TokenKind::RegexBegin if token.flags.ambiguous => Some(Diagnostic::warning_at(
            DiagnosticKind::AmbiguousRegex,
            "ambiguous first argument; put parentheses or a space even after `/` operator",
            token.span.start,
        )),
        TokenKind::LegacyOctalInteger => {
            let digits = match token.text.trim_start_matches(['0', '_']) {
                "" => "0",
                digits => digits,
            };
            Some(Diagnostic::warning_at(
                DiagnosticKind::LegacyOctal,
                format!(
                    "integer literal `{}` has a leading zero and is read as octal; write `0o{digits}` if that is intended",
                    token.text
                ),
                token.span.start,
            ))
        }
        _ => None,
    }
}

fn inside_error(token: &Token, error_spans: &[Span]) -> bool {
    error_spans.iter().any(|span| span.contains(token.span.start.byte))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn warnings(source: &str) -> Vec<Diagnostic> {
        let parsed = ruby_parser::parse_source(source, Default::default());
        check_tokens(&parsed.tokens, &parsed.cst.error_spans())
    }

    #[test]
    fn test_ambiguous_regex_argument() {
        let found = warnings("p /regexp/");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DiagnosticKind::AmbiguousRegex);
        assert_eq!((found[0].line, found[0].column), (1, 3));
    }

    #[test]
    fn test_unambiguous_regex_and_division() {
        assert!(warnings("p(/regexp/)\nx = /a/\ny = 4\ny / 2").is_empty());
    }

    #[test]
    fn test_legacy_octal_once() {
        let found = warnings("num = 0123\nok = 0o123\nzero = 0");
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].line, found[0].column), (1, 7));
        assert!(found[0].message.contains("`0o123`"));
    }

    #[test]
    fn test_legacy_octal_of_zeros_suggests_zero() {
        let found = warnings("y = 00\nz = 0_0");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|w| w.message.contains("write `0o0`")), "{found:?}");
    }

    #[test]
    fn test_tokens_inside_discarded_statements_are_skipped() {
        let found = warnings("x = (0123 +\n");
        assert!(found.is_empty());
    }
}
