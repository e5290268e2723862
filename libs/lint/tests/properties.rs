//! Property tests over arbitrary and Ruby-shaped input.

use proptest::prelude::*;
use ruby_lint::{codec, lint, Diagnostic, LintOptions};

/// Fragments that recombine into mostly-plausible Ruby.
fn ruby_fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "def f", "def g(a, b = 1)", "end", "class C", "module M", "if x", "elsif y", "else", "unless z",
        "while w", "case v", "when 1", "when 0123", "do |x|", "{ |y| y }", "x = 1", "y = x", "x += 2",
        "p /re/", "[1, 2", "]", "(", ")", "\"str", "'s'", ":sym", "0123", "END { puts 1 }", "begin",
        "rescue => e", "ensure", "yield x", "return", "\n", "\n", ";", " ", "x", ".each", "->(a) { a }",
        "\"#{", "}", "\"a #{x} b\"", "\"#{ \"in\" }\"", "\"", "`ls #{x}`", "/a#{x}/",
    ])
}

fn ruby_like() -> impl Strategy<Value = String> {
    prop::collection::vec(ruby_fragment(), 0..40).prop_map(|parts| parts.join(" "))
}

fn is_sorted(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.windows(2).all(|pair| pair[0].sort_key() <= pair[1].sort_key())
}

fn assert_in_range(source: &str, diagnostics: &[Diagnostic]) {
    let lines = source.split('\n').count();
    for diagnostic in diagnostics {
        assert!(diagnostic.line >= 1 && diagnostic.line <= lines, "{diagnostic} outside {lines} lines");
        assert!(diagnostic.column >= 1, "{diagnostic}");
    }
}

proptest! {
    #[test]
    fn prop_lint_never_panics(source in "\\PC{0,300}") {
        let _ = lint(&source, LintOptions::default().with_parse_dump(true));
    }

    #[test]
    fn prop_diagnostics_sorted_and_in_range(source in ruby_like()) {
        let result = lint(&source, LintOptions::default());
        prop_assert!(is_sorted(result.errors()));
        prop_assert!(is_sorted(result.warnings()));
        assert_in_range(&source, result.errors());
        assert_in_range(&source, result.warnings());
    }

    #[test]
    fn prop_reruns_are_byte_identical(source in ruby_like()) {
        let options = LintOptions::default().with_parse_dump(true);
        let first = codec::encode(&lint(&source, options)).unwrap();
        let second = codec::encode(&lint(&source, options)).unwrap();
        prop_assert_eq!(first, second);
    }
}
