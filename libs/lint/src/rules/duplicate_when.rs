//! # Duplicate `when` Values
//!
//! Within one `case`, a literal value that already appeared in an earlier
//! `when` can never match again. The later occurrence is reported.
//!
//! Values are compared by what they denote, not how they are spelled:
//! `when 8` and `when 0x8` collide, `when "a"` and `when :a` do not.

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use ruby_parser::{Cst, NodeId, NodeKind};
use std::collections::HashMap;

/// A literal reduced to the value it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralKey {
    Integer(i128),
    /// Bit pattern of the parsed `f64`.
    Float(u64),
    String(String),
    Symbol(String),
    Regex(String),
    Nil,
    True,
    False,
}

/// Check one `case` node.
pub fn check_case(cst: &Cst, case: NodeId) -> Vec<Diagnostic> {
    let mut seen: HashMap<LiteralKey, usize> = HashMap::new();
    let mut warnings = Vec::new();

    let clauses = cst.children(case).iter().filter(|id| cst.kind(**id) == NodeKind::When);
    for clause in clauses {
        let Some(values) = cst.children(*clause).first() else {
            continue;
        };
        for value in cst.children(*values) {
            let Some(key) = literal_key(cst, *value) else {
                continue;
            };
            let start = cst.node(*value).span.start;
            match seen.get(&key) {
                Some(first_line) => warnings.push(Diagnostic::warning_at(
                    DiagnosticKind::DuplicateWhenValue,
                    format!(
                        "duplicated `when` clause value `{}` (first seen on line {first_line}) is ignored",
                        source_text(cst, *value)
                    ),
                    start,
                )),
                None => {
                    seen.insert(key, start.display_line());
                }
            }
        }
    }

    warnings
}

/// The value a literal node denotes, if it is a plain literal.
///
/// Interpolated strings and anything computed return `None`.
pub fn literal_key(cst: &Cst, id: NodeId) -> Option<LiteralKey> {
    let node = cst.node(id);
    let text = node.text.as_deref();
    match node.kind {
        NodeKind::Integer => parse_integer(text?).map(LiteralKey::Integer),
        NodeKind::Float => parse_float(text?).map(LiteralKey::Float),
        NodeKind::String => text.map(|value| LiteralKey::String(value.to_string())),
        NodeKind::Character => text?.strip_prefix('?').map(|value| LiteralKey::String(value.to_string())),
        NodeKind::Symbol if node.children.is_empty() => text.map(|value| LiteralKey::Symbol(value.to_string())),
        NodeKind::Regex => text.map(|value| LiteralKey::Regex(value.to_string())),
        NodeKind::Nil => Some(LiteralKey::Nil),
        NodeKind::True => Some(LiteralKey::True),
        NodeKind::False => Some(LiteralKey::False),
        // `-1`
        NodeKind::Unary if text == Some("-") => match literal_key(cst, *node.children.first()?)? {
            LiteralKey::Integer(value) => Some(LiteralKey::Integer(-value)),
            LiteralKey::Float(bits) => Some(LiteralKey::Float((-f64::from_bits(bits)).to_bits())),
            _ => None,
        },
        _ => None,
    }
}

/// Integer value of a Ruby integer literal in any base.
fn parse_integer(text: &str) -> Option<i128> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = lower.strip_prefix("0d") {
        (10, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    i128::from_str_radix(body, radix).ok()
}

fn parse_float(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    digits.parse::<f64>().ok().map(f64::to_bits)
}

/// Source spelling of a value, for the message.
fn source_text(cst: &Cst, id: NodeId) -> String {
    let node = cst.node(id);
    match node.kind {
        NodeKind::String => format!("\"{}\"", node.text.as_deref().unwrap_or_default()),
        NodeKind::Symbol => format!(":{}", node.text.as_deref().unwrap_or_default()),
        NodeKind::Regex => format!("/{}/", node.text.as_deref().unwrap_or_default()),
        NodeKind::Nil => "nil".to_string(),
        NodeKind::True => "true".to_string(),
        NodeKind::False => "false".to_string(),
        NodeKind::Unary => {
            let operand = node.children.first().map(|child| source_text(cst, *child)).unwrap_or_default();
            format!("-{operand}")
        }
        _ => node.text.clone().unwrap_or_default(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
