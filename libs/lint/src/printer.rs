//! # Parse Tree Printer
//!
//! Renders a CST as an indented outline for the optional parse dump.
//! One line per node:
//!
//! ```text
//! Program 1:1-2:4
//!   MethodDef "greet" 1:1-2:4
//!     Parameters 1:10-1:16
//! ```
//!
//! Positions are 1-based `line:column` pairs. Errors recorded on the tree
//! are not printed; they travel in the report.

use ruby_parser::{Cst, Node, NodeId};
use std::fmt::Write;

/// Indentation per tree level.
const INDENT: &str = "  ";

/// Render `cst` starting at its root.
pub fn dump(cst: &Cst) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(cst.root, 0)];

    // Explicit stack keeps deep trees off the call stack.
    while let Some((id, depth)) = stack.pop() {
        write_node(&mut out, cst.node(id), depth);
        for child in cst.children(id).iter().rev() {
            stack.push((*child, depth + 1));
        }
    }

    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    let _ = write!(out, "{:?}", node.kind);
    if let Some(text) = &node.text {
        let _ = write!(out, " {text:?}");
    }
    let (start, end) = (node.span.start, node.span.end);
    let _ = writeln!(
        out,
        " {}:{}-{}:{}",
        start.display_line(),
        start.display_column(),
        end.display_line(),
        end.display_column()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_indents_children() {
        let cst = ruby_parser::parse("x = 1");
        let dump = dump(&cst);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "Program 1:1-1:6");
        assert_eq!(lines[1], "  Assignment 1:1-1:6");
        assert_eq!(lines[2], "    LocalTarget \"x\" 1:1-1:2");
        assert_eq!(lines[3], "    Integer \"1\" 1:5-1:6");
    }

    #[test]
    fn test_dump_escapes_text() {
        let cst = ruby_parser::parse("puts \"a\\nb\"");
        assert!(dump(&cst).contains("String \"a\\\\nb\""));
    }
}
