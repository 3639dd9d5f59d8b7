//! Failure containment for geometrically fragile operations.
//!
//! Runs on raw lines with an indentation stack instead of the parse tree, so it
//! also works on scripts the stripping pass rewrote or could not parse. A line
//! calling a fragile operation is wrapped in a local `try`/`except` unless an
//! enclosing protective block already covers it or an earlier pass wrapped it.

use studio_types::{Diagnostic, DiagnosticKind};
use tracing::debug;

use crate::scan::{find_word, indent_of, indent_width, LineScanner};

/// Marker line placed above every wrapped statement.
pub const GUARD_MARKER: &str = "# auto-fillet-guard";

const COMPOUND_KEYWORDS: [&str; 12] = [
    "if", "elif", "else", "for", "while", "with", "try", "except", "finally", "def", "class",
    "async",
];

/// Wrap every unprotected statement that calls one of `ops`.
pub fn guard_fragile_ops(script: &str, ops: &[String]) -> (String, Vec<Diagnostic>) {
    let lines: Vec<&str> = script.split('\n').collect();
    let mut scanner = LineScanner::new();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut diagnostics = Vec::new();

    // Indents of enclosing protective headers.
    let mut protected: Vec<usize> = Vec::new();
    // Indents of `try` statements whose clause chain is still open.
    let mut try_chains: Vec<usize> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        // One statement: the line plus any continuation lines.
        let start = i;
        let scanned = scanner.scan(lines[i]);
        let mut code = scanned.code;
        let mut open = scanned.open;
        i += 1;
        while open && i < lines.len() {
            let next = scanner.scan(lines[i]);
            code.push(' ');
            code.push_str(&next.code);
            open = next.open;
            i += 1;
        }
        let group = &lines[start..i];
        let first = group[0];

        let trimmed = code.trim();
        if trimmed.is_empty() {
            out.extend(group.iter().map(|l| l.to_string()));
            continue;
        }

        let indent = indent_width(first);
        while protected.last().map_or(false, |&top| indent <= top) {
            protected.pop();
        }
        let in_try = !protected.is_empty();

        let keyword = leading_word(trimmed);
        let is_header = trimmed.ends_with(':');
        let continues_chain = is_header && matches!(keyword, "except" | "else" | "finally");
        try_chains.retain(|&c| if continues_chain { c <= indent } else { c < indent });
        if is_header {
            let protective = match keyword {
                "try" => {
                    try_chains.push(indent);
                    true
                }
                "except" | "finally" => true,
                "else" => try_chains.contains(&indent),
                _ => false,
            };
            if protective {
                protected.push(indent);
            }
        }

        let skip = is_header
            || COMPOUND_KEYWORDS.contains(&keyword)
            || in_try
            || first.contains(GUARD_MARKER);
        let op = if skip {
            None
        } else {
            ops.iter().find(|op| calls_op(&code, op))
        };
        let Some(op) = op else {
            out.extend(group.iter().map(|l| l.to_string()));
            continue;
        };

        let ind = indent_of(first);
        out.push(format!("{}{}", ind, GUARD_MARKER));
        out.push(format!("{}try:", ind));
        out.push(format!("{}    {}", ind, first.trim_start()));
        for line in &group[1..] {
            if line.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("    {}", line));
            }
        }
        out.push(format!("{}except Exception:", ind));
        out.push(format!("{}    pass", ind));
        debug!(line = start + 1, op = %op, "guarded fragile operation");
        diagnostics.push(Diagnostic::at_line(
            DiagnosticKind::GuardedOp,
            op.as_str(),
            start + 1,
        ));
    }

    (out.join("\n"), diagnostics)
}

fn leading_word(code: &str) -> &str {
    let end = code
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(code.len());
    &code[..end]
}

/// `op(` called as a bare name or a method, not as part of a longer identifier.
fn calls_op(code: &str, op: &str) -> bool {
    find_word(code, op).any(|at| code[at + op.len()..].starts_with('('))
}
