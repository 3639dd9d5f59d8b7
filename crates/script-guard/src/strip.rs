//! Unknown-call stripping.
//!
//! A logical line that calls a bare name neither registered nor bound by the
//! script itself is replaced with a no-op carrying the offending names. The
//! whole statement goes; there is no partial-expression repair.

use std::collections::BTreeMap;

use studio_types::{Diagnostic, DiagnosticKind};
use tracing::{debug, warn};

use crate::registry::NameRegistry;
use crate::scan::indent_of;
use crate::syntax::{outline, Clause, LineKind, LogicalLine};

pub const STRIP_ANNOTATION: &str = "# stripped unknown:";

/// Strip statements calling unknown bare names.
///
/// A script that fails to parse is returned unchanged with no diagnostics.
pub fn strip_unknown_calls(
    script: &str,
    registry: &NameRegistry,
    extra_known: &[String],
) -> (String, Vec<Diagnostic>) {
    let outline = match outline(script) {
        Ok(o) => o,
        Err(err) => {
            debug!(error = %err, "script does not parse, stripping skipped");
            return (script.to_string(), Vec::new());
        }
    };

    let is_known = |name: &str| {
        registry.contains(name)
            || outline.bound.contains(name)
            || extra_known.iter().any(|k| k == name)
    };

    // logical line index -> flagged names, first-seen order
    let mut flagged: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for call in &outline.calls {
        if is_known(&call.name) {
            continue;
        }
        let names = flagged.entry(call.logical).or_default();
        if !names.contains(&call.name.as_str()) {
            names.push(&call.name);
        }
    }
    if flagged.is_empty() {
        return (script.to_string(), Vec::new());
    }

    let mut lines: Vec<String> = script.split('\n').map(str::to_string).collect();
    let mut diagnostics = Vec::with_capacity(flagged.len());
    for (idx, names) in flagged {
        let logical = &outline.lines[idx];
        let names = names.join(", ");
        let first = logical.first_line - 1;
        lines[first] = replacement(&lines[first], logical, &names);
        for line in &mut lines[logical.first_line..logical.last_line] {
            line.clear();
        }
        warn!(line = logical.first_line, names = %names, "stripped unknown call");
        diagnostics.push(Diagnostic::at_line(
            DiagnosticKind::StrippedCall,
            names,
            logical.first_line,
        ));
    }

    (lines.join("\n"), diagnostics)
}

/// No-op standing in for a stripped logical line. Headers keep a clause the
/// body below them can still attach to.
fn replacement(original: &str, logical: &LogicalLine, names: &str) -> String {
    let indent = indent_of(original);
    let note = format!("{} {}", STRIP_ANNOTATION, names);
    let clause = match logical.kind {
        LineKind::Simple => return format!("{}pass  {}", indent, note),
        LineKind::Decorator => return format!("{}{}", indent, note),
        LineKind::Header(clause) => clause,
    };
    let head = match clause {
        Clause::Elif => "elif False:",
        Clause::Else => "else:",
        Clause::Try => "try:",
        Clause::Except => "except Exception:",
        Clause::Finally => "finally:",
        Clause::If | Clause::While | Clause::For | Clause::With | Clause::Def | Clause::Class => {
            "if False:"
        }
    };
    let body = if logical.inline_body { " pass" } else { "" };
    format!("{}{}{}  {}", indent, head, body, note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(src: &str) -> (String, Vec<Diagnostic>) {
        strip_unknown_calls(src, NameRegistry::global(), &[])
    }

    #[test]
    fn replaces_simple_statement_with_annotated_pass() {
        let (out, diags) = strip("x = Box(1, 1, 1)\n  \nshow_object(x)\n");
        assert_eq!(out, "x = Box(1, 1, 1)\n  \npass  # stripped unknown: show_object\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::StrippedCall);
        assert_eq!(diags[0].detail, "show_object");
        assert_eq!(diags[0].line, Some(3));
    }

    #[test]
    fn method_calls_and_defined_names_are_kept() {
        let src = "def helper(n):\n    return n\nimport numpy as np\nresult = helper(np.ones(3))\nresult.show()\n";
        let (out, diags) = strip(src);
        assert_eq!(out, src);
        assert!(diags.is_empty());
    }

    #[test]
    fn names_bound_later_in_the_script_still_count() {
        let src = "a = late()\ndef late():\n    return 1\n";
        assert!(strip(src).1.is_empty());
    }

    #[test]
    fn continuation_lines_are_blanked() {
        let (out, _) = strip("if True:\n    x = mystery(\n        1,\n        2)\ny = 1\n");
        assert_eq!(out, "if True:\n    pass  # stripped unknown: mystery\n\n\ny = 1\n");
    }

    #[test]
    fn several_unknown_names_on_one_line_share_a_diagnostic() {
        let (out, diags) = strip("a = foo(bar(1)); baz()\n");
        assert_eq!(out, "pass  # stripped unknown: foo, bar, baz\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].detail, "foo, bar, baz");
    }

    #[test]
    fn headers_keep_their_body_attached() {
        let src = "if ghost(1):\n    a = 1\nelif phantom():\n    a = 2\nelse: spooky()\n";
        let (out, diags) = strip(src);
        assert_eq!(
            out,
            "if False:  # stripped unknown: ghost\n    a = 1\n\
             elif False:  # stripped unknown: phantom\n    a = 2\n\
             else: pass  # stripped unknown: spooky\n"
        );
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn decorators_become_comments() {
        let (out, _) = strip("@register()\ndef f():\n    pass\n");
        assert_eq!(out, "# stripped unknown: register\ndef f():\n    pass\n");
    }

    #[test]
    fn unparseable_scripts_pass_through() {
        let src = "x = (\nshow_object(x)\n";
        let (out, diags) = strip(src);
        assert_eq!(out, src);
        assert!(diags.is_empty());
    }

    #[test]
    fn extra_known_names_are_respected() {
        let extra = vec!["box".to_string()];
        let (out, diags) = strip_unknown_calls("b = box(1, 2, 3)\n", NameRegistry::global(), &extra);
        assert_eq!(out, "b = box(1, 2, 3)\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn trailing_newline_is_preserved_either_way() {
        assert_eq!(strip("show()").0, "pass  # stripped unknown: show");
        assert_eq!(strip("show()\n").0, "pass  # stripped unknown: show\n");
    }
}
