//! Static policy scan run before execution.
//!
//! Patterns run over scanned code (string contents and comments blanked), so a
//! banned name inside a string literal or a comment never matches.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scan::LineScanner;
use crate::syntax::outline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyFinding {
    pub level: FindingLevel,
    pub code: String,
    pub message: String,
}

impl PolicyFinding {
    fn error(code: &str, message: &str) -> Self {
        Self {
            level: FindingLevel::Error,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    fn warning(code: &str, message: &str) -> Self {
        Self {
            level: FindingLevel::Warning,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == FindingLevel::Error
    }
}

// ── Patterns ────────────────────────────────────────────────────────────────

const BANNED: &[(&str, &str, &str)] = &[
    (
        r"(?m)(?:^|[^.\w])open\s*\(",
        "file_io",
        "Direct file I/O is not allowed.",
    ),
    (
        r"\bos\s*\.",
        "os_access",
        "OS access is not allowed in generated code.",
    ),
    (
        r"\bsubprocess\b",
        "subprocess",
        "Subprocess execution is not allowed.",
    ),
    (
        r"\bsocket\b",
        "network_socket",
        "Network access is not allowed in generated code.",
    ),
    (
        r"\brequests\b|\burllib\b|\bhttpx\b",
        "network_http",
        "HTTP/network libraries are not allowed in generated code.",
    ),
];

/// Two or more top-level commas inside `.translate(...)` with no nested brackets.
const TRANSLATE_POSITIONALS: &str = r"\.translate\s*\(\s*[^()]*?,\s*[^()]*?,\s*[^()]*?\)";

struct Patterns {
    banned: Vec<(Regex, &'static str, &'static str)>,
    translate: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        let banned = BANNED
            .iter()
            .map(|&(pat, code, message)| Ok((Regex::new(pat)?, code, message)))
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self {
            banned,
            translate: Regex::new(TRANSLATE_POSITIONALS)?,
        })
    }

    /// Compiled once per process; `None` if a pattern failed to compile.
    fn get() -> Option<&'static Patterns> {
        static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
        PATTERNS.get_or_init(|| Patterns::compile().ok()).as_ref()
    }
}

// ── Scan ────────────────────────────────────────────────────────────────────

/// Scan `script` for banned capabilities and a missing result binding.
///
/// Banned capabilities are errors. A missing binding is only a warning: the
/// executor reports it as `NoResultBinding` once the script has run.
pub fn scan_policy(script: &str, result_binding: &str) -> Vec<PolicyFinding> {
    let mut scanner = LineScanner::new();
    let code = script
        .split('\n')
        .map(|line| scanner.scan(line).code)
        .collect::<Vec<_>>()
        .join("\n");

    let mut findings = Vec::new();
    if !binds(script, &code, result_binding) {
        findings.push(PolicyFinding::warning(
            "missing_result",
            &format!("Code must assign final geometry to `{}`.", result_binding),
        ));
    }

    let Some(patterns) = Patterns::get() else {
        findings.push(PolicyFinding::error(
            "policy_unavailable",
            "Policy patterns could not be compiled.",
        ));
        return findings;
    };
    for (re, code_id, message) in &patterns.banned {
        if re.is_match(&code) {
            findings.push(PolicyFinding::error(code_id, message));
        }
    }
    if patterns.translate.is_match(&code) {
        findings.push(PolicyFinding::warning(
            "translate_signature",
            "`.translate()` should receive a single tuple argument: `.translate((x, y, z))`.",
        ));
    }

    debug!(findings = findings.len(), "policy scan finished");
    findings
}

/// Codes of the error-level findings, in scan order.
pub fn blocking_codes(findings: &[PolicyFinding]) -> Vec<String> {
    findings
        .iter()
        .filter(|f| f.is_error())
        .map(|f| f.code.clone())
        .collect()
}

/// Whether the script binds `name` in any binding form. Scripts the parser
/// rejects fall back to a plain `name =` / `name: T =` line match on `code`.
fn binds(script: &str, code: &str, name: &str) -> bool {
    match outline(script) {
        Ok(o) => o.bound.contains(name),
        Err(_) => {
            let pat = format!(r"(?m)^\s*{}\s*(?::[^=\n]*)?=(?:[^=]|$)", regex::escape(name));
            Regex::new(&pat).is_ok_and(|re| re.is_match(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(script: &str) -> Vec<String> {
        scan_policy(script, "result").into_iter().map(|f| f.code).collect()
    }

    #[test]
    fn patterns_compile() {
        assert!(Patterns::compile().is_ok());
        assert!(Patterns::get().is_some());
    }

    #[test]
    fn clean_script_has_no_findings() {
        assert!(codes("part = Box(1, 2, 3)\nresult = part\n").is_empty());
    }

    #[test]
    fn missing_result_is_a_warning() {
        let findings = scan_policy("part = Box(1, 1, 1)\nresult == part\n", "result");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "missing_result");
        assert_eq!(findings[0].level, FindingLevel::Warning);
        assert!(blocking_codes(&findings).is_empty());
    }

    #[test]
    fn every_binding_form_counts_as_a_result() {
        for script in [
            "result, spare = Box(1, 1, 1), 0\n",
            "(result) = Box(1, 1, 1)\n",
            "with BuildPart() as result:\n    Box(1, 1, 1)\n",
            "for result in [Box(1, 1, 1)]:\n    pass\n",
            "result = Box(1, 1, 1)\nresult += 0\n",
            "if True:\n    result = Box(1, 1, 1)\n",
            "[first, *result] = parts\n",
        ] {
            assert!(codes(script).is_empty(), "{:?}", script);
        }
    }

    #[test]
    fn annotated_and_custom_bindings_count() {
        assert!(codes("result: Part = Box(1, 1, 1)\n").is_empty());
        let findings = scan_policy("shape = Box(1, 1, 1)\n", "shape");
        assert!(findings.is_empty());
    }

    #[test]
    fn unparsable_script_falls_back_to_line_match() {
        let script = "match x:\n    case 1:\n        pass\nresult = Box(1, 1, 1)\n";
        assert!(codes(script).is_empty());
        let findings = scan_policy("match x:\n    case 1:\n        result == 1\n", "result");
        assert_eq!(findings[0].code, "missing_result");
    }

    #[test]
    fn banned_capabilities_are_reported() {
        let script = "\
import os, subprocess, socket, requests
data = open('f.txt').read()
os.remove('f.txt')
result = 1
";
        assert_eq!(
            codes(script),
            vec!["file_io", "os_access", "subprocess", "network_socket", "network_http"]
        );
    }

    #[test]
    fn strings_comments_and_methods_do_not_match() {
        let script = "\
label = 'open(os.path) subprocess'
# import socket
door = hinge.open(90)
pos.x = 1
result = door
";
        assert!(codes(script).is_empty());
    }

    #[test]
    fn open_at_line_start_is_a_call() {
        assert_eq!(codes("open('x')\nresult = 1\n"), vec!["file_io"]);
    }

    #[test]
    fn translate_with_positionals_is_a_warning() {
        let findings = scan_policy("result = b.translate(1, 2, 3)\n", "result");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].level, FindingLevel::Warning);
        assert_eq!(findings[0].code, "translate_signature");
        assert!(blocking_codes(&findings).is_empty());
        assert!(codes("result = b.translate((1, 2, 3))\n").is_empty());
    }

    #[test]
    fn finding_level_serializes_snake_case() {
        let f = PolicyFinding::error("file_io", "x");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["level"], "error");
    }
}
