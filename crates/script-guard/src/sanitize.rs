//! The sanitizer: unknown-call stripping followed by fragile-op guarding.

use studio_types::Diagnostic;
use tracing::{info, instrument};

use crate::config::GuardConfig;
use crate::fragile::guard_fragile_ops;
use crate::registry::NameRegistry;
use crate::strip::strip_unknown_calls;

/// Source text of a generated program. Sanitizing produces a new `Script`;
/// the input is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Script(String);

impl Script {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Script {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Script {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitize with the default configuration.
pub fn sanitize(script: &Script) -> (Script, Vec<Diagnostic>) {
    sanitize_with(script, &GuardConfig::default())
}

/// Strip unknown calls, then guard fragile operations.
///
/// Never fails: a script that does not parse skips stripping and still gets
/// the line-based guard.
#[instrument(skip_all, fields(bytes = script.as_str().len()))]
pub fn sanitize_with(script: &Script, config: &GuardConfig) -> (Script, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let stripped = if config.strip_unknown {
        let (text, diags) =
            strip_unknown_calls(script.as_str(), NameRegistry::global(), &config.extra_known_names);
        diagnostics.extend(diags);
        text
    } else {
        script.as_str().to_string()
    };
    let stripped_count = diagnostics.len();

    let (guarded, diags) = guard_fragile_ops(&stripped, &config.fragile_ops);
    diagnostics.extend(diags);

    info!(
        stripped = stripped_count,
        guarded = diagnostics.len() - stripped_count,
        "sanitized script"
    );
    (Script(guarded), diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_types::DiagnosticKind;

    #[test]
    fn strips_then_guards() {
        let src = Script::new("part = Box(2, 2, 2)\npart = part.fillet(0.5)\nshow_object(part)\nresult = part\n");
        let (out, diags) = sanitize(&src);
        assert_eq!(
            out.as_str(),
            "part = Box(2, 2, 2)\n# auto-fillet-guard\ntry:\n    part = part.fillet(0.5)\nexcept Exception:\n    pass\n\
             pass  # stripped unknown: show_object\nresult = part\n"
        );
        let kinds: Vec<_> = diags.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::StrippedCall, DiagnosticKind::GuardedOp]);
        assert_eq!(diags[0].line, Some(3));
        assert_eq!(diags[1].line, Some(2));
    }

    #[test]
    fn input_is_left_untouched() {
        let src = Script::new("show()\n");
        let before = src.clone();
        let _ = sanitize(&src);
        assert_eq!(src, before);
    }

    #[test]
    fn unparseable_script_still_gets_guarded() {
        let src = Script::new("p = p.fillet(1)\nx = (\n");
        let (out, diags) = sanitize(&src);
        assert!(out.as_str().starts_with("# auto-fillet-guard\ntry:\n"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::GuardedOp);
    }

    #[test]
    fn modeling_api_and_exception_classes_survive() {
        let src = Script::new(
            "\
with BuildLine() as path:
    Bezier((0, 0), (1, 1), (2, 0))
    EllipticalCenterArc((0, 0), 2, 1)
hinge = RigidJoint('hinge', to_part=None)
if path is None:
    raise TimeoutError('slow')
result = path
",
        );
        let (out, diags) = sanitize(&src);
        assert_eq!(out, src);
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn guard_only_config_keeps_unknown_calls() {
        let src = Script::new("mystery()\n");
        let (out, diags) = sanitize_with(&src, &GuardConfig::guard_only());
        assert_eq!(out, src);
        assert!(diags.is_empty());
    }
}
