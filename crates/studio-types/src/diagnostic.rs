use serde::{Deserialize, Serialize};

/// What kind of recovery a diagnostic records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A statement calling an unknown bare name was replaced with a no-op.
    StrippedCall,
    /// A fragile operation line was wrapped in local failure containment.
    GuardedOp,
    /// Disjoint solids were fused into one.
    FuseApplied,
    /// A fusion step was reported as failed by the kernel.
    FuseFailed,
}

/// A non-fatal finding accumulated by a pipeline stage.
///
/// Diagnostics are surfaced to the caller as warnings, on success and on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub detail: String,
    /// 1-based source line, when the finding is tied to one.
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            line: None,
        }
    }

    pub fn at_line(kind: DiagnosticKind, detail: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            detail: detail.into(),
            line: Some(line),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::StrippedCall => "stripped-call",
            DiagnosticKind::GuardedOp => "guarded-op",
            DiagnosticKind::FuseApplied => "fuse-applied",
            DiagnosticKind::FuseFailed => "fuse-failed",
        };
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", kind, line, self.detail),
            None => write!(f, "[{}] {}", kind, self.detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_when_present() {
        let d = Diagnostic::at_line(DiagnosticKind::StrippedCall, "show", 4);
        assert_eq!(d.to_string(), "[stripped-call] line 4: show");

        let d = Diagnostic::new(DiagnosticKind::FuseApplied, "3 solids merged into 1");
        assert_eq!(d.to_string(), "[fuse-applied] 3 solids merged into 1");
    }

    #[test]
    fn kind_serializes_kebab_case() {
        let json = serde_json::to_string(&DiagnosticKind::GuardedOp).unwrap();
        assert_eq!(json, "\"guarded-op\"");
    }
}
