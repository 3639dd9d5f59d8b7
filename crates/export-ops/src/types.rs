use kernel_bridge::ShapeHandle;
use script_guard::{PolicyFinding, Script};
use studio_types::Diagnostic;

/// The single shape handed downstream after normalization: either the only
/// exportable, or a compound grouping all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSolid {
    pub handle: ShapeHandle,
    /// How many exportables were grouped into `handle`.
    pub parts: usize,
}

/// A shape holding exactly one solid, unless repair hit a tooling error and
/// passed the input through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedSolid {
    pub handle: ShapeHandle,
}

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub solid: RepairedSolid,
    /// The script that was actually executed.
    pub script: Script,
    /// Recoverable findings from every stage, in stage order.
    pub diagnostics: Vec<Diagnostic>,
    /// Warning-level policy findings. Never blocking.
    pub policy_warnings: Vec<PolicyFinding>,
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Failures at the execution boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("script raised: {trace}")]
    Runtime { trace: String },

    #[error("script did not assign final geometry to `{binding}`")]
    MissingResult { binding: String },
}

/// Failures while normalizing the result value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("result did not contain exportable geometry")]
    NoGeometry,

    #[error("result mixed geometry with non-geometry values ({})", .examples.join(", "))]
    MixedContent { examples: Vec<String> },
}

/// Why a run was aborted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FatalKind {
    #[error("execution failed: {trace}")]
    ExecutionFailure { trace: String },

    #[error("no result binding `{binding}`")]
    NoResultBinding { binding: String },

    #[error("result did not contain exportable geometry")]
    NoGeometry,

    #[error("result mixed geometry with non-geometry values ({})", .examples.join(", "))]
    MixedContent { examples: Vec<String> },

    #[error("result has {count} disconnected solids ({reason})")]
    SplitBody { count: usize, reason: String },

    #[error("policy violation: {}", .codes.join(", "))]
    PolicyViolation { codes: Vec<String> },

    #[error("export failed: {reason}")]
    Export { reason: String },
}

impl From<ExecutionError> for FatalKind {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Runtime { trace } => FatalKind::ExecutionFailure { trace },
            ExecutionError::MissingResult { binding } => FatalKind::NoResultBinding { binding },
        }
    }
}

impl From<ValidationError> for FatalKind {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NoGeometry => FatalKind::NoGeometry,
            ValidationError::MixedContent { examples } => FatalKind::MixedContent { examples },
        }
    }
}

/// A fatal outcome together with every diagnostic accumulated before it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct FatalError {
    pub kind: FatalKind,
    pub diagnostics: Vec<Diagnostic>,
}

impl FatalError {
    pub fn new(kind: impl Into<FatalKind>) -> Self {
        Self {
            kind: kind.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Put `earlier` ahead of the diagnostics already attached.
    pub fn after(mut self, earlier: &[Diagnostic]) -> Self {
        let mut all = earlier.to_vec();
        all.append(&mut self.diagnostics);
        self.diagnostics = all;
        self
    }
}

/// Failures of the post-export mesh analyses.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("tessellation failed: {0}")]
    Tessellation(#[from] kernel_bridge::KernelError),

    #[error("mesh audit failed: {0}")]
    Audit(#[from] mesh_audit::AuditError),
}
