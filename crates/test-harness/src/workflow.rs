//! ScriptSession: a fluent API for driving the pipeline in tests.
//!
//! Runs scripts through `export_ops::sanitize_and_run` against a `MockKernel`,
//! keeps the latest outcome, and exposes the downstream stages (export, mesh
//! check, orientation) on the resulting solid.

use export_ops::{
    check_solid, export_solid, orient_solid, sanitize_and_run, FatalError, PipelineConfig,
    RunOutput,
};
use kernel_bridge::{ExportFormat, FusePolicy, Kernel, MockKernel, MOCK_BUILTINS};
use mesh_audit::{IntegrityConfig, MeshReport, OrientationConfig, OrientationResult};
use script_guard::Script;
use studio_types::{Diagnostic, TriMesh};

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

/// A pipeline session over one mock kernel.
#[derive(Debug)]
pub struct ScriptSession {
    pub kernel: MockKernel,
    config: PipelineConfig,
    integrity: IntegrityConfig,
    orientation: OrientationConfig,
    last: Option<(Script, Result<RunOutput, FatalError>)>,
    history: Vec<(String, String)>,
}

impl Default for ScriptSession {
    fn default() -> Self {
        Self::mock()
    }
}

impl ScriptSession {
    /// Mock kernel with its builtins registered as known names.
    pub fn mock() -> Self {
        Self::with_kernel(MockKernel::new())
    }

    pub fn with_kernel(kernel: MockKernel) -> Self {
        Self {
            kernel,
            config: PipelineConfig::with_known(MOCK_BUILTINS.iter().copied()),
            integrity: IntegrityConfig::default(),
            orientation: OrientationConfig::default(),
            last: None,
            history: Vec::new(),
        }
    }

    /// Mock kernel whose fusion behaves per `policy`.
    pub fn with_fuse_policy(policy: FusePolicy) -> Self {
        Self::with_kernel(MockKernel::new().with_fuse_policy(policy))
    }

    pub fn configure(mut self, f: impl FnOnce(&mut PipelineConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_orientation(mut self, config: OrientationConfig) -> Self {
        self.orientation = config;
        self
    }

    pub fn with_integrity(mut self, config: IntegrityConfig) -> Self {
        self.integrity = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // ── Running ─────────────────────────────────────────────────────────

    /// Run `script`; the outcome replaces the previous one.
    pub fn run(&mut self, script: &str) -> &mut Self {
        let script = Script::new(script);
        let outcome = sanitize_and_run(&mut self.kernel, &script, &self.config);
        let summary = match &outcome {
            Ok(out) => format!("ok, {} diagnostics", out.diagnostics.len()),
            Err(err) => format!("fatal: {}", err),
        };
        self.history.push((first_line(script.as_str()), summary));
        self.last = Some((script, outcome));
        self
    }

    /// The latest successful run.
    pub fn output(&self) -> Result<&RunOutput, HarnessError> {
        match &self.last {
            None => Err(HarnessError::NoRun),
            Some((_, Ok(out))) => Ok(out),
            Some((_, Err(err))) => Err(HarnessError::UnexpectedOutcome {
                detail: format!("expected success, got fatal: {}", err),
            }),
        }
    }

    /// The latest fatal outcome.
    pub fn fatal(&self) -> Result<&FatalError, HarnessError> {
        match &self.last {
            None => Err(HarnessError::NoRun),
            Some((_, Err(err))) => Ok(err),
            Some((_, Ok(out))) => Err(HarnessError::UnexpectedOutcome {
                detail: format!(
                    "expected a fatal error, run succeeded with {} diagnostics",
                    out.diagnostics.len()
                ),
            }),
        }
    }

    /// Diagnostics of the latest run, whichever way it ended.
    pub fn diagnostics(&self) -> Result<&[Diagnostic], HarnessError> {
        match &self.last {
            None => Err(HarnessError::NoRun),
            Some((_, Ok(out))) => Ok(&out.diagnostics),
            Some((_, Err(err))) => Ok(&err.diagnostics),
        }
    }

    /// The script as submitted in the latest run.
    pub fn submitted(&self) -> Result<&Script, HarnessError> {
        self.last.as_ref().map(|(s, _)| s).ok_or(HarnessError::NoRun)
    }

    // ── Downstream Stages ───────────────────────────────────────────────

    pub fn tessellate(&mut self) -> Result<TriMesh, HarnessError> {
        let handle = self.output()?.solid.handle.clone();
        let tol = self.config.tessellation_tolerance;
        self.kernel
            .tessellate(&handle, tol)
            .map_err(|e| HarnessError::stage("tessellate", e))
    }

    pub fn check(&mut self) -> Result<MeshReport, HarnessError> {
        let solid = self.output()?.solid.clone();
        check_solid(&mut self.kernel, &solid, self.config.tessellation_tolerance, &self.integrity)
            .map_err(|e| HarnessError::stage("check", e))
    }

    pub fn orient(&mut self) -> Result<OrientationResult, HarnessError> {
        let solid = self.output()?.solid.clone();
        orient_solid(&mut self.kernel, &solid, self.config.tessellation_tolerance, &self.orientation)
            .map_err(|e| HarnessError::stage("orient", e))
    }

    pub fn export(&mut self, format: ExportFormat) -> Result<Vec<u8>, HarnessError> {
        let solid = self.output()?.solid.clone();
        export_solid(&mut self.kernel, &solid, format).map_err(|e| HarnessError::stage("export", e))
    }

    /// Brute-force oracles on the tessellated solid, plus agreement with
    /// the integrity report.
    pub fn oracles(&mut self) -> Result<Vec<OracleVerdict>, HarnessError> {
        let mesh = self.tessellate()?;
        let report = self.check()?;
        let mut verdicts = oracle::run_all_mesh_checks(&mesh);
        verdicts.push(oracle::check_report_agrees(&mesh, &report));
        Ok(verdicts)
    }

    // ── Inline Assertions ───────────────────────────────────────────────

    pub fn assert_ok(&self) -> Result<&Self, HarnessError> {
        self.output()?;
        Ok(self)
    }

    pub fn assert_solid_count(&mut self, expected: usize) -> Result<&mut Self, HarnessError> {
        let handle = self.output()?.solid.handle.clone();
        let count = self
            .kernel
            .count_solids(&handle)
            .map_err(|e| HarnessError::stage("count_solids", e))?;
        if count != expected {
            return Err(HarnessError::AssertionFailed {
                detail: format!("expected {} solids, got {}", expected, count),
            });
        }
        Ok(self)
    }

    /// `(first script line, outcome summary)` for every run so far.
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }
}

fn first_line(script: &str) -> String {
    script.lines().next().unwrap_or("").trim().to_string()
}
