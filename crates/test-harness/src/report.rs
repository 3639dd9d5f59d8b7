//! Structured text reports of a pipeline run.
//!
//! The text form is for reading in test failures and logs; `to_json` carries
//! the same data for tooling.

use std::fmt;

use mesh_audit::{MeshReport, OrientationResult};
use serde::Serialize;
use studio_types::Diagnostic;

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;
use crate::workflow::ScriptSession;

/// Everything known about the latest run of a session.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub script_lines: usize,
    /// `Ok` with the solid's kernel id, or the fatal message.
    pub outcome: Result<u64, String>,
    pub diagnostics: Vec<Diagnostic>,
    pub mesh: Option<MeshReport>,
    pub orientation: Option<OrientationResult>,
    pub oracle_results: Vec<OracleVerdict>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Pipeline Run Report ===\n\n");
        out.push_str(&format!("Script: {} lines\n", self.script_lines));
        match &self.outcome {
            Ok(id) => out.push_str(&format!("Outcome: solid #{}\n", id)),
            Err(msg) => out.push_str(&format!("Outcome: FATAL {}\n", msg)),
        }

        if self.diagnostics.is_empty() {
            out.push_str("\nDiagnostics: none\n");
        } else {
            out.push_str(&format!("\nDiagnostics ({}):\n", self.diagnostics.len()));
            for d in &self.diagnostics {
                out.push_str(&format!("  {}\n", d));
            }
        }

        if let Some(m) = &self.mesh {
            let verdict = if m.is_manifold() { "OK" } else { "WARN" };
            out.push_str(&format!(
                "\nMesh: {} triangles | Euler {} | volume {:.3} | manifold ({})\n",
                m.triangle_count, m.euler_number, m.volume, verdict,
            ));
            let [min, max] = m.bounds;
            out.push_str(&format!(
                "Bounding Box: ({:.1}, {:.1}, {:.1}) -> ({:.1}, {:.1}, {:.1})\n",
                min[0], min[1], min[2], max[0], max[1], max[2],
            ));
            for issue in &m.issues {
                out.push_str(&format!("  issue: {}\n", issue));
            }
        }

        if let Some(o) = &self.orientation {
            out.push_str(&format!(
                "\nOrientation: rotate {:?} | height {:.3} | overhang {:.2}% | base {:.3} ({} candidates)\n",
                o.rotation, o.height, o.overhang_pct, o.base_area, o.candidates_evaluated,
            ));
        }

        if !self.oracle_results.is_empty() {
            out.push_str(&format!("\nOracle Results ({} checks):\n", self.oracle_results.len()));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl ScriptSession {
    /// Report on the latest run. Mesh sections are filled only on success.
    pub fn report(&mut self) -> Result<RunReport, HarnessError> {
        let script_lines = self.submitted()?.as_str().lines().count();
        let diagnostics = self.diagnostics()?.to_vec();

        let outcome = match self.output() {
            Ok(out) => Ok(out.solid.handle.id()),
            Err(_) => Err(self.fatal()?.to_string()),
        };

        let (mesh, orientation, oracle_results) = if outcome.is_ok() {
            (Some(self.check()?), Some(self.orient()?), self.oracles()?)
        } else {
            (None, None, Vec::new())
        };

        Ok(RunReport {
            script_lines,
            outcome,
            diagnostics,
            mesh,
            orientation,
            oracle_results,
        })
    }
}
