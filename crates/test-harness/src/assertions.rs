//! Rich assertion helpers with diagnostic output.
//!
//! Every failure includes the context label, expected vs actual, and the
//! accumulated diagnostics where they help explain the outcome.

use export_ops::{FatalError, FatalKind};
use mesh_audit::{MeshReport, OrientationResult};
use studio_types::{Diagnostic, DiagnosticKind};

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

fn failed(ctx: &str, detail: String) -> HarnessError {
    HarnessError::AssertionFailed {
        detail: format!("[{}] {}", ctx, detail),
    }
}

fn listing(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "(no diagnostics)".to_string();
    }
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Assert the diagnostic kinds, in order.
pub fn assert_diagnostic_kinds(
    diagnostics: &[Diagnostic],
    expected: &[DiagnosticKind],
    ctx: &str,
) -> Result<(), HarnessError> {
    let actual: Vec<DiagnosticKind> = diagnostics.iter().map(|d| d.kind).collect();
    if actual == expected {
        Ok(())
    } else {
        Err(failed(
            ctx,
            format!("expected kinds {:?}, got {}", expected, listing(diagnostics)),
        ))
    }
}

/// Assert some diagnostic's detail mentions `needle`.
pub fn assert_diagnostic_mentions(
    diagnostics: &[Diagnostic],
    needle: &str,
    ctx: &str,
) -> Result<(), HarnessError> {
    if diagnostics.iter().any(|d| d.detail.contains(needle)) {
        Ok(())
    } else {
        Err(failed(
            ctx,
            format!("no diagnostic mentions {:?}: {}", needle, listing(diagnostics)),
        ))
    }
}

/// Assert a fatal outcome of the expected kind.
pub fn assert_fatal(
    err: &FatalError,
    expected: impl Fn(&FatalKind) -> bool,
    ctx: &str,
) -> Result<(), HarnessError> {
    if expected(&err.kind) {
        Ok(())
    } else {
        Err(failed(
            ctx,
            format!("unexpected fatal kind {:?} ({})", err.kind, listing(&err.diagnostics)),
        ))
    }
}

/// Assert the mesh is manifold, listing the report's issues if not.
pub fn assert_manifold(report: &MeshReport, ctx: &str) -> Result<(), HarnessError> {
    if report.is_manifold() {
        Ok(())
    } else {
        Err(failed(ctx, format!("not manifold: {}", report.issues.join("; "))))
    }
}

/// Assert the reported volume within `tol`.
pub fn assert_volume(report: &MeshReport, expected: f64, tol: f64, ctx: &str) -> Result<(), HarnessError> {
    if (report.volume - expected).abs() <= tol {
        Ok(())
    } else {
        Err(failed(
            ctx,
            format!("volume: expected {:.6}, got {:.6} (tol={})", expected, report.volume, tol),
        ))
    }
}

/// Assert the reported bounding box within `tol` on every coordinate.
pub fn assert_bounds(
    report: &MeshReport,
    expected_min: [f64; 3],
    expected_max: [f64; 3],
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let [min, max] = report.bounds;
    for i in 0..3 {
        if (min[i] - expected_min[i]).abs() > tol {
            return Err(failed(
                ctx,
                format!("bounding box min[{}]: expected {:.3}, got {:.3} (tol={})", i, expected_min[i], min[i], tol),
            ));
        }
        if (max[i] - expected_max[i]).abs() > tol {
            return Err(failed(
                ctx,
                format!("bounding box max[{}]: expected {:.3}, got {:.3} (tol={})", i, expected_max[i], max[i], tol),
            ));
        }
    }
    Ok(())
}

/// Assert the chosen rotation.
pub fn assert_rotation(result: &OrientationResult, expected: [f64; 3], ctx: &str) -> Result<(), HarnessError> {
    if result.rotation == expected {
        Ok(())
    } else {
        Err(failed(
            ctx,
            format!(
                "rotation: expected {:?}, got {:?} (height {:.3}, overhang {:.2}%, base {:.3})",
                expected, result.rotation, result.height, result.overhang_pct, result.base_area
            ),
        ))
    }
}

/// Assert every oracle verdict passed.
pub fn assert_oracles_pass(verdicts: &[OracleVerdict], ctx: &str) -> Result<(), HarnessError> {
    match verdicts.iter().find(|v| !v.passed) {
        None => Ok(()),
        Some(v) => Err(HarnessError::OracleFailure {
            oracle: v.oracle_name.clone(),
            detail: format!("[{}] {}", ctx, v.detail),
        }),
    }
}
