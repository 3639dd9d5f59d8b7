//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! They are written independently of mesh-audit (brute force, position-keyed)
//! so the two can be checked against each other.

use std::collections::HashMap;

use mesh_audit::MeshReport;
use serde::Serialize;
use studio_types::TriMesh;

use crate::helpers::{mesh_volume, triangle_area};

/// The result of a single oracle check.
#[derive(Debug, Clone, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::pass(name, detail)
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::fail(name, detail)
        }
    }
}

type PosKey = (i64, i64, i64);

fn pos_key(p: [f64; 3]) -> PosKey {
    let q = |v: f64| (v * 10000.0).round() as i64;
    (q(p[0]), q(p[1]), q(p[2]))
}

/// Directed edges keyed by quantized endpoint positions.
fn positional_edges(mesh: &TriMesh) -> Vec<(PosKey, PosKey)> {
    let mut edges = Vec::with_capacity(mesh.triangle_count() * 3);
    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.corners(t).map(pos_key);
        edges.extend([(a, b), (b, c), (c, a)]);
    }
    edges
}

// ── Mesh Oracles ────────────────────────────────────────────────────────────

/// Every triangle index addresses a vertex.
pub fn check_valid_indices(mesh: &TriMesh) -> OracleVerdict {
    let n = mesh.vertices.len();
    let bad = mesh
        .triangles
        .iter()
        .flatten()
        .filter(|&&i| i as usize >= n)
        .count();
    if bad == 0 {
        OracleVerdict::pass("valid_indices", format!("all indices < {}", n))
    } else {
        OracleVerdict::fail("valid_indices", format!("{} indices out of range (vertex count = {})", bad, n))
    }
}

/// Every edge, matched by position, is shared by exactly two triangles.
pub fn check_watertight_mesh(mesh: &TriMesh) -> OracleVerdict {
    let mut counts: HashMap<(PosKey, PosKey), usize> = HashMap::new();
    for (a, b) in positional_edges(mesh) {
        if a != b {
            *counts.entry(if a <= b { (a, b) } else { (b, a) }).or_insert(0) += 1;
        }
    }
    let unpaired = counts.values().filter(|&&c| c != 2).count();
    if unpaired == 0 {
        OracleVerdict::pass("watertight_mesh", format!("all {} edges paired", counts.len()))
    } else {
        OracleVerdict::fail(
            "watertight_mesh",
            format!("{} unpaired edges out of {} total", unpaired, counts.len()),
        )
    }
}

/// No directed edge is traversed by two triangles.
pub fn check_consistent_winding(mesh: &TriMesh) -> OracleVerdict {
    let mut directed: HashMap<(PosKey, PosKey), usize> = HashMap::new();
    for e in positional_edges(mesh) {
        *directed.entry(e).or_insert(0) += 1;
    }
    let clashes = directed.values().filter(|&&n| n > 1).count();
    if clashes == 0 {
        OracleVerdict::pass("consistent_winding", "no edge traversed twice in one direction".to_string())
    } else {
        OracleVerdict::fail(
            "consistent_winding",
            format!("{} edges traversed twice in the same direction", clashes),
        )
    }
}

/// No triangle has (near) zero area.
pub fn check_no_degenerate_triangles(mesh: &TriMesh) -> OracleVerdict {
    let degenerate = (0..mesh.triangle_count())
        .filter(|&t| {
            let a = triangle_area(mesh.corners(t));
            !a.is_finite() || a <= 1e-12
        })
        .count();
    if degenerate == 0 {
        OracleVerdict::pass("no_degenerate", format!("{} triangles, none degenerate", mesh.triangle_count()))
    } else {
        OracleVerdict::fail_val(
            "no_degenerate",
            format!("{} degenerate triangles", degenerate),
            degenerate as f64,
        )
    }
}

/// Enclosed volume is positive (outward winding).
pub fn check_positive_volume(mesh: &TriMesh) -> OracleVerdict {
    let v = mesh_volume(mesh);
    if v > 0.0 {
        OracleVerdict::pass_val("positive_volume", format!("volume {:.6}", v), v)
    } else {
        OracleVerdict::fail_val("positive_volume", format!("volume {:.6} (expected > 0)", v), v)
    }
}

/// Bounding box within `tol` of the expected corners.
pub fn check_bounding_box(mesh: &TriMesh, min: [f64; 3], max: [f64; 3], tol: f64) -> OracleVerdict {
    let Some([lo, hi]) = mesh.bounds() else {
        return OracleVerdict::fail("bounding_box", "mesh has no vertices".to_string());
    };
    let off = (0..3)
        .flat_map(|k| [(lo[k] - min[k]).abs(), (hi[k] - max[k]).abs()])
        .fold(0.0_f64, f64::max);
    let detail = format!("{:?} -> {:?}, max deviation {:.3e}", lo, hi, off);
    if off <= tol {
        OracleVerdict::pass_val("bounding_box", detail, off)
    } else {
        OracleVerdict::fail_val("bounding_box", detail, off)
    }
}

// ── Report Cross-Checks ─────────────────────────────────────────────────────

/// The report's verdicts agree with the brute-force oracles on `mesh`.
///
/// `mesh` should already be outward-wound; the report is computed after
/// winding normalization.
pub fn check_report_agrees(mesh: &TriMesh, report: &MeshReport) -> OracleVerdict {
    let watertight = check_watertight_mesh(mesh).passed;
    let degenerate = check_no_degenerate_triangles(mesh).value.unwrap_or(0.0) as usize;
    let mut mismatches = Vec::new();
    if report.watertight != watertight {
        mismatches.push(format!("watertight: report {} vs oracle {}", report.watertight, watertight));
    }
    if report.degenerate_faces != degenerate {
        mismatches.push(format!(
            "degenerate faces: report {} vs oracle {}",
            report.degenerate_faces, degenerate
        ));
    }
    if watertight {
        let v = mesh_volume(mesh).abs();
        if (report.volume - v).abs() > 1e-6 * v.max(1.0) {
            mismatches.push(format!("volume: report {} vs oracle {}", report.volume, v));
        }
    }
    if mismatches.is_empty() {
        OracleVerdict::pass("report_agrees", "report matches oracles".to_string())
    } else {
        OracleVerdict::fail("report_agrees", mismatches.join("; "))
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// Run every mesh oracle that needs no expectations. Stops after the index
/// check when it fails, since the others read vertices through the indices.
pub fn run_all_mesh_checks(mesh: &TriMesh) -> Vec<OracleVerdict> {
    let indices = check_valid_indices(mesh);
    if !indices.passed {
        return vec![indices];
    }
    vec![
        indices,
        check_watertight_mesh(mesh),
        check_consistent_winding(mesh),
        check_no_degenerate_triangles(mesh),
        check_positive_volume(mesh),
    ]
}
