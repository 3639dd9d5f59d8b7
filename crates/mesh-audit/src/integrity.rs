//! Mesh integrity report for manufacturability checks.

use serde::{Deserialize, Serialize};
use studio_types::TriMesh;
use tracing::{info, instrument};

use crate::config::IntegrityConfig;
use crate::degenerate::{count_degenerate_faces, FaceSignals};
use crate::error::AuditError;
use crate::topology::{signed_volume, Welded};
use crate::winding::normalize_winding;

/// Integrity of one tessellated mesh. Every failed check appears both in its
/// field and as a line in `issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshReport {
    pub watertight: bool,
    pub winding_consistent: bool,
    pub degenerate_faces: usize,
    pub euler_number: i64,
    /// Enclosed volume when watertight, else 0.
    pub volume: f64,
    pub triangle_count: usize,
    pub bounds: [[f64; 3]; 2],
    pub issues: Vec<String>,
}

impl MeshReport {
    /// Watertight, consistently wound, no degenerate faces, Euler number 2.
    pub fn is_manifold(&self) -> bool {
        self.watertight
            && self.winding_consistent
            && self.degenerate_faces == 0
            && self.euler_number == 2
    }
}

/// Check with the default configuration.
pub fn check_mesh(mesh: &TriMesh) -> Result<MeshReport, AuditError> {
    check(mesh, &IntegrityConfig::default())
}

/// Check `mesh`. The input is not modified; winding normalization works on a copy.
#[instrument(skip_all, fields(triangles = mesh.triangle_count()))]
pub fn check(mesh: &TriMesh, config: &IntegrityConfig) -> Result<MeshReport, AuditError> {
    AuditError::check_indices(mesh)?;
    let normalized;
    let mesh = if config.normalize_winding {
        normalized = normalize_winding(mesh);
        &normalized
    } else {
        mesh
    };

    let welded = Welded::new(mesh);
    let mut issues = Vec::new();

    let watertight = welded.is_watertight();
    if !watertight {
        issues.push("Mesh is not watertight (has holes or gaps)".to_string());
    }

    let winding_consistent = welded.is_winding_consistent();
    if !winding_consistent {
        issues.push("Inconsistent face winding (flipped normals)".to_string());
    }

    let degenerate_faces =
        count_degenerate_faces(&FaceSignals::from_mesh(mesh), config.degenerate_area_epsilon);
    if degenerate_faces > 0 {
        issues.push(format!("{} degenerate (zero-area) faces found", degenerate_faces));
    }

    let euler_number = welded.euler_number();
    if euler_number != 2 {
        issues.push(format!(
            "Euler number is {} (expected 2 for a closed solid)",
            euler_number
        ));
    }

    let mut volume = if watertight { signed_volume(mesh) } else { 0.0 };
    if volume < 0.0 {
        issues.push("Negative volume detected (inverted normals)".to_string());
        volume = volume.abs();
    }

    let report = MeshReport {
        watertight,
        winding_consistent,
        degenerate_faces,
        euler_number,
        volume,
        triangle_count: mesh.triangle_count(),
        bounds: mesh.bounds().unwrap_or([[0.0; 3]; 2]),
        issues,
    };
    info!(
        manifold = report.is_manifold(),
        issues = report.issues.len(),
        "mesh checked"
    );
    Ok(report)
}
