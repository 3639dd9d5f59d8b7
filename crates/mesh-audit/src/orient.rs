//! Print-orientation search over a fixed candidate list.
//!
//! Each candidate rotation is scored by build height, overhanging area and
//! bed-contact area; the first candidate with the lowest score wins.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use studio_types::TriMesh;
use tracing::{debug, info, instrument};

use crate::config::OrientationConfig;
use crate::decimate::decimate;
use crate::error::AuditError;
use crate::topology::point;
use crate::winding::normalize_winding;

/// The chosen orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationResult {
    /// Degrees about x, y, z.
    pub rotation: [f64; 3],
    pub height: f64,
    /// Percentage of surface area that overhangs, in `[0, 100]`.
    pub overhang_pct: f64,
    pub base_area: f64,
    pub candidates_evaluated: usize,
}

/// Metrics of one evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub rotation: [f64; 3],
    pub height: f64,
    pub overhang_pct: f64,
    pub base_area: f64,
    pub score: f64,
}

/// Rotation for a degree triple, about fixed x, then y, then z axes.
///
/// Quarter turns are exact, so axis-aligned candidates permute coordinates
/// without rounding noise.
pub fn rotation_from_degrees(deg: [f64; 3]) -> Rotation3<f64> {
    let (sx, cx) = sin_cos_deg(deg[0]);
    let (sy, cy) = sin_cos_deg(deg[1]);
    let (sz, cz) = sin_cos_deg(deg[2]);
    let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, cx, -sx, 0.0, sx, cx);
    let ry = Matrix3::new(cy, 0.0, sy, 0.0, 1.0, 0.0, -sy, 0.0, cy);
    let rz = Matrix3::new(cz, -sz, 0.0, sz, cz, 0.0, 0.0, 0.0, 1.0);
    Rotation3::from_matrix_unchecked(rz * ry * rx)
}

fn sin_cos_deg(deg: f64) -> (f64, f64) {
    let turns = deg / 90.0;
    if turns.fract() == 0.0 {
        match (turns as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        deg.to_radians().sin_cos()
    }
}

/// Score every configured candidate, in list order.
pub fn search_orientations(
    mesh: &TriMesh,
    config: &OrientationConfig,
) -> Result<Vec<CandidateScore>, AuditError> {
    AuditError::check_indices(mesh)?;
    if mesh.is_empty() {
        return Err(AuditError::EmptyMesh);
    }
    let working = if mesh.triangle_count() > config.decimation_threshold {
        decimate(mesh, config.decimation_threshold)
    } else {
        mesh.clone()
    };
    if working.is_empty() {
        return Err(AuditError::EmptyMesh);
    }
    let working = normalize_winding(&working);

    Ok(config
        .candidates
        .iter()
        .map(|&rotation| evaluate(&working, rotation, config))
        .collect())
}

/// Best candidate with the default configuration.
pub fn best_orientation(mesh: &TriMesh) -> Result<OrientationResult, AuditError> {
    best_orientation_with(mesh, &OrientationConfig::default())
}

#[instrument(skip_all, fields(triangles = mesh.triangle_count()))]
pub fn best_orientation_with(
    mesh: &TriMesh,
    config: &OrientationConfig,
) -> Result<OrientationResult, AuditError> {
    let scores = search_orientations(mesh, config)?;
    let best = pick_best(&scores).ok_or(AuditError::EmptyMesh)?;
    info!(
        rotation = ?best.rotation,
        score = best.score,
        candidates = scores.len(),
        "orientation chosen"
    );
    Ok(OrientationResult {
        rotation: best.rotation,
        height: best.height,
        overhang_pct: best.overhang_pct,
        base_area: best.base_area,
        candidates_evaluated: scores.len(),
    })
}

/// Lowest score; ties keep the earlier candidate.
fn pick_best(scores: &[CandidateScore]) -> Option<&CandidateScore> {
    let mut best: Option<&CandidateScore> = None;
    for candidate in scores {
        if best.map_or(true, |b| candidate.score < b.score) {
            best = Some(candidate);
        }
    }
    best
}

fn evaluate(mesh: &TriMesh, rotation: [f64; 3], config: &OrientationConfig) -> CandidateScore {
    let rot = rotation_from_degrees(rotation);
    let verts: Vec<Vector3<f64>> = mesh.vertices.iter().map(|p| rot * point(p)).collect();

    let (z_min, z_max) = verts
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v.z), hi.max(v.z))
        });
    let height = z_max - z_min;
    let overhang_limit = -config.overhang_angle_deg.to_radians().cos();
    let base_band = z_min + config.base_tolerance(height);

    let mut total_area = 0.0;
    let mut overhang_area = 0.0;
    let mut base_area = 0.0;
    for t in &mesh.triangles {
        let [a, b, c] = [verts[t[0] as usize], verts[t[1] as usize], verts[t[2] as usize]];
        let cross = (b - a).cross(&(c - a));
        let area = cross.norm() / 2.0;
        total_area += area;
        if area <= 0.0 {
            continue;
        }
        let normal_z = cross.z / cross.norm();
        if normal_z < overhang_limit {
            overhang_area += area;
        }
        let centroid_z = (a.z + b.z + c.z) / 3.0;
        if centroid_z < base_band && normal_z < config.base_normal_threshold {
            base_area += area;
        }
    }
    let overhang_pct = if total_area > 0.0 {
        overhang_area / total_area * 100.0
    } else {
        0.0
    };

    let score = config.score(height, overhang_pct, base_area);
    debug!(?rotation, height, overhang_pct, base_area, score, "candidate scored");
    CandidateScore {
        rotation,
        height,
        overhang_pct,
        base_area,
        score,
    }
}
