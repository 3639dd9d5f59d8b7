//! Tunables for the integrity checker and the orientation search.
//!
//! The orientation weights and thresholds are policy, not physics: they rank
//! candidates the way a print-preparation operator would, and may be retuned.

use serde::{Deserialize, Serialize};

/// Degree triples `(x, y, z)`, applied about fixed axes in x, y, z order.
pub const CANDIDATE_ROTATIONS: [[f64; 3]; 12] = [
    [0.0, 0.0, 0.0],
    [90.0, 0.0, 0.0],
    [-90.0, 0.0, 0.0],
    [0.0, 90.0, 0.0],
    [0.0, -90.0, 0.0],
    [0.0, 0.0, 90.0],
    [180.0, 0.0, 0.0],
    [90.0, 90.0, 0.0],
    [90.0, 0.0, 90.0],
    [45.0, 0.0, 0.0],
    [0.0, 45.0, 0.0],
    [45.0, 45.0, 0.0],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Faces with area at or below this (or non-finite) are degenerate.
    pub degenerate_area_epsilon: f64,
    /// Make winding consistent and outward before measuring.
    pub normalize_winding: bool,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            degenerate_area_epsilon: 1e-12,
            normalize_winding: true,
        }
    }
}

impl IntegrityConfig {
    /// Measure the mesh exactly as given, without the winding pass.
    pub fn as_is() -> Self {
        Self {
            normalize_winding: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    pub candidates: Vec<[f64; 3]>,
    /// Meshes with more triangles than this are decimated first.
    pub decimation_threshold: usize,
    /// Faces steeper than this from vertical (downward) count as overhang.
    pub overhang_angle_deg: f64,
    /// Upper bound on a face normal's z for it to count as bed contact.
    pub base_normal_threshold: f64,
    /// Bed-contact band above the lowest point, as a fraction of height.
    pub base_tolerance_fraction: f64,
    /// Minimum bed-contact band.
    pub base_tolerance_floor: f64,
    pub height_weight: f64,
    pub overhang_weight: f64,
    pub base_weight: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            candidates: CANDIDATE_ROTATIONS.to_vec(),
            decimation_threshold: 50_000,
            overhang_angle_deg: 45.0,
            base_normal_threshold: -0.9,
            base_tolerance_fraction: 0.01,
            base_tolerance_floor: 0.1,
            height_weight: 1.0,
            overhang_weight: 2.0,
            base_weight: 0.5,
        }
    }
}

impl OrientationConfig {
    /// Evaluate every mesh at full resolution.
    pub fn exact() -> Self {
        Self {
            decimation_threshold: usize::MAX,
            ..Self::default()
        }
    }

    /// `max(height × fraction, floor)`.
    pub fn base_tolerance(&self, height: f64) -> f64 {
        (height * self.base_tolerance_fraction).max(self.base_tolerance_floor)
    }

    pub fn score(&self, height: f64, overhang_pct: f64, base_area: f64) -> f64 {
        height * self.height_weight + overhang_pct * self.overhang_weight
            - base_area * self.base_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = OrientationConfig::default();
        assert_eq!(c.candidates.len(), 12);
        assert_eq!(c.candidates[0], [0.0, 0.0, 0.0]);
        assert_eq!(c.decimation_threshold, 50_000);
        assert_eq!(c.score(10.0, 5.0, 4.0), 18.0);
        assert_eq!(IntegrityConfig::default().degenerate_area_epsilon, 1e-12);
    }

    #[test]
    fn base_tolerance_has_a_floor() {
        let c = OrientationConfig::default();
        assert_eq!(c.base_tolerance(1.0), 0.1);
        assert_eq!(c.base_tolerance(50.0), 0.5);
    }
}
