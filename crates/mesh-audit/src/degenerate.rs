//! Degenerate-face counting across mesh sources with different capabilities.
//!
//! Some sources report degenerate faces directly, some only report the
//! non-degenerate ones, and some expose nothing but per-face areas. The count
//! tries them in that order. With no signal at all the count is 0, meaning
//! "not detected" rather than "none found".

use std::fmt;

use studio_types::TriMesh;
use tracing::debug;

use crate::error::AuditError;
use crate::topology::face_areas;

/// A selection of faces, as a list of indices or as a mask aligned to faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceSelector {
    Indices(Vec<usize>),
    Mask(Vec<bool>),
}

impl FaceSelector {
    /// Indices count one each; a mask counts its `true` entries.
    pub fn count(&self) -> usize {
        match self {
            FaceSelector::Indices(ix) => ix.len(),
            FaceSelector::Mask(mask) => mask.iter().filter(|&&m| m).count(),
        }
    }
}

/// Computes a selector on demand; may fail.
pub type SelectorFn = Box<dyn Fn() -> Result<FaceSelector, AuditError> + Send + Sync>;

/// A face indicator: already computed, or computed when asked.
pub enum Indicator {
    Precomputed(FaceSelector),
    Deferred(SelectorFn),
}

impl Indicator {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> Result<FaceSelector, AuditError> + Send + Sync + 'static,
    {
        Indicator::Deferred(Box::new(f))
    }

    fn resolve(&self) -> Result<usize, AuditError> {
        match self {
            Indicator::Precomputed(sel) => Ok(sel.count()),
            Indicator::Deferred(f) => f().map(|sel| sel.count()),
        }
    }
}

impl fmt::Debug for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Precomputed(sel) => f.debug_tuple("Precomputed").field(sel).finish(),
            Indicator::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// What a mesh source can tell about degenerate faces.
#[derive(Debug, Default)]
pub struct FaceSignals {
    pub face_count: usize,
    pub degenerate: Option<Indicator>,
    pub nondegenerate: Option<Indicator>,
    pub areas: Option<Vec<f64>>,
}

impl FaceSignals {
    pub fn new(face_count: usize) -> Self {
        Self {
            face_count,
            ..Self::default()
        }
    }

    /// Areas computed from the mesh geometry; no direct indicators.
    pub fn from_mesh(mesh: &TriMesh) -> Self {
        Self::new(mesh.triangle_count()).with_areas(face_areas(mesh))
    }

    pub fn with_degenerate(mut self, indicator: Indicator) -> Self {
        self.degenerate = Some(indicator);
        self
    }

    pub fn with_nondegenerate(mut self, indicator: Indicator) -> Self {
        self.nondegenerate = Some(indicator);
        self
    }

    pub fn with_areas(mut self, areas: Vec<f64>) -> Self {
        self.areas = Some(areas);
        self
    }
}

/// Count degenerate faces from the best available signal.
pub fn count_degenerate_faces(signals: &FaceSignals, area_epsilon: f64) -> usize {
    if let Some(indicator) = &signals.degenerate {
        match indicator.resolve() {
            Ok(n) => return n,
            Err(err) => debug!(error = %err, "degenerate indicator failed, falling back"),
        }
    }

    if let Some(indicator) = &signals.nondegenerate {
        match indicator.resolve() {
            Ok(n) if n <= signals.face_count => return signals.face_count - n,
            Ok(n) => debug!(
                nondegenerate = n,
                faces = signals.face_count,
                "non-degenerate count exceeds face count, falling back"
            ),
            Err(err) => debug!(error = %err, "non-degenerate indicator failed, falling back"),
        }
    }

    match &signals.areas {
        Some(areas) => areas
            .iter()
            .filter(|a| !a.is_finite() || **a <= area_epsilon)
            .count(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn direct_indices_are_counted() {
        let s = FaceSignals::new(4)
            .with_degenerate(Indicator::Precomputed(FaceSelector::Indices(vec![0, 2])));
        assert_eq!(count_degenerate_faces(&s, EPS), 2);
    }

    #[test]
    fn direct_mask_counts_true_entries() {
        let mask = FaceSelector::Mask(vec![false, true, false, true]);
        let s = FaceSignals::new(4).with_degenerate(Indicator::Precomputed(mask));
        assert_eq!(count_degenerate_faces(&s, EPS), 2);
    }

    #[test]
    fn deferred_nondegenerate_indicator_is_subtracted() {
        let s = FaceSignals::new(5).with_nondegenerate(Indicator::deferred(|| {
            Ok(FaceSelector::Indices(vec![0, 1, 2]))
        }));
        assert_eq!(count_degenerate_faces(&s, EPS), 2);
    }

    #[test]
    fn nondegenerate_mask_is_subtracted() {
        let mask = FaceSelector::Mask(vec![true, false, true, false]);
        let s = FaceSignals::new(4).with_nondegenerate(Indicator::Precomputed(mask));
        assert_eq!(count_degenerate_faces(&s, EPS), 2);
    }

    #[test]
    fn out_of_range_nondegenerate_count_falls_through_to_areas() {
        let s = FaceSignals::new(2)
            .with_nondegenerate(Indicator::Precomputed(FaceSelector::Indices(vec![0, 1, 2])))
            .with_areas(vec![0.0, 1.0]);
        assert_eq!(count_degenerate_faces(&s, EPS), 1);
    }

    #[test]
    fn failing_indicator_falls_through() {
        let s = FaceSignals::new(3)
            .with_degenerate(Indicator::deferred(|| {
                Err(AuditError::IndicatorFailed {
                    reason: "unsupported".into(),
                })
            }))
            .with_areas(vec![f64::NAN, 1.0, 0.0]);
        assert_eq!(count_degenerate_faces(&s, EPS), 2);
    }

    #[test]
    fn area_fallback_uses_epsilon() {
        let s = FaceSignals::new(4).with_areas(vec![0.5, 0.0, 1e-13, 0.3]);
        assert_eq!(count_degenerate_faces(&s, EPS), 2);
    }

    #[test]
    fn no_signal_reports_zero_as_not_detected() {
        let s = FaceSignals::new(2);
        assert_eq!(count_degenerate_faces(&s, EPS), 0);
    }

    #[test]
    fn mesh_areas_find_collapsed_triangles() {
        let mesh = TriMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 0.0, 0.0]],
            vec![[0, 1, 2], [0, 1, 3], [1, 1, 2]],
        );
        assert_eq!(count_degenerate_faces(&FaceSignals::from_mesh(&mesh), EPS), 2);
    }
}
