//! Helper functions: error type, fixture meshes and scripts, mesh math.

use studio_types::TriMesh;

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("nothing has been run yet")]
    NoRun,

    #[error("{stage} failed: {message}")]
    Stage { stage: String, message: String },

    #[error("unexpected outcome: {detail}")]
    UnexpectedOutcome { detail: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("STL error: {reason}")]
    StlError { reason: String },
}

impl HarnessError {
    pub(crate) fn stage(stage: &str, err: impl std::fmt::Display) -> Self {
        HarnessError::Stage {
            stage: stage.to_string(),
            message: err.to_string(),
        }
    }
}

// ── Fixture Meshes ──────────────────────────────────────────────────────────

/// Axis-aligned box from `min` to `max`: 8 shared vertices, 12 outward triangles.
pub fn cuboid(min: [f64; 3], max: [f64; 3]) -> TriMesh {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    TriMesh::new(
        vec![
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ],
        vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ],
    )
}

pub fn unit_cube() -> TriMesh {
    cuboid([0.0; 3], [1.0; 3])
}

/// Unit cube with the top face removed.
pub fn open_cube() -> TriMesh {
    let mut mesh = unit_cube();
    mesh.triangles.drain(2..4);
    mesh
}

/// Cube of side `size` whose faces are each split into an `n`×`n` grid.
///
/// Every face has its own vertices; edge vertices coincide exactly in
/// position, so welding closes the mesh. Holds `12 n²` triangles.
pub fn subdivided_cube(n: u32, size: f64) -> TriMesh {
    let coord = |i: u32| i as f64 / n as f64 * size;
    let mut mesh = TriMesh::default();

    // (normal axis, u axis, v axis) with u × v pointing along +axis.
    for (axis, u, v) in [(0usize, 1usize, 2usize), (1, 2, 0), (2, 0, 1)] {
        for positive in [false, true] {
            let base = mesh.vertices.len() as u32;
            for j in 0..=n {
                for i in 0..=n {
                    let mut p = [0.0; 3];
                    p[axis] = if positive { size } else { 0.0 };
                    p[u] = coord(i);
                    p[v] = coord(j);
                    mesh.vertices.push(p);
                }
            }
            let row = n + 1;
            for j in 0..n {
                for i in 0..n {
                    let a = base + j * row + i;
                    let (b, c, d) = (a + 1, a + row + 1, a + row);
                    if positive {
                        mesh.triangles.push([a, b, c]);
                        mesh.triangles.push([a, c, d]);
                    } else {
                        mesh.triangles.push([a, c, b]);
                        mesh.triangles.push([a, d, c]);
                    }
                }
            }
        }
    }
    mesh
}

// ── Fixture Scripts ─────────────────────────────────────────────────────────

/// One box assigned to `result`.
pub const SINGLE_BOX: &str = "result = box(10, 20, 30)\n";

/// Three boxes in a row, each touching the next.
pub const TOUCHING_ROW: &str = "\
a = box(1, 1, 1)
b = box(1, 1, 1).translate((1, 0, 0))
c = box(1, 1, 1).translate((2, 0, 0))
result = [a, b, c]
";

/// Two boxes with a gap between them.
pub const DISJOINT_PAIR: &str = "\
a = box(1, 1, 1)
b = box(1, 1, 1).translate((5, 0, 0))
result = [a, b]
";

/// A fillet far too large for the box it is applied to.
pub const OVERSIZED_FILLET: &str = "\
result = box(2, 2, 2)
result = result.fillet(5)
";

/// A plausible-looking helper that does not exist.
pub const HALLUCINATED_HELPER: &str = "\
result = box(3, 3, 3)
add_text_label(result, 'v1')
";

// ── Mesh Math ───────────────────────────────────────────────────────────────

/// Signed volume via the divergence theorem. Positive for outward winding.
pub fn mesh_volume(mesh: &TriMesh) -> f64 {
    (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = mesh.corners(t);
            (a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
                + a[2] * (b[0] * c[1] - b[1] * c[0]))
                / 6.0
        })
        .sum()
}

/// Total triangle area.
pub fn mesh_surface_area(mesh: &TriMesh) -> f64 {
    (0..mesh.triangle_count()).map(|t| triangle_area(mesh.corners(t))).sum()
}

pub fn triangle_area([a, b, c]: [[f64; 3]; 3]) -> f64 {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let cross = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_volume_and_area() {
        let m = cuboid([1.0, 1.0, 1.0], [3.0, 4.0, 5.0]);
        assert_relative_eq!(mesh_volume(&m), 24.0, epsilon = 1e-9);
        assert_relative_eq!(mesh_surface_area(&m), 2.0 * (6.0 + 8.0 + 12.0), epsilon = 1e-9);
    }

    #[test]
    fn subdivided_cube_is_outward_and_sized() {
        let m = subdivided_cube(4, 2.0);
        assert_eq!(m.triangle_count(), 12 * 16);
        assert_relative_eq!(mesh_volume(&m), 8.0, epsilon = 1e-9);
        assert_relative_eq!(mesh_surface_area(&m), 24.0, epsilon = 1e-9);
        assert_eq!(m.bounds(), Some([[0.0; 3], [2.0; 3]]));
    }
}
