//! Vertex-clustering decimation.
//!
//! Lossy and deterministic: vertices are snapped to a grid, each occupied cell
//! collapses to the mean of its vertices, and triangles that collapse or repeat
//! are dropped. The grid coarsens until the triangle budget is met. Only the
//! orientation search uses this, to bound its cost on very large meshes.

use std::collections::{HashMap, HashSet};

use studio_types::TriMesh;
use tracing::debug;

const GROWTH: f64 = 1.5;
const MAX_ROUNDS: usize = 24;

/// Reduce `mesh` to at most `target` triangles where the grid allows it.
///
/// Returns the input unchanged when it is already within budget. After the
/// last round the coarsest result is returned even if still over budget.
pub fn decimate(mesh: &TriMesh, target: usize) -> TriMesh {
    if mesh.triangle_count() <= target {
        return mesh.clone();
    }
    let Some([min, max]) = mesh.bounds() else {
        return mesh.clone();
    };
    let extent = (0..3).map(|k| max[k] - min[k]).fold(0.0_f64, f64::max);
    if extent <= 0.0 {
        return TriMesh::default();
    }

    // Surface meshes hold roughly (extent / cell)² triangles per face.
    let mut cell = extent / (target.max(1) as f64).sqrt();
    let mut result = cluster(mesh, min, cell);
    let mut rounds = 1;
    while result.triangle_count() > target && rounds < MAX_ROUNDS {
        cell *= GROWTH;
        result = cluster(mesh, min, cell);
        rounds += 1;
    }
    debug!(
        from = mesh.triangle_count(),
        to = result.triangle_count(),
        rounds,
        "decimated mesh"
    );
    result
}

fn cluster(mesh: &TriMesh, origin: [f64; 3], cell: f64) -> TriMesh {
    let mut cells: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let mut sums: Vec<([f64; 3], f64)> = Vec::new();
    let remap: Vec<u32> = mesh
        .vertices
        .iter()
        .map(|p| {
            let key = (
                ((p[0] - origin[0]) / cell).floor() as i64,
                ((p[1] - origin[1]) / cell).floor() as i64,
                ((p[2] - origin[2]) / cell).floor() as i64,
            );
            let id = *cells.entry(key).or_insert_with(|| {
                sums.push(([0.0; 3], 0.0));
                (sums.len() - 1) as u32
            });
            let (sum, n) = &mut sums[id as usize];
            for k in 0..3 {
                sum[k] += p[k];
            }
            *n += 1.0;
            id
        })
        .collect();

    let vertices = sums
        .iter()
        .map(|(s, n)| [s[0] / n, s[1] / n, s[2] / n])
        .collect();

    let mut seen: HashSet<[u32; 3]> = HashSet::new();
    let triangles = mesh
        .triangles
        .iter()
        .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]])
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[2] != t[0])
        .filter(|t| {
            let mut key = *t;
            key.sort_unstable();
            seen.insert(key)
        })
        .collect();

    TriMesh::new(vertices, triangles)
}
