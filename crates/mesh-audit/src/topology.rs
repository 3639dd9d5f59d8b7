//! Position-welded mesh topology: edges, boundary, winding agreement, Euler number.
//!
//! Tessellators often emit per-face vertices, so vertices are matched by
//! quantized position rather than by index.

use std::collections::HashMap;

use nalgebra::Vector3;
use studio_types::TriMesh;

/// Position quantum for welding.
const WELD_SCALE: f64 = 1e8;

type VertexKey = (i64, i64, i64);

fn vertex_key(p: &[f64; 3]) -> VertexKey {
    let q = |v: f64| (v * WELD_SCALE).round() as i64;
    (q(p[0]), q(p[1]), q(p[2]))
}

/// Uses of one undirected edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeUse {
    /// Faces using the edge, in face order.
    pub faces: Vec<usize>,
    /// How many of those traverse it from the lower to the higher vertex id.
    pub forward: usize,
}

impl EdgeUse {
    pub fn count(&self) -> usize {
        self.faces.len()
    }
}

/// Mesh with triangles re-indexed onto welded vertices.
#[derive(Debug, Clone)]
pub struct Welded {
    pub vertex_count: usize,
    pub triangles: Vec<[usize; 3]>,
    /// Undirected edge `(lo, hi)` to its uses. Self-loops of collapsed
    /// triangles are not edges.
    pub edges: HashMap<(usize, usize), EdgeUse>,
}

impl Welded {
    /// Callers must have rejected out-of-range indices.
    pub fn new(mesh: &TriMesh) -> Self {
        let mut ids: HashMap<VertexKey, usize> = HashMap::new();
        let mut remap = Vec::with_capacity(mesh.vertices.len());
        for v in &mesh.vertices {
            let next = ids.len();
            remap.push(*ids.entry(vertex_key(v)).or_insert(next));
        }

        // Only referenced vertices count toward the Euler number.
        let mut referenced = vec![false; ids.len()];
        let triangles: Vec<[usize; 3]> = mesh
            .triangles
            .iter()
            .map(|t| {
                let w = [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]];
                w.iter().for_each(|&i| referenced[i] = true);
                w
            })
            .collect();

        let mut edges: HashMap<(usize, usize), EdgeUse> = HashMap::new();
        for (f, t) in triangles.iter().enumerate() {
            for (a, b) in directed_edges(t) {
                if a == b {
                    continue;
                }
                let entry = edges.entry((a.min(b), a.max(b))).or_default();
                entry.faces.push(f);
                if a < b {
                    entry.forward += 1;
                }
            }
        }

        Self {
            vertex_count: referenced.iter().filter(|&&r| r).count(),
            triangles,
            edges,
        }
    }

    /// Every edge is shared by exactly two faces.
    pub fn is_watertight(&self) -> bool {
        !self.triangles.is_empty() && self.edges.values().all(|e| e.count() == 2)
    }

    /// Every two-face edge is traversed once in each direction.
    pub fn is_winding_consistent(&self) -> bool {
        self.edges
            .values()
            .filter(|e| e.count() == 2)
            .all(|e| e.forward == 1)
    }

    /// V − E + F.
    pub fn euler_number(&self) -> i64 {
        self.vertex_count as i64 - self.edges.len() as i64 + self.triangles.len() as i64
    }
}

pub(crate) fn directed_edges(t: &[usize; 3]) -> [(usize, usize); 3] {
    [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])]
}

pub(crate) fn point(p: &[f64; 3]) -> Vector3<f64> {
    Vector3::new(p[0], p[1], p[2])
}

/// Un-normalized face normal (length is twice the area).
pub fn face_cross(mesh: &TriMesh, t: usize) -> Vector3<f64> {
    let [a, b, c] = mesh.corners(t);
    let (a, b, c) = (point(&a), point(&b), point(&c));
    (b - a).cross(&(c - a))
}

pub fn face_areas(mesh: &TriMesh) -> Vec<f64> {
    (0..mesh.triangle_count())
        .map(|t| face_cross(mesh, t).norm() / 2.0)
        .collect()
}

/// Signed enclosed volume; positive for a closed mesh wound outward.
pub fn signed_volume(mesh: &TriMesh) -> f64 {
    (0..mesh.triangle_count())
        .map(|t| {
            let [a, b, c] = mesh.corners(t);
            point(&a).dot(&point(&b).cross(&point(&c)))
        })
        .sum::<f64>()
        / 6.0
}
