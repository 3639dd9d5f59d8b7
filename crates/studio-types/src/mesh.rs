use serde::{Deserialize, Serialize};

/// Indexed triangle mesh as produced by the kernel's tessellator.
///
/// Triangles index into `vertices`; winding is counter-clockwise seen from outside
/// once the mesh has been normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<[f64; 3]>, triangles: Vec<[u32; 3]>) -> Self {
        Self { vertices, triangles }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Index of the first triangle corner that does not reference a vertex.
    pub fn first_out_of_range(&self) -> Option<u32> {
        let n = self.vertices.len();
        self.triangles
            .iter()
            .flat_map(|t| t.iter().copied())
            .find(|&i| i as usize >= n)
    }

    /// The three corner positions of triangle `t`.
    pub fn corners(&self, t: usize) -> [[f64; 3]; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Axis-aligned bounds as `[min, max]`, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<[[f64; 3]; 2]> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            for k in 0..3 {
                min[k] = min[k].min(v[k]);
                max[k] = max[k].max(v[k]);
            }
        }
        Some([min, max])
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &TriMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TriMesh {
        TriMesh::new(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, -1.0], [0.0, 3.0, 4.0]],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let b = triangle().bounds().unwrap();
        assert_eq!(b[0], [0.0, 0.0, -1.0]);
        assert_eq!(b[1], [2.0, 3.0, 4.0]);
        assert!(TriMesh::default().bounds().is_none());
    }

    #[test]
    fn append_offsets_indices() {
        let mut m = triangle();
        m.append(&triangle());
        assert_eq!(m.vertices.len(), 6);
        assert_eq!(m.triangles[1], [3, 4, 5]);
        assert!(m.first_out_of_range().is_none());
    }

    #[test]
    fn detects_out_of_range_index() {
        let m = TriMesh::new(vec![[0.0; 3]], vec![[0, 0, 7]]);
        assert_eq!(m.first_out_of_range(), Some(7));
    }
}
