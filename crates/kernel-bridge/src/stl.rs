//! Binary and ASCII STL export from a TriMesh.

use crate::types::{KernelError, TriMesh};

fn validate(mesh: &TriMesh) -> Result<(), KernelError> {
    if mesh.triangles.is_empty() {
        return Err(KernelError::ExportFailed {
            reason: "mesh has no triangles".to_string(),
        });
    }
    if let Some(idx) = mesh.first_out_of_range() {
        return Err(KernelError::ExportFailed {
            reason: format!(
                "index {} out of range (vertex count = {})",
                idx,
                mesh.vertices.len()
            ),
        });
    }
    Ok(())
}

/// Unit face normal from the corner cross product; degenerate faces get +Z.
fn facet_normal(c: &[[f64; 3]; 3]) -> [f32; 3] {
    let a = [c[1][0] - c[0][0], c[1][1] - c[0][1], c[1][2] - c[0][2]];
    let b = [c[2][0] - c[0][0], c[2][1] - c[0][1], c[2][2] - c[0][2]];
    let n = [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [(n[0] / len) as f32, (n[1] / len) as f32, (n[2] / len) as f32]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Export a TriMesh as a binary STL file.
///
/// Binary STL format:
/// - 80-byte header (arbitrary text)
/// - u32 triangle count (little-endian)
/// - For each triangle: 3×f32 normal + 3×(3×f32 vertex) + u16 attribute = 50 bytes
pub fn write_binary_stl(mesh: &TriMesh, name: &str) -> Result<Vec<u8>, KernelError> {
    validate(mesh)?;
    let tri_count = mesh.triangles.len();
    let mut buf = Vec::with_capacity(84 + tri_count * 50);

    let header = format!("binary STL: {}", name);
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(80)]);
    buf.resize(80, 0u8);
    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for t in 0..tri_count {
        let corners = mesh.corners(t);
        for c in facet_normal(&corners) {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        for v in &corners {
            for &c in v {
                buf.extend_from_slice(&(c as f32).to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(buf)
}

/// Export a TriMesh as an ASCII STL string.
pub fn write_ascii_stl(mesh: &TriMesh, name: &str) -> Result<String, KernelError> {
    validate(mesh)?;
    let mut out = String::with_capacity(mesh.triangles.len() * 300);
    out.push_str(&format!("solid {}\n", name));

    for t in 0..mesh.triangles.len() {
        let corners = mesh.corners(t);
        let [nx, ny, nz] = facet_normal(&corners);
        out.push_str(&format!("  facet normal {} {} {}\n", nx, ny, nz));
        out.push_str("    outer loop\n");
        for v in &corners {
            out.push_str(&format!("      vertex {} {} {}\n", v[0], v[1], v[2]));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }

    out.push_str(&format!("endsolid {}\n", name));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_triangle() -> TriMesh {
        TriMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn binary_layout_is_header_count_and_50_byte_records() {
        let bytes = write_binary_stl(&one_triangle(), "tri").unwrap();
        assert_eq!(bytes.len(), 80 + 4 + 50);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(nz, 1.0);
    }

    #[test]
    fn ascii_contains_one_facet_per_triangle() {
        let text = write_ascii_stl(&one_triangle(), "tri").unwrap();
        assert!(text.starts_with("solid tri\n"));
        assert!(text.ends_with("endsolid tri\n"));
        assert_eq!(text.matches("facet normal").count(), 1);
        assert_eq!(text.matches("vertex").count(), 3);
    }

    #[test]
    fn rejects_empty_and_out_of_range_meshes() {
        assert!(matches!(
            write_binary_stl(&TriMesh::default(), "x"),
            Err(KernelError::ExportFailed { .. })
        ));
        let bad = TriMesh::new(vec![[0.0; 3]], vec![[0, 1, 2]]);
        let err = write_ascii_stl(&bad, "x").unwrap_err();
        assert!(err.to_string().contains("index 1 out of range"));
    }

    #[test]
    fn degenerate_facet_gets_up_normal() {
        let flat = TriMesh::new(vec![[1.0, 1.0, 1.0]; 3], vec![[0, 1, 2]]);
        let text = write_ascii_stl(&flat, "d").unwrap();
        assert!(text.contains("facet normal 0 0 1"));
    }
}
