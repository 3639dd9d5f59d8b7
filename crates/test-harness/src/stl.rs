//! Binary and ASCII STL readers for checking exported bytes.
//!
//! Each facet gets three fresh vertices; downstream checks weld by position.

use studio_types::TriMesh;

use crate::helpers::HarnessError;

const HEADER: usize = 80;
const RECORD: usize = 50;

/// Parse binary STL: 80-byte header, u32 count, 50-byte facet records.
pub fn parse_binary_stl(bytes: &[u8]) -> Result<TriMesh, HarnessError> {
    let count_bytes: [u8; 4] = bytes
        .get(HEADER..HEADER + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| HarnessError::StlError {
            reason: format!("file too short for a header ({} bytes)", bytes.len()),
        })?;
    let count = u32::from_le_bytes(count_bytes) as usize;
    let expected = HEADER + 4 + count * RECORD;
    if bytes.len() != expected {
        return Err(HarnessError::StlError {
            reason: format!(
                "{} facets need {} bytes, file has {}",
                count,
                expected,
                bytes.len()
            ),
        });
    }

    let read_f32 = |at: usize| f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let mut mesh = TriMesh::default();
    for facet in 0..count {
        // Skip the 12-byte normal.
        let base = HEADER + 4 + facet * RECORD + 12;
        let first = mesh.vertices.len() as u32;
        for corner in 0..3 {
            let at = base + corner * 12;
            mesh.vertices.push([
                read_f32(at) as f64,
                read_f32(at + 4) as f64,
                read_f32(at + 8) as f64,
            ]);
        }
        mesh.triangles.push([first, first + 1, first + 2]);
    }
    Ok(mesh)
}

/// Parse ASCII STL. Only `vertex` lines are read; they must come in threes.
pub fn parse_ascii_stl(text: &str) -> Result<TriMesh, HarnessError> {
    if !text.trim_start().starts_with("solid") {
        return Err(HarnessError::StlError {
            reason: "missing 'solid' header".to_string(),
        });
    }
    let mut mesh = TriMesh::default();
    for (no, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        if words.next() != Some("vertex") {
            continue;
        }
        let coords: Vec<f64> = words
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|e| HarnessError::StlError {
                reason: format!("line {}: {}", no + 1, e),
            })?;
        let [x, y, z] = coords[..] else {
            return Err(HarnessError::StlError {
                reason: format!("line {}: expected 3 coordinates, got {}", no + 1, coords.len()),
            });
        };
        mesh.vertices.push([x, y, z]);
    }
    if mesh.vertices.len() % 3 != 0 {
        return Err(HarnessError::StlError {
            reason: format!("{} vertices do not form whole facets", mesh.vertices.len()),
        });
    }
    mesh.triangles = (0..mesh.vertices.len() as u32 / 3)
        .map(|f| [3 * f, 3 * f + 1, 3 * f + 2])
        .collect();
    Ok(mesh)
}
