//! Winding normalization: consistent face orientation, then outward normals.

use std::collections::VecDeque;

use studio_types::TriMesh;
use tracing::debug;

use crate::topology::{directed_edges, signed_volume, Welded};

/// Return a copy of `mesh` with consistent, outward-facing winding.
///
/// Each connected patch is flood-filled from its first face, flipping any
/// neighbour that traverses a shared edge in the same direction. Only
/// two-face edges propagate orientation. If the result is closed and
/// encloses negative volume, every face is flipped.
pub fn normalize_winding(mesh: &TriMesh) -> TriMesh {
    let mut out = mesh.clone();
    let welded = Welded::new(mesh);
    let mut tris = welded.triangles.clone();
    let mut visited = vec![false; tris.len()];
    let mut flipped = 0usize;

    for seed in 0..tris.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(f) = queue.pop_front() {
            for (a, b) in directed_edges(&tris[f]) {
                if a == b {
                    continue;
                }
                let Some(edge) = welded.edges.get(&(a.min(b), a.max(b))) else {
                    continue;
                };
                if edge.count() != 2 {
                    continue;
                }
                for &g in &edge.faces {
                    if g == f || visited[g] {
                        continue;
                    }
                    visited[g] = true;
                    if directed_edges(&tris[g]).contains(&(a, b)) {
                        tris[g].swap(1, 2);
                        out.triangles[g].swap(1, 2);
                        flipped += 1;
                    }
                    queue.push_back(g);
                }
            }
        }
    }

    let closed = Welded::new(&out).is_watertight();
    if closed && signed_volume(&out) < 0.0 {
        for t in &mut out.triangles {
            t.swap(1, 2);
        }
        debug!("mesh was wound inward, inverted all faces");
    }
    debug!(flipped, "winding normalized");
    out
}
