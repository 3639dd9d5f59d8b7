//! Small meshes shared by the unit tests.

use studio_types::TriMesh;

pub fn unit_cube() -> TriMesh {
    TriMesh::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
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

/// The unit cube with its top face (two triangles) removed.
pub fn open_cube() -> TriMesh {
    let mut cube = unit_cube();
    cube.triangles.drain(2..4);
    cube
}

/// The unit cube with every triangle wound inward.
pub fn inverted_cube() -> TriMesh {
    let mut cube = unit_cube();
    for t in &mut cube.triangles {
        t.swap(1, 2);
    }
    cube
}

/// The unit cube with three private vertices per triangle.
pub fn split_vertex_cube() -> TriMesh {
    let cube = unit_cube();
    let mut mesh = TriMesh::default();
    for t in 0..cube.triangle_count() {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend(cube.corners(t));
        mesh.triangles.push([base, base + 1, base + 2]);
    }
    mesh
}
