use approx::assert_relative_eq;
use mesh_audit::{
    best_orientation, check_mesh, search_orientations, OrientationConfig, CANDIDATE_ROTATIONS,
};
use proptest::prelude::*;
use studio_types::TriMesh;

fn cuboid(size: [f64; 3], offset: [f64; 3]) -> TriMesh {
    let mut vertices = Vec::new();
    for &(x, y, z) in &[
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 1.0),
        (0.0, 1.0, 1.0),
    ] {
        vertices.push([
            x * size[0] + offset[0],
            y * size[1] + offset[1],
            z * size[2] + offset[2],
        ]);
    }
    let triangles = vec![
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
    ];
    TriMesh::new(vertices, triangles)
}

fn dims() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(0.5f64..20.0)
}

fn offsets() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-100.0f64..100.0)
}

proptest! {
    #[test]
    fn any_cuboid_is_manifold_with_its_volume(size in dims(), offset in offsets()) {
        let report = check_mesh(&cuboid(size, offset)).unwrap();
        prop_assert!(report.is_manifold(), "{:?}", report.issues);
        let expected = size[0] * size[1] * size[2];
        prop_assert!((report.volume - expected).abs() <= 1e-6 * expected.max(1.0));
    }

    #[test]
    fn reversed_cuboid_is_normalized_before_measuring(size in dims()) {
        let mut mesh = cuboid(size, [0.0; 3]);
        mesh.triangles.iter_mut().for_each(|t| t.swap(0, 1));
        let report = check_mesh(&mesh).unwrap();
        prop_assert!(report.volume > 0.0);
        prop_assert!(report.issues.is_empty());
    }

    #[test]
    fn orientation_ignores_translation(size in dims(), offset in offsets()) {
        // Quarter turns only: 45° tilts put faces exactly on the overhang threshold.
        let config = OrientationConfig {
            candidates: CANDIDATE_ROTATIONS[..9].to_vec(),
            ..OrientationConfig::default()
        };
        let here = search_orientations(&cuboid(size, [0.0; 3]), &config).unwrap();
        let there = search_orientations(&cuboid(size, offset), &config).unwrap();
        for (a, b) in here.iter().zip(&there) {
            prop_assert!((a.height - b.height).abs() < 1e-6);
            prop_assert!((a.overhang_pct - b.overhang_pct).abs() < 1e-6);
        }
    }
}

#[test]
fn best_orientation_reports_every_candidate() {
    let result = best_orientation(&cuboid([2.0, 3.0, 4.0], [5.0, 5.0, 5.0])).unwrap();
    assert_eq!(result.candidates_evaluated, 12);
    assert!(result.height > 0.0);
    assert_relative_eq!(
        result.overhang_pct.clamp(0.0, 100.0),
        result.overhang_pct,
        epsilon = 1e-12
    );
}
