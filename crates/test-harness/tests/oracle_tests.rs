//! Oracle tests: the brute-force checks against fixture meshes, and their
//! agreement with mesh-audit.

use mesh_audit::{check, check_mesh, normalize_winding, IntegrityConfig};
use studio_types::TriMesh;
use test_harness::helpers::*;
use test_harness::oracle::*;

// ── Closed Meshes ───────────────────────────────────────────────────────

#[test]
fn test_unit_cube_passes_every_oracle() {
    let verdicts = run_all_mesh_checks(&unit_cube());
    assert_eq!(verdicts.len(), 5);
    for v in &verdicts {
        assert!(v.passed, "{} failed: {}", v.oracle_name, v.detail);
    }
}

#[test]
fn test_subdivided_cube_welds_by_position() {
    let mesh = subdivided_cube(4, 2.0);
    assert_eq!(mesh.triangle_count(), 12 * 16);
    assert!(check_watertight_mesh(&mesh).passed);
    assert!(check_consistent_winding(&mesh).passed);
    let vol = check_positive_volume(&mesh);
    assert!(vol.passed);
    assert!((vol.value.unwrap() - 8.0).abs() < 1e-9);
}

#[test]
fn test_bounding_box_tolerance() {
    let mesh = cuboid([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]);
    assert!(check_bounding_box(&mesh, [1.0, 2.0, 3.0], [4.0, 5.0, 6.0], 1e-12).passed);
    let off = check_bounding_box(&mesh, [1.0, 2.0, 3.0], [4.0, 5.0, 6.5], 0.1);
    assert!(!off.passed);
    assert!((off.value.unwrap() - 0.5).abs() < 1e-12);
}

// ── Defective Meshes ────────────────────────────────────────────────────

#[test]
fn test_open_cube_is_not_watertight() {
    let v = check_watertight_mesh(&open_cube());
    assert!(!v.passed);
    assert!(v.detail.contains("4 unpaired edges"), "{}", v.detail);
}

#[test]
fn test_flipped_triangle_breaks_winding() {
    let mut mesh = unit_cube();
    mesh.triangles[0].swap(1, 2);
    assert!(check_watertight_mesh(&mesh).passed);
    assert!(!check_consistent_winding(&mesh).passed);
}

#[test]
fn test_inverted_cube_has_negative_volume() {
    let mut mesh = unit_cube();
    for t in &mut mesh.triangles {
        t.swap(1, 2);
    }
    assert!(check_consistent_winding(&mesh).passed);
    let v = check_positive_volume(&mesh);
    assert!(!v.passed);
    assert!((v.value.unwrap() + 1.0).abs() < 1e-12);
}

#[test]
fn test_degenerate_triangles_are_counted() {
    let mut mesh = unit_cube();
    mesh.vertices.push([0.5, 0.5, 0.5]);
    mesh.triangles.push([8, 8, 8]);
    mesh.triangles.push([0, 1, 0]);
    let v = check_no_degenerate_triangles(&mesh);
    assert!(!v.passed);
    assert_eq!(v.value, Some(2.0));
}

#[test]
fn test_bad_index_stops_the_composite() {
    let mesh = TriMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![[0, 1, 2]]);
    let verdicts = run_all_mesh_checks(&mesh);
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].oracle_name, "valid_indices");
    assert!(!verdicts[0].passed);
}

#[test]
fn test_empty_mesh_has_no_bounds() {
    let v = check_bounding_box(&TriMesh::default(), [0.0; 3], [1.0; 3], 1.0);
    assert!(!v.passed);
}

// ── Agreement With mesh-audit ───────────────────────────────────────────

#[test]
fn test_report_agrees_on_fixtures() {
    for (name, mesh) in [
        ("unit", unit_cube()),
        ("open", open_cube()),
        ("slab", cuboid([0.0; 3], [10.0, 10.0, 1.0])),
        ("dense", subdivided_cube(6, 3.0)),
    ] {
        let report = check_mesh(&mesh).unwrap();
        let v = check_report_agrees(&mesh, &report);
        assert!(v.passed, "{}: {}", name, v.detail);
    }
}

#[test]
fn test_normalized_winding_satisfies_oracles() {
    let mut mesh = subdivided_cube(3, 1.0);
    for t in mesh.triangles.iter_mut().step_by(3) {
        t.swap(1, 2);
    }
    assert!(!check_consistent_winding(&mesh).passed);

    let fixed = normalize_winding(&mesh);
    assert!(check_consistent_winding(&fixed).passed);
    assert!(check_positive_volume(&fixed).passed);
}

#[test]
fn test_as_is_report_sees_inverted_volume() {
    let mut mesh = unit_cube();
    for t in &mut mesh.triangles {
        t.swap(1, 2);
    }
    let normalized = check(&mesh, &IntegrityConfig::default()).unwrap();
    assert!((normalized.volume - 1.0).abs() < 1e-12);

    assert!(normalized.issues.is_empty());

    let raw = check(&mesh, &IntegrityConfig::as_is()).unwrap();
    assert!((raw.volume - 1.0).abs() < 1e-12);
    assert!(raw.issues.iter().any(|i| i.contains("Negative volume")));
}

#[test]
fn test_verdict_serializes() {
    let v = check_positive_volume(&unit_cube());
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["oracle_name"], "positive_volume");
    assert_eq!(json["passed"], true);
}
