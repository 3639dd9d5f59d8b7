//! Tests for reading STL bytes, both standalone and from exported solids.

use kernel_bridge::stl::{write_ascii_stl, write_binary_stl};
use kernel_bridge::ExportFormat;
use mesh_audit::check_mesh;
use test_harness::helpers::*;
use test_harness::oracle::run_all_mesh_checks;
use test_harness::stl::{parse_ascii_stl, parse_binary_stl};
use test_harness::{HarnessError, ScriptSession};

#[test]
fn binary_reader_gives_fresh_vertices_per_facet() {
    let bytes = write_binary_stl(&unit_cube(), "cube").unwrap();
    let mesh = parse_binary_stl(&bytes).unwrap();
    assert_eq!(mesh.triangle_count(), 12);
    assert_eq!(mesh.vertices.len(), 36);
    assert!((mesh_volume(&mesh) - 1.0).abs() < 1e-6);
}

#[test]
fn ascii_reader_matches_binary() {
    let cube = cuboid([0.0; 3], [2.0, 3.0, 4.0]);
    let from_binary = parse_binary_stl(&write_binary_stl(&cube, "c").unwrap()).unwrap();
    let from_ascii = parse_ascii_stl(&write_ascii_stl(&cube, "c").unwrap()).unwrap();
    assert_eq!(from_binary.triangle_count(), from_ascii.triangle_count());
    assert!((mesh_volume(&from_binary) - mesh_volume(&from_ascii)).abs() < 1e-4);
    assert!((mesh_surface_area(&from_ascii) - 52.0).abs() < 1e-4);
}

#[test]
fn truncated_binary_is_rejected() {
    let bytes = write_binary_stl(&unit_cube(), "cube").unwrap();
    let err = parse_binary_stl(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, HarnessError::StlError { .. }));
    assert!(parse_binary_stl(&[0u8; 10]).is_err());
}

#[test]
fn ascii_without_header_is_rejected() {
    let err = parse_ascii_stl("facet normal 0 0 1\n").unwrap_err();
    assert!(err.to_string().contains("missing 'solid' header"));
}

#[test]
fn ascii_partial_facet_is_rejected() {
    let text = "solid x\n  vertex 0 0 0\n  vertex 1 0 0\nendsolid x\n";
    assert!(parse_ascii_stl(text).is_err());
}

#[test]
fn ascii_bad_number_names_the_line() {
    let text = "solid x\n  vertex 0 zero 0\n";
    let err = parse_ascii_stl(text).unwrap_err();
    assert!(err.to_string().contains("line 2"), "{}", err);
}

// ── Exported Solids ─────────────────────────────────────────────────────

#[test]
fn exported_binary_stl_is_manifold() {
    let mut s = ScriptSession::mock();
    s.run(SINGLE_BOX);
    let bytes = s.export(ExportFormat::Stl).unwrap();
    assert_eq!(bytes.len(), 84 + 12 * 50);

    let mesh = parse_binary_stl(&bytes).unwrap();
    let report = check_mesh(&mesh).unwrap();
    assert!(report.is_manifold(), "{:?}", report.issues);
    assert!((report.volume - 6000.0).abs() < 1e-3);
    for v in run_all_mesh_checks(&mesh) {
        assert!(v.passed, "{}: {}", v.oracle_name, v.detail);
    }
}

#[test]
fn exported_ascii_stl_of_fused_row() {
    let mut s = ScriptSession::mock();
    s.run(TOUCHING_ROW);
    let bytes = s.export(ExportFormat::StlAscii).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("solid "));

    let mesh = parse_ascii_stl(&text).unwrap();
    assert!((mesh_volume(&mesh) - 3.0).abs() < 1e-4);
    let [min, max] = mesh.bounds().unwrap();
    assert_eq!(min, [0.0; 3]);
    assert_eq!(max, [3.0, 1.0, 1.0]);
}

#[test]
fn export_after_fatal_run_is_refused() {
    let mut s = ScriptSession::mock();
    s.run("result = 5\n");
    assert!(matches!(
        s.export(ExportFormat::Stl),
        Err(HarnessError::UnexpectedOutcome { .. })
    ));
}
