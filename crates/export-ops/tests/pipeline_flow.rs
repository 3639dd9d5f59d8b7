use export_ops::{
    check_solid, export_solid, sanitize_and_run, FatalKind, PipelineConfig,
};
use kernel_bridge::{ExportFormat, FusePolicy, Kernel, MockKernel, MOCK_BUILTINS};
use mesh_audit::IntegrityConfig;
use script_guard::Script;
use studio_types::DiagnosticKind;

fn config() -> PipelineConfig {
    PipelineConfig::with_known(MOCK_BUILTINS.iter().copied())
}

#[test]
fn failing_fillet_keeps_the_shape_built_before_it() {
    let script = "\
result = box(2, 3, 4)
result = result.fillet(10)
";
    let mut k = MockKernel::new();
    let out = sanitize_and_run(&mut k, &Script::new(script), &config()).unwrap();
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::GuardedOp);
    assert_eq!(out.diagnostics[0].line, Some(2));

    let report = check_solid(&mut k, &out.solid, 0.1, &IntegrityConfig::default()).unwrap();
    assert_eq!(report.bounds, [[0.0; 3], [2.0, 3.0, 4.0]]);
}

#[test]
fn run_then_export_binary_stl() {
    let mut k = MockKernel::new();
    let out = sanitize_and_run(&mut k, &Script::new("result = box(1, 1, 1)\n"), &config()).unwrap();
    let bytes = export_solid(&mut k, &out.solid, ExportFormat::Stl).unwrap();
    assert_eq!(bytes.len(), 84 + 12 * 50);
}

#[test]
fn runtime_error_surfaces_the_trace() {
    let err = sanitize_and_run(
        &mut MockKernel::new(),
        &Script::new("result = box(-1, 1, 1)\n"),
        &config(),
    )
    .unwrap_err();
    let FatalKind::ExecutionFailure { trace } = err.kind else {
        panic!("expected an execution failure, got {:?}", err.kind);
    };
    assert!(trace.contains("ValueError"), "{}", trace);
}

#[test]
fn geometry_with_a_label_is_rejected() {
    let err = sanitize_and_run(
        &mut MockKernel::new(),
        &Script::new("result = [box(1, 1, 1), 'oops']\n"),
        &config(),
    )
    .unwrap_err();
    assert_eq!(
        err.kind,
        FatalKind::MixedContent {
            examples: vec!["string:oops".to_string()]
        }
    );
    assert_eq!(err.to_string(), "result mixed geometry with non-geometry values (string:oops)");
}

#[test]
fn disjoint_parts_are_a_split_body_when_fusion_fails() {
    let script = "\
a = box(1, 1, 1)
b = box(1, 1, 1).translate((5, 0, 0))
result = {'left': a, 'right': b}
";
    let mut k = MockKernel::new().with_fuse_policy(FusePolicy::RejectDisjoint);
    let err = sanitize_and_run(&mut k, &Script::new(script), &config()).unwrap_err();
    assert!(matches!(err.kind, FatalKind::SplitBody { count: 2, .. }));
    assert_eq!(err.diagnostics.last().unwrap().kind, DiagnosticKind::FuseFailed);
}

#[test]
fn three_touching_parts_come_out_as_one_solid() {
    let script = "\
a = box(1, 1, 1)
b = box(1, 1, 1).translate((1, 0, 0))
c = box(1, 1, 1).translate((2, 0, 0))
result = workplane(a, b, c)
";
    let mut k = MockKernel::new();
    let out = sanitize_and_run(&mut k, &Script::new(script), &config()).unwrap();
    assert_eq!(k.count_solids(&out.solid.handle).unwrap(), 1);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].detail, "3 solids merged into 1");
}

#[test]
fn translate_warning_does_not_block() {
    let config = PipelineConfig {
        enforce_policy: true,
        ..config()
    };
    let script = "base = box(1, 1, 1)\nresult = base\nif False:\n    base.translate(1, 2, 3)\n";
    let out = sanitize_and_run(&mut MockKernel::new(), &Script::new(script), &config).unwrap();
    assert_eq!(out.policy_warnings.len(), 1);
    assert_eq!(out.policy_warnings[0].code, "translate_signature");
}

#[test]
fn custom_result_binding_flows_through_every_stage() {
    let config = PipelineConfig {
        result_binding: "part".to_string(),
        ..config()
    };
    let out = sanitize_and_run(
        &mut MockKernel::new(),
        &Script::new("part = build_part(box(2, 2, 2))\n"),
        &config,
    );
    assert!(out.is_ok(), "{:?}", out.err());
}

#[test]
fn config_loads_from_json() {
    let json = r#"{ "extra_known_names": ["box"], "tessellation_tolerance": 0.05 }"#;
    let config = PipelineConfig::from_json(json).unwrap();
    let out = sanitize_and_run(&mut MockKernel::new(), &Script::new("result = box(1, 2, 3)\n"), &config);
    assert!(out.is_ok());
    assert_eq!(config.tessellation_tolerance, 0.05);
}
