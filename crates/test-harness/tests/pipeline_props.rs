//! Property tests: generated scripts through the whole session.

use approx::relative_eq;
use proptest::prelude::*;
use studio_types::DiagnosticKind;
use test_harness::ScriptSession;

fn half_units() -> impl Strategy<Value = f64> {
    (1u32..100).prop_map(|n| f64::from(n) * 0.5)
}

fn box_dims() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(half_units())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_box_comes_out_manifold_with_its_volume([w, d, h] in box_dims()) {
        let mut s = ScriptSession::mock();
        s.run(&format!("result = box({}, {}, {})\n", w, d, h));
        prop_assert!(s.output().is_ok(), "{:?}", s.fatal());

        let report = s.check().unwrap();
        prop_assert!(report.is_manifold(), "{:?}", report.issues);
        prop_assert!(relative_eq!(report.volume, w * d * h, max_relative = 1e-9));
        prop_assert_eq!(report.bounds, [[0.0; 3], [w, d, h]]);
    }

    #[test]
    fn touching_row_always_fuses_into_one_solid(n in 2usize..6, [w, d, h] in box_dims()) {
        let mut script = String::new();
        for i in 0..n {
            script.push_str(&format!(
                "p{} = box({}, {}, {}).translate(({}, 0, 0))\n",
                i,
                w,
                d,
                h,
                w * i as f64
            ));
        }
        let names: Vec<String> = (0..n).map(|i| format!("p{}", i)).collect();
        script.push_str(&format!("result = [{}]\n", names.join(", ")));

        let mut s = ScriptSession::mock();
        s.run(&script);
        s.assert_solid_count(1).unwrap();
        let diags = s.diagnostics().unwrap();
        prop_assert_eq!(diags.len(), 1);
        prop_assert_eq!(diags[0].kind, DiagnosticKind::FuseApplied);
        prop_assert_eq!(&diags[0].detail, &format!("{} solids merged into 1", n));
    }

    #[test]
    fn unknown_helpers_are_stripped_without_touching_the_result(
        helper in "zz_[a-z]{3,12}",
        [w, d, h] in box_dims(),
    ) {
        let mut s = ScriptSession::mock();
        s.run(&format!("result = box({}, {}, {})\n{}(result)\n", w, d, h, helper));
        let out = s.output().unwrap();
        prop_assert_eq!(out.diagnostics.len(), 1);
        prop_assert_eq!(out.diagnostics[0].kind, DiagnosticKind::StrippedCall);
        prop_assert!(out.diagnostics[0].detail.contains(&helper));
        s.assert_solid_count(1).unwrap();
    }
}
