use proptest::prelude::*;
use script_guard::{outline, sanitize, Script, GUARD_MARKER};
use studio_types::DiagnosticKind;

fn unknown_name() -> impl Strategy<Value = String> {
    "zz_[a-z]{1,6}"
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a = Box(1, 2, 3)".to_string()),
        Just("b = a.fillet(0.5)".to_string()),
        Just("c = a.chamfer(0.2)".to_string()),
        Just("result = a".to_string()),
        Just("try:\n    e = a.fillet(1)\nexcept Exception:\n    pass".to_string()),
        unknown_name().prop_map(|n| format!("{}(a)", n)),
        unknown_name().prop_map(|n| format!("if a:\n    d = a.fillet(1)\n    x = {}(\n        2)", n)),
    ]
}

fn script() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 1..8).prop_map(|lines| lines.join("\n") + "\n")
}

proptest! {
    #[test]
    fn sanitizing_is_idempotent(src in script()) {
        let (once, _) = sanitize(&Script::new(src));
        let (twice, diags) = sanitize(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(diags.is_empty());
    }

    #[test]
    fn sanitized_output_still_parses(src in script()) {
        let (out, _) = sanitize(&Script::new(src));
        prop_assert!(outline(out.as_str()).is_ok());
    }

    #[test]
    fn unknown_calls_are_gone_and_named(src in script(), name in unknown_name()) {
        let src = format!("{}{}(1)\n", src, name);
        let (out, diags) = sanitize(&Script::new(src));
        let call = format!("{}(", name);
        for line in out.as_str().lines() {
            let code = line.split('#').next().unwrap_or("");
            prop_assert!(!code.contains(&call), "call survived: {}", line);
        }
        prop_assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::StrippedCall && d.detail.contains(&name)));
    }

    #[test]
    fn every_fragile_line_ends_up_protected(src in script()) {
        let (out, _) = sanitize(&Script::new(src));
        let lines: Vec<&str> = out.as_str().lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.contains(".fillet(") || line.contains(".chamfer(") {
                // Directly wrapped, or inside a hand-written try block.
                let wrapped = i >= 2 && lines[i - 2].trim() == GUARD_MARKER;
                let in_try = i >= 1 && lines[i - 1].trim() == "try:";
                prop_assert!(wrapped || in_try, "unprotected: {}", line);
            }
        }
    }
}
