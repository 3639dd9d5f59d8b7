//! End-to-end run: sanitize, policy scan, execute, normalize, repair.

use kernel_bridge::Kernel;
use script_guard::{blocking_codes, sanitize_with, scan_policy, FindingLevel, Script};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::executor;
use crate::normalize::normalize;
use crate::repair::ensure_single_solid;
use crate::types::{FatalError, FatalKind, RunOutput};

/// Run `script` through every stage and return the repaired solid.
///
/// Recoverable findings are returned as diagnostics; the first fatal one
/// aborts the run and carries the diagnostics gathered up to that point.
pub fn sanitize_and_run(
    kernel: &mut dyn Kernel,
    script: &Script,
    config: &PipelineConfig,
) -> Result<RunOutput, FatalError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("pipeline", %run_id);
    let _guard = span.enter();

    let (sanitized, mut diagnostics) = sanitize_with(script, &config.guard_config());

    let findings = scan_policy(sanitized.as_str(), &config.result_binding);
    for f in &findings {
        warn!(code = %f.code, level = ?f.level, "{}", f.message);
    }
    let codes = blocking_codes(&findings);
    if config.enforce_policy && !codes.is_empty() {
        return Err(FatalError::new(FatalKind::PolicyViolation { codes }).after(&diagnostics));
    }
    let policy_warnings = findings
        .into_iter()
        .filter(|f| f.level == FindingLevel::Warning)
        .collect();

    let request = config.exec_request(&sanitized);
    let candidate =
        executor::run(kernel, &request).map_err(|e| FatalError::new(e).after(&diagnostics))?;
    let exportables = normalize(&candidate).map_err(|e| FatalError::new(e).after(&diagnostics))?;
    let normalized = exportables.into_solid(kernel).map_err(|e| {
        FatalError::new(FatalKind::Export {
            reason: e.to_string(),
        })
        .after(&diagnostics)
    })?;

    let (solid, repair_diagnostics) =
        ensure_single_solid(kernel, normalized).map_err(|e| e.after(&diagnostics))?;
    diagnostics.extend(repair_diagnostics);

    info!(
        shape = solid.handle.id(),
        diagnostics = diagnostics.len(),
        "pipeline finished"
    );
    Ok(RunOutput {
        solid,
        script: sanitized,
        diagnostics,
        policy_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_bridge::{MockKernel, MOCK_BUILTINS};
    use studio_types::DiagnosticKind;

    fn config() -> PipelineConfig {
        PipelineConfig::with_known(MOCK_BUILTINS.iter().copied())
    }

    fn run(script: &str) -> Result<RunOutput, FatalError> {
        sanitize_and_run(&mut MockKernel::new(), &Script::new(script), &config())
    }

    #[test]
    fn clean_script_produces_one_solid() {
        let out = run("result = box(10, 10, 10)\n").unwrap();
        assert!(out.diagnostics.is_empty());
        assert!(out.policy_warnings.is_empty());
    }

    #[test]
    fn hallucinated_helper_is_stripped_and_run_continues() {
        let out = run("result = box(4, 4, 4)\nmake_pretty(result)\n").unwrap();
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::StrippedCall);
        assert!(out.script.as_str().contains("# stripped unknown: make_pretty"));
    }

    #[test]
    fn oversized_fillet_is_contained() {
        let out = run("result = box(2, 2, 2)\nresult = result.fillet(5)\n").unwrap();
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::GuardedOp);
    }

    #[test]
    fn touching_parts_are_fused_with_a_diagnostic() {
        let script = "\
a = box(1, 1, 1)
b = box(1, 1, 1).translate((1, 0, 0))
result = [a, b]
";
        let out = run(script).unwrap();
        assert_eq!(out.diagnostics.last().unwrap().detail, "2 solids merged into 1");
    }

    #[test]
    fn policy_violation_stops_before_execution() {
        let mut k = MockKernel::new();
        let err = sanitize_and_run(
            &mut k,
            &Script::new("import os\nos.remove('x')\nresult = box(1, 1, 1)\n"),
            &config(),
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            FatalKind::PolicyViolation {
                codes: vec!["os_access".to_string()]
            }
        );
    }

    #[test]
    fn permissive_config_reports_policy_but_runs() {
        let config = PipelineConfig {
            enforce_policy: false,
            ..config()
        };
        let out = sanitize_and_run(
            &mut MockKernel::new(),
            &Script::new("import socket\nresult = box(1, 1, 1)\n"),
            &config,
        )
        .unwrap();
        assert!(out.policy_warnings.is_empty());
    }

    #[test]
    fn missing_result_reaches_the_executor_under_enforced_policy() {
        let err = run("part = box(1, 1, 1)\n").unwrap_err();
        assert_eq!(
            err.kind,
            FatalKind::NoResultBinding {
                binding: "result".to_string()
            }
        );
    }

    #[test]
    fn unpacked_result_binding_passes_the_policy_scan() {
        let out = run("result, spare = box(1, 1, 1), 0\n").unwrap();
        assert!(out.policy_warnings.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn fatal_errors_keep_earlier_diagnostics() {
        let err = run("unknown_thing()\nresult = 5\n").unwrap_err();
        assert_eq!(err.kind, FatalKind::NoGeometry);
        assert_eq!(err.diagnostics.len(), 1);
        assert_eq!(err.diagnostics[0].kind, DiagnosticKind::StrippedCall);
    }
}
