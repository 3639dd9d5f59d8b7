//! Execution boundary: run a script in the kernel and capture one binding.

use kernel_bridge::{Candidate, ExecRequest, Kernel, KernelError};
use tracing::{debug, info, instrument};

use crate::types::ExecutionError;

/// Run `request` and take its result binding out of the namespace.
///
/// A binding that is missing or bound to `None` counts as missing.
#[instrument(skip_all, fields(binding = %request.result_binding))]
pub fn run(kernel: &mut dyn Kernel, request: &ExecRequest) -> Result<Candidate, ExecutionError> {
    let mut namespace = kernel.execute(request).map_err(|err| {
        debug!(error = %err, "script execution failed");
        ExecutionError::Runtime {
            trace: match err {
                KernelError::ScriptRaised { trace } => trace,
                other => other.to_string(),
            },
        }
    })?;

    match namespace.take(&request.result_binding) {
        Some(candidate) if !candidate.is_absent() => {
            info!(bindings = namespace.bindings.len() + 1, "script executed");
            Ok(candidate)
        }
        _ => Err(ExecutionError::MissingResult {
            binding: request.result_binding.clone(),
        }),
    }
}
