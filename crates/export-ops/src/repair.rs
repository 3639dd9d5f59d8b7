//! Single-solid enforcement.
//!
//! A result holding several solids is fused left to right. A fusion step the
//! kernel reports as failed, or a fused result that still holds more than one
//! solid, is a split body. Errors from the counting and traversal machinery
//! itself are tooling faults: they are logged and the input passes through.

use kernel_bridge::{Kernel, KernelError, ShapeHandle};
use studio_types::{Diagnostic, DiagnosticKind};
use tracing::{info, instrument, warn};

use crate::types::{FatalError, FatalKind, NormalizedSolid, RepairedSolid};

enum Failure {
    Split { count: usize, reason: String },
    Tooling(KernelError),
}

impl From<KernelError> for Failure {
    fn from(err: KernelError) -> Self {
        Failure::Tooling(err)
    }
}

/// Make sure `solid` holds exactly one solid, fusing when it holds several.
///
/// On success the diagnostics hold one `FuseApplied` entry when fusion ran.
#[instrument(skip_all, fields(shape = solid.handle.id()))]
pub fn ensure_single_solid(
    kernel: &mut dyn Kernel,
    solid: NormalizedSolid,
) -> Result<(RepairedSolid, Vec<Diagnostic>), FatalError> {
    match fuse_all(kernel, &solid.handle) {
        Ok(None) => Ok((RepairedSolid { handle: solid.handle }, Vec::new())),
        Ok(Some((handle, count))) => {
            info!(solids = count, "solids fused");
            let diagnostic = Diagnostic::new(
                DiagnosticKind::FuseApplied,
                format!("{} solids merged into 1", count),
            );
            Ok((RepairedSolid { handle }, vec![diagnostic]))
        }
        Err(Failure::Split { count, reason }) => {
            warn!(solids = count, %reason, "split body");
            let diagnostic = Diagnostic::new(
                DiagnosticKind::FuseFailed,
                format!("{} disconnected solids ({})", count, reason),
            );
            Err(FatalError {
                kind: FatalKind::SplitBody { count, reason },
                diagnostics: vec![diagnostic],
            })
        }
        Err(Failure::Tooling(err)) => {
            warn!(error = %err, "solid count check skipped");
            Ok((RepairedSolid { handle: solid.handle }, Vec::new()))
        }
    }
}

/// `Ok(None)` when no fusion is needed, else the fused shape and how many
/// solids went into it.
fn fuse_all(
    kernel: &mut dyn Kernel,
    shape: &ShapeHandle,
) -> Result<Option<(ShapeHandle, usize)>, Failure> {
    let count = kernel.count_solids(shape)?;
    if count <= 1 {
        return Ok(None);
    }

    let solids = kernel.solids(shape)?;
    let mut iter = solids.into_iter();
    let Some(mut fused) = iter.next() else {
        return Ok(None);
    };
    for next in iter {
        fused = match kernel.boolean_fuse(&fused, &next) {
            Ok(h) => h,
            Err(KernelError::BooleanFailed { .. }) => {
                return Err(Failure::Split {
                    count,
                    reason: "fuse failed".to_string(),
                })
            }
            Err(other) => return Err(Failure::Tooling(other)),
        };
    }

    if kernel.count_solids(&fused)? == 1 {
        Ok(Some((fused, count)))
    } else {
        Err(Failure::Split {
            count,
            reason: "after fuse attempt".to_string(),
        })
    }
}
