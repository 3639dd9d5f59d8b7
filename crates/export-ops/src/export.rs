//! Export of a repaired solid through the kernel contract.

use std::path::Path;

use kernel_bridge::{ExportFormat, Kernel};
use tracing::{info, instrument};

use crate::types::{FatalError, FatalKind, RepairedSolid};

/// Serialize `solid` in `format`.
#[instrument(skip_all, fields(shape = solid.handle.id(), ?format))]
pub fn export_solid(
    kernel: &mut dyn Kernel,
    solid: &RepairedSolid,
    format: ExportFormat,
) -> Result<Vec<u8>, FatalError> {
    let bytes = kernel.export(&solid.handle, format).map_err(|err| {
        FatalError::new(FatalKind::Export {
            reason: err.to_string(),
        })
    })?;
    info!(bytes = bytes.len(), "solid exported");
    Ok(bytes)
}

/// Export to `path`, picking the format from its extension.
pub fn export_to_path(
    kernel: &mut dyn Kernel,
    solid: &RepairedSolid,
    path: &Path,
) -> Result<ExportFormat, FatalError> {
    let format = ExportFormat::from_path(path);
    let bytes = export_solid(kernel, solid, format)?;
    std::fs::write(path, bytes).map_err(|err| {
        FatalError::new(FatalKind::Export {
            reason: format!("{}: {}", path.display(), err),
        })
    })?;
    Ok(format)
}
