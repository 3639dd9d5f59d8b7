//! Mesh analyses of a repaired solid: integrity report and print orientation.

use kernel_bridge::Kernel;
use mesh_audit::{IntegrityConfig, MeshReport, OrientationConfig, OrientationResult};
use studio_types::TriMesh;
use tracing::instrument;

use crate::types::{AnalysisError, RepairedSolid};

fn tessellate(
    kernel: &mut dyn Kernel,
    solid: &RepairedSolid,
    tolerance: f64,
) -> Result<TriMesh, AnalysisError> {
    Ok(kernel.tessellate(&solid.handle, tolerance)?)
}

#[instrument(skip_all, fields(shape = solid.handle.id(), tolerance))]
pub fn check_solid(
    kernel: &mut dyn Kernel,
    solid: &RepairedSolid,
    tolerance: f64,
    config: &IntegrityConfig,
) -> Result<MeshReport, AnalysisError> {
    let mesh = tessellate(kernel, solid, tolerance)?;
    Ok(mesh_audit::check(&mesh, config)?)
}

#[instrument(skip_all, fields(shape = solid.handle.id(), tolerance))]
pub fn orient_solid(
    kernel: &mut dyn Kernel,
    solid: &RepairedSolid,
    tolerance: f64,
    config: &OrientationConfig,
) -> Result<OrientationResult, AnalysisError> {
    let mesh = tessellate(kernel, solid, tolerance)?;
    Ok(mesh_audit::best_orientation_with(&mesh, config)?)
}
