/// Errors from mesh analysis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuditError {
    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("face indicator failed: {reason}")]
    IndicatorFailed { reason: String },
}

impl AuditError {
    /// Reject meshes whose triangles reference missing vertices.
    pub(crate) fn check_indices(mesh: &studio_types::TriMesh) -> Result<(), AuditError> {
        match mesh.first_out_of_range() {
            Some(index) => Err(AuditError::IndexOutOfRange {
                index,
                vertex_count: mesh.vertices.len(),
            }),
            None => Ok(()),
        }
    }
}
