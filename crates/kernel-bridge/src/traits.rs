use crate::types::*;

/// Narrow contract with the geometry kernel.
/// Implemented by the host's real kernel binding and by MockKernel (deterministic test double).
pub trait Kernel {
    /// Run a script in a fresh namespace and return its top-level bindings.
    fn execute(&mut self, request: &ExecRequest) -> Result<Namespace, KernelError>;

    /// Tessellate a shape to a triangle mesh.
    fn tessellate(&mut self, shape: &ShapeHandle, tolerance: f64) -> Result<TriMesh, KernelError>;

    /// Boolean union of two shapes. A geometric failure is `BooleanFailed`.
    fn boolean_fuse(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError>;

    /// Solid sub-shapes of `shape`, in topological traversal order.
    fn solids(&mut self, shape: &ShapeHandle) -> Result<Vec<ShapeHandle>, KernelError>;

    /// Number of solid sub-shapes.
    fn count_solids(&mut self, shape: &ShapeHandle) -> Result<usize, KernelError> {
        Ok(self.solids(shape)?.len())
    }

    /// Group shapes into one compound without fusing them.
    fn make_compound(&mut self, shapes: &[ShapeHandle]) -> Result<ShapeHandle, KernelError>;

    /// Write a shape in the requested format.
    fn export(&mut self, shape: &ShapeHandle, format: ExportFormat) -> Result<Vec<u8>, KernelError>;
}
