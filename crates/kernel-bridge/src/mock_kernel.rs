//! MockKernel: deterministic test double implementing Kernel.
//!
//! Solids are unions of axis-aligned boxes. Fusing merges boxes that touch or
//! overlap into one solid and leaves disjoint boxes as separate solids, the way a
//! real kernel's fuse reports "done" on disjoint inputs. Scripts are run by a small
//! interpreter (see `mock_script`).

use std::collections::HashMap;

use tracing::debug;

use crate::mock_script;
use crate::stl;
use crate::traits::Kernel;
use crate::types::*;

/// Contact tolerance for deciding whether two boxes touch.
const TOUCH_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Aabb {
    min: [f64; 3],
    max: [f64; 3],
}

impl Aabb {
    fn touches(&self, other: &Aabb) -> bool {
        (0..3).all(|k| {
            self.min[k] <= other.max[k] + TOUCH_EPS && other.min[k] <= self.max[k] + TOUCH_EPS
        })
    }

    fn translated(&self, v: [f64; 3]) -> Aabb {
        Aabb {
            min: [self.min[0] + v[0], self.min[1] + v[1], self.min[2] + v[2]],
            max: [self.max[0] + v[0], self.max[1] + v[1], self.max[2] + v[2]],
        }
    }

    fn smallest_side(&self) -> f64 {
        (0..3)
            .map(|k| self.max[k] - self.min[k])
            .fold(f64::INFINITY, f64::min)
    }

    /// 8 corners and 12 outward-wound triangles.
    fn mesh(&self) -> TriMesh {
        let [x0, y0, z0] = self.min;
        let [x1, y1, z1] = self.max;
        let vertices = vec![
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ];
        let triangles = vec![
            // Bottom (-Z)
            [0, 2, 1],
            [0, 3, 2],
            // Top (+Z)
            [4, 5, 6],
            [4, 6, 7],
            // Front (-Y)
            [0, 1, 5],
            [0, 5, 4],
            // Back (+Y)
            [2, 3, 7],
            [2, 7, 6],
            // Left (-X)
            [0, 4, 7],
            [0, 7, 3],
            // Right (+X)
            [1, 2, 6],
            [1, 6, 5],
        ];
        TriMesh::new(vertices, triangles)
    }
}

/// A connected union of boxes.
#[derive(Debug, Clone)]
struct MockSolid {
    boxes: Vec<Aabb>,
}

impl MockSolid {
    fn touches(&self, other: &MockSolid) -> bool {
        self.boxes
            .iter()
            .any(|a| other.boxes.iter().any(|b| a.touches(b)))
    }
}

/// A shape is a list of solids; more than one makes it a compound.
#[derive(Debug, Clone, Default)]
struct MockShape {
    solids: Vec<MockSolid>,
}

/// Free functions of the mock script dialect. A sanitizer running ahead of this
/// kernel needs them registered as known names.
pub const MOCK_BUILTINS: &[&str] = &[
    "box",
    "workplane",
    "build_part",
    "build_sketch",
    "compound",
    "fuse",
    "opaque",
    "print",
    "len",
];

/// How `boolean_fuse` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FusePolicy {
    /// Merge touching solids; disjoint solids come back as separate solids.
    #[default]
    Merge,
    /// Report `BooleanFailed` when the inputs share no boundary.
    RejectDisjoint,
    /// Report `BooleanFailed` on every call.
    AlwaysFail,
}

/// Deterministic test double for the geometry kernel.
#[derive(Debug)]
pub struct MockKernel {
    next_handle: u64,
    shapes: HashMap<u64, MockShape>,
    fuse_policy: FusePolicy,
    /// When set, solid traversal fails with this message.
    tooling_fault: Option<String>,
    fuse_calls: usize,
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
            fuse_policy: FusePolicy::Merge,
            tooling_fault: None,
            fuse_calls: 0,
        }
    }

    pub fn with_fuse_policy(mut self, policy: FusePolicy) -> Self {
        self.fuse_policy = policy;
        self
    }

    /// Make solid traversal fail, simulating an internal kernel error.
    pub fn with_tooling_fault(mut self, message: impl Into<String>) -> Self {
        self.tooling_fault = Some(message.into());
        self
    }

    /// Number of `boolean_fuse` calls made so far.
    pub fn fuse_calls(&self) -> usize {
        self.fuse_calls
    }

    /// Insert a single box solid spanning `min..max`.
    pub fn insert_box(&mut self, min: [f64; 3], max: [f64; 3]) -> ShapeHandle {
        self.insert(MockShape {
            solids: vec![MockSolid {
                boxes: vec![Aabb { min, max }],
            }],
        })
    }

    fn insert(&mut self, shape: MockShape) -> ShapeHandle {
        let h = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(h.0, shape);
        h
    }

    fn get(&self, h: &ShapeHandle) -> Result<&MockShape, KernelError> {
        self.shapes
            .get(&h.0)
            .ok_or(KernelError::ShapeNotFound { id: h.0 })
    }

    /// Box of the given size with its minimum corner at the origin.
    pub(crate) fn make_box(&mut self, w: f64, d: f64, h: f64) -> Result<ShapeHandle, String> {
        if !(w > 0.0 && d > 0.0 && h > 0.0) {
            return Err(format!("box dimensions must be positive, got ({}, {}, {})", w, d, h));
        }
        Ok(self.insert_box([0.0, 0.0, 0.0], [w, d, h]))
    }

    pub(crate) fn translated(&mut self, h: &ShapeHandle, v: [f64; 3]) -> Result<ShapeHandle, KernelError> {
        let moved = MockShape {
            solids: self
                .get(h)?
                .solids
                .iter()
                .map(|s| MockSolid {
                    boxes: s.boxes.iter().map(|b| b.translated(v)).collect(),
                })
                .collect(),
        };
        Ok(self.insert(moved))
    }

    /// Fillet/chamfer stand-in: geometry is unchanged, but the size must fit every box.
    pub(crate) fn edge_op(&mut self, h: &ShapeHandle, op: &str, size: f64) -> Result<ShapeHandle, String> {
        let shape = self.get(h).map_err(|e| e.to_string())?.clone();
        let limit = shape
            .solids
            .iter()
            .flat_map(|s| s.boxes.iter())
            .map(Aabb::smallest_side)
            .fold(f64::INFINITY, f64::min);
        if size <= 0.0 || size >= limit / 2.0 {
            return Err(format!("{} of size {} failed: no valid edges (limit {})", op, size, limit / 2.0));
        }
        Ok(self.insert(shape))
    }

    /// Group solids into connected components, preserving first-seen order.
    fn merge_touching(solids: Vec<MockSolid>) -> Vec<MockSolid> {
        let mut merged: Vec<MockSolid> = Vec::new();
        for solid in solids {
            let mut current = solid;
            // Absorb every existing component that touches the incoming solid.
            let mut i = 0;
            let mut first_hit: Option<usize> = None;
            while i < merged.len() {
                if merged[i].touches(&current) {
                    match first_hit {
                        None => {
                            merged[i].boxes.append(&mut current.boxes);
                            current = merged[i].clone();
                            first_hit = Some(i);
                            i += 1;
                        }
                        Some(keep) => {
                            let absorbed = merged.remove(i);
                            merged[keep].boxes.extend(absorbed.boxes);
                            current = merged[keep].clone();
                        }
                    }
                } else {
                    i += 1;
                }
            }
            if first_hit.is_none() {
                merged.push(current);
            }
        }
        merged
    }
}

impl Kernel for MockKernel {
    fn execute(&mut self, request: &ExecRequest) -> Result<Namespace, KernelError> {
        mock_script::run(self, request)
    }

    fn tessellate(&mut self, shape: &ShapeHandle, tolerance: f64) -> Result<TriMesh, KernelError> {
        if !(tolerance > 0.0) {
            return Err(KernelError::TessellationFailed {
                reason: format!("tolerance must be positive, got {}", tolerance),
            });
        }
        let shape = self.get(shape)?;
        let mut mesh = TriMesh::default();
        for b in shape.solids.iter().flat_map(|s| s.boxes.iter()) {
            mesh.append(&b.mesh());
        }
        if mesh.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "shape has no faces".to_string(),
            });
        }
        Ok(mesh)
    }

    fn boolean_fuse(&mut self, a: &ShapeHandle, b: &ShapeHandle) -> Result<ShapeHandle, KernelError> {
        self.fuse_calls += 1;
        let sa = self.get(a)?.clone();
        let sb = self.get(b)?.clone();
        match self.fuse_policy {
            FusePolicy::AlwaysFail => {
                return Err(KernelError::BooleanFailed {
                    reason: "fuse not done".to_string(),
                })
            }
            FusePolicy::RejectDisjoint => {
                let contact = sa
                    .solids
                    .iter()
                    .any(|x| sb.solids.iter().any(|y| x.touches(y)));
                if !contact {
                    return Err(KernelError::BooleanFailed {
                        reason: "operands share no boundary".to_string(),
                    });
                }
            }
            FusePolicy::Merge => {}
        }
        let mut solids = sa.solids;
        solids.extend(sb.solids);
        let merged = Self::merge_touching(solids);
        debug!(a = a.0, b = b.0, solids = merged.len(), "mock fuse");
        Ok(self.insert(MockShape { solids: merged }))
    }

    fn solids(&mut self, shape: &ShapeHandle) -> Result<Vec<ShapeHandle>, KernelError> {
        if let Some(message) = &self.tooling_fault {
            return Err(KernelError::Other {
                message: message.clone(),
            });
        }
        let solids = self.get(shape)?.solids.clone();
        Ok(solids
            .into_iter()
            .map(|s| self.insert(MockShape { solids: vec![s] }))
            .collect())
    }

    fn count_solids(&mut self, shape: &ShapeHandle) -> Result<usize, KernelError> {
        if let Some(message) = &self.tooling_fault {
            return Err(KernelError::Other {
                message: message.clone(),
            });
        }
        Ok(self.get(shape)?.solids.len())
    }

    fn make_compound(&mut self, shapes: &[ShapeHandle]) -> Result<ShapeHandle, KernelError> {
        let mut solids = Vec::new();
        for h in shapes {
            solids.extend(self.get(h)?.solids.iter().cloned());
        }
        Ok(self.insert(MockShape { solids }))
    }

    fn export(&mut self, shape: &ShapeHandle, format: ExportFormat) -> Result<Vec<u8>, KernelError> {
        let name = format!("mock-{}", shape.0);
        match format {
            ExportFormat::Stl => {
                let mesh = self.tessellate(shape, 0.1)?;
                stl::write_binary_stl(&mesh, &name)
            }
            ExportFormat::StlAscii => {
                let mesh = self.tessellate(shape, 0.1)?;
                Ok(stl::write_ascii_stl(&mesh, &name)?.into_bytes())
            }
            ExportFormat::Step => Err(KernelError::NotSupported {
                operation: "STEP export".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_tessellates_to_twelve_triangles() {
        let mut k = MockKernel::new();
        let h = k.insert_box([0.0; 3], [1.0, 2.0, 3.0]);
        let mesh = k.tessellate(&h, 0.1).unwrap();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.bounds().unwrap()[1], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn fuse_merges_touching_boxes() {
        let mut k = MockKernel::new();
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        let b = k.insert_box([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let fused = k.boolean_fuse(&a, &b).unwrap();
        assert_eq!(k.count_solids(&fused).unwrap(), 1);
    }

    #[test]
    fn fuse_of_disjoint_boxes_stays_split() {
        let mut k = MockKernel::new();
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        let b = k.insert_box([5.0; 3], [6.0; 3]);
        let fused = k.boolean_fuse(&a, &b).unwrap();
        assert_eq!(k.count_solids(&fused).unwrap(), 2);
    }

    #[test]
    fn bridging_solid_joins_two_components() {
        let mut k = MockKernel::new();
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        let c = k.insert_box([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
        let ac = k.make_compound(&[a, c]).unwrap();
        let bridge = k.insert_box([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let fused = k.boolean_fuse(&ac, &bridge).unwrap();
        assert_eq!(k.count_solids(&fused).unwrap(), 1);
    }

    #[test]
    fn reject_disjoint_policy_reports_boolean_failure() {
        let mut k = MockKernel::new().with_fuse_policy(FusePolicy::RejectDisjoint);
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        let b = k.insert_box([5.0; 3], [6.0; 3]);
        let err = k.boolean_fuse(&a, &b).unwrap_err();
        assert!(matches!(err, KernelError::BooleanFailed { .. }));
        assert_eq!(k.fuse_calls(), 1);
    }

    #[test]
    fn compound_keeps_solids_separate() {
        let mut k = MockKernel::new();
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        let b = k.insert_box([0.5; 3], [2.0; 3]);
        let c = k.make_compound(&[a, b]).unwrap();
        assert_eq!(k.solids(&c).unwrap().len(), 2);
    }

    #[test]
    fn tooling_fault_surfaces_as_other() {
        let mut k = MockKernel::new().with_tooling_fault("explorer crashed");
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        let err = k.count_solids(&a).unwrap_err();
        assert!(matches!(err, KernelError::Other { .. }));
    }

    #[test]
    fn step_export_is_not_supported() {
        let mut k = MockKernel::new();
        let a = k.insert_box([0.0; 3], [1.0; 3]);
        assert!(matches!(
            k.export(&a, ExportFormat::Step),
            Err(KernelError::NotSupported { .. })
        ));
        let stl = k.export(&a, ExportFormat::Stl).unwrap();
        assert_eq!(stl.len(), 84 + 12 * 50);
    }

    #[test]
    fn unknown_handle_is_not_found() {
        let mut k = MockKernel::new();
        let err = k.tessellate(&ShapeHandle(99), 0.1).unwrap_err();
        assert!(matches!(err, KernelError::ShapeNotFound { id: 99 }));
    }
}
