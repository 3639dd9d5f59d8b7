use std::collections::HashMap;


pub use studio_types::{ExportFormat, TriMesh};

/// Opaque handle to a shape in the geometry kernel.
/// NEVER persisted. Valid only for the current kernel session.
///
/// Identity is the kernel id: clones of a handle are the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) u64);

impl ShapeHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    /// The script raised while running. `trace` is the kernel's full error text.
    #[error("script raised: {trace}")]
    ScriptRaised { trace: String },

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("shape not found: {id}")]
    ShapeNotFound { id: u64 },

    #[error("export failed: {reason}")]
    ExportFailed { reason: String },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// A script execution request.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub script: String,
    /// Names bound to no-op callables before the script runs.
    pub shims: Vec<String>,
    /// Name the script is expected to bind its result to.
    pub result_binding: String,
}

impl ExecRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            shims: vec!["show_object".into(), "show".into(), "cq_show".into()],
            result_binding: "result".into(),
        }
    }
}

/// Top-level bindings left behind by an executed script.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub bindings: HashMap<String, Candidate>,
}

impl Namespace {
    pub fn get(&self, name: &str) -> Option<&Candidate> {
        self.bindings.get(name)
    }

    pub fn take(&mut self, name: &str) -> Option<Candidate> {
        self.bindings.remove(name)
    }
}

/// A value produced by a script, before it is known to be geometry.
///
/// Closed set of variants: normalization classifies each node by variant, then by
/// the capabilities an `Object` exposes, in a fixed order.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Absent,
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Key/value pairs; keys play no part in export.
    Mapping(Vec<(String, Candidate)>),
    /// Ordered collection (list or tuple).
    Sequence(Vec<Candidate>),
    /// Unordered collection.
    Set(Vec<Candidate>),
    Object(Box<ObjectValue>),
}

/// An object value and the accessors it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub type_name: String,
    /// "Get all values" accessor.
    pub all_values: Option<Vec<Candidate>>,
    /// "Get the value" accessor.
    pub single_value: Option<SingleValue>,
    /// Build-session part result.
    pub part: Option<Candidate>,
    /// Build-session sketch result.
    pub sketch: Option<Candidate>,
    /// Native kernel geometry wrapped by this object.
    pub shape: Option<ShapeHandle>,
}

/// What a single-value accessor returned.
#[derive(Debug, Clone, PartialEq)]
pub enum SingleValue {
    /// The accessor returned the object it was called on.
    Itself,
    Value(Candidate),
}

impl ObjectValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            all_values: None,
            single_value: None,
            part: None,
            sketch: None,
            shape: None,
        }
    }
}

impl Candidate {
    /// A plain kernel shape object.
    pub fn shape(handle: ShapeHandle) -> Self {
        let mut obj = ObjectValue::new("Solid");
        obj.shape = Some(handle);
        Candidate::Object(Box::new(obj))
    }

    /// A workplane-like wrapper exposing both accessors over `items`.
    pub fn workplane(items: Vec<Candidate>) -> Self {
        let mut obj = ObjectValue::new("Workplane");
        obj.single_value = Some(match items.first() {
            Some(first) => SingleValue::Value(first.clone()),
            None => SingleValue::Value(Candidate::Absent),
        });
        obj.all_values = Some(items);
        Candidate::Object(Box::new(obj))
    }

    /// A part-building session result.
    pub fn build_part(part: Candidate) -> Self {
        let mut obj = ObjectValue::new("BuildPart");
        obj.part = Some(part);
        Candidate::Object(Box::new(obj))
    }

    /// A sketch-building session result.
    pub fn build_sketch(sketch: Candidate) -> Self {
        let mut obj = ObjectValue::new("BuildSketch");
        obj.sketch = Some(sketch);
        Candidate::Object(Box::new(obj))
    }

    /// An object exposing no geometry accessors at all.
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Candidate::Object(Box::new(ObjectValue::new(type_name)))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Candidate::Absent)
    }
}
