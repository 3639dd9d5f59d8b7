//! Names a generated script may call without defining them.
//!
//! The standard registry is built once per process and never changes
//! afterwards: the modeling library surface is fixed for the life of a run.
//! [`NameRegistry::global`] is the shared, lazily built instance.

use std::collections::HashSet;
use std::sync::OnceLock;

const BUILTINS: &[&str] = &[
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool", "breakpoint", "bytearray",
    "bytes", "callable", "chr", "classmethod", "compile", "complex", "delattr", "dict", "dir",
    "divmod", "enumerate", "eval", "exec", "filter", "float", "format", "frozenset", "getattr",
    "globals", "hasattr", "hash", "help", "hex", "id", "input", "int", "isinstance",
    "issubclass", "iter", "len", "list", "locals", "map", "max", "memoryview", "min", "next",
    "object", "oct", "open", "ord", "pow", "print", "property", "range", "repr", "reversed",
    "round", "set", "setattr", "slice", "sorted", "staticmethod", "str", "sum", "super",
    "tuple", "type", "vars", "zip", "__import__", "__build_class__",
    // site and module constants
    "exit", "quit", "copyright", "credits", "license", "NotImplemented", "Ellipsis",
    "__debug__", "__name__", "__doc__", "__file__", "__spec__", "__loader__", "__package__",
    "__builtins__",
];

const EXCEPTIONS: &[&str] = &[
    "BaseException", "BaseExceptionGroup", "GeneratorExit", "KeyboardInterrupt", "SystemExit",
    "Exception", "ExceptionGroup", "ArithmeticError", "FloatingPointError", "OverflowError",
    "ZeroDivisionError", "AssertionError", "AttributeError", "BufferError", "EOFError",
    "ImportError", "ModuleNotFoundError", "LookupError", "IndexError", "KeyError",
    "MemoryError", "NameError", "UnboundLocalError", "OSError", "EnvironmentError", "IOError",
    "BlockingIOError", "ChildProcessError", "ConnectionError", "BrokenPipeError",
    "ConnectionAbortedError", "ConnectionRefusedError", "ConnectionResetError",
    "FileExistsError", "FileNotFoundError", "InterruptedError", "IsADirectoryError",
    "NotADirectoryError", "PermissionError", "ProcessLookupError", "TimeoutError",
    "ReferenceError", "RuntimeError", "NotImplementedError", "RecursionError",
    "PythonFinalizationError", "StopAsyncIteration", "StopIteration", "SyntaxError",
    "IndentationError", "TabError", "SystemError", "TypeError", "ValueError", "UnicodeError",
    "UnicodeDecodeError", "UnicodeEncodeError", "UnicodeTranslateError",
    // warnings
    "Warning", "BytesWarning", "DeprecationWarning", "EncodingWarning", "FutureWarning",
    "ImportWarning", "PendingDeprecationWarning", "ResourceWarning", "RuntimeWarning",
    "SyntaxWarning", "UnicodeWarning", "UserWarning",
];

const MATH: &[&str] = &[
    "acos", "acosh", "asin", "asinh", "atan", "atan2", "atanh", "cbrt", "ceil", "comb",
    "copysign", "cos", "cosh", "degrees", "dist", "e", "erf", "erfc", "exp", "exp2", "expm1",
    "fabs", "factorial", "floor", "fma", "fmod", "frexp", "fsum", "gamma", "gcd", "hypot",
    "inf", "isclose", "isfinite", "isinf", "isnan", "isqrt", "lcm", "ldexp", "lgamma", "log",
    "log10", "log1p", "log2", "modf", "nan", "nextafter", "perm", "pi", "pow", "prod",
    "radians", "remainder", "sin", "sinh", "sqrt", "sumprod", "tan", "tanh", "tau", "trunc",
    "ulp",
];

const HELPERS: &[&str] = &["deepcopy", "copy", "partial", "reduce"];

/// Public surface of the modeling library generated scripts are written against.
const MODELING_API: &[&str] = &[
    // units and constants
    "MM", "CM", "M", "IN", "FT", "THOU", "TOLERANCE",
    // enums
    "Align", "AngularDirection", "CenterOf", "Extrinsic", "FontStyle", "FrameMethod",
    "GeomType", "HeadType", "Intrinsic", "Keep", "Kind", "LengthMode", "MeshType", "Mode",
    "NumberDisplay", "PageSize", "PositionMode", "PrecisionMode", "Select", "Side", "SortBy",
    "Transition", "Unit", "Until",
    // builders and locations
    "Builder", "BuildLine", "BuildPart", "BuildSketch", "LocationList", "Locations",
    "GridLocations", "HexLocations", "PolarLocations", "Workplanes",
    // 1d objects
    "BaseLineObject", "Bezier", "CenterArc", "DoubleTangentArc", "EllipticalCenterArc",
    "EllipticalStartArc", "FilletPolyline", "Helix", "IntersectingLine", "JernArc", "Line",
    "PolarLine", "Polyline", "RadiusArc", "SagittaArc", "Spline", "TangentArc",
    "ThreePointArc", "ArcArcTangentArc", "ArcArcTangentLine", "PointArcTangentArc",
    "PointArcTangentLine",
    // 2d objects and drafting
    "BaseSketchObject", "Arrow", "ArrowHead", "Circle", "DimensionLine", "Ellipse",
    "ExtensionLine", "Polygon", "Rectangle", "RectangleRounded", "RegularPolygon", "SlotArc",
    "SlotCenterPoint", "SlotCenterToCenter", "SlotOverall", "TechnicalDrawing", "Text",
    "Trapezoid", "Triangle", "Draft",
    // 3d objects
    "BasePartObject", "Box", "Cone", "CounterBoreHole", "CounterSinkHole", "Cylinder", "Hole",
    "Sphere", "Torus", "Wedge",
    // joints
    "Joint", "BallJoint", "CylindricalJoint", "LinearJoint", "RevoluteJoint", "RigidJoint",
    // operations
    "add", "bounding_box", "chamfer", "draft", "extrude", "fillet", "full_round", "loft",
    "make_brake_formed", "make_face", "make_hull", "mirror", "offset", "project",
    "project_workplane", "revolve", "scale", "section", "shell", "split", "sweep", "thicken",
    "trace", "edge", "edges", "face", "faces", "solid", "solids", "vertex", "vertices",
    "wire", "wires", "pack", "polar", "delta",
    // topology and geometry
    "Shape", "Solid", "Compound", "Part", "Sketch", "Curve", "Face", "Wire", "Edge",
    "Vertex", "Shell", "ShapeList", "Mixin1D", "Mixin3D", "Vector", "VectorLike", "Location",
    "LocationEncoder", "Plane", "Axis", "Rotation", "RotationLike", "Pos", "Rot", "Color",
    "Matrix", "BoundBox", "SkipClean",
    // import and export
    "import_brep", "import_step", "import_stl", "import_svg", "import_svg_as_buildline_code",
    "export_brep", "export_gltf", "export_step", "export_stl", "Mesher", "ExportDXF",
    "ExportSVG", "LineType", "Drawing",
];

const KERNEL_NATIVE: &[&str] = &[
    "TopAbs_SOLID", "TopAbs_FACE", "TopAbs_EDGE", "TopAbs_WIRE", "TopExp_Explorer",
    "BRepAlgoAPI_Fuse", "gp_Pnt", "gp_Vec", "gp_Dir", "gp_Ax1", "gp_Ax2",
];

/// Names the executor injects into every namespace.
const INJECTED: &[&str] = &["_orig_fillet", "_orig_chamfer", "max_fillet"];

#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: HashSet<String>,
}

impl NameRegistry {
    /// Builtins and exception classes, the math namespace, helper imports,
    /// the modeling API, kernel-native names and executor-injected names.
    ///
    /// Viewer shims (`show_object` and friends) are not registered, so calls
    /// to them get stripped.
    pub fn standard() -> Self {
        Self::from_names(
            [BUILTINS, EXCEPTIONS, MATH, HELPERS, MODELING_API, KERNEL_NATIVE, INJECTED]
                .into_iter()
                .flatten()
                .copied(),
        )
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Process-wide standard registry. Built by the first caller, read-only after.
    pub fn global() -> &'static NameRegistry {
        static REGISTRY: OnceLock<NameRegistry> = OnceLock::new();
        REGISTRY.get_or_init(NameRegistry::standard)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_covers_every_group() {
        let reg = NameRegistry::standard();
        for name in [
            // builtins and site constants
            "print", "exit", "quit", "__debug__",
            // exceptions and warnings
            "ValueError", "TimeoutError", "ExceptionGroup", "UnicodeDecodeError", "FutureWarning",
            // math
            "sqrt", "sumprod", "fma", "nan", "tau",
            // helpers
            "deepcopy",
            // modeling API, one per section
            "MM", "AngularDirection", "BuildPart", "Bezier", "EllipticalCenterArc",
            "TechnicalDrawing", "Box", "RigidJoint", "full_round", "ShapeList", "export_gltf",
            // kernel-native and injected
            "gp_Pnt", "max_fillet",
        ] {
            assert!(reg.contains(name), "{} missing", name);
        }
    }

    #[test]
    fn groups_have_no_duplicates() {
        let total = BUILTINS.len()
            + EXCEPTIONS.len()
            + MATH.len()
            + HELPERS.len()
            + MODELING_API.len()
            + KERNEL_NATIVE.len()
            + INJECTED.len();
        // `pow` is both a builtin and a math function.
        assert_eq!(NameRegistry::standard().len(), total - 1);
    }

    #[test]
    fn viewer_shims_are_not_registered() {
        let reg = NameRegistry::standard();
        assert!(!reg.contains("show_object"));
        assert!(!reg.contains("show"));
        assert!(!reg.contains("cq_show"));
    }

    #[test]
    fn global_is_built_once() {
        let a = NameRegistry::global() as *const NameRegistry;
        let b = NameRegistry::global() as *const NameRegistry;
        assert_eq!(a, b);
        assert_eq!(NameRegistry::global().len(), NameRegistry::standard().len());
    }
}
