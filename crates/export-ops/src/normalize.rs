//! Flatten a script's result value into kernel shapes.
//!
//! Each node is classified once, by the first rule that applies:
//!
//! 1. absent: ignored
//! 2. text or bytes: invalid, `string:<first 40 chars>`
//! 3. mapping: every value, keys ignored
//! 4. sequence or set: every element, in order
//! 5. multi-value accessor yielding something: each value
//! 6. single-value accessor yielding something other than the node itself
//! 7. build-session `part`, then `sketch`, when present
//! 8. kernel shape: recorded once per shape identity
//! 9. numeric or boolean scalar: invalid, `scalar:<value>`
//! 10. anything else: invalid, `type:<type name>`
//!
//! Accessors that yield nothing fall through to the next rule.

use std::collections::HashSet;

use kernel_bridge::{Candidate, Kernel, KernelError, ObjectValue, ShapeHandle, SingleValue};
use tracing::{debug, info, instrument};

use crate::types::{NormalizedSolid, ValidationError};

const PREVIEW_CHARS: usize = 40;
const MIXED_EXAMPLES: usize = 3;

/// Distinct exportable shapes, in first-seen order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportableSet {
    shapes: Vec<ShapeHandle>,
}

impl ExportableSet {
    pub fn shapes(&self) -> &[ShapeHandle] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shape ids, for order-insensitive comparison.
    pub fn ids(&self) -> HashSet<u64> {
        self.shapes.iter().map(ShapeHandle::id).collect()
    }

    /// The single shape, or a compound of all of them.
    pub fn into_solid(self, kernel: &mut dyn Kernel) -> Result<NormalizedSolid, KernelError> {
        let parts = self.shapes.len();
        let handle = match <[ShapeHandle; 1]>::try_from(self.shapes) {
            Ok([only]) => only,
            Err(shapes) => {
                debug!(parts, "grouping exportables into a compound");
                kernel.make_compound(&shapes)?
            }
        };
        Ok(NormalizedSolid { handle, parts })
    }
}

#[derive(Default)]
struct Collector {
    found: Vec<ShapeHandle>,
    seen: HashSet<u64>,
    invalid: Vec<String>,
}

impl Collector {
    fn visit(&mut self, candidate: &Candidate) {
        match candidate {
            Candidate::Absent => {}
            Candidate::Text(s) => self.invalid_string(s),
            Candidate::Bytes(b) => self.invalid_string(&format!("b'{}'", String::from_utf8_lossy(b))),
            Candidate::Mapping(entries) => entries.iter().for_each(|(_, v)| self.visit(v)),
            Candidate::Sequence(items) | Candidate::Set(items) => {
                items.iter().for_each(|v| self.visit(v))
            }
            Candidate::Object(obj) => self.visit_object(obj),
            Candidate::Int(i) => self.invalid.push(format!("scalar:{}", i)),
            Candidate::Float(x) => self.invalid.push(format!("scalar:{:?}", x)),
            Candidate::Bool(b) => self
                .invalid
                .push(format!("scalar:{}", if *b { "True" } else { "False" })),
        }
    }

    fn visit_object(&mut self, obj: &ObjectValue) {
        if let Some(values) = obj.all_values.as_deref().filter(|v| !v.is_empty()) {
            values.iter().for_each(|v| self.visit(v));
            return;
        }
        if let Some(SingleValue::Value(value)) = &obj.single_value {
            if !value.is_absent() {
                self.visit(value);
                return;
            }
        }
        for sub in [&obj.part, &obj.sketch] {
            if let Some(inner) = sub.as_ref().filter(|c| !c.is_absent()) {
                self.visit(inner);
                return;
            }
        }
        if let Some(handle) = &obj.shape {
            if self.seen.insert(handle.id()) {
                self.found.push(handle.clone());
            } else {
                debug!(shape = handle.id(), "duplicate shape reference skipped");
            }
            return;
        }
        self.invalid.push(format!("type:{}", obj.type_name));
    }

    fn invalid_string(&mut self, s: &str) {
        let preview: String = s.chars().take(PREVIEW_CHARS).collect();
        self.invalid.push(format!("string:{}", preview));
    }
}

/// Collect the exportable shapes in `candidate`.
///
/// Fails with `NoGeometry` when nothing exportable is found, and with
/// `MixedContent` (naming the first three offenders) when geometry comes
/// alongside anything else.
#[instrument(skip_all)]
pub fn normalize(candidate: &Candidate) -> Result<ExportableSet, ValidationError> {
    let mut c = Collector::default();
    c.visit(candidate);

    if c.found.is_empty() {
        debug!(invalid = c.invalid.len(), "no exportable geometry");
        return Err(ValidationError::NoGeometry);
    }
    if !c.invalid.is_empty() {
        c.invalid.truncate(MIXED_EXAMPLES);
        return Err(ValidationError::MixedContent {
            examples: c.invalid,
        });
    }
    info!(shapes = c.found.len(), "result normalized");
    Ok(ExportableSet { shapes: c.found })
}
