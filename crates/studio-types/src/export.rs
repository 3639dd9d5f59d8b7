use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output format requested from the kernel's export contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Binary STL.
    Stl,
    /// ASCII STL.
    StlAscii,
    Step,
}

impl ExportFormat {
    /// STEP for `.step`/`.stp` (any case), binary STL for everything else.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("step") | Some("stp") => ExportFormat::Step,
            _ => ExportFormat::Stl,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Stl | ExportFormat::StlAscii => "stl",
            ExportFormat::Step => "step",
        }
    }
}
