//! Pipeline configuration.

use kernel_bridge::ExecRequest;
use script_guard::{GuardConfig, Script};
use serde::{Deserialize, Serialize};

/// Settings for one `sanitize_and_run` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name the script must assign its final geometry to.
    pub result_binding: String,
    /// Viewer/debug callables injected as no-ops before execution.
    pub shims: Vec<String>,
    /// Abort before execution on any error-level policy finding.
    pub enforce_policy: bool,
    /// Names the sanitizer treats as known on top of the standard registry.
    pub extra_known_names: Vec<String>,
    /// Operations wrapped in local failure containment.
    pub fragile_ops: Vec<String>,
    /// Chordal tolerance used when tessellating for analysis.
    pub tessellation_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            result_binding: "result".to_string(),
            shims: vec![
                "show_object".to_string(),
                "show".to_string(),
                "cq_show".to_string(),
            ],
            enforce_policy: true,
            extra_known_names: Vec::new(),
            fragile_ops: vec!["fillet".to_string(), "chamfer".to_string()],
            tessellation_tolerance: 0.1,
        }
    }
}

impl PipelineConfig {
    /// Policy findings are reported but never block.
    pub fn permissive() -> Self {
        Self {
            enforce_policy: false,
            ..Self::default()
        }
    }

    /// Default settings with `names` registered as known.
    pub fn with_known<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_known_names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            fragile_ops: self.fragile_ops.clone(),
            extra_known_names: self.extra_known_names.clone(),
            ..GuardConfig::default()
        }
    }

    pub fn exec_request(&self, script: &Script) -> ExecRequest {
        ExecRequest {
            script: script.as_str().to_string(),
            shims: self.shims.clone(),
            result_binding: self.result_binding.clone(),
        }
    }
}
