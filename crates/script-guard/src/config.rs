//! Configuration for script sanitization.

use serde::{Deserialize, Serialize};

/// Knobs for [`crate::sanitize_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Operations whose lines get wrapped in local failure containment.
    pub fragile_ops: Vec<String>,
    /// Names treated as known in addition to the standard registry.
    pub extra_known_names: Vec<String>,
    /// Whether unknown-call stripping runs at all.
    pub strip_unknown: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            fragile_ops: vec!["fillet".to_string(), "chamfer".to_string()],
            extra_known_names: Vec::new(),
            strip_unknown: true,
        }
    }
}

impl GuardConfig {
    /// Guarding only; unknown calls are left for the executor to report.
    pub fn guard_only() -> Self {
        Self {
            strip_unknown: false,
            ..Self::default()
        }
    }

    /// Default passes, with `names` also treated as known.
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
}
