pub mod config;
pub mod error;
pub mod fragile;
pub mod lexer;
pub mod policy;
pub mod registry;
pub mod sanitize;
mod scan;
pub mod strip;
pub mod syntax;

pub use config::GuardConfig;
pub use error::ParseError;
pub use fragile::{guard_fragile_ops, GUARD_MARKER};
pub use policy::{blocking_codes, scan_policy, FindingLevel, PolicyFinding};
pub use registry::NameRegistry;
pub use sanitize::{sanitize, sanitize_with, Script};
pub use strip::strip_unknown_calls;
pub use syntax::{outline, ScriptOutline};
