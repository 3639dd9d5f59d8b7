//! Test harness for the script-to-solid pipeline.
//!
//! Provides tools for driving scripts through every stage against the mock
//! kernel, checking meshes independently of mesh-audit, and producing
//! readable reports.
//!
//! # Key Components
//!
//! - [`ScriptSession`]: Fluent API for running scripts and downstream stages
//! - [`oracle`]: Brute-force verification functions returning pass/fail verdicts
//! - [`report`]: Structured text run descriptions
//! - [`stl`]: STL readers for exported bytes
//! - [`helpers`]: Fixture meshes and scripts, mesh math
//! - [`assertions`]: Rich assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod stl;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::RunReport;
pub use workflow::ScriptSession;
