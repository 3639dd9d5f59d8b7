pub mod config;
pub mod executor;
pub mod export;
pub mod manufacturing;
pub mod normalize;
pub mod pipeline;
pub mod repair;
pub mod types;

pub use config::PipelineConfig;
pub use executor::run;
pub use export::{export_solid, export_to_path};
pub use manufacturing::{check_solid, orient_solid};
pub use normalize::{normalize, ExportableSet};
pub use pipeline::sanitize_and_run;
pub use repair::ensure_single_solid;
pub use types::*;
