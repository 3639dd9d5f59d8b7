pub mod mock_kernel;
mod mock_script;
pub mod stl;
pub mod traits;
pub mod types;

pub use mock_kernel::{FusePolicy, MockKernel, MOCK_BUILTINS};
pub use traits::Kernel;
pub use types::*;
