pub mod diagnostic;
pub mod export;
pub mod mesh;

pub use diagnostic::*;
pub use export::*;
pub use mesh::*;
