pub mod model;
pub mod predict;
pub mod system;

pub use model::*;
pub use predict::*;
pub use system::*;
