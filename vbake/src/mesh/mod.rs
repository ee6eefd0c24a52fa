pub mod mesh_data;
pub mod split;

pub use mesh_data::*;
pub use split::*;
