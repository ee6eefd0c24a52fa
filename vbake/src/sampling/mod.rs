pub mod rgba;
pub mod sampler;
pub mod texture;

pub use rgba::*;
pub use sampler::*;
pub use texture::*;
