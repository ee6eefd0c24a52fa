pub mod aabb;
pub mod dot;
pub mod geom;
pub mod hsv;
pub mod vec2;
pub mod vec3;
pub mod vec4;

pub use aabb::*;
pub use dot::*;
pub use geom::*;
pub use hsv::*;
pub use vec2::*;
pub use vec3::*;
pub use vec4::*;
