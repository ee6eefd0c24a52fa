pub mod adjust;
pub mod baker;
pub mod filters;
pub mod lightmap;
pub mod optimize;

pub use adjust::*;
pub use baker::*;
pub use filters::*;
pub use lightmap::*;
pub use optimize::*;
