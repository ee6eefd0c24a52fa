pub mod bake;
pub mod config;
pub mod error;
pub mod math;
pub mod mesh;
pub mod progress;
pub mod sampling;
pub mod session;

pub use config::BakeConfig;
pub use error::{BakeError, Result};
pub use progress::{NoProgress, ProgressSink};
