pub mod engine;
pub mod host;
pub mod ledger;
pub mod naming;

pub use engine::*;
pub use host::*;
pub use ledger::*;
pub use naming::*;
