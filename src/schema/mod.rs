pub mod plan;
pub mod tables;
pub mod types;

pub use plan::*;
pub use tables::*;
pub use types::*;
