pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod load;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod store;

pub use cli::{Cli, Commands};
pub use config::{Destination, PipelineConfig};
pub use error::{Error, Result};
pub use load::CommitMode;
pub use report::{LogReporter, Phase, Reporter, RunReport, SilentReporter};
pub use store::Store;
