pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod table;

pub use config::Config;
pub use error::{EdaError, Result};
pub use pipeline::{run_pipeline, PipelineResult};
pub use table::Table;
