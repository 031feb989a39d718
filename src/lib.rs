pub mod analyzers;
pub mod charts;
pub mod cleaning;
pub mod config;
pub mod cycle_time;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;

pub use error::{PipelineError, Result};
