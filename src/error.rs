//! Error type shared by every pipeline stage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input could not be read or is not valid delimited data.
    #[error("failed to load data from {path}: {reason}")]
    DataLoad { path: String, reason: String },

    /// A timestamp cell did not match any accepted format.
    #[error("row {row}: cannot parse '{value}' in column {column} as a timestamp")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Nothing to aggregate.
    #[error("dataset has no rows to aggregate")]
    EmptyDataset,

    #[error("failed to render {chart}: {reason}")]
    Render { chart: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
