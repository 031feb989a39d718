//! Pipeline settings: column names, ranking depth, timestamp layout and
//! chart location.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::analyzers::bottleneck::{DEFAULT_STAGE_COLUMN, DEFAULT_TOP_N};
use crate::charts::{ChartColumns, DEFAULT_PRODUCT_COLUMN};
use crate::cycle_time::{CYCLE_TIME_COLUMN, DEFAULT_END_COLUMN, DEFAULT_START_COLUMN};

/// Settings for a pipeline run.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "stage_column": "Stage",
///   "top_n": 3,
///   "time_format": "%d.%m.%Y %H:%M",
///   "chart_dir": "out/charts"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stage_column: String,
    pub product_column: String,
    pub start_column: String,
    pub end_column: String,
    pub cycle_time_column: String,
    pub top_n: usize,
    /// chrono format string; `None` tries the built-in layouts
    pub time_format: Option<String>,
    pub chart_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_column: DEFAULT_STAGE_COLUMN.to_string(),
            product_column: DEFAULT_PRODUCT_COLUMN.to_string(),
            start_column: DEFAULT_START_COLUMN.to_string(),
            end_column: DEFAULT_END_COLUMN.to_string(),
            cycle_time_column: CYCLE_TIME_COLUMN.to_string(),
            top_n: DEFAULT_TOP_N,
            time_format: None,
            chart_dir: PathBuf::from("charts"),
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn chart_columns(&self) -> ChartColumns {
        ChartColumns {
            stage: self.stage_column.clone(),
            product: self.product_column.clone(),
            start: self.start_column.clone(),
            end: self.end_column.clone(),
            cycle_time: self.cycle_time_column.clone(),
        }
    }
}
