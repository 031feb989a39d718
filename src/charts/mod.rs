//! Chart rendering for cleaned, cycle-timed datasets.
//!
//! Both charts are drawn with plotters onto an SVG backend and written to the
//! chart directory. Both need the stage, product, timestamp and cycle-time
//! columns.

pub mod gantt;
pub mod heatmap;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::analyzers::bottleneck::DEFAULT_STAGE_COLUMN;
use crate::cycle_time::{CYCLE_TIME_COLUMN, DEFAULT_END_COLUMN, DEFAULT_START_COLUMN};
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};

pub use gantt::render_gantt;
pub use heatmap::render_heatmap;

pub const DEFAULT_PRODUCT_COLUMN: &str = "Product_ID";

/// Column names the charts read from.
#[derive(Debug, Clone)]
pub struct ChartColumns {
    pub stage: String,
    pub product: String,
    pub start: String,
    pub end: String,
    pub cycle_time: String,
}

impl Default for ChartColumns {
    fn default() -> Self {
        Self {
            stage: DEFAULT_STAGE_COLUMN.to_string(),
            product: DEFAULT_PRODUCT_COLUMN.to_string(),
            start: DEFAULT_START_COLUMN.to_string(),
            end: DEFAULT_END_COLUMN.to_string(),
            cycle_time: CYCLE_TIME_COLUMN.to_string(),
        }
    }
}

impl ChartColumns {
    /// Fails with `MissingColumn` for the first absent column.
    pub(crate) fn check(&self, dataset: &Dataset) -> Result<()> {
        for name in [
            &self.stage,
            &self.product,
            &self.start,
            &self.end,
            &self.cycle_time,
        ] {
            dataset.require_column(name)?;
        }
        Ok(())
    }
}

/// Creates the parent directory of a chart file if needed.
fn prepare_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Wraps a plotters drawing error for `chart`.
fn render_error<E: std::fmt::Display>(chart: &'static str) -> impl Fn(E) -> PipelineError {
    move |e| PipelineError::Render {
        chart,
        reason: e.to_string(),
    }
}

fn chart_written(path: &Path) -> PathBuf {
    info!(path = %path.display(), "Chart written");
    path.to_path_buf()
}

/// Renders both charts into `dir` as `gantt.svg` and `heatmap.svg`.
pub fn render_all(
    dataset: &Dataset,
    columns: &ChartColumns,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    Ok(vec![
        render_gantt(dataset, columns, &dir.join("gantt.svg"))?,
        render_heatmap(dataset, columns, &dir.join("heatmap.svg"))?,
    ])
}
