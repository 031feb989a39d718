use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::analyzers::types::BottleneckEntry;
use crate::analyzers::utility::mean;
use crate::dataset::{Cell, Dataset};
use crate::error::{PipelineError, Result};

pub const DEFAULT_STAGE_COLUMN: &str = "Stage";
pub const DEFAULT_TOP_N: usize = 5;

/// Group key ordering: numbers by value, then timestamps, then text.
#[derive(Debug, Clone, Copy)]
struct StageKey<'a>(&'a Cell);

impl StageKey<'_> {
    fn kind(&self) -> u8 {
        match self.0 {
            Cell::Number(_) => 0,
            Cell::Timestamp(_) => 1,
            Cell::Text(_) => 2,
            Cell::Missing => 3,
        }
    }
}

impl Ord for StageKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            // adding 0.0 folds -0.0 into 0.0
            (Cell::Number(a), Cell::Number(b)) => (a + 0.0).total_cmp(&(b + 0.0)),
            (Cell::Timestamp(a), Cell::Timestamp(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for StageKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for StageKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StageKey<'_> {}

/// Mean cycle time per stage, in ascending stage-key order.
///
/// Rows with a missing stage are not grouped. Missing cycle times are
/// skipped, and a stage with none left is omitted.
pub fn stage_means(
    dataset: &Dataset,
    stage_col: &str,
    cycle_time_col: &str,
) -> Result<Vec<BottleneckEntry>> {
    let stage_idx = dataset.require_column(stage_col)?;
    let cycle_idx = dataset.require_column(cycle_time_col)?;

    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let mut groups: BTreeMap<StageKey<'_>, Vec<f64>> = BTreeMap::new();
    for row in dataset.rows() {
        if row[stage_idx].is_missing() {
            continue;
        }
        let series = groups.entry(StageKey(&row[stage_idx])).or_default();
        if let Some(v) = row[cycle_idx].as_number() {
            series.push(v);
        }
    }

    let entries: Vec<BottleneckEntry> = groups
        .into_iter()
        .filter_map(|(key, series)| {
            let stage = key.0.to_string();
            let avg = mean(&series);
            if avg.is_none() {
                debug!(stage = %stage, "Stage has no valid cycle times, skipping");
            }
            Some(BottleneckEntry {
                stage,
                mean_cycle_time: avg?,
            })
        })
        .collect();

    if entries.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    Ok(entries)
}

/// Returns up to `top_n` stages sorted by descending mean cycle time.
///
/// The sort is stable, so ties keep ascending stage-key order.
#[tracing::instrument(skip(dataset), fields(rows = dataset.len()))]
pub fn identify_bottlenecks(
    dataset: &Dataset,
    stage_col: &str,
    cycle_time_col: &str,
    top_n: usize,
) -> Result<Vec<BottleneckEntry>> {
    let mut entries = stage_means(dataset, stage_col, cycle_time_col)?;
    let stages = entries.len();

    entries.sort_by(|a, b| b.mean_cycle_time.total_cmp(&a.mean_cycle_time));
    entries.truncate(top_n);

    info!(stages, ranked = entries.len(), "Bottlenecks ranked");
    Ok(entries)
}
