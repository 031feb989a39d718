//! Data cleaning: forward fill, duplicate removal and IQR clipping.
//!
//! [`clean`] applies the three steps in that order. Fill and dedup are stable
//! under a second pass; clipping is not in general, since the fences are
//! recomputed from the already clipped values.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::analyzers::utility::iqr_bounds;
use crate::dataset::{Cell, CellKey, Dataset};

/// Fills each missing cell with the nearest earlier non-missing value in the
/// same column. Leading missing cells stay missing.
///
/// Returns the number of cells filled.
pub fn forward_fill(dataset: &mut Dataset) -> usize {
    let width = dataset.columns().len();
    let mut last: Vec<Option<Cell>> = vec![None; width];
    let mut filled = 0;

    for row in dataset.rows_mut() {
        for (idx, cell) in row.iter_mut().enumerate() {
            if cell.is_missing() {
                if let Some(prev) = &last[idx] {
                    *cell = prev.clone();
                    filled += 1;
                }
            } else {
                last[idx] = Some(cell.clone());
            }
        }
    }

    filled
}

/// Removes rows identical to an earlier row, keeping the first occurrence.
///
/// Returns the number of rows removed.
pub fn drop_duplicates(dataset: &mut Dataset) -> usize {
    let before = dataset.len();
    let rows = std::mem::take(dataset.rows_mut());

    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(rows.len());
    let keep: Vec<bool> = rows
        .iter()
        .map(|row| seen.insert(row.iter().map(Cell::key).collect()))
        .collect();
    drop(seen);

    *dataset.rows_mut() = rows
        .into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect();

    before - dataset.len()
}

/// Clamps every numeric column into its Tukey fences.
///
/// Bounds are computed per column from the values present before clipping.
/// A NaN fence does not bound its side. Returns the number of cells changed.
pub fn clip_outliers(dataset: &mut Dataset) -> usize {
    let mut clipped = 0;

    for idx in dataset.numeric_columns() {
        let values: Vec<f64> = dataset.column(idx).filter_map(Cell::as_number).collect();
        let Some((lower, upper)) = iqr_bounds(&values) else {
            continue;
        };

        debug!(
            column = %dataset.columns()[idx],
            lower,
            upper,
            "Clipping column"
        );

        for row in dataset.rows_mut() {
            if let Cell::Number(v) = &mut row[idx] {
                if *v < lower {
                    *v = lower;
                    clipped += 1;
                } else if *v > upper {
                    *v = upper;
                    clipped += 1;
                }
            }
        }
    }

    clipped
}

/// Runs the full cleaning pass in place.
#[tracing::instrument(skip_all, fields(rows = dataset.len()))]
pub fn clean(dataset: &mut Dataset) {
    let filled = forward_fill(dataset);
    let duplicates = drop_duplicates(dataset);
    let clipped = clip_outliers(dataset);

    info!(
        filled,
        duplicates,
        clipped,
        rows = dataset.len(),
        "Dataset cleaned"
    );
}
