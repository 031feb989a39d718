//! Delimited-text reader producing a typed [`Dataset`].
//!
//! Column types are inferred once at load time: a column whose non-missing
//! fields all parse as numbers becomes numeric, everything else stays text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::dataset::{Cell, Dataset};
use crate::error::{PipelineError, Result};

/// Field values treated as missing, in addition to the empty string.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_na(field: &str) -> bool {
    field.is_empty() || NA_TOKENS.contains(&field)
}

/// Reads a CSV file with a header row.
///
/// # Errors
///
/// Returns [`PipelineError::DataLoad`] if the file cannot be opened or is not
/// well-formed delimited data.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| PipelineError::DataLoad {
        path: source.clone(),
        reason: e.to_string(),
    })?;
    read_csv(file, &source)
}

/// Reads CSV data from any reader; `source` is only used in error messages.
pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<Dataset> {
    let load_err = |reason: String| PipelineError::DataLoad {
        path: source.to_string(),
        reason,
    };

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| load_err(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if columns.is_empty() || columns.iter().all(String::is_empty) {
        return Err(load_err("no columns to parse".to_string()));
    }

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| load_err(e.to_string()))?;
        raw.push(
            record
                .iter()
                .map(|field| (!is_na(field)).then(|| field.to_string()))
                .collect(),
        );
    }

    let numeric: Vec<bool> = (0..columns.len())
        .map(|idx| {
            let mut values = raw.iter().filter_map(|row| row.get(idx)?.as_deref()).peekable();
            values.peek().is_some() && values.all(|v| v.trim().parse::<f64>().is_ok())
        })
        .collect();

    debug!(
        columns = ?columns,
        numeric = ?numeric,
        "Inferred column types"
    );

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(idx, field)| match field {
                    None => Cell::Missing,
                    Some(v) if numeric[idx] => v
                        .trim()
                        .parse::<f64>()
                        .map(Cell::Number)
                        .unwrap_or(Cell::Missing),
                    Some(v) => Cell::Text(v),
                })
                .collect()
        })
        .collect();

    let dataset = Dataset::from_rows(columns, rows);
    info!(
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Writes a dataset as CSV with a header row.
pub fn write_csv(path: impl AsRef<Path>, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    let to_err = |e: csv::Error| PipelineError::DataLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    writer.write_record(dataset.columns()).map_err(to_err)?;
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(to_err)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = dataset.len(), "Dataset written");
    Ok(())
}
