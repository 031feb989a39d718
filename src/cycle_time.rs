//! Timestamp parsing and cycle-time derivation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::dataset::{Cell, Dataset};
use crate::error::{PipelineError, Result};

pub const DEFAULT_START_COLUMN: &str = "Start_Time";
pub const DEFAULT_END_COLUMN: &str = "End_Time";
pub const CYCLE_TIME_COLUMN: &str = "Cycle_Time";

/// Date-time layouts tried in order when no explicit format is configured.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses a single timestamp.
///
/// With `format` set only that layout is accepted. Otherwise RFC 3339 (offset
/// dropped, wall-clock kept), the layouts in `DATETIME_FORMATS` and plain
/// `%Y-%m-%d` dates are tried.
pub fn parse_timestamp(value: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Some(fmt) = format {
        return NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Converts a column in place to [`Cell::Timestamp`] values.
///
/// Missing cells stay missing; already parsed timestamps are kept.
///
/// # Errors
///
/// [`PipelineError::MissingColumn`] if the column is absent and
/// [`PipelineError::Parse`] for the first value that does not parse.
pub fn parse_timestamp_column(
    dataset: &mut Dataset,
    column: &str,
    format: Option<&str>,
) -> Result<()> {
    let idx = dataset.require_column(column)?;

    for (row_idx, row) in dataset.rows_mut().iter_mut().enumerate() {
        let parsed = match &row[idx] {
            Cell::Missing | Cell::Timestamp(_) => continue,
            Cell::Text(s) => parse_timestamp(s, format).ok_or_else(|| PipelineError::Parse {
                row: row_idx,
                column: column.to_string(),
                value: s.clone(),
            })?,
            other => {
                return Err(PipelineError::Parse {
                    row: row_idx,
                    column: column.to_string(),
                    value: other.to_string(),
                });
            }
        };
        row[idx] = Cell::Timestamp(parsed);
    }

    debug!(column, "Timestamp column parsed");
    Ok(())
}

/// Elapsed minutes from `start` to `end`, fractional part preserved.
/// Negative when the timestamps are inverted.
pub fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 60_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// Parses both timestamp columns and writes `Cycle_Time` in minutes.
///
/// Rows where either timestamp is missing get a missing cycle time. An
/// existing `Cycle_Time` column is overwritten.
#[tracing::instrument(skip(dataset, format), fields(rows = dataset.len()))]
pub fn derive_cycle_times(
    dataset: &mut Dataset,
    start_col: &str,
    end_col: &str,
    format: Option<&str>,
) -> Result<()> {
    parse_timestamp_column(dataset, start_col, format)?;
    parse_timestamp_column(dataset, end_col, format)?;

    let start_idx = dataset.require_column(start_col)?;
    let end_idx = dataset.require_column(end_col)?;

    let cycle_times: Vec<Cell> = dataset
        .rows()
        .iter()
        .map(|row| match (row[start_idx].as_timestamp(), row[end_idx].as_timestamp()) {
            (Some(start), Some(end)) => Cell::Number(minutes_between(start, end)),
            _ => Cell::Missing,
        })
        .collect();

    let negative = cycle_times
        .iter()
        .filter(|c| c.as_number().is_some_and(|v| v < 0.0))
        .count();
    let missing = cycle_times.iter().filter(|c| c.is_missing()).count();

    dataset.set_column(CYCLE_TIME_COLUMN, cycle_times);

    info!(negative, missing, "Cycle times derived");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_common_layouts() {
        let expected = ts("2024-03-01 10:30:00");
        assert_eq!(parse_timestamp("2024-03-01 10:30:00", None), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00", None), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:30", None), Some(expected));
        assert_eq!(parse_timestamp("03/01/2024 10:30", None), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00+02:00", None), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01", None),
            Some(ts("2024-03-01 00:00:00"))
        );
    }

    #[test]
    fn test_parse_explicit_format_only() {
        assert_eq!(
            parse_timestamp("01.03.2024 10:30", Some("%d.%m.%Y %H:%M")),
            Some(ts("2024-03-01 10:30:00"))
        );
        assert_eq!(parse_timestamp("2024-03-01 10:30", Some("%d.%m.%Y %H:%M")), None);
    }

    #[test]
    fn test_minutes_between_keeps_fraction() {
        let start = ts("2024-03-01 10:00:00");
        let end = ts("2024-03-01 10:01:30");
        assert_eq!(minutes_between(start, end), 1.5);
        assert_eq!(minutes_between(end, start), -1.5);
    }

    #[test]
    fn test_derive_cycle_times() {
        let mut ds = read_csv(
            "Stage,Start_Time,End_Time\n\
             A,2024-01-01 10:00,2024-01-01 10:30\n\
             A,2024-01-01 10:00,2024-01-01 10:10\n\
             B,2024-01-01 09:00,2024-01-01 09:45\n"
                .as_bytes(),
            "inline",
        )
        .unwrap();

        derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None).unwrap();

        let idx = ds.require_column(CYCLE_TIME_COLUMN).unwrap();
        let values: Vec<f64> = ds.column(idx).filter_map(Cell::as_number).collect();
        assert_eq!(values, vec![30.0, 10.0, 45.0]);
    }

    #[test]
    fn test_missing_timestamp_gives_missing_cycle_time() {
        let mut ds = read_csv(
            "Start_Time,End_Time\n,2024-01-01 10:30\n".as_bytes(),
            "inline",
        )
        .unwrap();

        derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None).unwrap();

        assert!(ds.rows()[0][2].is_missing());
    }

    #[test]
    fn test_unparsable_timestamp_is_parse_error() {
        let mut ds = read_csv(
            "Start_Time,End_Time\nyesterday,2024-01-01 10:30\n".as_bytes(),
            "inline",
        )
        .unwrap();

        let result = derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None);
        assert!(matches!(
            result,
            Err(PipelineError::Parse { row: 0, ref value, .. }) if value == "yesterday"
        ));
    }

    #[test]
    fn test_absent_column_is_missing_column_error() {
        let mut ds = read_csv("Start_Time\n2024-01-01 10:00\n".as_bytes(), "inline").unwrap();

        let result = derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None);
        assert!(matches!(result, Err(PipelineError::MissingColumn(c)) if c == "End_Time"));
    }

    #[test]
    fn test_rederive_overwrites_column() {
        let mut ds = read_csv(
            "Start_Time,End_Time\n2024-01-01 10:00,2024-01-01 10:30\n".as_bytes(),
            "inline",
        )
        .unwrap();

        derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None).unwrap();
        derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None).unwrap();

        assert_eq!(ds.columns().len(), 3);
        assert_eq!(ds.rows()[0][2], Cell::Number(30.0));
    }
}
