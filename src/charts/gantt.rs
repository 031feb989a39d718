//! Production timeline: one lane per task, bars coloured by stage.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use plotters::prelude::*;
use tracing::debug;

use super::{ChartColumns, chart_written, prepare_output, render_error};
use crate::dataset::{Cell, Dataset};
use crate::error::{PipelineError, Result};

pub const GANTT_TITLE: &str = "Production Timeline - Gantt Chart";

const WIDTH: u32 = 1400;
const BASE_HEIGHT: u32 = 180;
const LANE_HEIGHT: u32 = 24;

/// One timeline bar.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttTask {
    pub task: String,
    pub stage: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Formats the `"<Stage>: <Product_ID>"` label for a row.
pub fn task_label(stage: &Cell, product: &Cell) -> String {
    format!("{}: {}", stage, product)
}

/// Collects one task per row that has both timestamps.
pub fn gantt_tasks(dataset: &Dataset, columns: &ChartColumns) -> Result<Vec<GanttTask>> {
    columns.check(dataset)?;
    let stage = dataset.require_column(&columns.stage)?;
    let product = dataset.require_column(&columns.product)?;
    let start = dataset.require_column(&columns.start)?;
    let end = dataset.require_column(&columns.end)?;

    let tasks: Vec<GanttTask> = dataset
        .rows()
        .iter()
        .filter_map(|row| {
            Some(GanttTask {
                task: task_label(&row[stage], &row[product]),
                stage: row[stage].to_string(),
                start: row[start].as_timestamp()?,
                end: row[end].as_timestamp()?,
            })
        })
        .collect();

    debug!(
        tasks = tasks.len(),
        skipped = dataset.len() - tasks.len(),
        "Gantt tasks collected"
    );
    Ok(tasks)
}

/// Draws the timeline as an SVG document. Tasks sharing a label share a lane;
/// the first task seen is drawn on top.
pub fn gantt_svg(tasks: &[GanttTask]) -> Result<String> {
    let (Some(t0), Some(t1)) = (
        tasks.iter().map(|t| t.start.min(t.end)).min(),
        tasks.iter().map(|t| t.start.max(t.end)).max(),
    ) else {
        return Err(PipelineError::Render {
            chart: "gantt",
            reason: "no rows with both timestamps".to_string(),
        });
    };

    let mut lanes: Vec<&str> = Vec::new();
    let mut lane_of: HashMap<&str, usize> = HashMap::new();
    let mut by_stage: BTreeMap<&str, Vec<&GanttTask>> = BTreeMap::new();
    for t in tasks {
        lane_of.entry(t.task.as_str()).or_insert_with(|| {
            lanes.push(&t.task);
            lanes.len() - 1
        });
        by_stage.entry(t.stage.as_str()).or_default().push(t);
    }

    let n = lanes.len() as i32;
    // lane 0 is drawn at the top
    let row_of = |task: &str| n - 1 - lane_of[task] as i32;
    let minutes = |ts: NaiveDateTime| (ts - t0).num_seconds() as f64 / 60.0;
    let span = minutes(t1).max(1.0);

    let x_fmt = |m: &f64| {
        (t0 + Duration::seconds((m * 60.0).round() as i64))
            .format("%m-%d %H:%M")
            .to_string()
    };
    let y_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(row) if (0..n).contains(row) => {
            lanes[(n - 1 - row) as usize].to_string()
        }
        _ => String::new(),
    };

    let height = BASE_HEIGHT + LANE_HEIGHT * lanes.len() as u32;
    let mut document = String::new();
    {
        let root = SVGBackend::with_string(&mut document, (WIDTH, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error("gantt"))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(GANTT_TITLE, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(220)
            .build_cartesian_2d(0f64..span, (0..n).into_segmented())
            .map_err(render_error("gantt"))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_labels(8)
            .y_labels(lanes.len())
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .x_desc("Time")
            .draw()
            .map_err(render_error("gantt"))?;

        for (idx, (stage, stage_tasks)) in by_stage.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            chart
                .draw_series(stage_tasks.iter().map(|t| {
                    let row = row_of(t.task.as_str());
                    let mut bar = Rectangle::new(
                        [
                            (minutes(t.start.min(t.end)), SegmentValue::Exact(row)),
                            (minutes(t.start.max(t.end)), SegmentValue::Exact(row + 1)),
                        ],
                        color.filled(),
                    );
                    bar.set_margin(3, 3, 0, 0);
                    bar
                }))
                .map_err(render_error("gantt"))?
                .label(*stage)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_error("gantt"))?;

        root.present().map_err(render_error("gantt"))?;
    }

    Ok(document)
}

/// Renders the timeline chart to `path`.
#[tracing::instrument(skip(dataset, columns), fields(rows = dataset.len()))]
pub fn render_gantt(dataset: &Dataset, columns: &ChartColumns, path: &Path) -> Result<PathBuf> {
    let tasks = gantt_tasks(dataset, columns)?;
    let document = gantt_svg(&tasks)?;
    prepare_output(path)?;
    fs::write(path, document)?;
    Ok(chart_written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle_time::{DEFAULT_END_COLUMN, DEFAULT_START_COLUMN, derive_cycle_times};
    use crate::loader::read_csv;

    fn sample() -> Dataset {
        let mut ds = read_csv(
            "Stage,Product_ID,Start_Time,End_Time\n\
             Cutting,101,2024-01-01 08:00,2024-01-01 08:30\n\
             Welding,101,2024-01-01 08:30,2024-01-01 09:15\n\
             Cutting,102,2024-01-01 08:10,2024-01-01 08:50\n"
                .as_bytes(),
            "inline",
        )
        .unwrap();
        derive_cycle_times(&mut ds, DEFAULT_START_COLUMN, DEFAULT_END_COLUMN, None).unwrap();
        ds
    }

    #[test]
    fn test_task_labels() {
        let tasks = gantt_tasks(&sample(), &ChartColumns::default()).unwrap();
        let labels: Vec<&str> = tasks.iter().map(|t| t.task.as_str()).collect();

        assert_eq!(labels, vec!["Cutting: 101", "Welding: 101", "Cutting: 102"]);
    }

    #[test]
    fn test_svg_contains_title_and_legend() {
        let tasks = gantt_tasks(&sample(), &ChartColumns::default()).unwrap();
        let svg = gantt_svg(&tasks).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains(GANTT_TITLE));
        // one legend entry per stage
        assert!(svg.contains("Cutting"));
        assert!(svg.contains("Welding"));
    }

    #[test]
    fn test_repeated_labels_share_a_lane() {
        let start = NaiveDateTime::parse_from_str("2024-01-01 08:00", "%Y-%m-%d %H:%M").unwrap();
        let tasks: Vec<GanttTask> = (0..2000)
            .map(|i| GanttTask {
                task: format!("Cutting: {}", i % 1000),
                stage: "Cutting".to_string(),
                start: start + Duration::minutes(i),
                end: start + Duration::minutes(i + 5),
            })
            .collect();

        let svg = gantt_svg(&tasks).unwrap();
        let expected_height = BASE_HEIGHT + LANE_HEIGHT * 1000;
        assert!(svg.contains(&format!("height=\"{}\"", expected_height)));
    }

    #[test]
    fn test_no_tasks_is_render_error() {
        let result = gantt_svg(&[]);
        assert!(matches!(result, Err(PipelineError::Render { chart: "gantt", .. })));
    }

    #[test]
    fn test_requires_cycle_time_column() {
        let ds = read_csv(
            "Stage,Product_ID,Start_Time,End_Time\nA,1,2024-01-01 08:00,2024-01-01 08:30\n"
                .as_bytes(),
            "inline",
        )
        .unwrap();

        let result = gantt_tasks(&ds, &ChartColumns::default());
        assert!(matches!(result, Err(PipelineError::MissingColumn(c)) if c == "Cycle_Time"));
    }
}
