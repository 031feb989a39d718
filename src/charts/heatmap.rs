//! Stage × mean cycle time heatmap.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{ChartColumns, chart_written, prepare_output, render_error};
use crate::analyzers::bottleneck::stage_means;
use crate::analyzers::types::BottleneckEntry;
use crate::dataset::Dataset;
use crate::error::Result;

pub const HEATMAP_TITLE: &str = "Average Cycle Time by Stage - Heatmap";

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;
const GRID_WIDTH: i32 = 860;
const BAR_STEPS: usize = 64;

/// Anchors of the diverging blue-white-red map.
const COOLWARM: [(f64, [f64; 3]); 3] = [
    (0.0, [59.0, 76.0, 192.0]),
    (0.5, [221.0, 221.0, 221.0]),
    (1.0, [180.0, 4.0, 38.0]),
];

/// Maps `t` in `[0, 1]` onto the coolwarm colour map.
pub fn coolwarm(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let (lo, hi) = if t <= COOLWARM[1].0 {
        (COOLWARM[0], COOLWARM[1])
    } else {
        (COOLWARM[1], COOLWARM[2])
    };
    let frac = (t - lo.0) / (hi.0 - lo.0);
    let channel = |i: usize| (lo.1[i] + (hi.1[i] - lo.1[i]) * frac).round() as u8;
    RGBColor(channel(0), channel(1), channel(2))
}

/// Draws the heatmap as an SVG document: one annotated cell per stage, in
/// the given order from the top, plus a colour bar.
pub fn heatmap_svg(pivot: &[BottleneckEntry], value_label: &str) -> Result<String> {
    let min = pivot
        .iter()
        .map(|e| e.mean_cycle_time)
        .fold(f64::INFINITY, f64::min);
    let max = pivot
        .iter()
        .map(|e| e.mean_cycle_time)
        .fold(f64::NEG_INFINITY, f64::max);
    let scale = |v: f64| if max > min { (v - min) / (max - min) } else { 0.5 };
    let (bar_lo, bar_hi) = if max > min {
        (min, max)
    } else if min.is_finite() {
        (min - 0.5, min + 0.5)
    } else {
        (0.0, 1.0)
    };

    let n = pivot.len() as i32;
    let y_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(row) if (0..n).contains(row) => {
            pivot[(n - 1 - row) as usize].stage.clone()
        }
        _ => String::new(),
    };
    let x_fmt = |_: &SegmentValue<i32>| value_label.to_string();

    let mut document = String::new();
    {
        let root = SVGBackend::with_string(&mut document, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error("heatmap"))?;
        let root = root
            .titled(HEATMAP_TITLE, ("sans-serif", 24))
            .map_err(render_error("heatmap"))?;
        let (grid_area, bar_area) = root.split_horizontally(GRID_WIDTH);

        let mut grid = ChartBuilder::on(&grid_area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(160)
            .build_cartesian_2d((0..1).into_segmented(), (0..n.max(1)).into_segmented())
            .map_err(render_error("heatmap"))?;

        grid.configure_mesh()
            .disable_mesh()
            .x_labels(1)
            .y_labels(pivot.len().max(1))
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .draw()
            .map_err(render_error("heatmap"))?;

        grid.draw_series(pivot.iter().enumerate().map(|(idx, entry)| {
            let row = n - 1 - idx as i32;
            Rectangle::new(
                [
                    (SegmentValue::Exact(0), SegmentValue::Exact(row)),
                    (SegmentValue::Exact(1), SegmentValue::Exact(row + 1)),
                ],
                coolwarm(scale(entry.mean_cycle_time)).filled(),
            )
        }))
        .map_err(render_error("heatmap"))?;

        let annotation = TextStyle::from(("sans-serif", 18).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));
        grid.draw_series(pivot.iter().enumerate().map(|(idx, entry)| {
            let row = n - 1 - idx as i32;
            let t = scale(entry.mean_cycle_time);
            let style = if (0.2..=0.8).contains(&t) {
                annotation.color(&BLACK)
            } else {
                annotation.color(&WHITE)
            };
            Text::new(
                format!("{:.2}", entry.mean_cycle_time),
                (SegmentValue::CenterOf(0), SegmentValue::CenterOf(row)),
                style,
            )
        }))
        .map_err(render_error("heatmap"))?;

        let mut bar = ChartBuilder::on(&bar_area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(0)
            .right_y_label_area_size(60)
            .build_cartesian_2d(0f64..1f64, bar_lo..bar_hi)
            .map_err(render_error("heatmap"))?;

        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_label_formatter(&|v: &f64| format!("{:.2}", v))
            .draw()
            .map_err(render_error("heatmap"))?;

        let step = (bar_hi - bar_lo) / BAR_STEPS as f64;
        bar.draw_series((0..BAR_STEPS).map(|i| {
            let lo = bar_lo + step * i as f64;
            Rectangle::new(
                [(0.0, lo), (1.0, lo + step)],
                coolwarm(scale(lo + step / 2.0)).filled(),
            )
        }))
        .map_err(render_error("heatmap"))?;

        root.present().map_err(render_error("heatmap"))?;
    }

    Ok(document)
}

/// Pivots the dataset to one mean per stage and renders the heatmap to `path`.
#[tracing::instrument(skip(dataset, columns), fields(rows = dataset.len()))]
pub fn render_heatmap(dataset: &Dataset, columns: &ChartColumns, path: &Path) -> Result<PathBuf> {
    columns.check(dataset)?;
    let pivot = stage_means(dataset, &columns.stage, &columns.cycle_time)?;
    let document = heatmap_svg(&pivot, &columns.cycle_time)?;
    prepare_output(path)?;
    fs::write(path, document)?;
    Ok(chart_written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn entry(stage: &str, mean: f64) -> BottleneckEntry {
        BottleneckEntry {
            stage: stage.to_string(),
            mean_cycle_time: mean,
        }
    }

    #[test]
    fn test_coolwarm_endpoints() {
        assert_eq!(coolwarm(0.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(0.5), RGBColor(221, 221, 221));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(f64::NAN), RGBColor(221, 221, 221));
    }

    #[test]
    fn test_cells_are_annotated() {
        let svg = heatmap_svg(&[entry("A", 20.0), entry("B", 45.0)], "Cycle_Time").unwrap();

        assert!(svg.contains(HEATMAP_TITLE));
        assert!(svg.contains("20.00"));
        assert!(svg.contains("45.00"));
    }

    #[test]
    fn test_extremes_use_map_endpoints() {
        let svg = heatmap_svg(&[entry("A", 20.0), entry("B", 45.0)], "Cycle_Time").unwrap();

        assert!(svg.contains("#3B4CC0") || svg.contains("#3b4cc0"));
        assert!(svg.contains("#B40426") || svg.contains("#b40426"));
    }

    #[test]
    fn test_single_stage_renders() {
        let svg = heatmap_svg(&[entry("Only", 3.0)], "Cycle_Time").unwrap();
        assert!(svg.contains("3.00"));
    }

    #[test]
    fn test_render_requires_columns() {
        let ds = Dataset::new(vec!["Stage".to_string()]);
        let path = std::env::temp_dir().join("cycle_rater_test_heatmap_missing.svg");

        let result = render_heatmap(&ds, &ChartColumns::default(), &path);
        assert!(matches!(result, Err(PipelineError::MissingColumn(_))));
    }
}
