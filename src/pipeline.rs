//! The end-to-end run: load → clean → derive → rank → recommend.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::analyzers::bottleneck::identify_bottlenecks;
use crate::analyzers::recommend::recommend_optimizations;
use crate::analyzers::types::AnalysisReport;
use crate::cleaning::clean;
use crate::config::PipelineConfig;
use crate::cycle_time::derive_cycle_times;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::loader::load_csv;

/// A prepared dataset and the report computed from it.
#[derive(Debug)]
pub struct Analysis {
    pub dataset: Dataset,
    pub report: AnalysisReport,
}

/// Loads, cleans and derives cycle times.
pub fn prepare(path: &Path, config: &PipelineConfig) -> Result<Dataset> {
    let mut dataset = load_csv(path)?;
    clean(&mut dataset);
    derive_cycle_times(
        &mut dataset,
        &config.start_column,
        &config.end_column,
        config.time_format.as_deref(),
    )?;
    Ok(dataset)
}

/// Ranks an already prepared dataset and builds the report.
pub fn analyze_dataset(
    dataset: &Dataset,
    source: &str,
    config: &PipelineConfig,
) -> Result<AnalysisReport> {
    let bottlenecks = identify_bottlenecks(
        dataset,
        &config.stage_column,
        &config.cycle_time_column,
        config.top_n,
    )?;
    let recommendations = recommend_optimizations(&bottlenecks);

    let stage_idx = dataset.require_column(&config.stage_column)?;
    let stages = dataset
        .column(stage_idx)
        .filter(|c| !c.is_missing())
        .map(|c| c.to_string())
        .collect::<BTreeSet<_>>()
        .len();

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        source: source.to_string(),
        rows: dataset.len(),
        stages,
        bottlenecks,
        recommendations,
    })
}

/// Runs the whole pipeline for the file at `path`.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn analyze(path: &Path, config: &PipelineConfig) -> Result<Analysis> {
    let dataset = prepare(path, config)?;
    let report = analyze_dataset(&dataset, &path.display().to_string(), config)?;

    info!(
        rows = report.rows,
        stages = report.stages,
        bottlenecks = report.bottlenecks.len(),
        "Analysis complete"
    );
    Ok(Analysis { dataset, report })
}
