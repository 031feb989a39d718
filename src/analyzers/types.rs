//! Data types produced by the ranking pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A process stage and its mean cycle time in minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleneckEntry {
    pub stage: String,
    pub mean_cycle_time: f64,
}

/// Advisory text for one bottleneck stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub stage: String,
    pub advice: String,
}

/// Everything an `analyze` run prints, in serializable form.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub rows: usize,
    pub stages: usize,
    pub bottlenecks: Vec<BottleneckEntry>,
    pub recommendations: Vec<Recommendation>,
}
