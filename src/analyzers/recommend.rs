use crate::analyzers::types::{BottleneckEntry, Recommendation};

/// Maps each bottleneck to a workload-redistribution suggestion, preserving order.
pub fn recommend_optimizations(bottlenecks: &[BottleneckEntry]) -> Vec<Recommendation> {
    bottlenecks
        .iter()
        .map(|entry| Recommendation {
            stage: entry.stage.clone(),
            advice: format!(
                "Consider redistributing workload or adding resources to reduce average cycle time ({:.2} mins).",
                entry.mean_cycle_time
            ),
        })
        .collect()
}
