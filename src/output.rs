//! Console and file output for analysis reports.
//!
//! Supports the plain-text console sections, JSON, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::AnalysisReport;

/// Writes the "Top Bottlenecks" and "Optimization Recommendations" sections.
pub fn write_report<W: Write>(out: &mut W, report: &AnalysisReport) -> Result<()> {
    let width = report
        .bottlenecks
        .iter()
        .map(|b| b.stage.chars().count())
        .max()
        .unwrap_or(0);

    writeln!(out, "\nTop Bottlenecks:")?;
    for entry in &report.bottlenecks {
        writeln!(
            out,
            "{:<width$}  {:>10.2}",
            entry.stage,
            entry.mean_cycle_time,
            width = width
        )?;
    }

    writeln!(out, "\nOptimization Recommendations:")?;
    for rec in &report.recommendations {
        writeln!(out, "- {}: {}", rec.stage, rec.advice)?;
    }
    Ok(())
}

/// Prints the report sections to stdout.
pub fn print_report(report: &AnalysisReport) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_report(&mut handle, report)?;
    handle.flush()?;
    Ok(())
}

/// Prints the report as pretty-printed JSON to stdout.
pub fn print_json(report: &AnalysisReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[derive(Serialize)]
struct BottleneckRecord<'a> {
    generated_at: DateTime<Utc>,
    source: &'a str,
    rank: usize,
    stage: &'a str,
    mean_cycle_time: f64,
}

/// Appends one CSV row per ranked bottleneck.
///
/// Creates the file with headers if it does not already exist.
pub fn append_bottlenecks(path: &str, report: &AnalysisReport) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending bottleneck records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for (idx, entry) in report.bottlenecks.iter().enumerate() {
        writer.serialize(BottleneckRecord {
            generated_at: report.generated_at,
            source: &report.source,
            rank: idx + 1,
            stage: &entry.stage,
            mean_cycle_time: entry.mean_cycle_time,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::recommend::recommend_optimizations;
    use crate::analyzers::types::BottleneckEntry;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn report() -> AnalysisReport {
        let bottlenecks = vec![
            BottleneckEntry {
                stage: "B".into(),
                mean_cycle_time: 45.0,
            },
            BottleneckEntry {
                stage: "A".into(),
                mean_cycle_time: 20.0,
            },
        ];
        AnalysisReport {
            generated_at: Utc::now(),
            source: "test.csv".into(),
            rows: 3,
            stages: 2,
            recommendations: recommend_optimizations(&bottlenecks),
            bottlenecks,
        }
    }

    #[test]
    fn test_write_report_sections() {
        let mut buf = Vec::new();
        write_report(&mut buf, &report()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let top = text.find("Top Bottlenecks:").unwrap();
        let recs = text.find("Optimization Recommendations:").unwrap();
        assert!(top < recs);
        assert!(text.contains("B       45.00"));
        assert!(text.contains("- A: Consider redistributing workload"));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&report()).unwrap();
    }

    #[test]
    fn test_append_writes_header_once() {
        let path = temp_path("cycle_rater_test_header.csv");
        let _ = fs::remove_file(&path);

        append_bottlenecks(&path, &report()).unwrap();
        append_bottlenecks(&path, &report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("generated_at")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 runs × 2 bottlenecks
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }
}
