//! CLI entry point for the cycle-time rater.
//!
//! Provides subcommands for running the full bottleneck analysis over a
//! manufacturing event log and for exporting the cleaned dataset.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cycle_rater::{
    charts::render_all,
    config::PipelineConfig,
    loader::write_csv,
    output::{append_bottlenecks, print_json, print_report},
    pipeline::{analyze, prepare},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "cycle_rater")]
#[command(about = "Rank manufacturing stages by average cycle time", long_about = None)]
struct Cli {
    /// JSON file with pipeline settings
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Explicit chrono format for the timestamp columns
    #[arg(long, global = true)]
    time_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the event log, rank bottlenecks and render charts
    Analyze {
        /// CSV event log
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Number of stages to report
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Directory for gantt.svg and heatmap.svg
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Skip chart rendering
        #[arg(long, default_value_t = false)]
        no_charts: bool,

        /// Also print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append ranked bottlenecks to
        #[arg(long)]
        report_csv: Option<String>,
    },
    /// Write the cleaned dataset, with Cycle_Time, as CSV
    Clean {
        /// CSV event log
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Destination CSV
        #[arg(short, long, default_value = "cleaned.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/cycle_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("cycle_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if cli.time_format.is_some() {
        config.time_format = cli.time_format;
    }

    match cli.command {
        Commands::Analyze {
            input,
            top_n,
            chart_dir,
            no_charts,
            json,
            report_csv,
        } => {
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(dir) = chart_dir {
                config.chart_dir = dir;
            }

            let analysis = analyze(&input, &config)?;
            print_report(&analysis.report)?;

            if json {
                print_json(&analysis.report)?;
            }
            if let Some(path) = report_csv {
                append_bottlenecks(&path, &analysis.report)?;
                info!(path = %path, "Bottlenecks appended");
            }

            if no_charts {
                info!("Chart rendering skipped");
            } else {
                let written =
                    render_all(&analysis.dataset, &config.chart_columns(), &config.chart_dir)?;
                info!(charts = written.len(), dir = %config.chart_dir.display(), "Charts rendered");
            }
        }
        Commands::Clean { input, output } => {
            let dataset = prepare(&input, &config)?;
            write_csv(&output, &dataset)?;
            info!(
                rows = dataset.len(),
                output = %output.display(),
                "Cleaned dataset written"
            );
        }
    }

    Ok(())
}
