//! `day_report` CLI - Judge how well ocean appearance predicts bad days.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocean_vision::core_modules::boundary::SegmentationConfig;
use ocean_vision::learning::{KMeans, ShuffleSplit};
use ocean_vision::{AnalysisConfig, OceanAnalysis};

/// Segment the ocean in a series of daily photographs, then cluster and classify
/// the days by the colour statistics of the water.
#[derive(Parser, Debug)]
#[command(name = "day_report")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory with one YYYY_MM_DD.png photograph per day.
    #[arg(long, default_value = "../data", value_name = "DIR")]
    data_dir: PathBuf,

    /// JSON file mapping image names to good, okay or bad.
    #[arg(long, default_value = "../data/day_classes.json", value_name = "FILE")]
    labels: PathBuf,

    /// Day whose photograph defines the ocean boundary.
    #[arg(long, default_value = "2019-05-05", value_name = "YYYY-MM-DD")]
    reference: NaiveDate,

    /// Write figures as PNG files into this directory.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Random seed for clustering and cross-validation.
    #[arg(long, default_value = "0", value_name = "INT")]
    seed: u64,

    /// Number of random train/test splits.
    #[arg(long, default_value = "1000", value_name = "INT")]
    splits: usize,

    /// Fraction of images held out in every split.
    #[arg(long, default_value = "0.2", value_name = "FLOAT")]
    test_size: f64,

    /// Number of k-means clusters.
    #[arg(long, default_value = "2", value_name = "INT")]
    clusters: usize,

    /// Number of k-means restarts.
    #[arg(long, default_value = "50", value_name = "INT")]
    n_init: usize,

    /// Blue intensities below this seed the land label.
    #[arg(long, default_value = "30", value_name = "INT")]
    low_threshold: u8,

    /// Blue intensities above this seed the ocean label.
    #[arg(long, default_value = "150", value_name = "INT")]
    high_threshold: u8,

    /// Ocean components smaller than this many pixels are dropped.
    #[arg(long, default_value = "10000", value_name = "INT")]
    min_object_size: usize,

    /// Standardise features inside every cross-validation split.
    #[arg(long)]
    standardize: bool,

    /// Maximum number of images decoded at once. Defaults to the CPU count.
    #[arg(short, long, value_name = "INT")]
    workers: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ocean_vision={log_level},day_report={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args).await {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn build_config(args: &Args) -> AnalysisConfig {
    let defaults = AnalysisConfig::default();
    AnalysisConfig {
        data_dir: args.data_dir.clone(),
        labels_path: args.labels.clone(),
        reference_date: args.reference,
        output_dir: args.output_dir.clone(),
        segmentation: SegmentationConfig {
            low_threshold: args.low_threshold,
            high_threshold: args.high_threshold,
            min_object_size: args.min_object_size,
            ..SegmentationConfig::default()
        },
        kmeans: KMeans {
            n_clusters: args.clusters,
            n_init: args.n_init,
            ..KMeans::default()
        },
        validation: ShuffleSplit {
            n_splits: args.splits,
            test_size: args.test_size,
            ..ShuffleSplit::default()
        },
        standardize: args.standardize,
        workers: args.workers.unwrap_or(defaults.workers),
        seed: args.seed,
        ..defaults
    }
}

async fn run(args: &Args) -> Result<()> {
    let analysis = OceanAnalysis::new(build_config(args)).context("Invalid analysis settings")?;
    let report = analysis.run().await.context("Analysis failed")?;

    println!("Confusion matrix:\n{}", report.clustering.confusion);
    println!("{}", report.classification);
    for figure in &report.figures {
        println!("Wrote {}", figure.display());
    }

    Ok(())
}
