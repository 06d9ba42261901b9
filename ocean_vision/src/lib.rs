// THEORY:
// This file is the main entry point for the `ocean_vision` library crate. It
// exposes `OceanAnalysis` and its configuration and report types as the
// high-level interface for the day-quality analysis, while the image-processing
// building blocks (`core_modules`) and the learners (`learning`) stay available
// for callers that need a single stage on its own.
//
// The analysis reads a fixed-camera series of daily coastal photographs:
// 1.  The ocean is segmented once, on a reference photograph.
// 2.  Every labelled photograph is masked with that boundary and summarised by
//     per-channel medians and variances.
// 3.  The summaries are clustered and used to train a classifier, both judged
//     against human "good / okay / bad" day labels.

pub mod core_modules;
pub mod error;
pub mod learning;
pub mod parallel_pipeline;
pub mod pipeline;

pub use error::{Error, Result};
pub use pipeline::{AnalysisConfig, AnalysisReport, ClusterReport, Dataset, OceanAnalysis, Sample};
