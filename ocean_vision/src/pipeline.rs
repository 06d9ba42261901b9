// THEORY:
// The `pipeline` module is the top-level API of the analysis. It turns a folder of
// daily photographs and a file of human day-quality labels into a report that
// answers one question: can bad days be told apart from the rest by looking at
// the ocean alone?
//
// Key architectural principles:
// 1.  **Segment once**: the ocean boundary is computed from a single reference
//     photograph and reused for the whole series, which is valid because the
//     camera does not move.
// 2.  **Summarise in parallel**: per-image work is handed to the
//     `ExtractionPool`; everything after it runs on the small feature matrix.
// 3.  **Two views**: k-means asks whether the classes form natural groups, the
//     cross-validated classifier asks how predictable they are.
// 4.  **Explicit configuration**: every tunable lives in `AnalysisConfig`, and a
//     single seed drives every random choice.

use crate::core_modules::boundary::{OceanBoundary, SegmentationConfig};
use crate::core_modules::channel::RgbChannel;
use crate::core_modules::day_class::{self, DayClass, DayClassLabels};
use crate::core_modules::features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
use crate::core_modules::histogram::ChannelHistogram;
use crate::core_modules::utils::{image_helper, render};
use crate::error::{Error, Result};
use crate::learning::validation::cross_val_score;
use crate::learning::{ConfusionMatrix, KMeans, ScoreSummary, ShuffleSplit, SvcParams};
use crate::parallel_pipeline::{ExtractionPool, ImageTask};
use chrono::NaiveDate;
use ndarray::Array2;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for an `OceanAnalysis` run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Directory holding one `YYYY_MM_DD.png` photograph per day.
    pub data_dir: PathBuf,
    /// JSON object mapping image identifiers to `good`, `okay` or `bad`.
    pub labels_path: PathBuf,
    /// Day whose photograph defines the ocean boundary.
    pub reference_date: NaiveDate,
    /// Where figures are written. No figures are rendered when unset.
    pub output_dir: Option<PathBuf>,
    pub segmentation: SegmentationConfig,
    pub kmeans: KMeans,
    pub validation: ShuffleSplit,
    pub svm: SvcParams,
    /// Standardise features inside every cross-validation split.
    pub standardize: bool,
    /// Maximum number of images decoded at once.
    pub workers: usize,
    /// Seeds both k-means and the shuffle splits, overriding their own seeds.
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../data"),
            labels_path: PathBuf::from("../data/day_classes.json"),
            reference_date: NaiveDate::from_ymd_opt(2019, 5, 5).unwrap_or_default(),
            output_dir: None,
            segmentation: SegmentationConfig::default(),
            kmeans: KMeans::default(),
            validation: ShuffleSplit::default(),
            svm: SvcParams::default(),
            standardize: false,
            workers: num_cpus::get(),
            seed: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.segmentation.validate()?;
        self.kmeans.validate()?;
        self.validation.validate()?;
        self.svm.validate()?;
        if self.workers == 0 {
            return Err(Error::InvalidParameter {
                name: "workers",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Path of the photograph used to segment the ocean.
    pub fn reference_path(&self) -> PathBuf {
        self.data_dir.join(day_class::reference_file_name(self.reference_date))
    }
}

/// One labelled image and its summaries.
#[derive(Debug, Clone)]
pub struct Sample {
    pub id: String,
    pub class: DayClass,
    pub features: FeatureVector,
    /// Red, green and blue, in that order.
    pub histograms: Vec<ChannelHistogram>,
}

/// The samples of a run as learner input.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub samples: Vec<Sample>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// One row of six statistics per sample.
    pub fn features(&self) -> Array2<f64> {
        let mut matrix = Array2::zeros((self.samples.len(), FEATURE_COUNT));
        for (mut row, sample) in matrix.outer_iter_mut().zip(&self.samples) {
            for (cell, value) in row.iter_mut().zip(sample.features.to_array()) {
                *cell = value;
            }
        }
        matrix
    }

    /// `bad -> 0`, everything else `-> 1`.
    pub fn targets(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.class.binary_target()).collect()
    }

    pub fn classes(&self) -> Vec<DayClass> {
        self.samples.iter().map(|s| s.class).collect()
    }
}

/// What the segmentation of the reference image produced.
#[derive(Debug, Clone)]
pub struct BoundarySummary {
    pub reference: PathBuf,
    pub width: u32,
    pub height: u32,
    pub ocean_pixels: usize,
    pub coastline_points: usize,
}

/// k-means memberships compared with the binary targets.
#[derive(Debug, Clone)]
pub struct ClusterReport {
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub confusion: ConfusionMatrix,
}

/// The complete outcome of an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub boundary: BoundarySummary,
    pub dataset: Dataset,
    pub clustering: ClusterReport,
    /// Accuracy of every cross-validation split.
    pub scores: Vec<f64>,
    pub classification: ScoreSummary,
    pub figures: Vec<PathBuf>,
}

/// The main, top-level struct of the day-quality analysis.
pub struct OceanAnalysis {
    config: AnalysisConfig,
}

impl OceanAnalysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub async fn run(&self) -> Result<AnalysisReport> {
        let config = &self.config;

        // --- 1. Labels ---
        let labels = DayClassLabels::load(&config.labels_path)?;
        info!(path = %config.labels_path.display(), count = labels.len(), "loaded day classes");

        // --- 2. Ocean boundary from the reference photograph ---
        let reference_path = config.reference_path();
        let reference = image_helper::load_rgba(&reference_path)?;
        let segmentation = config.segmentation.clone();
        let (reference, boundary) = tokio::task::spawn_blocking(move || {
            let boundary = OceanBoundary::segment(&reference, &segmentation);
            (reference, boundary)
        })
        .await?;
        let boundary = Arc::new(boundary?);
        let boundary_summary = BoundarySummary {
            reference: reference_path,
            width: boundary.width(),
            height: boundary.height(),
            ocean_pixels: boundary.ocean_pixels(),
            coastline_points: boundary.coastline().len(),
        };
        info!(
            reference = %boundary_summary.reference.display(),
            ocean_pixels = boundary_summary.ocean_pixels,
            coastline_points = boundary_summary.coastline_points,
            "segmented ocean boundary"
        );

        // --- 3. Per-image features ---
        let tasks = labelled_tasks(&list_images(&config.data_dir)?, &labels);
        info!(images = tasks.len(), workers = config.workers, "extracting features");
        let samples = ExtractionPool::new(Arc::clone(&boundary), config.workers)
            .extract_all(tasks)
            .await?;
        if samples.len() < 2 {
            return Err(Error::InsufficientSamples {
                stage: "analysis",
                needed: 2,
                found: samples.len(),
            });
        }
        let dataset = Dataset { samples };
        let data = dataset.features();
        let targets = dataset.targets();

        for (name, column) in FEATURE_NAMES.iter().zip(data.columns()) {
            debug!(feature = name, mean = column.mean().unwrap_or(0.0), "feature column");
        }

        // --- 4. Clustering and cross-validated classification ---
        let kmeans = KMeans {
            seed: config.seed,
            ..config.kmeans.clone()
        };
        let split = ShuffleSplit {
            seed: config.seed,
            ..config.validation.clone()
        };
        let svm = config.svm.clone();
        let standardize = config.standardize;
        let (clustering, scores) = tokio::task::spawn_blocking(move || {
            learn(&data, &targets, &kmeans, &svm, &split, standardize)
        })
        .await??;
        let classification = ScoreSummary::from_scores(&scores)?;
        info!(
            mean = classification.mean,
            standard_error = classification.standard_error,
            splits = scores.len(),
            "cross-validated classifier"
        );

        // --- 5. Figures ---
        let figures = match &config.output_dir {
            Some(dir) => write_figures(dir, &reference, &boundary, &dataset, &clustering.labels)?,
            None => Vec::new(),
        };

        Ok(AnalysisReport {
            boundary: boundary_summary,
            dataset,
            clustering,
            scores,
            classification,
            figures,
        })
    }
}

/// Runs both learners on the feature matrix: k-means memberships compared with
/// the targets, and the accuracy of every cross-validation split.
fn learn(
    data: &Array2<f64>,
    targets: &[usize],
    kmeans: &KMeans,
    svm: &SvcParams,
    split: &ShuffleSplit,
    standardize: bool,
) -> Result<(ClusterReport, Vec<f64>)> {
    let fit = kmeans.fit(data)?;
    let confusion = ConfusionMatrix::from_labels(targets, &fit.labels);
    info!(inertia = fit.inertia, agreement = confusion.correct(), "clustered samples");
    let clustering = ClusterReport {
        labels: fit.labels,
        inertia: fit.inertia,
        confusion,
    };

    let scores = cross_val_score(data, targets, svm, split, standardize)?;
    Ok((clustering, scores))
}

/// Every `*.png` directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_error = |source| Error::DataDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Pairs images with their day class; unlabelled images are skipped.
fn labelled_tasks(images: &[PathBuf], labels: &DayClassLabels) -> Vec<ImageTask> {
    images
        .iter()
        .filter_map(|path| {
            let id = day_class::image_id(path)?;
            match labels.get(&id) {
                Some(class) => Some(ImageTask {
                    id,
                    path: path.clone(),
                    class,
                }),
                None => {
                    warn!(%id, "skipping image without a day class");
                    None
                }
            }
        })
        .collect()
}

fn write_figures(
    dir: &Path,
    reference: &image::RgbaImage,
    boundary: &OceanBoundary,
    dataset: &Dataset,
    clusters: &[usize],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(3);

    let path = dir.join("coastal_edge.png");
    image_helper::save_png(&path, &render::coastal_edge_figure(reference, boundary))?;
    written.push(path);

    let histograms: Vec<(DayClass, &[ChannelHistogram])> = dataset
        .samples
        .iter()
        .map(|s| (s.class, s.histograms.as_slice()))
        .collect();
    let path = dir.join("histograms.png");
    image_helper::save_png(&path, &render::histogram_figure(&histograms))?;
    written.push(path);

    let points: Vec<(f64, f64)> = dataset
        .samples
        .iter()
        .map(|s| s.features.channel(RgbChannel::Blue))
        .map(|blue| (blue.median, blue.variance))
        .collect();
    let path = dir.join("clusters.png");
    image_helper::save_png(&path, &render::cluster_figure(&points, &dataset.classes(), clusters))?;
    written.push(path);

    for figure in &written {
        debug!(path = %figure.display(), "wrote figure");
    }
    Ok(written)
}
