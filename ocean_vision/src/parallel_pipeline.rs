// THEORY:
// Feature extraction is the only stage whose cost grows with the size of the
// photo archive: every image must be decoded, clipped, masked and summarised.
// Each image is independent of the others, so the work is fanned out over a
// bounded set of blocking tasks.
//
// Key architectural principles:
// 1.  **Blocking work off the runtime**: decoding and statistics are CPU bound, so
//     they run under `spawn_blocking` rather than on the async worker threads.
// 2.  **Bounded fan-out**: at most `workers` images are in flight at once, which
//     also bounds the number of decoded images held in memory.
// 3.  **Ordered results**: results come back in listing order, so a parallel run
//     is indistinguishable from a sequential one.

use crate::core_modules::boundary::OceanBoundary;
use crate::core_modules::channel::RgbChannel;
use crate::core_modules::day_class::DayClass;
use crate::core_modules::features::FeatureVector;
use crate::core_modules::histogram::ChannelHistogram;
use crate::core_modules::utils::image_helper;
use crate::error::{Error, Result};
use crate::pipeline::Sample;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// One labelled image waiting to be summarised.
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub id: String,
    pub path: PathBuf,
    pub class: DayClass,
}

/// Runs feature extraction for many images against one shared boundary.
pub struct ExtractionPool {
    boundary: Arc<OceanBoundary>,
    workers: usize,
}

impl ExtractionPool {
    pub fn new(boundary: Arc<OceanBoundary>, workers: usize) -> Self {
        Self {
            boundary,
            workers: workers.max(1),
        }
    }

    /// Extracts every task, in order. Images whose ocean region turns out empty
    /// are dropped with a warning; any other failure aborts the run.
    pub async fn extract_all(&self, tasks: Vec<ImageTask>) -> Result<Vec<Sample>> {
        let outcomes: Vec<Result<Sample>> = stream::iter(tasks)
            .map(|task| {
                let boundary = Arc::clone(&self.boundary);
                async move {
                    tokio::task::spawn_blocking(move || extract_sample(&boundary, task)).await?
                }
            })
            .buffered(self.workers)
            .collect()
            .await;

        let mut samples = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(sample) => samples.push(sample),
                Err(Error::EmptyRegion { id, channel }) => {
                    warn!(%id, channel, "skipping image without ocean pixels");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(samples)
    }
}

/// Decode, mask, and summarise a single image.
pub fn extract_sample(boundary: &OceanBoundary, task: ImageTask) -> Result<Sample> {
    let image = image_helper::load_rgba(&task.path)?;
    let masked = boundary.apply(&image);
    let features = FeatureVector::from_masked(&masked, &task.id)?;
    let histograms = RgbChannel::ALL
        .iter()
        .map(|&channel| ChannelHistogram::from_masked(&masked, channel))
        .collect();

    debug!(
        id = %task.id,
        class = task.class.name(),
        blue_median = features.blue.median,
        blue_variance = features.blue.variance,
        "extracted features"
    );

    Ok(Sample {
        id: task.id,
        class: task.class,
        features,
        histograms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::morphology::BinaryMask;
    use image::{Rgba, RgbaImage};

    fn write_image(dir: &std::path::Path, name: &str, pixel: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(4, 4, Rgba(pixel))
            .save(&path)
            .expect("Error Saving File.");
        path
    }

    fn ocean_everywhere() -> Arc<OceanBoundary> {
        Arc::new(OceanBoundary::from_mask(BinaryMask::filled(4, 4, true)))
    }

    #[tokio::test]
    async fn results_keep_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        let tasks: Vec<ImageTask> = (0..6u8)
            .map(|i| ImageTask {
                id: format!("day_{i}"),
                path: write_image(dir.path(), &format!("day_{i}.png"), [10, 20, 100 + i, 255]),
                class: DayClass::Good,
            })
            .collect();

        let samples = ExtractionPool::new(ocean_everywhere(), 3)
            .extract_all(tasks)
            .await
            .unwrap();

        assert_eq!(samples.len(), 6);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.id, format!("day_{i}"));
            assert_eq!(sample.features.blue.median, 100.0 + i as f64);
            assert_eq!(sample.histograms.len(), 3);
        }
    }

    #[tokio::test]
    async fn empty_regions_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = vec![
            ImageTask {
                id: "dark".into(),
                path: write_image(dir.path(), "dark.png", [0, 0, 0, 255]),
                class: DayClass::Bad,
            },
            ImageTask {
                id: "bright".into(),
                path: write_image(dir.path(), "bright.png", [5, 6, 7, 255]),
                class: DayClass::Okay,
            },
        ];

        let samples = ExtractionPool::new(ocean_everywhere(), 2)
            .extract_all(tasks)
            .await
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "bright");
    }

    #[tokio::test]
    async fn unreadable_images_abort() {
        let tasks = vec![ImageTask {
            id: "missing".into(),
            path: PathBuf::from("/definitely/not/here.png"),
            class: DayClass::Good,
        }];
        let err = ExtractionPool::new(ocean_everywhere(), 1)
            .extract_all(tasks)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }
}
