use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use ocean_vision::core_modules::boundary::SegmentationConfig;
use ocean_vision::learning::{KMeans, ShuffleSplit};
use ocean_vision::{AnalysisConfig, Error, OceanAnalysis};
use std::path::Path;

const WIDTH: u32 = 60;
const HEIGHT: u32 = 40;
const SHORE: u32 = 30;

/// Dark land on the left, textured sea on the right.
fn day_image(sea: [u8; 3], texture: u8) -> RgbaImage {
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        if x < SHORE {
            return Rgba([60, 50, 10, 255]);
        }
        let jitter = |v: u8| {
            if (x + y) % 2 == 0 {
                v + texture
            } else {
                v - texture
            }
        };
        Rgba([jitter(sea[0]), jitter(sea[1]), jitter(sea[2]), 255])
    })
}

/// Six calm bright days, six choppy dull ones, and one unlabelled photograph.
fn write_archive(dir: &Path) {
    let mut labels = serde_json::Map::new();
    for i in 0..6u8 {
        let id = format!("2019_05_{:02}", 5 + i);
        day_image([20, 80, 200 + i], 2)
            .save(dir.join(format!("{id}.png")))
            .expect("Error Saving File.");
        labels.insert(id, "good".into());
    }
    for i in 0..6u8 {
        let id = format!("2019_05_{:02}", 11 + i);
        day_image([90, 90, 120 + i], 30)
            .save(dir.join(format!("{id}.png")))
            .expect("Error Saving File.");
        labels.insert(id, "bad".into());
    }
    day_image([20, 80, 200], 2)
        .save(dir.join("2019_06_30.png"))
        .expect("Error Saving File.");

    let text = serde_json::to_string(&labels).expect("Error Serializing Labels.");
    std::fs::write(dir.join("day_classes.json"), text).expect("Error Writing Labels.");
}

fn config_for(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        data_dir: dir.to_path_buf(),
        labels_path: dir.join("day_classes.json"),
        reference_date: NaiveDate::from_ymd_opt(2019, 5, 5).unwrap(),
        segmentation: SegmentationConfig {
            min_object_size: 50,
            ..SegmentationConfig::default()
        },
        kmeans: KMeans {
            n_init: 10,
            ..KMeans::default()
        },
        validation: ShuffleSplit {
            n_splits: 20,
            ..ShuffleSplit::default()
        },
        workers: 4,
        seed: 3,
        ..AnalysisConfig::default()
    }
}

#[tokio::test]
async fn full_analysis_separates_calm_and_choppy_days() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path());

    let report = OceanAnalysis::new(config_for(dir.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    // Every pixel right of the shore is ocean.
    assert_eq!(report.boundary.ocean_pixels, ((WIDTH - SHORE) * HEIGHT) as usize);
    assert!(report.boundary.coastline_points > 0);

    // The unlabelled photograph is skipped; the rest keep listing order.
    assert_eq!(report.dataset.len(), 12);
    assert_eq!(report.dataset.samples[0].id, "2019_05_05");
    assert_eq!(report.dataset.samples[11].id, "2019_05_16");

    let first = &report.dataset.samples[0].features;
    assert_eq!(first.blue.median, 200.0);
    assert_eq!(first.blue.variance, 4.0);
    let last = &report.dataset.samples[11].features;
    assert_eq!(last.blue.median, 125.0);
    assert_eq!(last.blue.variance, 900.0);

    // Clusters match the classes up to naming.
    let confusion = &report.clustering.confusion;
    assert_eq!(confusion.labels, vec![0, 1]);
    assert_eq!(confusion.total(), 12);
    assert!(confusion.correct() == 12 || confusion.correct() == 0, "{confusion}");

    assert_eq!(report.scores.len(), 20);
    assert_eq!(report.classification.mean, 1.0);
    assert!(report.figures.is_empty());
}

#[tokio::test]
async fn figures_are_written_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path());
    let output = dir.path().join("figures");

    let config = AnalysisConfig {
        output_dir: Some(output.clone()),
        ..config_for(dir.path())
    };
    let report = OceanAnalysis::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.figures.len(), 3);
    for name in ["coastal_edge.png", "histograms.png", "clusters.png"] {
        let path = output.join(name);
        assert!(report.figures.contains(&path));
        image::open(&path).expect("Error Opening Figure.");
    }
    let coastal = image::open(output.join("coastal_edge.png")).unwrap();
    assert_eq!(coastal.width(), 2 * WIDTH + 10);
    assert_eq!(coastal.height(), HEIGHT);
}

#[tokio::test]
async fn missing_reference_photograph_is_an_image_error() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path());
    let config = AnalysisConfig {
        reference_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        ..config_for(dir.path())
    };

    let err = OceanAnalysis::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, Error::ImageLoad { .. }));
}

#[tokio::test]
async fn a_single_labelled_day_is_not_enough() {
    let dir = tempfile::tempdir().unwrap();
    day_image([20, 80, 200], 2)
        .save(dir.path().join("2019_05_05.png"))
        .unwrap();
    std::fs::write(dir.path().join("day_classes.json"), r#"{"2019_05_05": "okay"}"#).unwrap();

    let err = OceanAnalysis::new(config_for(dir.path()))
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientSamples { needed: 2, found: 1, .. }));
}
