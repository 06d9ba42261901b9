//! Error types for the ocean_vision library.

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the analysis can surface.
#[derive(Error, Debug)]
pub enum Error {
    /// An image could not be opened or decoded.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A figure could not be encoded or written.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read day classes from {path}: {source}")]
    LabelsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse day classes in {path}: {source}")]
    LabelsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The image directory could not be listed.
    #[error("failed to list images in {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Segmentation of the reference image found no ocean at all.
    #[error("reference image {width}x{height} produced an empty ocean boundary")]
    EmptyBoundary { width: u32, height: u32 },

    /// The masked region of an image has no usable pixel in some channel.
    #[error("image {id} has no ocean pixels in the {channel} channel")]
    EmptyRegion { id: String, channel: &'static str },

    #[error("need at least {needed} samples for {stage}, found {found}")]
    InsufficientSamples {
        stage: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A blocking feature-extraction task panicked or was cancelled.
    #[error("feature extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ocean_vision operations.
pub type Result<T> = std::result::Result<T, Error>;
