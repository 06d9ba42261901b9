// THEORY:
// The `OceanBoundary` is the owner of the segmentation stage. It is not an
// algorithm itself but the orchestrator that runs the stateless steps in order
// and keeps their final products:
//
// 1.  **Elevation**: the blue channel (water reflects blue most strongly) is
//     normalized and turned into a Sobel edge map.
// 2.  **Seeding & Flooding**: raw blue thresholds seed a two-label watershed over
//     that edge map. Label 2, the bright side, is the ocean.
// 3.  **Clean-up**: enclosed holes are filled; the longest iso-contour of the
//     filled mask is kept as the coastline for display; then detached bright
//     islands smaller than `min_object_size` are dropped from the mask.
// 4.  **Reuse**: The boundary is computed once from a reference photograph and
//     applied to every other image of the series. Photographs of a fixed camera
//     may differ slightly in size, so every use first clips mask and image to
//     their common top-left extent.

use crate::core_modules::channel::{ChannelPlane, RgbChannel};
use crate::core_modules::contour::{self, Contour};
use crate::core_modules::edge_map;
use crate::core_modules::morphology::{self, BinaryMask};
use crate::core_modules::watershed::watershed;
use crate::error::{Error, Result};
use image::RgbaImage;
use tracing::{debug, warn};

/// Tunable parameters of the ocean segmentation.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Blue intensities strictly below this seed the non-ocean label.
    pub low_threshold: u8,
    /// Blue intensities strictly above this seed the ocean label.
    pub high_threshold: u8,
    /// Iso-level used to trace the coastline on the 0/1 mask.
    pub contour_level: f64,
    /// Ocean components smaller than this many pixels are discarded.
    pub min_object_size: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            low_threshold: 30,
            high_threshold: 150,
            contour_level: 0.8,
            min_object_size: 10_000,
        }
    }
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.low_threshold >= self.high_threshold {
            return Err(Error::InvalidParameter {
                name: "low_threshold",
                reason: format!(
                    "must be below high_threshold ({} >= {})",
                    self.low_threshold, self.high_threshold
                ),
            });
        }
        if !(self.contour_level > 0.0 && self.contour_level < 1.0) {
            return Err(Error::InvalidParameter {
                name: "contour_level",
                reason: format!("must lie strictly between 0 and 1, got {}", self.contour_level),
            });
        }
        Ok(())
    }
}

/// The ocean region of a reference photograph.
#[derive(Debug, Clone)]
pub struct OceanBoundary {
    mask: BinaryMask,
    coastline: Contour,
}

impl OceanBoundary {
    /// Segments `reference` into ocean and non-ocean pixels.
    pub fn segment(reference: &RgbaImage, config: &SegmentationConfig) -> Result<Self> {
        config.validate()?;
        let blue = ChannelPlane::from_image(reference, RgbChannel::Blue);

        let elevation = edge_map::sobel(&blue.normalized());
        let markers =
            watershed::markers_from_thresholds(&blue, config.low_threshold, config.high_threshold);
        let labels = watershed::flood(&elevation, &markers);

        let ocean = labels.values.iter().map(|&l| l == watershed::HIGH_LABEL).collect();
        let segmentation = morphology::fill_holes(&BinaryMask::new(blue.width, blue.height, ocean));

        let contours = contour::mask_contours(&segmentation, config.contour_level);
        let coastline = contour::longest(&contours).cloned().unwrap_or_default();
        if coastline.is_empty() {
            warn!("segmentation has no coastline contour");
        }

        let mask = morphology::remove_small_objects(&segmentation, config.min_object_size);
        debug!(
            filled = segmentation.count(),
            kept = mask.count(),
            contours = contours.len(),
            coastline_points = coastline.len(),
            "segmented reference image"
        );

        if mask.count() == 0 {
            return Err(Error::EmptyBoundary {
                width: reference.width(),
                height: reference.height(),
            });
        }

        Ok(Self { mask, coastline })
    }

    /// Wraps an existing mask, e.g. one produced by an external tool.
    pub fn from_mask(mask: BinaryMask) -> Self {
        let coastline = contour::longest(&contour::mask_contours(&mask, 0.5))
            .cloned()
            .unwrap_or_default();
        Self { mask, coastline }
    }

    pub fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// The longest iso-contour of the filled segmentation, as `(row, column)`.
    pub fn coastline(&self) -> &Contour {
        &self.coastline
    }

    pub fn width(&self) -> u32 {
        self.mask.width
    }

    pub fn height(&self) -> u32 {
        self.mask.height
    }

    pub fn ocean_pixels(&self) -> usize {
        self.mask.count()
    }

    /// The mask restricted to the extent it shares with a `width x height` image.
    pub fn clipped(&self, width: u32, height: u32) -> BinaryMask {
        self.mask.cropped(width, height)
    }

    /// Clips `image` to the common extent and zeroes every non-ocean pixel in all
    /// four channels.
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let mask = self.clipped(image.width(), image.height());
        let mut masked = RgbaImage::new(mask.width, mask.height);
        for (x, y, pixel) in masked.enumerate_pixels_mut() {
            if mask.get(x, y) {
                *pixel = *image.get_pixel(x, y);
            }
        }
        masked
    }
}
