// THEORY:
// The feature vector summarises one photograph's ocean region with six numbers:
// the median and the variance of each colour channel. The median tracks the
// overall tone of the water (glare, haze, overcast), the variance tracks its
// texture (chop, whitecaps, broken reflections).
//
// Zero is the "missing" marker. The mask writes zeros outside the ocean, so every
// zero is skipped before the statistics are taken. Genuine zero intensities
// inside the ocean are indistinguishable from masked pixels and are skipped too;
// each channel is filtered on its own.

use crate::core_modules::channel::RgbChannel;
use crate::error::{Error, Result};
use image::RgbaImage;

/// Number of statistics per image.
pub const FEATURE_COUNT: usize = 6;

/// Column names, in feature order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "red_median",
    "red_variance",
    "green_median",
    "green_variance",
    "blue_median",
    "blue_variance",
];

/// Median and variance of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub median: f64,
    pub variance: f64,
}

/// Six statistics describing one image's ocean region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub red: ChannelStats,
    pub green: ChannelStats,
    pub blue: ChannelStats,
}

impl FeatureVector {
    /// Computes the statistics of a masked image. `id` only labels errors.
    pub fn from_masked(image: &RgbaImage, id: &str) -> Result<Self> {
        let stats = |channel: RgbChannel| {
            let offset = channel.index();
            let values: Vec<u8> = image
                .pixels()
                .map(|p| p.0[offset])
                .filter(|&v| v != 0)
                .collect();
            channel_stats(&values).ok_or_else(|| Error::EmptyRegion {
                id: id.to_string(),
                channel: channel.name(),
            })
        };

        Ok(Self {
            red: stats(RgbChannel::Red)?,
            green: stats(RgbChannel::Green)?,
            blue: stats(RgbChannel::Blue)?,
        })
    }

    pub fn channel(&self, channel: RgbChannel) -> ChannelStats {
        match channel {
            RgbChannel::Red => self.red,
            RgbChannel::Green => self.green,
            RgbChannel::Blue => self.blue,
        }
    }

    /// `[red median, red variance, green median, green variance, blue median, blue variance]`
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.red.median,
            self.red.variance,
            self.green.median,
            self.green.variance,
            self.blue.median,
            self.blue.variance,
        ]
    }
}

/// Median and population variance of the given samples, `None` when empty.
pub fn channel_stats(values: &[u8]) -> Option<ChannelStats> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count;

    Some(ChannelStats {
        median: median(values),
        variance,
    })
}

/// Median via a 256-bin count, averaging the two middle values for even counts.
fn median(values: &[u8]) -> f64 {
    let mut counts = [0usize; 256];
    for &v in values {
        counts[v as usize] += 1;
    }
    let nth = |rank: usize| -> f64 {
        let mut seen = 0;
        for (value, &count) in counts.iter().enumerate() {
            seen += count;
            if seen > rank {
                return value as f64;
            }
        }
        255.0
    };

    let n = values.len();
    if n % 2 == 1 {
        nth(n / 2)
    } else {
        (nth(n / 2 - 1) + nth(n / 2)) / 2.0
    }
}
