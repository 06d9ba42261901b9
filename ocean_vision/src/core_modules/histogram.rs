// THEORY:
// Greyscale histograms show the full intensity distribution behind the two summary
// statistics. One histogram is taken per channel of the masked image: one bin per
// integer intensity from the channel's minimum to its maximum, normalised so the
// bins sum to one. The first bin is then dropped, because in a masked image it
// holds the zeros written outside the ocean.

use crate::core_modules::channel::RgbChannel;
use image::RgbaImage;

/// A normalised intensity histogram of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHistogram {
    pub channel: RgbChannel,
    /// Intensity of each bin.
    pub centers: Vec<u8>,
    /// Fraction of all pixels (masked ones included) falling in each bin.
    pub frequencies: Vec<f64>,
}

impl ChannelHistogram {
    pub fn from_masked(image: &RgbaImage, channel: RgbChannel) -> Self {
        let offset = channel.index();
        let mut counts = [0usize; 256];
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        let mut total = 0usize;
        for pixel in image.pixels() {
            let v = pixel.0[offset];
            counts[v as usize] += 1;
            min = min.min(v);
            max = max.max(v);
            total += 1;
        }

        if total == 0 {
            return Self {
                channel,
                centers: Vec::new(),
                frequencies: Vec::new(),
            };
        }

        // Skip the first bin.
        let centers: Vec<u8> = (min..=max).skip(1).collect();
        let frequencies = centers
            .iter()
            .map(|&v| counts[v as usize] as f64 / total as f64)
            .collect();

        Self {
            channel,
            centers,
            frequencies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Largest bin frequency, 0 for an empty histogram.
    pub fn peak(&self) -> f64 {
        self.frequencies.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn bins_span_min_to_max_without_the_first() {
        let mut image = RgbaImage::new(4, 1);
        for (x, blue) in [0u8, 0, 3, 5].into_iter().enumerate() {
            image.put_pixel(x as u32, 0, Rgba([0, 0, blue, 255]));
        }
        let histogram = ChannelHistogram::from_masked(&image, RgbChannel::Blue);
        assert_eq!(histogram.centers, vec![1, 2, 3, 4, 5]);
        assert_eq!(histogram.frequencies, vec![0.0, 0.0, 0.25, 0.0, 0.25]);
        assert_eq!(histogram.peak(), 0.25);
    }

    #[test]
    fn single_valued_channel_is_empty() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([7, 7, 7, 255]));
        let histogram = ChannelHistogram::from_masked(&image, RgbChannel::Red);
        assert!(histogram.is_empty());
        assert_eq!(histogram.peak(), 0.0);
    }
}
