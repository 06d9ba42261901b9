// THEORY:
// The `channel` module is the most fundamental unit of the analysis. Everything
// downstream (edge detection, thresholds, statistics, histograms) works on one
// colour channel at a time, never on whole pixels, so an image is first split
// into dense, row-major "planes".
//
// Two numeric forms are kept:
// - raw bytes (0..255) for thresholds, statistics and histograms, which are all
//   defined on the original 8-bit intensities;
// - normalized floats (0..1) for the edge filter, whose magnitudes are only
//   comparable across images when computed on a fixed unit range.
//
// A plane is a "dumb" data container. It knows its shape and how to index itself,
// nothing more.

use image::RgbaImage;

/// One of the three colour channels carried into feature extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RgbChannel {
    Red,
    Green,
    Blue,
}

impl RgbChannel {
    pub const ALL: [RgbChannel; 3] = [RgbChannel::Red, RgbChannel::Green, RgbChannel::Blue];

    /// Position of the channel inside an RGBA pixel.
    pub fn index(self) -> usize {
        match self {
            RgbChannel::Red => 0,
            RgbChannel::Green => 1,
            RgbChannel::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RgbChannel::Red => "red",
            RgbChannel::Green => "green",
            RgbChannel::Blue => "blue",
        }
    }
}

/// A single channel of an image as a flattened, row-major grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlane<T> {
    pub width: u32,
    pub height: u32,
    pub values: Vec<T>,
}

impl<T: Copy> ChannelPlane<T> {
    pub fn new(width: u32, height: u32, values: Vec<T>) -> Self {
        debug_assert_eq!(values.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            values,
        }
    }

    #[inline]
    pub fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.values[self.index_of(x, y)]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ChannelPlane<u8> {
    /// Copies the raw 8-bit values of `channel` out of an RGBA image.
    pub fn from_image(image: &RgbaImage, channel: RgbChannel) -> Self {
        let offset = channel.index();
        let values = image.pixels().map(|pixel| pixel.0[offset]).collect();
        Self::new(image.width(), image.height(), values)
    }

    /// Rescales the plane to the unit interval.
    pub fn normalized(&self) -> ChannelPlane<f64> {
        let values = self.values.iter().map(|&v| v as f64 / 255.0).collect();
        ChannelPlane::new(self.width, self.height, values)
    }
}
