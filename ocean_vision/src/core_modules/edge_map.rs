// THEORY:
// The edge map is the "elevation" surface the watershed floods. Flat water and
// flat land are low ground; the coastline, where intensity changes abruptly, is a
// ridge that keeps the two flood fronts apart until they meet on it.
//
// The operator is a Sobel filter built from two separable passes per axis:
// smoothing `[1, 2, 1] / 4` across the axis and a central difference `[1, 0, -1]`
// along it. The magnitude combines both axes as `sqrt((gx^2 + gy^2) / 2)`, so a
// unit step between 0.0 and 1.0 peaks at `1 / sqrt(2)` on both sides of the step.
// Borders are handled by half-sample symmetric reflection (`d c b a | a b c d | d c b a`),
// and the outermost one-pixel ring of the magnitude is then set to zero.

use crate::core_modules::channel::ChannelPlane;

const SMOOTH: [f64; 3] = [0.25, 0.5, 0.25];
const DERIVATIVE: [f64; 3] = [1.0, 0.0, -1.0];

/// Computes the Sobel gradient magnitude of a normalized plane.
pub fn sobel(plane: &ChannelPlane<f64>) -> ChannelPlane<f64> {
    let (width, height) = (plane.width as usize, plane.height as usize);
    if width == 0 || height == 0 {
        return ChannelPlane::new(plane.width, plane.height, Vec::new());
    }

    // Vertical derivative (rows), smoothed horizontally.
    let smoothed_x = convolve_rows(&plane.values, width, height, &SMOOTH);
    let gy = convolve_columns(&smoothed_x, width, height, &DERIVATIVE);

    // Horizontal derivative (columns), smoothed vertically.
    let smoothed_y = convolve_columns(&plane.values, width, height, &SMOOTH);
    let gx = convolve_rows(&smoothed_y, width, height, &DERIVATIVE);

    let mut magnitude: Vec<f64> = gx
        .iter()
        .zip(gy.iter())
        .map(|(x, y)| ((x * x + y * y) / 2.0).sqrt())
        .collect();
    clear_border(&mut magnitude, width, height);

    ChannelPlane::new(plane.width, plane.height, magnitude)
}

/// Zeroes the one-pixel frame of a row-major grid.
fn clear_border(values: &mut [f64], width: usize, height: usize) {
    for x in 0..width {
        values[x] = 0.0;
        values[(height - 1) * width + x] = 0.0;
    }
    for y in 0..height {
        values[y * width] = 0.0;
        values[y * width + width - 1] = 0.0;
    }
}

/// Half-sample symmetric reflection of an out-of-range index.
#[inline]
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - 1 - i;
    }
    i as usize
}

/// Correlates every row with a 3-tap kernel centred on each pixel.
fn convolve_rows(values: &[f64], width: usize, height: usize, kernel: &[f64; 3]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    for y in 0..height {
        let row = &values[y * width..(y + 1) * width];
        for x in 0..width {
            let left = row[reflect(x as isize - 1, width)];
            let right = row[reflect(x as isize + 1, width)];
            out[y * width + x] = kernel[0] * left + kernel[1] * row[x] + kernel[2] * right;
        }
    }
    out
}

/// Correlates every column with a 3-tap kernel centred on each pixel.
fn convolve_columns(values: &[f64], width: usize, height: usize, kernel: &[f64; 3]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    for y in 0..height {
        let up = reflect(y as isize - 1, height) * width;
        let down = reflect(y as isize + 1, height) * width;
        let here = y * width;
        for x in 0..width {
            out[here + x] =
                kernel[0] * values[up + x] + kernel[1] * values[here + x] + kernel[2] * values[down + x];
        }
    }
    out
}
