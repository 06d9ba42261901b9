// THEORY:
// Figures are plain RGB rasters drawn with a handful of primitives (lines, discs,
// marker outlines) so the analysis needs nothing beyond the `image` crate. Every
// figure is produced from data already computed by the pipeline; rendering never
// feeds back into the analysis.

use crate::core_modules::boundary::OceanBoundary;
use crate::core_modules::channel::{ChannelPlane, RgbChannel};
use crate::core_modules::day_class::DayClass;
use crate::core_modules::histogram::ChannelHistogram;
use image::{Rgb, RgbImage, RgbaImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const ORANGE: Rgb<u8> = Rgb([255, 165, 0]);
const DARK_GREY: Rgb<u8> = Rgb([169, 169, 169]);

const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 500;
const MARGIN: u32 = 40;
const PANEL_GAP: u32 = 10;

/// A white plotting area with a data-to-pixel mapping.
struct Canvas {
    image: RgbImage,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Canvas {
    fn new(x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        let mut canvas = Self {
            image: RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, WHITE),
            x_range: widen(x_range),
            y_range: widen(y_range),
        };
        let (x0, y0) = (MARGIN as f64, (PLOT_HEIGHT - MARGIN) as f64);
        canvas.line((x0, y0), ((PLOT_WIDTH - MARGIN) as f64, y0), AXIS);
        canvas.line((x0, y0), (x0, MARGIN as f64), AXIS);
        canvas
    }

    /// Maps data coordinates to pixel coordinates (y grows upwards).
    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let span_x = (PLOT_WIDTH - 2 * MARGIN) as f64;
        let span_y = (PLOT_HEIGHT - 2 * MARGIN) as f64;
        let px = MARGIN as f64 + (x - self.x_range.0) / (self.x_range.1 - self.x_range.0) * span_x;
        let py = (PLOT_HEIGHT - MARGIN) as f64
            - (y - self.y_range.0) / (self.y_range.1 - self.y_range.0) * span_y;
        (px, py)
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
        draw_line(&mut self.image, from, to, color);
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb<u8>) {
        for pair in points.windows(2) {
            let a = self.to_pixel(pair[0].0, pair[0].1);
            let b = self.to_pixel(pair[1].0, pair[1].1);
            self.line(a, b, color);
        }
    }
}

/// Expands a degenerate range so the mapping never divides by zero.
fn widen(range: (f64, f64)) -> (f64, f64) {
    if (range.1 - range.0).abs() < f64::EPSILON {
        (range.0 - 1.0, range.1 + 1.0)
    } else {
        range
    }
}

fn put(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line between two pixel positions.
fn draw_line(image: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let (mut x0, mut y0) = (from.0.round() as i64, from.1.round() as i64);
    let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(image, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn fill_disc(image: &mut RgbImage, centre: (f64, f64), radius: i64, color: Rgb<u8>) {
    let (cx, cy) = (centre.0.round() as i64, centre.1.round() as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(image, cx + dx, cy + dy, color);
            }
        }
    }
}

fn square_outline(image: &mut RgbImage, centre: (f64, f64), half: f64, color: Rgb<u8>) {
    for inset in 0..3 {
        let h = half - inset as f64;
        let (l, r, t, b) = (centre.0 - h, centre.0 + h, centre.1 - h, centre.1 + h);
        draw_line(image, (l, t), (r, t), color);
        draw_line(image, (r, t), (r, b), color);
        draw_line(image, (r, b), (l, b), color);
        draw_line(image, (l, b), (l, t), color);
    }
}

fn cross_outline(image: &mut RgbImage, centre: (f64, f64), half: f64, color: Rgb<u8>) {
    for offset in -1..=1 {
        let o = offset as f64;
        draw_line(image, (centre.0 - half + o, centre.1 - half), (centre.0 + half + o, centre.1 + half), color);
        draw_line(image, (centre.0 - half + o, centre.1 + half), (centre.0 + half + o, centre.1 - half), color);
    }
}

/// Flattens RGBA onto black, as a masked image is displayed.
fn flatten(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y).0;
        Rgb([p[0], p[1], p[2]])
    })
}

/// The blue channel with the coastline in orange, next to the masked reference.
pub fn coastal_edge_figure(reference: &RgbaImage, boundary: &OceanBoundary) -> RgbImage {
    let (width, height) = reference.dimensions();
    let mut figure = RgbImage::from_pixel(2 * width + PANEL_GAP, height, WHITE);

    let blue = ChannelPlane::from_image(reference, RgbChannel::Blue);
    for y in 0..height {
        for x in 0..width {
            let v = blue.get(x, y);
            figure.put_pixel(x, y, Rgb([v, v, v]));
        }
    }
    for &(row, col) in boundary.coastline() {
        fill_disc(&mut figure, (col, row), 2, ORANGE);
    }

    let masked = flatten(&boundary.apply(reference));
    let offset = width + PANEL_GAP;
    for (x, y, pixel) in masked.enumerate_pixels() {
        figure.put_pixel(offset + x, y, *pixel);
    }
    figure
}

/// Every channel histogram of every image, coloured by day class.
pub fn histogram_figure(samples: &[(DayClass, &[ChannelHistogram])]) -> RgbImage {
    let peak = samples
        .iter()
        .flat_map(|(_, histograms)| histograms.iter())
        .map(ChannelHistogram::peak)
        .fold(0.0, f64::max);
    let mut canvas = Canvas::new((0.0, 255.0), (0.0, peak));

    for (class, histograms) in samples {
        for histogram in histograms.iter() {
            let points: Vec<(f64, f64)> = histogram
                .centers
                .iter()
                .zip(&histogram.frequencies)
                .map(|(&c, &f)| (c as f64, f))
                .collect();
            canvas.polyline(&points, class.color());
        }
    }
    canvas.image
}

/// Blue median vs. blue variance per image, coloured by day class, with k-means
/// membership drawn as a grey square (cluster 0) or cross (any other cluster).
pub fn cluster_figure(points: &[(f64, f64)], classes: &[DayClass], clusters: &[usize]) -> RgbImage {
    let bounds = |select: fn(&(f64, f64)) -> f64| {
        points.iter().map(select).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    };
    let pad = |(lo, hi): (f64, f64)| {
        if !lo.is_finite() {
            return (0.0, 1.0);
        }
        let margin = (hi - lo) * 0.05;
        (lo - margin, hi + margin)
    };
    let mut canvas = Canvas::new(pad(bounds(|p| p.0)), pad(bounds(|p| p.1)));

    for ((&(x, y), class), &cluster) in points.iter().zip(classes).zip(clusters) {
        let centre = canvas.to_pixel(x, y);
        if cluster == 0 {
            square_outline(&mut canvas.image, centre, 12.0, DARK_GREY);
        } else {
            cross_outline(&mut canvas.image, centre, 12.0, DARK_GREY);
        }
        fill_disc(&mut canvas.image, centre, 6, class.color());
    }
    canvas.image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::morphology::BinaryMask;
    use image::Rgba;

    #[test]
    fn lines_cover_both_endpoints() {
        let mut image = RgbImage::from_pixel(10, 10, WHITE);
        draw_line(&mut image, (1.0, 1.0), (8.0, 5.0), ORANGE);
        assert_eq!(image.get_pixel(1, 1), &ORANGE);
        assert_eq!(image.get_pixel(8, 5), &ORANGE);
    }

    #[test]
    fn drawing_outside_the_raster_is_ignored() {
        let mut image = RgbImage::from_pixel(4, 4, WHITE);
        fill_disc(&mut image, (-10.0, -10.0), 3, ORANGE);
        assert!(image.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn coastal_figure_has_two_panels() {
        let reference = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 200, 255]));
        let boundary = OceanBoundary::from_mask(BinaryMask::filled(6, 4, true));
        let figure = coastal_edge_figure(&reference, &boundary);
        assert_eq!(figure.dimensions(), (2 * 6 + PANEL_GAP, 4));
        // Left panel shows blue as grey, right panel shows the masked colour.
        assert_eq!(figure.get_pixel(0, 0), &Rgb([200, 200, 200]));
        assert_eq!(figure.get_pixel(6 + PANEL_GAP, 0), &Rgb([10, 20, 200]));
    }

    #[test]
    fn cluster_figure_marks_points_in_class_colour() {
        let points = [(10.0, 100.0), (20.0, 300.0)];
        let classes = [DayClass::Good, DayClass::Bad];
        let figure = cluster_figure(&points, &classes, &[0, 1]);
        assert_eq!(figure.dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
        assert!(figure.pixels().any(|p| *p == DayClass::Good.color()));
        assert!(figure.pixels().any(|p| *p == DayClass::Bad.color()));
        assert!(figure.pixels().any(|p| *p == DARK_GREY));
    }
}
