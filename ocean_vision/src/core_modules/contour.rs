// THEORY:
// Iso-contours by marching squares. The image is viewed as a grid of 2x2 cells;
// each cell whose corners straddle the level contributes one or two line segments
// whose endpoints lie on the crossed cell edges (linearly interpolated). Adjacent
// cells share edges, so segments are chained into polylines by edge identity
// rather than by floating-point coordinates, which keeps the assembly exact.
//
// Ambiguous "saddle" cells (opposite corners on the same side of the level) are
// resolved with the average of the four corners: when the centre lies on the same
// side as the top-left corner, that corner is connected through the centre.
//
// Coordinates are `(row, column)` in pixel units. A closed contour repeats its
// first point at the end.

use crate::core_modules::channel::ChannelPlane;
use crate::core_modules::morphology::BinaryMask;
use std::collections::HashMap;

/// A polyline of `(row, column)` points.
pub type Contour = Vec<(f64, f64)>;

/// A cell edge: horizontal between `(r, c)` and `(r, c + 1)`, vertical between
/// `(r, c)` and `(r + 1, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Edge {
    Horizontal(usize, usize),
    Vertical(usize, usize),
}

/// Finds every contour of `plane` at `level`.
pub fn find_contours(plane: &ChannelPlane<f64>, level: f64) -> Vec<Contour> {
    let width = plane.width as usize;
    let height = plane.height as usize;
    if width < 2 || height < 2 {
        return Vec::new();
    }
    let value = |r: usize, c: usize| plane.values[r * width + c];

    let mut segments: Vec<(Edge, Edge)> = Vec::new();
    for r in 0..height - 1 {
        for c in 0..width - 1 {
            let ul = value(r, c);
            let ur = value(r, c + 1);
            let ll = value(r + 1, c);
            let lr = value(r + 1, c + 1);
            let (ul_up, ur_up, ll_up, lr_up) = (ul > level, ur > level, ll > level, lr > level);

            let top = Edge::Horizontal(r, c);
            let bottom = Edge::Horizontal(r + 1, c);
            let left = Edge::Vertical(r, c);
            let right = Edge::Vertical(r, c + 1);

            let mut crossed = Vec::with_capacity(4);
            if ul_up != ur_up {
                crossed.push(top);
            }
            if ur_up != lr_up {
                crossed.push(right);
            }
            if ll_up != lr_up {
                crossed.push(bottom);
            }
            if ul_up != ll_up {
                crossed.push(left);
            }

            match crossed.len() {
                2 => segments.push((crossed[0], crossed[1])),
                4 => {
                    let centre_up = (ul + ur + ll + lr) / 4.0 > level;
                    if ul_up == centre_up {
                        segments.push((top, right));
                        segments.push((bottom, left));
                    } else {
                        segments.push((top, left));
                        segments.push((right, bottom));
                    }
                }
                _ => {}
            }
        }
    }

    assemble(&segments)
        .into_iter()
        .map(|edges| {
            edges
                .into_iter()
                .map(|edge| interpolate(edge, &value, level))
                .collect()
        })
        .collect()
}

/// Contours of a boolean mask viewed as a 0/1 image.
pub fn mask_contours(mask: &BinaryMask, level: f64) -> Vec<Contour> {
    let values = mask.values.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect();
    find_contours(&ChannelPlane::new(mask.width, mask.height, values), level)
}

/// The contour with the most points; the first one wins ties.
pub fn longest(contours: &[Contour]) -> Option<&Contour> {
    let mut best: Option<&Contour> = None;
    for contour in contours {
        if best.is_none_or(|b| contour.len() > b.len()) {
            best = Some(contour);
        }
    }
    best
}

fn interpolate(edge: Edge, value: &impl Fn(usize, usize) -> f64, level: f64) -> (f64, f64) {
    let fraction = |a: f64, b: f64| if a == b { 0.5 } else { (level - a) / (b - a) };
    match edge {
        Edge::Horizontal(r, c) => (r as f64, c as f64 + fraction(value(r, c), value(r, c + 1))),
        Edge::Vertical(r, c) => (r as f64 + fraction(value(r, c), value(r + 1, c)), c as f64),
    }
}

/// Chains segments sharing an edge into polylines of edges.
fn assemble(segments: &[(Edge, Edge)]) -> Vec<Vec<Edge>> {
    let mut adjacency: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (index, &(a, b)) in segments.iter().enumerate() {
        adjacency.entry(a).or_default().push(index);
        adjacency.entry(b).or_default().push(index);
    }

    let mut visited = vec![false; segments.len()];
    let mut paths = Vec::new();

    // Open paths first, starting from a dangling end so nothing is split.
    for index in 0..segments.len() {
        if visited[index] {
            continue;
        }
        let (a, b) = segments[index];
        let start = if adjacency[&a].len() == 1 {
            Some(a)
        } else if adjacency[&b].len() == 1 {
            Some(b)
        } else {
            None
        };
        if let Some(start) = start {
            paths.push(walk(start, index, segments, &adjacency, &mut visited));
        }
    }

    // Whatever is left are closed loops.
    for index in 0..segments.len() {
        if !visited[index] {
            let start = segments[index].0;
            paths.push(walk(start, index, segments, &adjacency, &mut visited));
        }
    }

    paths
}

fn walk(
    start: Edge,
    first_segment: usize,
    segments: &[(Edge, Edge)],
    adjacency: &HashMap<Edge, Vec<usize>>,
    visited: &mut [bool],
) -> Vec<Edge> {
    let mut path = vec![start];
    let mut current = start;
    let mut segment = Some(first_segment);

    while let Some(index) = segment {
        visited[index] = true;
        let (a, b) = segments[index];
        let next = if a == current { b } else { a };
        path.push(next);
        current = next;
        segment = adjacency[&next].iter().copied().find(|&s| !visited[s]);
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask() -> BinaryMask {
        // A 2x2 block of ones inside a 4x4 frame of zeros.
        let mut values = vec![false; 16];
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            values[y * 4 + x] = true;
        }
        BinaryMask::new(4, 4, values)
    }

    #[test]
    fn isolated_block_gives_one_closed_contour() {
        let contours = mask_contours(&square_mask(), 0.8);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(contour.first(), contour.last());
        // Eight crossed edges around the block plus the closing point.
        assert_eq!(contour.len(), 9);
    }

    #[test]
    fn points_are_interpolated_towards_the_ones() {
        let contours = mask_contours(&square_mask(), 0.8);
        for &(row, col) in &contours[0] {
            // Every point sits 0.2 px outside the block edge or on a pixel line.
            let on_row = (row - 0.8).abs() < 1e-12 || (row - 2.2).abs() < 1e-12 || row.fract() == 0.0;
            let on_col = (col - 0.8).abs() < 1e-12 || (col - 2.2).abs() < 1e-12 || col.fract() == 0.0;
            assert!(on_row && on_col, "unexpected point ({row}, {col})");
        }
    }

    #[test]
    fn step_touching_the_border_gives_an_open_contour() {
        // Left half zero, right half one.
        let values = (0..12).map(|i| if i % 4 >= 2 { 1.0 } else { 0.0 }).collect();
        let plane = ChannelPlane::new(4, 3, values);
        let contours = find_contours(&plane, 0.8);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(contour.len(), 3);
        assert_ne!(contour.first(), contour.last());
        assert!(contour.iter().all(|&(_, col)| (col - 1.8).abs() < 1e-12));
    }

    #[test]
    fn flat_plane_has_no_contours() {
        let plane = ChannelPlane::new(3, 3, vec![1.0; 9]);
        assert!(find_contours(&plane, 0.8).is_empty());
    }

    #[test]
    fn longest_prefers_the_first_of_equal_lengths() {
        let contours = vec![vec![(0.0, 0.0)], vec![(1.0, 1.0), (2.0, 2.0)], vec![(3.0, 3.0), (4.0, 4.0)]];
        assert_eq!(longest(&contours), Some(&contours[1]));
        assert_eq!(longest(&[]), None);
    }
}
