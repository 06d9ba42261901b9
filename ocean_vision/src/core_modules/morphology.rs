// THEORY:
// Binary clean-up of the raw watershed partition. The flood leaves two kinds of
// noise in the ocean mask: enclosed "holes" (boats, foam, glare that seeded the
// dark label inside the water) and small detached islands of bright pixels on
// land (white walls, clouds reflected in windows). `fill_holes` absorbs the first,
// `remove_small_objects` drops the second.
//
// Both operations are built on one primitive: 4-connected component labelling by
// breadth-first search, the same region-growing pattern used elsewhere in the
// crate.

use std::collections::VecDeque;

/// A boolean grid aligned to image coordinates, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: u32,
    pub height: u32,
    pub values: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32, values: Vec<bool>) -> Self {
        debug_assert_eq!(values.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            values,
        }
    }

    pub fn filled(width: u32, height: u32, value: bool) -> Self {
        Self::new(width, height, vec![value; (width as usize) * (height as usize)])
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.values[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Number of `true` pixels.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|&&v| v).count()
    }

    /// The top-left `width x height` window of the mask. Dimensions larger than
    /// the mask are clamped.
    pub fn cropped(&self, width: u32, height: u32) -> BinaryMask {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let mut values = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            let start = (y as usize) * (self.width as usize);
            values.extend_from_slice(&self.values[start..start + width as usize]);
        }
        BinaryMask::new(width, height, values)
    }
}

/// Labels the 4-connected components of pixels equal to `target`.
/// Returns one label per pixel (0 for pixels not equal to `target`) and the size
/// of each component, indexed by `label - 1`.
pub fn label_components(mask: &BinaryMask, target: bool) -> (Vec<u32>, Vec<usize>) {
    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut labels = vec![0u32; mask.values.len()];
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..mask.values.len() {
        if mask.values[start] != target || labels[start] != 0 {
            continue;
        }
        let label = sizes.len() as u32 + 1;
        let mut size = 0usize;
        labels[start] = label;
        queue.push_back(start);

        while let Some(index) = queue.pop_front() {
            size += 1;
            for neighbour in neighbours(index, width, height).into_iter().flatten() {
                if mask.values[neighbour] == target && labels[neighbour] == 0 {
                    labels[neighbour] = label;
                    queue.push_back(neighbour);
                }
            }
        }
        sizes.push(size);
    }

    (labels, sizes)
}

/// Sets every background region that does not touch the image border.
pub fn fill_holes(mask: &BinaryMask) -> BinaryMask {
    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut outside = vec![false; mask.values.len()];
    let mut queue = VecDeque::new();

    let seed = |index: usize, outside: &mut Vec<bool>, queue: &mut VecDeque<usize>| {
        if !mask.values[index] && !outside[index] {
            outside[index] = true;
            queue.push_back(index);
        }
    };

    for x in 0..width {
        seed(x, &mut outside, &mut queue);
        if height > 1 {
            seed((height - 1) * width + x, &mut outside, &mut queue);
        }
    }
    for y in 0..height {
        seed(y * width, &mut outside, &mut queue);
        if width > 1 {
            seed(y * width + width - 1, &mut outside, &mut queue);
        }
    }

    while let Some(index) = queue.pop_front() {
        for neighbour in neighbours(index, width, height).into_iter().flatten() {
            if !mask.values[neighbour] && !outside[neighbour] {
                outside[neighbour] = true;
                queue.push_back(neighbour);
            }
        }
    }

    let values = outside.into_iter().map(|o| !o).collect();
    BinaryMask::new(mask.width, mask.height, values)
}

/// Clears foreground components smaller than `min_size` pixels.
pub fn remove_small_objects(mask: &BinaryMask, min_size: usize) -> BinaryMask {
    let (labels, sizes) = label_components(mask, true);
    let values = labels
        .iter()
        .map(|&label| label != 0 && sizes[label as usize - 1] >= min_size)
        .collect();
    BinaryMask::new(mask.width, mask.height, values)
}

#[inline]
fn neighbours(index: usize, width: usize, height: usize) -> [Option<usize>; 4] {
    let x = index % width;
    let y = index / width;
    [
        (y > 0).then(|| index - width),
        (y + 1 < height).then(|| index + width),
        (x > 0).then(|| index - 1),
        (x + 1 < width).then(|| index + 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> BinaryMask {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let values = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| c == '#'))
            .collect();
        BinaryMask::new(width, height, values)
    }

    #[test]
    fn enclosed_background_is_filled() {
        let mask = mask_from_rows(&[
            ".....", //
            ".###.",
            ".#.#.",
            ".###.",
            ".....",
        ]);
        let filled = fill_holes(&mask);
        assert!(filled.get(2, 2));
        assert_eq!(filled.count(), 9);
    }

    #[test]
    fn background_touching_the_border_is_kept() {
        let mask = mask_from_rows(&[
            "..#..", //
            ".#.#.",
            ".#.#.",
        ]);
        let filled = fill_holes(&mask);
        // The gap at (2, 1) reaches the bottom edge through (2, 2).
        assert!(!filled.get(2, 1));
        assert_eq!(filled, mask);
    }

    #[test]
    fn diagonal_gaps_do_not_leak() {
        // The hole at the centre only touches the outside diagonally.
        let mask = mask_from_rows(&[
            "###", //
            "#.#",
            "##.",
        ]);
        let filled = fill_holes(&mask);
        assert!(filled.get(1, 1));
        assert!(!filled.get(2, 2));
    }

    #[test]
    fn components_are_four_connected() {
        let mask = mask_from_rows(&[
            "#.#", //
            ".#.",
            "#.#",
        ]);
        let (_, sizes) = label_components(&mask, true);
        assert_eq!(sizes, vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn small_objects_are_removed() {
        let mask = mask_from_rows(&[
            "##...#", //
            "##....",
            "......",
            "...###",
        ]);
        let cleaned = remove_small_objects(&mask, 3);
        let expected = mask_from_rows(&[
            "##....", //
            "##....",
            "......",
            "...###",
        ]);
        assert_eq!(cleaned, expected);
    }

    #[test]
    fn cropping_keeps_the_top_left_window() {
        let mask = mask_from_rows(&[
            "#..", //
            ".#.",
            "..#",
        ]);
        let cropped = mask.cropped(2, 5);
        assert_eq!(cropped, mask_from_rows(&["#.", ".#", ".."]));
    }
}
