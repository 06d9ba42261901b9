// THEORY:
// The watershed turns an elevation map into a labelled partition of the image. It
// is a marker-controlled "priority flood":
//
// 1.  **Seeding**: Pixels whose raw intensity is unambiguous are pre-labelled.
//     Very dark pixels become label 1 (land, rocks, shadow) and very bright pixels
//     become label 2 (sunlit water). Everything in between is unknown (0).
// 2.  **Flooding**: All seeds enter a min-priority queue keyed by their elevation.
//     Repeatedly the lowest pixel is popped and each unlabelled 4-neighbour
//     inherits its label and is queued at its own elevation. Low, flat ground is
//     therefore claimed first and the two fronts meet on the ridges of the edge
//     map, which is where the coastline lies.
// 3.  **Determinism**: Equal elevations are served in insertion order (FIFO), so a
//     given image and marker set always yields the same partition.
// 4.  **Stateless Utility**: Like every segmentation step, the flood takes its
//     inputs by reference and returns a new label plane. It keeps no memory.

use crate::core_modules::channel::ChannelPlane;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub mod watershed {
    use super::*; // Make the plane type and queue machinery available.

    /// Label given to pixels darker than the low threshold.
    pub const LOW_LABEL: u8 = 1;
    /// Label given to pixels brighter than the high threshold.
    pub const HIGH_LABEL: u8 = 2;

    /// Builds the seed image from raw intensities.
    pub fn markers_from_thresholds(plane: &ChannelPlane<u8>, low: u8, high: u8) -> ChannelPlane<u8> {
        let values = plane
            .values
            .iter()
            .map(|&v| {
                if v < low {
                    LOW_LABEL
                } else if v > high {
                    HIGH_LABEL
                } else {
                    0
                }
            })
            .collect();
        ChannelPlane::new(plane.width, plane.height, values)
    }

    /// Floods `elevation` from the non-zero `markers` and returns the label plane.
    pub fn flood(elevation: &ChannelPlane<f64>, markers: &ChannelPlane<u8>) -> ChannelPlane<u8> {
        debug_assert_eq!(elevation.len(), markers.len());
        let width = markers.width as usize;
        let height = markers.height as usize;
        let mut labels = markers.values.clone();
        let mut queue: BinaryHeap<FloodEntry> = BinaryHeap::new();
        let mut age: u64 = 0;

        for (index, &label) in labels.iter().enumerate() {
            if label != 0 {
                queue.push(FloodEntry {
                    elevation: elevation.values[index],
                    age,
                    index,
                });
                age += 1;
            }
        }

        while let Some(entry) = queue.pop() {
            let label = labels[entry.index];
            let x = entry.index % width;
            let y = entry.index / width;

            let mut neighbours = [usize::MAX; 4];
            if y > 0 {
                neighbours[0] = entry.index - width;
            }
            if y + 1 < height {
                neighbours[1] = entry.index + width;
            }
            if x > 0 {
                neighbours[2] = entry.index - 1;
            }
            if x + 1 < width {
                neighbours[3] = entry.index + 1;
            }

            for neighbour in neighbours {
                if neighbour == usize::MAX || labels[neighbour] != 0 {
                    continue;
                }
                labels[neighbour] = label;
                queue.push(FloodEntry {
                    elevation: elevation.values[neighbour],
                    age,
                    index: neighbour,
                });
                age += 1;
            }
        }

        ChannelPlane::new(markers.width, markers.height, labels)
    }
}

/// A queued pixel. Ordered so that `BinaryHeap` pops the lowest elevation first,
/// and the oldest entry among equal elevations.
#[derive(Debug, Clone, Copy)]
struct FloodEntry {
    elevation: f64,
    age: u64,
    index: usize,
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodEntry {}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.age.cmp(&self.age))
    }
}

#[cfg(test)]
mod tests {
    use super::watershed::*;
    use super::*;

    #[test]
    fn thresholds_produce_two_marker_labels() {
        let plane = ChannelPlane::new(4, 1, vec![10u8, 30, 150, 200]);
        let markers = markers_from_thresholds(&plane, 30, 150);
        assert_eq!(markers.values, vec![LOW_LABEL, 0, 0, HIGH_LABEL]);
    }

    #[test]
    fn fronts_meet_on_the_ridge() {
        // A single row with a ridge at x = 3.
        let elevation = ChannelPlane::new(7, 1, vec![0.0, 0.1, 0.2, 0.9, 0.2, 0.1, 0.0]);
        let markers = ChannelPlane::new(7, 1, vec![1u8, 0, 0, 0, 0, 0, 2]);
        let labels = flood(&elevation, &markers);
        // Both fronts reach the ridge's neighbours at 0.2; the left front queues
        // first, so the ridge itself is claimed by label 1.
        assert_eq!(labels.values, vec![1, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn flood_fills_every_reachable_pixel() {
        let elevation = ChannelPlane::new(3, 3, vec![0.0; 9]);
        let mut seeds = vec![0u8; 9];
        seeds[4] = HIGH_LABEL;
        let labels = flood(&elevation, &ChannelPlane::new(3, 3, seeds));
        assert!(labels.values.iter().all(|&l| l == HIGH_LABEL));
    }

    #[test]
    fn no_markers_leaves_everything_unlabelled() {
        let elevation = ChannelPlane::new(2, 2, vec![0.5; 4]);
        let markers = ChannelPlane::new(2, 2, vec![0u8; 4]);
        assert_eq!(flood(&elevation, &markers).values, vec![0; 4]);
    }

    #[test]
    fn heap_pops_lowest_then_oldest() {
        let mut heap = BinaryHeap::new();
        heap.push(FloodEntry { elevation: 0.5, age: 0, index: 0 });
        heap.push(FloodEntry { elevation: 0.1, age: 2, index: 1 });
        heap.push(FloodEntry { elevation: 0.1, age: 1, index: 2 });
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|e| e.index)).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }
}
