use std::collections::BTreeSet;
use std::fmt;

/// Counts of true label (rows) against predicted label (columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Sorted union of every label seen on either side.
    pub labels: Vec<usize>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Pairs are taken positionally; any surplus on the longer side is ignored.
    pub fn from_labels(truth: &[usize], predicted: &[usize]) -> Self {
        let labels: Vec<usize> = truth
            .iter()
            .chain(predicted)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let position = |label: usize| labels.binary_search(&label).unwrap_or(0);

        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (&t, &p) in truth.iter().zip(predicted) {
            counts[position(t)][position(p)] += 1;
        }
        Self { labels, counts }
    }

    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        match (
            self.labels.binary_search(&truth),
            self.labels.binary_search(&predicted),
        ) {
            (Ok(i), Ok(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Sum of the diagonal.
    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);

        write!(f, "[")?;
        for (i, row) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            write!(f, "[")?;
            for (j, count) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{count:>width$}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_true_rows_against_predicted_columns() {
        let matrix = ConfusionMatrix::from_labels(&[0, 0, 1, 1, 1], &[0, 1, 1, 1, 0]);
        assert_eq!(matrix.labels, vec![0, 1]);
        assert_eq!(matrix.counts, vec![vec![1, 1], vec![1, 2]]);
        assert_eq!(matrix.get(1, 1), 2);
        assert_eq!(matrix.correct(), 3);
        assert_eq!(matrix.total(), 5);
    }

    #[test]
    fn labels_only_predicted_still_get_a_row() {
        let matrix = ConfusionMatrix::from_labels(&[1, 1], &[0, 1]);
        assert_eq!(matrix.labels, vec![0, 1]);
        assert_eq!(matrix.counts, vec![vec![0, 0], vec![1, 1]]);
    }

    #[test]
    fn renders_like_a_numpy_array() {
        let matrix = ConfusionMatrix::from_labels(&[0, 0, 1, 1, 1], &[0, 1, 1, 1, 0]);
        assert_eq!(matrix.to_string(), "[[1 1]\n [1 2]]");

        let wide = ConfusionMatrix {
            labels: vec![0, 1],
            counts: vec![vec![12, 3], vec![0, 7]],
        };
        assert_eq!(wide.to_string(), "[[12  3]\n [ 0  7]]");
    }
}
