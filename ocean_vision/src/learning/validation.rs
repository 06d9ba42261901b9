use crate::error::{Error, Result};
use crate::learning::scaler::StandardScaler;
use crate::learning::svm::{SupportVectorClassifier, SvcParams};
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fmt;
use tracing::debug;

/// Repeated random train/test partitions.
#[derive(Debug, Clone)]
pub struct ShuffleSplit {
    pub n_splits: usize,
    /// Fraction of samples held out; the test side has `ceil(test_size * n)` rows.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for ShuffleSplit {
    fn default() -> Self {
        Self {
            n_splits: 1000,
            test_size: 0.2,
            seed: 0,
        }
    }
}

/// Row indices of one partition.
pub type Split = (Vec<usize>, Vec<usize>);

impl ShuffleSplit {
    pub fn validate(&self) -> Result<()> {
        if self.n_splits == 0 {
            return Err(Error::InvalidParameter {
                name: "n_splits",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(Error::InvalidParameter {
                name: "test_size",
                reason: format!("must lie strictly between 0 and 1, got {}", self.test_size),
            });
        }
        Ok(())
    }

    /// Sizes of the train and test sides for `n` samples.
    pub fn sizes(&self, n: usize) -> (usize, usize) {
        let test = ((self.test_size * n as f64).ceil() as usize).min(n);
        (n - test, test)
    }

    pub fn splits(&self, n: usize) -> Result<Vec<Split>> {
        self.validate()?;
        let (train_size, test_size) = self.sizes(n);
        if train_size == 0 || test_size == 0 {
            return Err(Error::InsufficientSamples {
                stage: "shuffle split",
                needed: 2,
                found: n,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut indices: Vec<usize> = (0..n).collect();
        let splits = (0..self.n_splits)
            .map(|_| {
                indices.shuffle(&mut rng);
                let test = indices[..test_size].to_vec();
                let train = indices[test_size..].to_vec();
                (train, test)
            })
            .collect();
        Ok(splits)
    }
}

/// Accuracy of a freshly trained classifier on every split.
///
/// With `standardize`, a scaler is fitted on each training side and applied to
/// both sides of that split.
pub fn cross_val_score(
    data: &Array2<f64>,
    targets: &[usize],
    params: &SvcParams,
    split: &ShuffleSplit,
    standardize: bool,
) -> Result<Vec<f64>> {
    if data.nrows() != targets.len() {
        return Err(Error::InvalidParameter {
            name: "targets",
            reason: format!("{} targets for {} rows", targets.len(), data.nrows()),
        });
    }

    let splits = split.splits(data.nrows())?;
    let mut scores = Vec::with_capacity(splits.len());
    for (index, (train, test)) in splits.iter().enumerate() {
        let mut train_data = data.select(Axis(0), train);
        let mut test_data = data.select(Axis(0), test);
        if standardize {
            let (scaler, scaled) = StandardScaler::fit_transform(&train_data);
            train_data = scaled;
            test_data = scaler.transform(&test_data);
        }
        let train_targets: Vec<usize> = train.iter().map(|&i| targets[i]).collect();
        let test_targets: Vec<usize> = test.iter().map(|&i| targets[i]).collect();

        let model = SupportVectorClassifier::fit(&train_data, &train_targets, params)?;
        let score = model.score(&test_data, &test_targets);
        debug!(split = index, score, support = model.n_support(), "cross-validation split");
        scores.push(score);
    }
    Ok(scores)
}

/// Mean of a set of scores and its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub mean: f64,
    /// `sqrt(var(scores) / n)` with the population variance.
    pub standard_error: f64,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[f64]) -> Result<Self> {
        if scores.is_empty() {
            return Err(Error::InsufficientSamples {
                stage: "score summary",
                needed: 1,
                found: 0,
            });
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
        Ok(Self {
            mean,
            standard_error: (variance / n).sqrt(),
        })
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mean accuracy {:.3} ± {:.4}", self.mean, self.standard_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_side_is_rounded_up() {
        let split = ShuffleSplit::default();
        assert_eq!(split.sizes(10), (8, 2));
        assert_eq!(split.sizes(11), (8, 3));
        assert_eq!(split.sizes(3), (2, 1));
    }

    #[test]
    fn every_split_partitions_all_rows() {
        let split = ShuffleSplit { n_splits: 20, seed: 3, ..ShuffleSplit::default() };
        let splits = split.splits(9).unwrap();
        assert_eq!(splits.len(), 20);
        for (train, test) in &splits {
            assert_eq!(train.len(), 7);
            assert_eq!(test.len(), 2);
            let mut all: Vec<usize> = train.iter().chain(test).copied().collect();
            all.sort_unstable();
            assert_eq!(all, (0..9).collect::<Vec<_>>());
        }
    }

    #[test]
    fn splits_are_reproducible() {
        let split = ShuffleSplit { n_splits: 5, seed: 11, ..ShuffleSplit::default() };
        assert_eq!(split.splits(12).unwrap(), split.splits(12).unwrap());
    }

    #[test]
    fn a_single_sample_cannot_be_split() {
        let err = ShuffleSplit::default().splits(1).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { .. }));
    }

    #[test]
    fn test_size_must_be_a_fraction() {
        let split = ShuffleSplit { test_size: 1.0, ..ShuffleSplit::default() };
        assert!(split.validate().is_err());
    }

    #[test]
    fn separable_data_scores_perfectly() {
        let data = array![[0.0], [0.5], [1.0], [1.5], [9.0], [9.5], [10.0], [10.5]];
        let targets = [0, 0, 0, 0, 1, 1, 1, 1];
        let split = ShuffleSplit { n_splits: 25, seed: 5, ..ShuffleSplit::default() };
        for standardize in [false, true] {
            let scores =
                cross_val_score(&data, &targets, &SvcParams::default(), &split, standardize).unwrap();
            assert_eq!(scores.len(), 25);
            assert!(scores.iter().all(|&s| s == 1.0), "{scores:?}");
        }
    }

    #[test]
    fn summary_uses_population_variance() {
        let summary = ScoreSummary::from_scores(&[0.5, 1.0]).unwrap();
        assert_eq!(summary.mean, 0.75);
        // var = 0.0625, / 2 -> sqrt(0.03125)
        assert!((summary.standard_error - 0.03125f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.to_string(), "Mean accuracy 0.750 ± 0.1768");
    }
}
