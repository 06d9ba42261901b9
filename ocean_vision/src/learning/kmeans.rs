use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Lloyd's k-means with k-means++ seeding and several restarts.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    /// Independent restarts; the lowest-inertia run is kept.
    pub n_init: usize,
    pub max_iter: usize,
    /// Relative tolerance on the squared centre shift, scaled by the mean
    /// per-column variance of the data.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_clusters: 2,
            n_init: 50,
            max_iter: 300,
            tol: 1e-4,
            seed: 0,
        }
    }
}

/// The outcome of the best k-means run.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster index of every row.
    pub labels: Vec<usize>,
    /// One row per cluster.
    pub centers: Array2<f64>,
    /// Sum of squared distances of every row to its centre.
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeansFit {
    /// Index of the centre closest to `point`.
    pub fn predict(&self, point: ArrayView1<f64>) -> usize {
        nearest(&self.centers, point).0
    }
}

impl KMeans {
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "n_clusters",
                reason: "must be at least 1".into(),
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn fit(&self, data: &Array2<f64>) -> Result<KMeansFit> {
        self.validate()?;
        if data.nrows() < self.n_clusters {
            return Err(Error::InsufficientSamples {
                stage: "k-means clustering",
                needed: self.n_clusters,
                found: data.nrows(),
            });
        }

        let tolerance = self.tol * data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;

        for run in 0..self.n_init {
            let initial = plus_plus_centers(data, self.n_clusters, &mut rng);
            let fit = self.lloyd(data, initial, tolerance);
            debug!(run, inertia = fit.inertia, iterations = fit.iterations, "k-means run");
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or_else(|| Error::InvalidParameter {
            name: "n_init",
            reason: "must be at least 1".into(),
        })
    }

    fn lloyd(&self, data: &Array2<f64>, mut centers: Array2<f64>, tolerance: f64) -> KMeansFit {
        let mut labels = assign(data, &centers);
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let updated = update_centers(data, &labels, &centers);
            let shift: f64 = (&updated - &centers).mapv(|d| d * d).sum();
            centers = updated;

            let relabelled = assign(data, &centers);
            let unchanged = relabelled == labels;
            labels = relabelled;
            if unchanged || shift <= tolerance {
                break;
            }
        }

        let inertia = data
            .outer_iter()
            .zip(&labels)
            .map(|(row, &label)| squared_distance(row, centers.row(label)))
            .sum();

        KMeansFit {
            labels,
            centers,
            inertia,
            iterations,
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Closest centre and its squared distance; the lowest index wins ties.
fn nearest(centers: &Array2<f64>, point: ArrayView1<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (index, center) in centers.outer_iter().enumerate() {
        let distance = squared_distance(point, center);
        if distance < best.1 {
            best = (index, distance);
        }
    }
    best
}

fn assign(data: &Array2<f64>, centers: &Array2<f64>) -> Vec<usize> {
    data.outer_iter().map(|row| nearest(centers, row).0).collect()
}

/// Recomputes each centre as the mean of its members. An empty cluster is moved
/// onto the row that is currently worst served by its own centre.
fn update_centers(data: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let k = previous.nrows();
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; k];
    for (row, &label) in data.outer_iter().zip(labels) {
        let mut sum = sums.row_mut(label);
        sum += &row;
        counts[label] += 1;
    }

    let mut taken: Vec<usize> = Vec::new();
    for cluster in 0..k {
        if counts[cluster] > 0 {
            let mut center = sums.row_mut(cluster);
            center /= counts[cluster] as f64;
            continue;
        }
        let far = data
            .outer_iter()
            .zip(labels)
            .enumerate()
            .filter(|(index, _)| !taken.contains(index))
            .map(|(index, (row, &label))| (index, squared_distance(row, previous.row(label))))
            .fold((0, f64::NEG_INFINITY), |best, item| if item.1 > best.1 { item } else { best });
        taken.push(far.0);
        sums.row_mut(cluster).assign(&data.row(far.0));
    }
    sums
}

/// k-means++ seeding with `2 + floor(ln k)` greedy trials per centre.
fn plus_plus_centers(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let trials = 2 + (k as f64).ln().floor() as usize;
    let mut centers = Array2::<f64>::zeros((k, data.ncols()));

    let first = rng.random_range(0..n);
    centers.row_mut(0).assign(&data.row(first));
    let mut closest: Array1<f64> = data
        .outer_iter()
        .map(|row| squared_distance(row, data.row(first)))
        .collect();
    let mut potential = closest.sum();

    for c in 1..k {
        let mut best: Option<(usize, f64, Array1<f64>)> = None;
        for _ in 0..trials {
            let target = rng.random::<f64>() * potential;
            let candidate = pick_by_weight(&closest, target);
            let distances: Array1<f64> = data
                .outer_iter()
                .zip(closest.iter())
                .map(|(row, &d)| d.min(squared_distance(row, data.row(candidate))))
                .collect();
            let candidate_potential = distances.sum();
            if best.as_ref().is_none_or(|b| candidate_potential < b.1) {
                best = Some((candidate, candidate_potential, distances));
            }
        }
        if let Some((candidate, candidate_potential, distances)) = best {
            centers.row_mut(c).assign(&data.row(candidate));
            closest = distances;
            potential = candidate_potential;
        }
    }
    centers
}

/// First index whose cumulative weight reaches `target`.
fn pick_by_weight(weights: &Array1<f64>, target: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative >= target && w > 0.0 {
            return index;
        }
    }
    weights.len() - 1
}
