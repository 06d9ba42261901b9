use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, Axis};

/// Floor for a non-positive curvature in the two-variable sub-problem.
const TAU: f64 = 1e-12;

/// Width of the RBF kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / (n_features * var(X))` over every entry of the training matrix.
    Scale,
    Value(f64),
}

#[derive(Debug, Clone)]
pub struct SvcParams {
    /// Penalty on margin violations.
    pub c: f64,
    pub gamma: Gamma,
    /// Stopping tolerance on the maximal KKT violation.
    pub tolerance: f64,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
        }
    }
}

impl SvcParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(Error::InvalidParameter {
                name: "c",
                reason: format!("must be positive, got {}", self.c),
            });
        }
        if let Gamma::Value(g) = self.gamma {
            if !(g > 0.0) {
                return Err(Error::InvalidParameter {
                    name: "gamma",
                    reason: format!("must be positive, got {g}"),
                });
            }
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidParameter {
                name: "tolerance",
                reason: format!("must be positive, got {}", self.tolerance),
            });
        }
        Ok(())
    }
}

/// A trained binary C-SVC with a radial basis function kernel.
#[derive(Debug, Clone)]
pub struct SupportVectorClassifier {
    support_vectors: Array2<f64>,
    /// `alpha_i * y_i` for every support vector.
    coefficients: Vec<f64>,
    rho: f64,
    gamma: f64,
    /// Set when the training targets held a single class.
    constant: Option<usize>,
}

impl SupportVectorClassifier {
    /// Trains on `data` (one row per sample) with targets in `{0, 1}`.
    pub fn fit(data: &Array2<f64>, targets: &[usize], params: &SvcParams) -> Result<Self> {
        params.validate()?;
        if data.nrows() != targets.len() {
            return Err(Error::InvalidParameter {
                name: "targets",
                reason: format!("{} targets for {} rows", targets.len(), data.nrows()),
            });
        }
        if let Some(&bad) = targets.iter().find(|&&t| t > 1) {
            return Err(Error::InvalidParameter {
                name: "targets",
                reason: format!("expected binary targets, found {bad}"),
            });
        }
        if data.nrows() == 0 {
            return Err(Error::InsufficientSamples {
                stage: "support vector training",
                needed: 1,
                found: 0,
            });
        }

        let gamma = match params.gamma {
            Gamma::Value(g) => g,
            Gamma::Scale => {
                let variance = data.var(0.0);
                if variance > 0.0 {
                    1.0 / (data.ncols() as f64 * variance)
                } else {
                    1.0
                }
            }
        };

        let first = targets[0];
        if targets.iter().all(|&t| t == first) {
            return Ok(Self {
                support_vectors: Array2::zeros((0, data.ncols())),
                coefficients: Vec::new(),
                rho: 0.0,
                gamma,
                constant: Some(first),
            });
        }

        let y: Vec<f64> = targets.iter().map(|&t| if t == 1 { 1.0 } else { -1.0 }).collect();
        let kernel = kernel_matrix(data, gamma);
        let (alpha, rho) = solve(&kernel, &y, params.c, params.tolerance);

        let support: Vec<usize> = (0..alpha.len()).filter(|&i| alpha[i] > 0.0).collect();
        let coefficients = support.iter().map(|&i| alpha[i] * y[i]).collect();
        let support_vectors = data.select(Axis(0), &support);

        Ok(Self {
            support_vectors,
            coefficients,
            rho,
            gamma,
            constant: None,
        })
    }

    /// Signed distance-like score; positive means class 1.
    pub fn decision_function(&self, sample: ArrayView1<f64>) -> f64 {
        if let Some(class) = self.constant {
            return if class == 1 { 1.0 } else { -1.0 };
        }
        self.support_vectors
            .outer_iter()
            .zip(&self.coefficients)
            .map(|(sv, &coef)| coef * rbf(sv, sample, self.gamma))
            .sum::<f64>()
            - self.rho
    }

    pub fn predict(&self, sample: ArrayView1<f64>) -> usize {
        if self.decision_function(sample) > 0.0 { 1 } else { 0 }
    }

    pub fn predict_all(&self, data: &Array2<f64>) -> Vec<usize> {
        data.outer_iter().map(|row| self.predict(row)).collect()
    }

    /// Fraction of rows predicted correctly.
    pub fn score(&self, data: &Array2<f64>, targets: &[usize]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        let correct = self
            .predict_all(data)
            .iter()
            .zip(targets)
            .filter(|(p, t)| p == t)
            .count();
        correct as f64 / targets.len() as f64
    }

    pub fn n_support(&self) -> usize {
        self.coefficients.len()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

fn rbf(a: ArrayView1<f64>, b: ArrayView1<f64>, gamma: f64) -> f64 {
    let distance: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * distance).exp()
}

fn kernel_matrix(data: &Array2<f64>, gamma: f64) -> Array2<f64> {
    let n = data.nrows();
    let mut kernel = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let k = rbf(data.row(i), data.row(j), gamma);
            kernel[[i, j]] = k;
            kernel[[j, i]] = k;
        }
    }
    kernel
}

/// Sequential minimal optimisation of the C-SVC dual with second-order working
/// set selection. Returns the multipliers and the bias term `rho`.
fn solve(kernel: &Array2<f64>, y: &[f64], c: f64, eps: f64) -> (Vec<f64>, f64) {
    let n = y.len();
    let mut alpha = vec![0.0; n];
    // Gradient of 1/2 a'Qa - e'a with Q_ij = y_i y_j K_ij.
    let mut grad = vec![-1.0; n];
    let max_iter = (100 * n).max(10_000_000);

    for _ in 0..max_iter {
        let Some((i, j)) = select_working_set(kernel, y, &alpha, &grad, c, eps) else {
            break;
        };

        let (old_i, old_j) = (alpha[i], alpha[j]);
        let mut quad = kernel[[i, i]] + kernel[[j, j]] - 2.0 * kernel[[i, j]];
        if quad <= 0.0 {
            quad = TAU;
        }

        if y[i] != y[j] {
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (delta_i, delta_j) = (alpha[i] - old_i, alpha[j] - old_j);
        for k in 0..n {
            grad[k] += y[i] * y[k] * kernel[[i, k]] * delta_i + y[j] * y[k] * kernel[[j, k]] * delta_j;
        }
    }

    let rho = compute_rho(y, &alpha, &grad, c);
    (alpha, rho)
}

fn select_working_set(
    kernel: &Array2<f64>,
    y: &[f64],
    alpha: &[f64],
    grad: &[f64],
    c: f64,
    eps: f64,
) -> Option<(usize, usize)> {
    let n = y.len();
    let mut gmax = f64::NEG_INFINITY;
    let mut first = None;
    for t in 0..n {
        let candidate = if y[t] > 0.0 {
            (alpha[t] < c).then(|| -grad[t])
        } else {
            (alpha[t] > 0.0).then(|| grad[t])
        };
        if let Some(value) = candidate {
            if value >= gmax {
                gmax = value;
                first = Some(t);
            }
        }
    }
    let i = first?;

    let mut gmax2 = f64::NEG_INFINITY;
    let mut second = None;
    let mut best_objective = f64::INFINITY;
    for j in 0..n {
        let (violation, grad_diff) = if y[j] > 0.0 {
            if alpha[j] <= 0.0 {
                continue;
            }
            (grad[j], gmax + grad[j])
        } else {
            if alpha[j] >= c {
                continue;
            }
            (-grad[j], gmax - grad[j])
        };
        if violation >= gmax2 {
            gmax2 = violation;
        }
        if grad_diff > 0.0 {
            let quad = kernel[[i, i]] + kernel[[j, j]] - 2.0 * kernel[[i, j]];
            let objective = -(grad_diff * grad_diff) / if quad > 0.0 { quad } else { TAU };
            if objective <= best_objective {
                best_objective = objective;
                second = Some(j);
            }
        }
    }

    if gmax + gmax2 < eps {
        return None;
    }
    second.map(|j| (i, j))
}

fn compute_rho(y: &[f64], alpha: &[f64], grad: &[f64], c: f64) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free = 0usize;
    let mut free_sum = 0.0;

    for t in 0..y.len() {
        let yg = y[t] * grad[t];
        if alpha[t] >= c {
            if y[t] < 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if alpha[t] <= 0.0 {
            if y[t] > 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            free += 1;
            free_sum += yg;
        }
    }

    if free > 0 {
        free_sum / free as f64
    } else {
        (upper + lower) / 2.0
    }
}
