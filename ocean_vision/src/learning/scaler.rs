use ndarray::{Array1, Array2, Axis};

/// Per-column standardisation to zero mean and unit variance.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learns column means and population standard deviations. Columns with no
    /// spread keep a scale of 1 so they pass through centred but unscaled.
    pub fn fit(data: &Array2<f64>) -> Self {
        let columns = data.ncols();
        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(columns));
        let scale = if data.nrows() == 0 {
            Array1::ones(columns)
        } else {
            data.std_axis(Axis(0), 0.0)
                .mapv(|s| if s.abs() < f64::EPSILON { 1.0 } else { s })
        };
        Self { mean, scale }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.mean) / &self.scale
    }

    pub fn fit_transform(data: &Array2<f64>) -> (Self, Array2<f64>) {
        let scaler = Self::fit(data);
        let transformed = scaler.transform(data);
        (scaler, transformed)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn centres_and_scales_each_column() {
        let data = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&data);

        assert_eq!(scaler.mean(), &array![3.0, 10.0]);
        let sd = (8.0f64 / 3.0).sqrt();
        assert!((scaler.scale()[0] - sd).abs() < 1e-12);
        // The constant column keeps scale 1.
        assert_eq!(scaler.scale()[1], 1.0);

        assert!((scaled[[0, 0]] + 2.0 / sd).abs() < 1e-12);
        assert!(scaled[[1, 0]].abs() < 1e-12);
        assert!(scaled.column(1).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn transform_uses_the_fitted_statistics() {
        let train = array![[0.0], [2.0]];
        let scaler = StandardScaler::fit(&train);
        let scaled = scaler.transform(&array![[4.0]]);
        assert!((scaled[[0, 0]] - 3.0).abs() < 1e-12);
    }
}
