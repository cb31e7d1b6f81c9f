//! Feature scaling (z-score standardisation)

use crate::error::{Result, StressError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-column parameters of a fitted scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean
    scale: f64,  // population std, 1.0 for constant columns
}

/// Standard scaler: `(x - mean) / std` per column
///
/// Constant columns keep `scale = 1.0`, so they come out all-zero after
/// centering instead of dividing by zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit column means and standard deviations
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(StressError::EmptyDataset);
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|column| {
                let mean = column.mean().unwrap_or(0.0);
                let std = column.std(0.0);
                ScalerParams {
                    center: mean,
                    scale: if std > f64::EPSILON && std.is_finite() { std } else { 1.0 },
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Scale a matrix with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for (mut column, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            column.mapv_inplace(|v| (v - p.center) / p.scale);
        }
        Ok(out)
    }

    /// Scale a single feature vector
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(&self.params)
            .map(|(&v, p)| (v - p.center) / p.scale)
            .collect())
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for (mut column, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            column.mapv_inplace(|v| v * p.scale + p.center);
        }
        Ok(out)
    }

    pub fn n_features(&self) -> usize {
        self.params.len()
    }

    pub fn means(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.center).collect()
    }

    pub fn scales(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.scale).collect()
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if !self.is_fitted {
            return Err(StressError::ModelNotFitted);
        }
        if width != self.params.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} features", self.params.len()),
                actual: format!("{} features", width),
            });
        }
        Ok(())
    }
}
