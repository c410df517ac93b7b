use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PvError, Result};

/// Straight line `y = slope * x + intercept`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn predict_all(&self, x: &Array1<f64>) -> Array1<f64> {
        x.mapv(|v| self.predict(v))
    }
}

impl std::fmt::Display for LinearFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4} * x + {:.4}", self.slope, self.intercept)
    }
}

/// Ordinary least squares of `y` against `x`.
pub fn least_squares(x: &Array1<f64>, y: &Array1<f64>) -> Result<LinearFit> {
    weighted_least_squares(x, y, &Array1::ones(x.len()))
}

/// Weighted least squares minimizing `sum w * (y - slope*x - intercept)^2`.
///
/// When every x is identical the slope is 0 and the intercept is the
/// weighted mean of y.
pub fn weighted_least_squares(
    x: &Array1<f64>,
    y: &Array1<f64>,
    w: &Array1<f64>,
) -> Result<LinearFit> {
    if x.len() != y.len() || x.len() != w.len() {
        return Err(PvError::LengthMismatch {
            column: "fit input".into(),
            expected: x.len(),
            actual: y.len().min(w.len()),
        });
    }
    let w_sum = w.sum();
    if x.is_empty() || w_sum <= 0.0 {
        return Err(PvError::EmptySelection("no points to fit".into()));
    }

    let x_mean = (w * x).sum() / w_sum;
    let y_mean = (w * y).sum() / w_sum;
    let dx = x - x_mean;
    let dy = y - y_mean;
    let sxx = (w * &dx * &dx).sum();
    let sxy = (w * &dx * &dy).sum();

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    Ok(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}
