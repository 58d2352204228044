//! Centered first and second moments of a paired return sample.

use crate::returns::ReturnSeries;
use ndarray::Array1;

/// Means and centered cross-products of `x` (benchmark) and `y` (instrument).
///
/// All estimators and diagnostics derive from the same sums, which keeps the
/// covariance beta and the OLS slope numerically identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Moments {
    pub(crate) n: usize,
    pub(crate) mean_x: f64,
    pub(crate) mean_y: f64,
    /// Σ (x - x̄)²
    pub(crate) sxx: f64,
    /// Σ (y - ȳ)²
    pub(crate) syy: f64,
    /// Σ (x - x̄)(y - ȳ)
    pub(crate) sxy: f64,
}

impl Moments {
    pub(crate) fn from_returns(returns: &ReturnSeries) -> Self {
        Self::compute(returns.benchmark(), returns.instrument())
    }

    pub(crate) fn compute(x: &Array1<f64>, y: &Array1<f64>) -> Self {
        let n = x.len();
        let mean_x = x.mean().unwrap_or(0.0);
        let mean_y = y.mean().unwrap_or(0.0);

        let dx = x - mean_x;
        let dy = y - mean_y;

        Self {
            n,
            mean_x,
            mean_y,
            sxx: dx.dot(&dx),
            syy: dy.dot(&dy),
            sxy: dx.dot(&dy),
        }
    }

    /// Sample covariance (n − 1 denominator).
    pub(crate) fn covariance(&self) -> f64 {
        self.sxy / self.dof()
    }

    /// Sample variance of the benchmark (n − 1 denominator).
    pub(crate) fn variance_x(&self) -> f64 {
        self.sxx / self.dof()
    }

    /// Sample variance of the instrument (n − 1 denominator).
    pub(crate) fn variance_y(&self) -> f64 {
        self.syy / self.dof()
    }

    /// Whether every sum is finite. Overflow on extreme inputs makes them infinite.
    pub(crate) fn is_finite(&self) -> bool {
        [self.mean_x, self.mean_y, self.sxx, self.syy, self.sxy]
            .iter()
            .all(|v| v.is_finite())
    }

    fn dof(&self) -> f64 {
        (self.n.saturating_sub(1)).max(1) as f64
    }
}
