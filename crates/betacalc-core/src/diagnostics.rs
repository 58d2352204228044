//! Regression diagnostics for the single-regressor OLS fit
//! `instrument = α + β · benchmark + ε`.
//!
//! The p-value and standard error assume i.i.d. normal residuals. Daily
//! returns are fat-tailed and heteroskedastic, so treat them as approximate.

use crate::config::DEFAULT_VARIANCE_FLOOR;
use crate::error::{CoreError, Result};
use crate::moments::Moments;
use crate::returns::ReturnSeries;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Goodness-of-fit and inference statistics for the OLS slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionDiagnostics {
    /// Fitted slope (beta).
    pub slope: f64,
    /// Fitted intercept (alpha), in return units per period.
    pub alpha: f64,
    /// Coefficient of determination, 1 − SSres / SStot, in [0, 1].
    pub r_squared: f64,
    /// Pearson correlation between instrument and benchmark returns.
    pub correlation: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    /// t-statistic of the slope under H0: β = 0.
    pub t_statistic: f64,
    /// Two-sided p-value of the slope under H0: β = 0.
    pub p_value: f64,
    /// Residual degrees of freedom (n − 2).
    pub degrees_of_freedom: usize,
}

impl RegressionDiagnostics {
    /// Fit the regression and compute its diagnostics.
    ///
    /// # Errors
    /// - [`CoreError::InsufficientData`] for fewer than two observations
    /// - [`CoreError::DegenerateVariance`] if the benchmark is flat
    /// - [`CoreError::RegressionUnderdetermined`] for n ≤ 2
    /// - [`CoreError::ConstantInstrument`] if the instrument is flat
    pub fn compute(returns: &ReturnSeries) -> Result<Self> {
        Self::compute_with_floor(returns, DEFAULT_VARIANCE_FLOOR)
    }

    /// Like [`Self::compute`] with an explicit zero-variance threshold.
    ///
    /// # Errors
    /// See [`Self::compute`].
    pub fn compute_with_floor(returns: &ReturnSeries, variance_floor: f64) -> Result<Self> {
        returns.ensure_sufficient()?;
        let m = Moments::from_returns(returns);

        if m.variance_x() <= variance_floor {
            return Err(CoreError::DegenerateVariance {
                symbol: returns.benchmark_symbol().to_string(),
            });
        }
        if m.n <= 2 {
            return Err(CoreError::RegressionUnderdetermined { sample_size: m.n });
        }
        if m.variance_y() <= variance_floor {
            return Err(CoreError::ConstantInstrument { sample_size: m.n });
        }

        let slope = m.sxy / m.sxx;
        let alpha = m.mean_y - slope * m.mean_x;

        let residuals = returns.instrument() - &(returns.benchmark() * slope) - alpha;
        let ss_res = residuals.dot(&residuals);

        let r_squared = (1.0 - ss_res / m.syy).clamp(0.0, 1.0);
        let correlation = (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0);

        let degrees_of_freedom = m.n - 2;
        let std_err = (ss_res / degrees_of_freedom as f64 / m.sxx).sqrt();

        let (t_statistic, p_value) = if std_err > 0.0 {
            let t = slope / std_err;
            (t, two_sided_p_value(t, degrees_of_freedom, m.n)?)
        } else {
            // Exact fit: the slope is known without error.
            (f64::INFINITY.copysign(slope), 0.0)
        };

        Ok(Self {
            slope,
            alpha,
            r_squared,
            correlation,
            std_err,
            t_statistic,
            p_value,
            degrees_of_freedom,
        })
    }

    /// Whether the slope is significant at `level` (e.g. 0.05).
    pub fn is_significant(&self, level: f64) -> bool {
        self.p_value < level
    }
}

fn two_sided_p_value(t: f64, dof: usize, sample_size: usize) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, dof as f64)
        .map_err(|_| CoreError::RegressionUnderdetermined { sample_size })?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn series(inst: Vec<f64>, bench: Vec<f64>) -> ReturnSeries {
        ReturnSeries::from_returns("AAA", "IDX", inst, bench).unwrap()
    }

    #[test]
    fn test_reference_fit() {
        // Returns of prices [100, 102, 101, 105] against [100, 101, 100, 103].
        let returns = series(
            vec![0.02, 101.0 / 102.0 - 1.0, 105.0 / 101.0 - 1.0],
            vec![0.01, 100.0 / 101.0 - 1.0, 0.03],
        );
        let d = RegressionDiagnostics::compute(&returns).unwrap();

        assert_relative_eq!(d.slope, 1.238_048_072_513_298, max_relative = 1e-9);
        assert_relative_eq!(d.alpha, 0.004_178_672_544_977_58, max_relative = 1e-8);
        assert_relative_eq!(d.r_squared, 0.985_653_895_455_118_5, max_relative = 1e-9);
        assert_relative_eq!(d.std_err, 0.149_362_743_692_258_05, max_relative = 1e-8);
        assert_relative_eq!(d.t_statistic, 8.288_868_039_704_269, max_relative = 1e-8);
        // One degree of freedom: p = 1 − (2/π)·atan(|t|).
        assert_relative_eq!(d.p_value, 0.076_434_781_811_320_02, max_relative = 1e-6);
        assert_eq!(d.degrees_of_freedom, 1);
    }

    #[test]
    fn test_r_squared_is_squared_correlation() {
        let returns = series(
            vec![0.011, -0.004, 0.02, -0.013, 0.006, 0.0, 0.009],
            vec![0.007, -0.001, 0.012, -0.01, 0.001, 0.003, 0.004],
        );
        let d = RegressionDiagnostics::compute(&returns).unwrap();

        assert!((0.0..=1.0).contains(&d.r_squared));
        assert_relative_eq!(d.r_squared, d.correlation.powi(2), max_relative = 1e-9);
    }

    #[test]
    fn test_perfect_fit() {
        let bench = vec![0.01, -0.02, 0.015, 0.003];
        let d = RegressionDiagnostics::compute(&series(bench.clone(), bench)).unwrap();

        assert_relative_eq!(d.slope, 1.0, max_relative = 1e-12);
        assert_relative_eq!(d.r_squared, 1.0, max_relative = 1e-12);
        assert!(d.p_value < 1e-6);
    }

    #[rstest]
    #[case(vec![0.01, 0.02], vec![0.03, -0.01])]
    #[case(vec![0.05, -0.02], vec![0.01, 0.02])]
    fn test_two_observations_underdetermined(#[case] inst: Vec<f64>, #[case] bench: Vec<f64>) {
        let err = RegressionDiagnostics::compute(&series(inst, bench)).unwrap_err();
        assert_eq!(err, CoreError::RegressionUnderdetermined { sample_size: 2 });
    }

    #[test]
    fn test_flat_benchmark_is_degenerate() {
        let err = RegressionDiagnostics::compute(&series(vec![0.01, 0.02, 0.03], vec![0.0; 3]))
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::DegenerateVariance {
                symbol: "IDX".to_string()
            }
        );
    }

    #[test]
    fn test_flat_instrument_has_undefined_fit() {
        let err = RegressionDiagnostics::compute(&series(vec![0.0; 3], vec![0.01, -0.02, 0.03]))
            .unwrap_err();
        assert_eq!(err, CoreError::ConstantInstrument { sample_size: 3 });
    }

    #[test]
    fn test_uncorrelated_slope_not_significant() {
        let returns = series(
            vec![0.01, -0.01, 0.01, -0.01, 0.01, -0.01],
            vec![0.01, 0.01, -0.01, -0.01, 0.02, 0.02],
        );
        let d = RegressionDiagnostics::compute(&returns).unwrap();
        assert!(!d.is_significant(0.05));
    }
}
