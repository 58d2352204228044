//! Beta estimators.
//!
//! Beta measures the sensitivity of an instrument's returns to a benchmark:
//!
//! - Beta > 1: amplifies market moves
//! - Beta = 1: moves with the market
//! - 0 < Beta < 1: dampens market moves
//! - Beta < 0: tends to move against the market
//!
//! Two interchangeable strategies are provided. [`CovarianceBeta`] computes
//! `Cov(R_i, R_m) / Var(R_m)` with sample (n − 1) moments. [`RegressionBeta`]
//! fits `R_i = α + β · R_m + ε` by OLS and also reports fit diagnostics. For a
//! single regressor both give the same β.

use crate::config::EstimatorConfig;
use crate::diagnostics::RegressionDiagnostics;
use crate::error::{CoreError, Result};
use crate::moments::Moments;
use crate::returns::ReturnSeries;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative tolerance within which the two methods must agree.
pub const METHOD_AGREEMENT_TOLERANCE: f64 = 1e-9;

/// Estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationMethod {
    /// Sample covariance over sample variance.
    #[default]
    Covariance,
    /// Ordinary least-squares slope with diagnostics.
    Regression,
}

impl EstimationMethod {
    /// Lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Covariance => "covariance",
            Self::Regression => "regression",
        }
    }

    /// Build the estimator for this method.
    pub fn estimator(self, config: &EstimatorConfig) -> Box<dyn BetaEstimator> {
        match self {
            Self::Covariance => Box::new(CovarianceBeta::with_config(config.clone())),
            Self::Regression => Box::new(RegressionBeta::with_config(config.clone())),
        }
    }
}

impl fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimationMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "covariance" | "cov" => Ok(Self::Covariance),
            "regression" | "ols" => Ok(Self::Regression),
            _ => Err(CoreError::UnknownMethod(s.to_string())),
        }
    }
}

/// Output of a single estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaEstimate {
    /// Estimated beta.
    pub beta: f64,
    /// Method that produced it.
    pub method: EstimationMethod,
    /// Number of paired observations used.
    pub sample_size: usize,
    /// Regression diagnostics, when the method provides them and the sample
    /// supports them.
    pub diagnostics: Option<RegressionDiagnostics>,
}

/// Trait for beta estimators.
pub trait BetaEstimator: fmt::Debug {
    /// Method implemented by this estimator.
    fn method(&self) -> EstimationMethod;

    /// Estimate beta from paired returns.
    ///
    /// # Errors
    /// Returns [`CoreError::InsufficientData`] below two observations and
    /// [`CoreError::DegenerateVariance`] for a flat benchmark.
    fn estimate(&self, returns: &ReturnSeries) -> Result<BetaEstimate>;
}

/// Covariance-over-variance beta.
#[derive(Debug, Clone, Default)]
pub struct CovarianceBeta {
    config: EstimatorConfig,
}

impl CovarianceBeta {
    /// Create with the given configuration.
    pub const fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}

impl BetaEstimator for CovarianceBeta {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::Covariance
    }

    fn estimate(&self, returns: &ReturnSeries) -> Result<BetaEstimate> {
        returns.ensure_sufficient()?;
        warn_if_small(returns, &self.config);

        let m = Moments::from_returns(returns);
        check_moments(&m, returns, &self.config)?;

        Ok(BetaEstimate {
            beta: m.covariance() / m.variance_x(),
            method: EstimationMethod::Covariance,
            sample_size: m.n,
            diagnostics: None,
        })
    }
}

/// OLS slope beta with regression diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RegressionBeta {
    config: EstimatorConfig,
}

impl RegressionBeta {
    /// Create with the given configuration.
    pub const fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}

impl BetaEstimator for RegressionBeta {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::Regression
    }

    fn estimate(&self, returns: &ReturnSeries) -> Result<BetaEstimate> {
        returns.ensure_sufficient()?;
        warn_if_small(returns, &self.config);

        let m = Moments::from_returns(returns);
        check_moments(&m, returns, &self.config)?;
        let slope = m.sxy / m.sxx;

        let diagnostics =
            match RegressionDiagnostics::compute_with_floor(returns, self.config.variance_floor) {
                Ok(d) => Some(d),
                Err(
                    e @ (CoreError::RegressionUnderdetermined { .. }
                    | CoreError::ConstantInstrument { .. }),
                ) => {
                    tracing::debug!(
                        instrument = returns.instrument_symbol(),
                        error = %e,
                        "regression diagnostics unavailable"
                    );
                    None
                }
                Err(e) => return Err(e),
            };

        Ok(BetaEstimate {
            beta: slope,
            method: EstimationMethod::Regression,
            sample_size: m.n,
            diagnostics,
        })
    }
}

/// Whether two beta estimates agree within [`METHOD_AGREEMENT_TOLERANCE`].
pub fn estimates_agree(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(f64::MIN_POSITIVE);
    (a - b).abs() <= METHOD_AGREEMENT_TOLERANCE * scale
}

/// Reject sums that overflowed and a benchmark variance at or below the floor.
fn check_moments(m: &Moments, returns: &ReturnSeries, config: &EstimatorConfig) -> Result<()> {
    if !m.is_finite() {
        return Err(CoreError::InvalidSeries {
            symbol: returns.instrument_symbol().to_string(),
            reason: "return moments are not finite".to_string(),
        });
    }
    if m.variance_x() <= config.variance_floor {
        return Err(CoreError::DegenerateVariance {
            symbol: returns.benchmark_symbol().to_string(),
        });
    }
    Ok(())
}

fn warn_if_small(returns: &ReturnSeries, config: &EstimatorConfig) {
    if returns.len() < config.min_recommended_observations {
        tracing::warn!(
            instrument = returns.instrument_symbol(),
            benchmark = returns.benchmark_symbol(),
            observations = returns.len(),
            recommended = config.min_recommended_observations,
            "small sample, beta estimate may be unstable"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn sample() -> ReturnSeries {
        ReturnSeries::from_returns(
            "AAA",
            "IDX",
            vec![0.012, -0.007, 0.021, -0.015, 0.004, 0.009, -0.002, 0.016],
            vec![0.008, -0.004, 0.011, -0.012, 0.002, 0.006, 0.001, 0.010],
        )
        .unwrap()
    }

    #[rstest]
    #[case("covariance", EstimationMethod::Covariance)]
    #[case("COV", EstimationMethod::Covariance)]
    #[case("regression", EstimationMethod::Regression)]
    #[case(" ols ", EstimationMethod::Regression)]
    fn test_method_from_str(#[case] input: &str, #[case] expected: EstimationMethod) {
        assert_eq!(input.parse::<EstimationMethod>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_method() {
        assert!(matches!(
            "kalman".parse::<EstimationMethod>(),
            Err(CoreError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_methods_agree() {
        let returns = sample();
        let config = EstimatorConfig::default();
        let cov = CovarianceBeta::with_config(config.clone())
            .estimate(&returns)
            .unwrap();
        let ols = RegressionBeta::with_config(config).estimate(&returns).unwrap();

        assert!(estimates_agree(cov.beta, ols.beta));
        assert_relative_eq!(cov.beta, ols.beta, max_relative = METHOD_AGREEMENT_TOLERANCE);
        assert!(cov.diagnostics.is_none());
        assert!(ols.diagnostics.is_some());
    }

    #[test]
    fn test_method_dispatch() {
        let config = EstimatorConfig::default();
        for method in [EstimationMethod::Covariance, EstimationMethod::Regression] {
            let estimator = method.estimator(&config);
            assert_eq!(estimator.method(), method);
            assert_eq!(estimator.estimate(&sample()).unwrap().method, method);
        }
    }

    #[rstest]
    #[case(EstimationMethod::Covariance)]
    #[case(EstimationMethod::Regression)]
    fn test_flat_benchmark_rejected(#[case] method: EstimationMethod) {
        let returns =
            ReturnSeries::from_returns("AAA", "IDX", vec![0.01, 0.02, -0.01], vec![0.0; 3])
                .unwrap();
        let err = method
            .estimator(&EstimatorConfig::default())
            .estimate(&returns)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::DegenerateVariance {
                symbol: "IDX".to_string()
            }
        );
    }

    #[rstest]
    #[case(EstimationMethod::Covariance)]
    #[case(EstimationMethod::Regression)]
    fn test_overflowing_moments_rejected(#[case] method: EstimationMethod) {
        let returns = ReturnSeries::from_returns(
            "AAA",
            "IDX",
            vec![1e200, -1e200, 1e200],
            vec![1e200, -1e200, 1e200],
        )
        .unwrap();
        let err = method
            .estimator(&EstimatorConfig::default())
            .estimate(&returns)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSeries { ref symbol, .. } if symbol == "AAA"));
    }

    #[test]
    fn test_regression_two_points_keeps_slope() {
        let returns =
            ReturnSeries::from_returns("AAA", "IDX", vec![0.02, -0.02], vec![0.01, -0.01])
                .unwrap();
        let estimate = RegressionBeta::default().estimate(&returns).unwrap();

        assert_relative_eq!(estimate.beta, 2.0, max_relative = 1e-12);
        assert!(estimate.diagnostics.is_none());
    }

    #[test]
    fn test_method_serde() {
        let json = serde_json::to_string(&EstimationMethod::Regression).unwrap();
        assert_eq!(json, "\"regression\"");
        assert_eq!(EstimationMethod::Covariance.to_string(), "covariance");
    }
}
