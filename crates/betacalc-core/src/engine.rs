//! End-to-end beta computation: prices in, [`BetaResult`] out.

use crate::config::EstimatorConfig;
use crate::error::Result;
use crate::estimator::{
    BetaEstimator, CovarianceBeta, EstimationMethod, RegressionBeta, estimates_agree,
};
use crate::moments::Moments;
use crate::returns::ReturnSeries;
use crate::series::{AlignedPricePanel, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaResult {
    /// Instrument symbol.
    pub instrument_symbol: String,
    /// Benchmark label.
    pub benchmark_symbol: String,
    /// Estimated beta.
    pub beta: f64,
    /// Paired return observations used.
    pub sample_size: usize,
    /// Estimation method.
    pub method: EstimationMethod,
    /// Coefficient of determination (regression only).
    pub r_squared: Option<f64>,
    /// Two-sided p-value of the slope (regression only).
    pub p_value: Option<f64>,
    /// Standard error of the slope (regression only).
    pub std_err: Option<f64>,
    /// Regression intercept per period (regression only).
    pub alpha: Option<f64>,
    /// Pearson correlation of returns (regression only).
    pub correlation: Option<f64>,
    /// t-statistic of the slope (regression only).
    pub t_statistic: Option<f64>,
    /// Date of the first return used.
    pub start_date: Option<NaiveDate>,
    /// Date of the last return used.
    pub end_date: Option<NaiveDate>,
    /// Rows removed because a return was undefined on either side.
    pub dropped_rows: usize,
}

/// Coarse reading of a beta value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetaProfile {
    /// β < 0
    Inverse,
    /// 0 ≤ β < 0.95
    Defensive,
    /// 0.95 ≤ β ≤ 1.05
    MarketLike,
    /// β > 1.05
    Aggressive,
}

impl BetaProfile {
    /// Classify a beta value.
    pub fn classify(beta: f64) -> Self {
        if beta < 0.0 {
            Self::Inverse
        } else if beta < 0.95 {
            Self::Defensive
        } else if beta <= 1.05 {
            Self::MarketLike
        } else {
            Self::Aggressive
        }
    }

    /// One-line description.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Inverse => "tends to move against the benchmark",
            Self::Defensive => "less volatile than the benchmark",
            Self::MarketLike => "moves with the benchmark",
            Self::Aggressive => "more volatile than the benchmark",
        }
    }
}

impl fmt::Display for BetaProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inverse => "Inverse",
            Self::Defensive => "Defensive",
            Self::MarketLike => "Market-like",
            Self::Aggressive => "Aggressive",
        };
        f.write_str(name)
    }
}

impl BetaResult {
    /// Profile of the estimated beta.
    pub fn profile(&self) -> BetaProfile {
        BetaProfile::classify(self.beta)
    }

    /// Whether the slope is significant at `level`. `None` without a p-value.
    pub fn is_significant(&self, level: f64) -> Option<bool> {
        self.p_value.map(|p| p < level)
    }
}

/// Compute beta of `instrument` against `benchmark` with default settings.
///
/// `benchmark_label` names the benchmark in the result and in errors.
///
/// # Errors
/// - [`CoreError::SymbolNotFound`](crate::CoreError::SymbolNotFound) if either series is empty
/// - [`CoreError::InsufficientData`](crate::CoreError::InsufficientData) below two paired returns
/// - [`CoreError::DegenerateVariance`](crate::CoreError::DegenerateVariance) for a flat benchmark
pub fn compute_beta(
    instrument: &PriceSeries,
    benchmark: &PriceSeries,
    method: EstimationMethod,
    benchmark_label: &str,
) -> Result<BetaResult> {
    compute_beta_with_config(
        instrument,
        benchmark,
        benchmark_label,
        &EstimatorConfig::with_method(method),
    )
}

/// Compute beta with an explicit configuration.
///
/// # Errors
/// See [`compute_beta`].
pub fn compute_beta_with_config(
    instrument: &PriceSeries,
    benchmark: &PriceSeries,
    benchmark_label: &str,
    config: &EstimatorConfig,
) -> Result<BetaResult> {
    let panel =
        AlignedPricePanel::align(instrument, benchmark)?.with_benchmark_label(benchmark_label);
    let returns = ReturnSeries::from_panel(&panel)?;
    estimate_returns(&returns, config)
}

/// Estimate beta from returns the caller already holds.
///
/// # Errors
/// See [`compute_beta`].
pub fn estimate_returns(returns: &ReturnSeries, config: &EstimatorConfig) -> Result<BetaResult> {
    let estimate = match config.method {
        EstimationMethod::Covariance => {
            CovarianceBeta::with_config(config.clone()).estimate(returns)?
        }
        EstimationMethod::Regression => {
            let estimate = RegressionBeta::with_config(config.clone()).estimate(returns)?;
            let m = Moments::from_returns(returns);
            let covariance_beta = m.covariance() / m.variance_x();
            debug_assert!(
                estimates_agree(estimate.beta, covariance_beta),
                "OLS slope {} diverges from covariance beta {}",
                estimate.beta,
                covariance_beta
            );
            estimate
        }
    };

    let d = estimate.diagnostics;
    let result = BetaResult {
        instrument_symbol: returns.instrument_symbol().to_string(),
        benchmark_symbol: returns.benchmark_symbol().to_string(),
        beta: estimate.beta,
        sample_size: estimate.sample_size,
        method: estimate.method,
        r_squared: d.map(|d| d.r_squared),
        p_value: d.map(|d| d.p_value),
        std_err: d.map(|d| d.std_err),
        alpha: d.map(|d| d.alpha),
        correlation: d.map(|d| d.correlation),
        t_statistic: d.map(|d| d.t_statistic),
        start_date: returns.start_date(),
        end_date: returns.end_date(),
        dropped_rows: returns.dropped(),
    };

    tracing::debug!(
        instrument = %result.instrument_symbol,
        benchmark = %result.benchmark_symbol,
        method = %result.method,
        beta = result.beta,
        observations = result.sample_size,
        "beta estimated"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn series(symbol: &str, prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_pairs(
            symbol,
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (start + chrono::Days::new(i as u64), p)),
        )
        .unwrap()
    }

    #[test]
    fn test_reference_covariance_beta() {
        let stock = series("ACME", &[100.0, 102.0, 101.0, 105.0]);
        let index = series("^GSPC", &[100.0, 101.0, 100.0, 103.0]);

        let result = compute_beta(&stock, &index, EstimationMethod::Covariance, "S&P 500").unwrap();

        assert_relative_eq!(result.beta, 1.238_048_072_513_298, max_relative = 1e-9);
        assert_eq!(result.sample_size, 3);
        assert_eq!(result.benchmark_symbol, "S&P 500");
        assert_eq!(result.instrument_symbol, "ACME");
        assert!(result.r_squared.is_none());
        assert_eq!(result.profile(), BetaProfile::Aggressive);
        assert_eq!(result.start_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(result.end_date, NaiveDate::from_ymd_opt(2024, 1, 4));
    }

    #[test]
    fn test_regression_fills_diagnostics() {
        let stock = series("ACME", &[100.0, 102.0, 101.0, 105.0]);
        let index = series("^GSPC", &[100.0, 101.0, 100.0, 103.0]);

        let result = compute_beta(&stock, &index, EstimationMethod::Regression, "^GSPC").unwrap();

        assert_relative_eq!(result.beta, 1.238_048_072_513_298, max_relative = 1e-9);
        assert_relative_eq!(result.r_squared.unwrap(), 0.985_653_895_455_118_5, max_relative = 1e-9);
        assert!(result.p_value.is_some());
        assert!(result.std_err.is_some());
        assert_eq!(result.is_significant(0.05), Some(false));
    }

    #[test]
    fn test_regression_with_two_returns_marks_diagnostics_absent() {
        let stock = series("ACME", &[100.0, 102.0, 101.0]);
        let index = series("^GSPC", &[100.0, 101.0, 100.0]);

        let result = compute_beta(&stock, &index, EstimationMethod::Regression, "^GSPC").unwrap();

        assert!(result.beta.is_finite());
        assert!(result.r_squared.is_none());
        assert!(result.p_value.is_none());
        assert!(result.std_err.is_none());
    }

    #[rstest]
    #[case(EstimationMethod::Covariance)]
    #[case(EstimationMethod::Regression)]
    fn test_constant_benchmark(#[case] method: EstimationMethod) {
        let stock = series("ACME", &[100.0, 102.0, 101.0, 105.0]);
        let index = series("^FLAT", &[50.0; 4]);

        let err = compute_beta(&stock, &index, method, "^FLAT").unwrap_err();
        assert_eq!(
            err,
            CoreError::DegenerateVariance {
                symbol: "^FLAT".to_string()
            }
        );
    }

    #[rstest]
    #[case(EstimationMethod::Covariance)]
    #[case(EstimationMethod::Regression)]
    fn test_precomputed_returns_with_nan_stay_finite(#[case] method: EstimationMethod) {
        let returns = ReturnSeries::from_returns(
            "AAA",
            "IDX",
            vec![0.01, f64::NAN, 0.02, -0.01],
            vec![0.005, 0.01, 0.015, -0.004],
        )
        .unwrap();

        let result = estimate_returns(&returns, &EstimatorConfig::with_method(method)).unwrap();

        assert!(result.beta.is_finite());
        assert_eq!(result.sample_size, 3);
        assert_eq!(result.dropped_rows, 1);
        if let Some(r2) = result.r_squared {
            assert!((0.0..=1.0).contains(&r2));
        }
        if let Some(p) = result.p_value {
            assert!(p.is_finite());
        }
    }

    #[test]
    fn test_empty_instrument() {
        let stock = PriceSeries::empty("TYPO");
        let index = series("^GSPC", &[100.0, 101.0, 100.0, 103.0]);

        let err = compute_beta(&stock, &index, EstimationMethod::Covariance, "^GSPC").unwrap_err();
        assert_eq!(
            err,
            CoreError::SymbolNotFound {
                symbol: "TYPO".to_string()
            }
        );
    }

    #[rstest]
    #[case(-0.4, BetaProfile::Inverse)]
    #[case(0.0, BetaProfile::Defensive)]
    #[case(0.94, BetaProfile::Defensive)]
    #[case(1.0, BetaProfile::MarketLike)]
    #[case(1.05, BetaProfile::MarketLike)]
    #[case(1.6, BetaProfile::Aggressive)]
    fn test_profile(#[case] beta: f64, #[case] expected: BetaProfile) {
        assert_eq!(BetaProfile::classify(beta), expected);
    }
}
