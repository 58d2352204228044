#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/betacalc/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod benchmark;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod estimator;
mod moments;
pub mod returns;
pub mod series;

pub use benchmark::{
    BenchmarkResolver, DEFAULT_FALLBACK_BENCHMARK, DEFAULT_SUFFIX_BENCHMARKS, SuffixBenchmark,
};
pub use config::EstimatorConfig;
pub use diagnostics::RegressionDiagnostics;
pub use engine::{BetaProfile, BetaResult, compute_beta, compute_beta_with_config, estimate_returns};
pub use error::{CoreError, MIN_OBSERVATIONS, Result};
pub use estimator::{
    BetaEstimate, BetaEstimator, CovarianceBeta, EstimationMethod, RegressionBeta,
    estimates_agree,
};
pub use returns::ReturnSeries;
pub use series::{AlignedPricePanel, PricePoint, PriceSeries};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
