//! Estimator configuration.

use crate::estimator::EstimationMethod;
use serde::{Deserialize, Serialize};

/// Benchmark variance at or below this is treated as zero.
pub const DEFAULT_VARIANCE_FLOOR: f64 = 1e-20;

/// Configuration for beta estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Estimation strategy (default: covariance)
    pub method: EstimationMethod,
    /// Sample size below which estimates are flagged as unstable (default: 30)
    pub min_recommended_observations: usize,
    /// Zero-variance threshold for benchmark returns (default: 1e-20)
    pub variance_floor: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            method: EstimationMethod::Covariance,
            min_recommended_observations: 30,
            variance_floor: DEFAULT_VARIANCE_FLOOR,
        }
    }
}

impl EstimatorConfig {
    /// Default configuration using `method`.
    pub fn with_method(method: EstimationMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EstimatorConfig::default();
        assert_eq!(config.method, EstimationMethod::Covariance);
        assert_eq!(config.min_recommended_observations, 30);
        assert_eq!(config.variance_floor, 1e-20);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EstimatorConfig = serde_json::from_str(r#"{"method": "regression"}"#).unwrap();
        assert_eq!(config.method, EstimationMethod::Regression);
        assert_eq!(config.min_recommended_observations, 30);
    }
}
