//! Error types for beta estimation.

use thiserror::Error;

/// Result type for estimation operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Minimum number of paired return observations any estimate needs.
pub const MIN_OBSERVATIONS: usize = 2;

/// Errors that can occur while estimating beta.
///
/// Every variant names the precondition that failed and the observed value,
/// so callers can tell a ticker typo from a short history or a flat benchmark.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Symbol has no price data.
    #[error("Symbol not found: no price data for {symbol}")]
    SymbolNotFound {
        /// Symbol that was queried
        symbol: String,
    },

    /// Too few paired return observations.
    #[error(
        "Insufficient data: need at least {required} paired return observations, got {observed}"
    )]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Observed number of observations
        observed: usize,
    },

    /// Benchmark returns have zero variance.
    #[error("Degenerate variance: benchmark {symbol} has zero return variance")]
    DegenerateVariance {
        /// Benchmark symbol
        symbol: String,
    },

    /// Too few observations for a t-test on the slope.
    #[error(
        "Regression underdetermined: {sample_size} observations leave no residual degrees of freedom"
    )]
    RegressionUnderdetermined {
        /// Number of paired observations
        sample_size: usize,
    },

    /// Instrument returns have zero variance, so fit quality is undefined.
    #[error("Constant instrument returns over {sample_size} observations: R² is undefined")]
    ConstantInstrument {
        /// Number of paired observations
        sample_size: usize,
    },

    /// Return vectors of different lengths.
    #[error("Length mismatch: instrument has {instrument} observations, benchmark has {benchmark}")]
    LengthMismatch {
        /// Instrument vector length
        instrument: usize,
        /// Benchmark vector length
        benchmark: usize,
    },

    /// Malformed price series.
    #[error("Invalid series for {symbol}: {reason}")]
    InvalidSeries {
        /// Symbol of the offending series
        symbol: String,
        /// What was wrong with it
        reason: String,
    },

    /// Unknown estimation method name.
    #[error("Unknown estimation method: {0} (expected covariance or regression)")]
    UnknownMethod(String),
}

impl CoreError {
    /// Build an [`CoreError::InsufficientData`] against the hard floor.
    pub const fn insufficient(observed: usize) -> Self {
        Self::InsufficientData {
            required: MIN_OBSERVATIONS,
            observed,
        }
    }
}
