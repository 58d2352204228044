//! Error types for data operations.

use betacalc_core::CoreError;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Symbol absent from the response, or present with no prices
    #[error("Symbol not found: no price data for {symbol}")]
    SymbolNotFound {
        /// Symbol that was queried
        symbol: String,
    },

    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// Request did not complete in time
    #[error("Request for {symbol} timed out after {seconds}s")]
    Timeout {
        /// Symbol that was queried
        symbol: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// Unparseable lookback period
    #[error("Invalid lookback period: {0} (expected e.g. 1y, 3y, 6mo)")]
    InvalidLookback(String),

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Time conversion error
    #[error("Time conversion error: {0}")]
    TimeConversion(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed price series from the source
    #[error("Price series error: {0}")]
    Series(#[from] CoreError),
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}
