//! Yahoo Finance data provider.

pub mod quotes;

pub use quotes::{DEFAULT_RATE_LIMIT_DELAY, DEFAULT_REQUEST_TIMEOUT, YahooQuoteProvider};
