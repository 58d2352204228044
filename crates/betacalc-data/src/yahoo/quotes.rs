//! Quote data fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::frame::{quotes_frame, series_from_frame};
use crate::provider::PriceSeriesProvider;
use crate::request::{DateRange, normalize_symbol};
use betacalc_core::PriceSeries;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use yahoo_finance_api as yahoo;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay after each request.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(250);

/// Yahoo Finance quote provider with rate limiting and a request timeout.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
    request_timeout: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with default rate limiting and timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn try_new() -> Result<Self> {
        Self::with_settings(DEFAULT_RATE_LIMIT_DELAY, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a provider with custom rate limiting and timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_settings(rate_limit_delay: Duration, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
            request_timeout,
        })
    }

    /// Fetch daily quotes for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "AAPL")
    /// * `start` - Start of the window
    /// * `end` - End of the window
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, close, adjusted_close.
    /// Empty when Yahoo has no quotes for the window.
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        // Validate date range
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        let symbol = normalize_symbol(symbol)?;

        // Convert chrono DateTime to time::OffsetDateTime
        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        tracing::debug!(%symbol, %start, %end, "requesting Yahoo quote history");

        let response = timeout(
            self.request_timeout,
            self.provider.get_quote_history(&symbol, start_time, end_time),
        )
        .await
        .map_err(|_| DataError::Timeout {
            symbol: symbol.clone(),
            seconds: self.request_timeout.as_secs(),
        })?
        .map_err(|e| history_error(&symbol, e))?;

        // Apply rate limiting
        sleep(self.rate_limit_delay).await;

        // A response without a quote block means no data for the window.
        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::debug!(%symbol, error = %e, "no quotes in Yahoo response");
                Vec::new()
            }
        };

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        quotes_frame(&symbol, timestamps, closes, adj_closes)
    }
}

impl PriceSeriesProvider for YahooQuoteProvider {
    async fn fetch_series(&self, symbol: &str, range: &DateRange) -> Result<PriceSeries> {
        let (start, end) = range.to_utc_bounds();
        let df = self.fetch_quotes(symbol, start, end).await?;
        let series = series_from_frame(&normalize_symbol(symbol)?, &df)?;

        // Yahoo snaps the window to whole sessions; trim anything outside it.
        let points = series
            .points()
            .iter()
            .filter(|p| range.contains(p.date))
            .copied()
            .collect();
        Ok(PriceSeries::new(series.symbol(), points)?)
    }
}

/// Map a quote-history failure; Yahoo reports unknown tickers as a
/// "Not Found" chart error or an empty result.
fn history_error(symbol: &str, err: yahoo::YahooError) -> DataError {
    match err {
        yahoo::YahooError::ApiError(ref msg)
            if msg
                .code
                .as_deref()
                .is_some_and(|code| code.eq_ignore_ascii_case("Not Found")) =>
        {
            DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }
        }
        yahoo::YahooError::NoResult | yahoo::YahooError::NoQuotes => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        other => DataError::YahooApi(format!("{symbol}: {other}")),
    }
}
