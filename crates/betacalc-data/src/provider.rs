//! Price series providers.

use crate::error::{DataError, Result};
use crate::request::{DateRange, PriceRequest};
use betacalc_core::PriceSeries;
use chrono::Utc;
use std::collections::HashMap;

/// Instrument and benchmark prices returned for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePair {
    /// Instrument prices.
    pub instrument: PriceSeries,
    /// Benchmark prices.
    pub benchmark: PriceSeries,
    /// Dates that were requested.
    pub range: DateRange,
}

/// Source of daily adjusted closing prices.
///
/// Implementations return an empty series for a symbol with no data in the
/// range rather than an error; [`Self::fetch_pair`] turns that into
/// [`DataError::SymbolNotFound`].
#[allow(async_fn_in_trait)]
pub trait PriceSeriesProvider {
    /// Fetch prices for one symbol, dates ascending.
    ///
    /// # Errors
    /// Returns an error if the source cannot be reached or returns malformed data.
    async fn fetch_series(&self, symbol: &str, range: &DateRange) -> Result<PriceSeries>;

    /// Fetch instrument and benchmark concurrently.
    ///
    /// # Errors
    /// Returns [`DataError::SymbolNotFound`] for a symbol without prices, or
    /// any error from [`Self::fetch_series`].
    async fn fetch_pair(&self, request: &PriceRequest) -> Result<PricePair> {
        let range = request.window.resolve(Utc::now().date_naive())?;

        let (instrument, benchmark) = futures::try_join!(
            self.fetch_series(&request.instrument, &range),
            self.fetch_series(&request.benchmark, &range),
        )?;

        for series in [&instrument, &benchmark] {
            if series.is_empty() {
                return Err(DataError::SymbolNotFound {
                    symbol: series.symbol().to_string(),
                });
            }
        }

        tracing::info!(
            instrument = %request.instrument,
            benchmark = %request.benchmark,
            range = %range,
            instrument_rows = instrument.len(),
            benchmark_rows = benchmark.len(),
            "fetched price pair"
        );

        Ok(PricePair {
            instrument,
            benchmark,
            range,
        })
    }
}

/// In-memory provider, keyed by upper-case symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    series: HashMap<String, PriceSeries>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a series.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_uppercase(), series);
    }

    /// Builder-style [`Self::insert`].
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    /// Symbols held, unordered.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

impl PriceSeriesProvider for StaticProvider {
    async fn fetch_series(&self, symbol: &str, range: &DateRange) -> Result<PriceSeries> {
        let Some(series) = self.series.get(&symbol.to_uppercase()) else {
            return Ok(PriceSeries::empty(symbol));
        };
        let points = series
            .points()
            .iter()
            .filter(|p| range.contains(p.date))
            .copied()
            .collect();
        Ok(PriceSeries::new(series.symbol(), points)?)
    }
}
