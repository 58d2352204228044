//! Price series and date alignment.
//!
//! A [`PriceSeries`] is the provider's view of one symbol: strictly increasing
//! trading dates paired with adjusted closing prices. Two series are combined
//! into an [`AlignedPricePanel`] by keeping only the dates both sides traded.

use crate::error::{CoreError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Adjusted closing price.
    pub price: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    /// Whether the price can take part in a return calculation.
    ///
    /// Zero, negative and non-finite prices mark gaps in the upstream data.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Ordered daily price history for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a price series, validating that dates are strictly increasing.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidSeries`] on duplicate or out-of-order dates.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let symbol = symbol.into();

        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(CoreError::InvalidSeries {
                symbol,
                reason: format!(
                    "dates must be strictly increasing ({} followed by {})",
                    pair[0].date, pair[1].date
                ),
            });
        }

        Ok(Self { symbol, points })
    }

    /// Create a price series from `(date, price)` pairs.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidSeries`] on duplicate or out-of-order dates.
    pub fn from_pairs(
        symbol: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let points = pairs
            .into_iter()
            .map(|(date, price)| PricePoint::new(date, price))
            .collect();
        Self::new(symbol, points)
    }

    /// Create an empty series, as returned by a provider with no data for the symbol.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Symbol this series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All price points in date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of price points.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no price points.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First trading date, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Last trading date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Return a copy with every price multiplied by `factor`.
    ///
    /// Useful for currency redenomination; returns are unchanged for any
    /// positive factor.
    pub fn rescaled(&self, factor: f64) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .map(|p| PricePoint::new(p.date, p.price * factor))
                .collect(),
        }
    }
}

/// Instrument and benchmark prices restricted to their common trading dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPricePanel {
    instrument_symbol: String,
    benchmark_symbol: String,
    dates: Vec<NaiveDate>,
    instrument: Vec<f64>,
    benchmark: Vec<f64>,
}

impl AlignedPricePanel {
    /// Inner-join two series on date.
    ///
    /// Both inputs are date-ordered, so a single merge pass suffices.
    ///
    /// # Errors
    /// Returns [`CoreError::SymbolNotFound`] if either series is empty.
    pub fn align(instrument: &PriceSeries, benchmark: &PriceSeries) -> Result<Self> {
        for series in [instrument, benchmark] {
            if series.is_empty() {
                return Err(CoreError::SymbolNotFound {
                    symbol: series.symbol().to_string(),
                });
            }
        }

        let capacity = instrument.len().min(benchmark.len());
        let mut dates = Vec::with_capacity(capacity);
        let mut inst = Vec::with_capacity(capacity);
        let mut bench = Vec::with_capacity(capacity);

        let (a, b) = (instrument.points(), benchmark.points());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].date.cmp(&b[j].date) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dates.push(a[i].date);
                    inst.push(a[i].price);
                    bench.push(b[j].price);
                    i += 1;
                    j += 1;
                }
            }
        }

        let skipped = instrument.len() + benchmark.len() - 2 * dates.len();
        if skipped > 0 {
            tracing::debug!(
                instrument = instrument.symbol(),
                benchmark = benchmark.symbol(),
                aligned = dates.len(),
                skipped,
                "dropped unmatched trading days during alignment"
            );
        }

        Ok(Self {
            instrument_symbol: instrument.symbol().to_string(),
            benchmark_symbol: benchmark.symbol().to_string(),
            dates,
            instrument: inst,
            benchmark: bench,
        })
    }

    /// Override the benchmark label carried into downstream results.
    pub fn with_benchmark_label(mut self, label: impl Into<String>) -> Self {
        self.benchmark_symbol = label.into();
        self
    }

    /// Instrument symbol.
    pub fn instrument_symbol(&self) -> &str {
        &self.instrument_symbol
    }

    /// Benchmark symbol (or the label it was given).
    pub fn benchmark_symbol(&self) -> &str {
        &self.benchmark_symbol
    }

    /// Common trading dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Instrument prices, positionally matched with [`Self::dates`].
    pub fn instrument(&self) -> &[f64] {
        &self.instrument
    }

    /// Benchmark prices, positionally matched with [`Self::dates`].
    pub fn benchmark(&self) -> &[f64] {
        &self.benchmark
    }

    /// Number of aligned rows.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the two series share no trading dates.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let result = PriceSeries::from_pairs("AAPL", [(day(5), 1.0), (day(4), 2.0)]);
        assert!(matches!(result, Err(CoreError::InvalidSeries { .. })));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = PriceSeries::from_pairs("AAPL", [(day(5), 1.0), (day(5), 2.0)]);
        assert!(matches!(result, Err(CoreError::InvalidSeries { .. })));
    }

    #[test]
    fn test_accepts_gaps_as_undefined_prices() {
        let series =
            PriceSeries::from_pairs("AAPL", [(day(4), 1.0), (day(5), f64::NAN), (day(6), 0.0)])
                .unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.points()[0].is_valid());
        assert!(!series.points()[1].is_valid());
        assert!(!series.points()[2].is_valid());
    }

    #[test]
    fn test_align_intersects_dates() {
        let stock =
            PriceSeries::from_pairs("AAPL", [(day(4), 10.0), (day(5), 11.0), (day(7), 12.0)])
                .unwrap();
        let index =
            PriceSeries::from_pairs("^GSPC", [(day(5), 100.0), (day(6), 101.0), (day(7), 102.0)])
                .unwrap();

        let panel = AlignedPricePanel::align(&stock, &index).unwrap();
        assert_eq!(panel.dates(), &[day(5), day(7)]);
        assert_eq!(panel.instrument(), &[11.0, 12.0]);
        assert_eq!(panel.benchmark(), &[100.0, 102.0]);
    }

    #[test]
    fn test_align_empty_series_is_symbol_not_found() {
        let stock = PriceSeries::from_pairs("AAPL", [(day(4), 10.0)]).unwrap();
        let index = PriceSeries::empty("^BOGUS");

        let err = AlignedPricePanel::align(&stock, &index).unwrap_err();
        assert_eq!(
            err,
            CoreError::SymbolNotFound {
                symbol: "^BOGUS".to_string()
            }
        );
    }

    #[test]
    fn test_rescaled_keeps_dates() {
        let series = PriceSeries::from_pairs("AAPL", [(day(4), 10.0), (day(5), 20.0)]).unwrap();
        let scaled = series.rescaled(0.5);
        assert_eq!(scaled.first_date(), Some(day(4)));
        assert_eq!(scaled.points()[1].price, 10.0);
    }
}
