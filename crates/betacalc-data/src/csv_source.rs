//! Offline provider backed by a CSV file of adjusted closes.
//!
//! Expected header: `date,symbol,adjusted_close` (ISO dates, any row order).

use crate::error::Result;
use crate::frame::dedup_last;
use crate::provider::PriceSeriesProvider;
use crate::request::DateRange;
use betacalc_core::PriceSeries;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    symbol: String,
    adjusted_close: Option<f64>,
}

/// Provider serving prices loaded from CSV.
#[derive(Debug, Clone, Default)]
pub struct CsvPriceProvider {
    rows: HashMap<String, Vec<(NaiveDate, f64)>>,
}

impl CsvPriceProvider {
    /// Load from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a row fails to parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load from any reader.
    ///
    /// # Errors
    /// Returns an error if a row fails to parse.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();

        for record in rdr.deserialize() {
            let row: PriceRow = record?;
            rows.entry(row.symbol.trim().to_uppercase())
                .or_default()
                .push((row.date, row.adjusted_close.unwrap_or(f64::NAN)));
        }

        let rows = rows
            .into_iter()
            .map(|(symbol, pairs)| (symbol, dedup_last(pairs)))
            .collect();

        Ok(Self { rows })
    }

    /// Number of distinct symbols loaded.
    pub fn symbol_count(&self) -> usize {
        self.rows.len()
    }
}

impl PriceSeriesProvider for CsvPriceProvider {
    async fn fetch_series(&self, symbol: &str, range: &DateRange) -> Result<PriceSeries> {
        let key = symbol.to_uppercase();
        let pairs = self
            .rows
            .get(&key)
            .map(|pairs| {
                pairs
                    .iter()
                    .filter(|(date, _)| range.contains(*date))
                    .copied()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(PriceSeries::from_pairs(key, pairs)?)
    }
}
