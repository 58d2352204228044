//! Conversion between quote frames and price series.
//!
//! Quote frames follow the Yahoo layout: `symbol, date, close, adjusted_close`
//! with `date` as a polars `Date` column.

use crate::error::Result;
use betacalc_core::PriceSeries;
use chrono::NaiveDate;
use polars::prelude::*;

/// Build a quote frame from raw Unix timestamps and prices.
///
/// # Errors
/// Returns a polars error if the columns cannot be assembled.
pub fn quotes_frame(
    symbol: &str,
    timestamps: Vec<i64>,
    closes: Vec<f64>,
    adjusted_closes: Vec<f64>,
) -> Result<DataFrame> {
    let height = timestamps.len();
    let df = DataFrame::new(vec![
        Series::new("symbol".into(), vec![symbol; height]).into(),
        Series::new("timestamp".into(), timestamps).into(),
        Series::new("close".into(), closes).into(),
        Series::new("adjusted_close".into(), adjusted_closes).into(),
    ])?;

    // Convert timestamp to date
    let df = df
        .lazy()
        .with_column(
            (col("timestamp") * lit(1_000_000_000))
                .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                .cast(DataType::Date)
                .alias("date"),
        )
        .sort(["date"], SortMultipleOptions::default())
        .select([
            col("symbol"),
            col("date"),
            col("close"),
            col("adjusted_close"),
        ])
        .collect()?;

    Ok(df)
}

/// Extract `(date, adjusted_close)` from a quote frame into a price series.
///
/// Rows without a date are skipped; a null price becomes an undefined
/// observation. When a date repeats (Yahoo can append a provisional row for
/// the current session) the last row wins.
///
/// # Errors
/// Returns an error if the columns are missing or mistyped.
pub fn series_from_frame(symbol: &str, df: &DataFrame) -> Result<PriceSeries> {
    let dates = df.column("date")?.date()?;
    let prices = df.column("adjusted_close")?.f64()?;

    let pairs: Vec<(NaiveDate, f64)> = dates
        .as_date_iter()
        .zip(prices)
        .filter_map(|(date, price)| Some((date?, price.unwrap_or(f64::NAN))))
        .collect();

    Ok(PriceSeries::from_pairs(symbol, dedup_last(pairs))?)
}

/// Sort by date and keep the last observation per date.
pub(crate) fn dedup_last(mut pairs: Vec<(NaiveDate, f64)>) -> Vec<(NaiveDate, f64)> {
    pairs.sort_by_key(|&(date, _)| date);
    let mut out: Vec<(NaiveDate, f64)> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match out.last_mut() {
            Some(last) if last.0 == pair.0 => *last = pair,
            _ => out.push(pair),
        }
    }
    out
}
