//! Paired daily return series.
//!
//! Converts an [`AlignedPricePanel`] into simple returns
//! `r[t] = p[t] / p[t-1] - 1` for both symbols. A row is kept only when the
//! return is defined on *both* sides, so the two vectors stay index-aligned.

use crate::error::{CoreError, MIN_OBSERVATIONS, Result};
use crate::series::AlignedPricePanel;
use chrono::NaiveDate;
use ndarray::Array1;

/// Index-aligned instrument and benchmark returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    instrument_symbol: String,
    benchmark_symbol: String,
    dates: Vec<NaiveDate>,
    instrument: Array1<f64>,
    benchmark: Array1<f64>,
    dropped: usize,
}

impl ReturnSeries {
    /// Compute paired returns from aligned prices.
    ///
    /// # Errors
    /// Returns [`CoreError::InsufficientData`] if fewer than two paired
    /// returns survive.
    pub fn from_panel(panel: &AlignedPricePanel) -> Result<Self> {
        let (inst, bench) = (panel.instrument(), panel.benchmark());
        let rows = panel.len().saturating_sub(1);

        let mut dates = Vec::with_capacity(rows);
        let mut inst_returns = Vec::with_capacity(rows);
        let mut bench_returns = Vec::with_capacity(rows);

        for t in 1..panel.len() {
            match (
                simple_return(inst[t - 1], inst[t]),
                simple_return(bench[t - 1], bench[t]),
            ) {
                (Some(ri), Some(rb)) => {
                    dates.push(panel.dates()[t]);
                    inst_returns.push(ri);
                    bench_returns.push(rb);
                }
                _ => {
                    tracing::debug!(
                        date = %panel.dates()[t],
                        instrument = panel.instrument_symbol(),
                        benchmark = panel.benchmark_symbol(),
                        "dropping row with undefined return"
                    );
                }
            }
        }

        let dropped = rows - dates.len();
        let series = Self {
            instrument_symbol: panel.instrument_symbol().to_string(),
            benchmark_symbol: panel.benchmark_symbol().to_string(),
            dates,
            instrument: Array1::from(inst_returns),
            benchmark: Array1::from(bench_returns),
            dropped,
        };
        series.ensure_sufficient()?;
        Ok(series)
    }

    /// Wrap return vectors a caller has already computed.
    ///
    /// A pair with a non-finite value on either side is dropped and counted
    /// in [`Self::dropped`], the same way undefined prices are.
    ///
    /// # Errors
    /// Returns [`CoreError::LengthMismatch`] for vectors of different length
    /// and [`CoreError::InsufficientData`] for fewer than two finite pairs.
    pub fn from_returns(
        instrument_symbol: impl Into<String>,
        benchmark_symbol: impl Into<String>,
        instrument: Vec<f64>,
        benchmark: Vec<f64>,
    ) -> Result<Self> {
        if instrument.len() != benchmark.len() {
            return Err(CoreError::LengthMismatch {
                instrument: instrument.len(),
                benchmark: benchmark.len(),
            });
        }

        let rows = instrument.len();
        let (inst_returns, bench_returns): (Vec<f64>, Vec<f64>) = instrument
            .into_iter()
            .zip(benchmark)
            .filter(|(ri, rb)| ri.is_finite() && rb.is_finite())
            .unzip();

        let series = Self {
            instrument_symbol: instrument_symbol.into(),
            benchmark_symbol: benchmark_symbol.into(),
            dates: Vec::new(),
            dropped: rows - inst_returns.len(),
            instrument: Array1::from(inst_returns),
            benchmark: Array1::from(bench_returns),
        };
        if series.dropped > 0 {
            tracing::debug!(
                instrument = %series.instrument_symbol,
                benchmark = %series.benchmark_symbol,
                dropped = series.dropped,
                "dropping non-finite return pairs"
            );
        }
        series.ensure_sufficient()?;
        Ok(series)
    }

    /// Re-check the two-observation floor.
    ///
    /// # Errors
    /// Returns [`CoreError::InsufficientData`] below the floor.
    pub fn ensure_sufficient(&self) -> Result<()> {
        if self.len() < MIN_OBSERVATIONS {
            return Err(CoreError::insufficient(self.len()));
        }
        Ok(())
    }

    /// Instrument symbol.
    pub fn instrument_symbol(&self) -> &str {
        &self.instrument_symbol
    }

    /// Benchmark symbol.
    pub fn benchmark_symbol(&self) -> &str {
        &self.benchmark_symbol
    }

    /// Dates of each return (the later day of each pair). Empty when built
    /// with [`Self::from_returns`].
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Instrument returns.
    pub const fn instrument(&self) -> &Array1<f64> {
        &self.instrument
    }

    /// Benchmark returns.
    pub const fn benchmark(&self) -> &Array1<f64> {
        &self.benchmark
    }

    /// Number of paired observations.
    pub fn len(&self) -> usize {
        self.instrument.len()
    }

    /// Whether there are no observations.
    pub fn is_empty(&self) -> bool {
        self.instrument.is_empty()
    }

    /// Rows removed by paired dropping.
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Date of the first return, if dated.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Date of the last return, if dated.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Simple return between two prices, `None` if either price is unusable.
fn simple_return(prev: f64, curr: f64) -> Option<f64> {
    let valid = |p: f64| p.is_finite() && p > 0.0;
    if !valid(prev) || !valid(curr) {
        return None;
    }
    Some(curr / prev - 1.0).filter(|r| r.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PriceSeries;
    use approx::assert_relative_eq;

    fn panel(inst: &[f64], bench: &[f64]) -> AlignedPricePanel {
        let day = |i: usize| NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap();
        let a = PriceSeries::from_pairs("AAA", inst.iter().enumerate().map(|(i, &p)| (day(i), p)))
            .unwrap();
        let b = PriceSeries::from_pairs("IDX", bench.iter().enumerate().map(|(i, &p)| (day(i), p)))
            .unwrap();
        AlignedPricePanel::align(&a, &b).unwrap()
    }

    #[test]
    fn test_percentage_change() {
        let returns = ReturnSeries::from_panel(&panel(
            &[100.0, 102.0, 101.0, 105.0],
            &[100.0, 101.0, 100.0, 103.0],
        ))
        .unwrap();

        assert_eq!(returns.len(), 3);
        assert_eq!(returns.dropped(), 0);
        assert_relative_eq!(returns.instrument()[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(returns.instrument()[1], -0.009_803_921_568_627_45, epsilon = 1e-12);
        assert_relative_eq!(returns.benchmark()[2], 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_paired_dropping_removes_both_sides() {
        // Benchmark price at index 1 is zero: returns 1 and 2 are undefined.
        let returns = ReturnSeries::from_panel(&panel(
            &[10.0, 11.0, 12.0, 13.0, 14.0],
            &[50.0, 0.0, 52.0, 53.0, 54.0],
        ))
        .unwrap();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.dropped(), 2);
        assert_eq!(returns.instrument().len(), returns.benchmark().len());
        assert_relative_eq!(returns.instrument()[0], 13.0 / 12.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(returns.benchmark()[0], 53.0 / 52.0 - 1.0, epsilon = 1e-12);
        assert_eq!(
            returns.start_date(),
            NaiveDate::from_ymd_opt(2024, 1, 4)
        );
    }

    #[test]
    fn test_missing_instrument_price_drops_row() {
        let returns = ReturnSeries::from_panel(&panel(
            &[10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0],
            &[50.0, 51.0, 52.0, 53.0, 54.0, 55.0],
        ))
        .unwrap();

        assert_eq!(returns.len(), 3);
        assert!(returns.instrument().iter().all(|r| r.is_finite()));
        assert!(returns.benchmark().iter().all(|r| r.is_finite()));
    }

    #[test]
    fn test_precomputed_returns_drop_non_finite_pairs() {
        let returns = ReturnSeries::from_returns(
            "AAA",
            "IDX",
            vec![0.01, f64::NAN, 0.02, -0.01],
            vec![0.005, 0.01, f64::INFINITY, -0.004],
        )
        .unwrap();

        assert_eq!(returns.len(), 2);
        assert_eq!(returns.dropped(), 2);
        assert_relative_eq!(returns.instrument()[1], -0.01);
        assert_relative_eq!(returns.benchmark()[1], -0.004);
    }

    #[test]
    fn test_precomputed_returns_all_undefined_is_insufficient() {
        let err = ReturnSeries::from_returns(
            "AAA",
            "IDX",
            vec![f64::NAN, 0.01, 0.02],
            vec![0.01, f64::NAN, f64::NEG_INFINITY],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::insufficient(0));
    }

    #[test]
    fn test_single_overlapping_day_is_insufficient() {
        let a = PriceSeries::from_pairs(
            "AAA",
            [(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 10.0)],
        )
        .unwrap();
        let b = PriceSeries::from_pairs(
            "IDX",
            [(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 50.0)],
        )
        .unwrap();
        let panel = AlignedPricePanel::align(&a, &b).unwrap();

        let err = ReturnSeries::from_panel(&panel).unwrap_err();
        assert_eq!(err, CoreError::insufficient(0));
    }

    #[test]
    fn test_too_many_gaps_is_insufficient() {
        let err =
            ReturnSeries::from_panel(&panel(&[10.0, 0.0, 12.0, 13.0], &[50.0, 51.0, 52.0, 53.0]))
                .unwrap_err();
        assert_eq!(err, CoreError::insufficient(1));
    }

    #[test]
    fn test_from_returns_length_mismatch() {
        let err = ReturnSeries::from_returns("AAA", "IDX", vec![0.1, 0.2], vec![0.1]).unwrap_err();
        assert_eq!(
            err,
            CoreError::LengthMismatch {
                instrument: 2,
                benchmark: 1
            }
        );
    }
}
