//! Request model: which symbols, over which dates.

use crate::error::{DataError, Result};
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named lookback period ending today, e.g. `1y`, `3y`, `6mo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lookback {
    months: u32,
}

impl Lookback {
    /// Lookback of whole years.
    pub const fn years(years: u32) -> Self {
        Self { months: years * 12 }
    }

    /// Lookback of months.
    pub const fn months(months: u32) -> Self {
        Self { months }
    }

    /// Length in months.
    pub const fn as_months(&self) -> u32 {
        self.months
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::years(3)
    }
}

impl FromStr for Lookback {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim().to_lowercase();
        let invalid = || DataError::InvalidLookback(s.to_string());

        let (digits, per_unit) = if let Some(d) = raw.strip_suffix("mo") {
            (d, 1)
        } else if let Some(d) = raw.strip_suffix('y') {
            (d, 12)
        } else {
            return Err(invalid());
        };

        let count: u32 = digits.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        count
            .checked_mul(per_unit)
            .map(Self::months)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Lookback {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Lookback> for String {
    fn from(value: Lookback) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months % 12 == 0 {
            write!(f, "{}y", self.months / 12)
        } else {
            write!(f, "{}mo", self.months)
        }
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidDateRange`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Range covering `lookback` up to and including `today`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidLookback`] if the start falls outside the
    /// calendar.
    pub fn from_lookback(lookback: Lookback, today: NaiveDate) -> Result<Self> {
        let start = today
            .checked_sub_months(Months::new(lookback.as_months()))
            .ok_or_else(|| DataError::InvalidLookback(lookback.to_string()))?;
        Self::new(start, today)
    }

    /// First date.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date (inclusive).
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` lies in the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Range as UTC instants `[start 00:00, end + 1 day 00:00)`.
    pub fn to_utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        (start, end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Either a lookback ending today or explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestWindow {
    /// Named lookback period.
    Lookback(Lookback),
    /// Explicit date range.
    Range(DateRange),
}

impl RequestWindow {
    /// Resolve into concrete dates relative to `today`.
    ///
    /// # Errors
    /// See [`DateRange::from_lookback`].
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange> {
        match self {
            Self::Lookback(lookback) => DateRange::from_lookback(*lookback, today),
            Self::Range(range) => Ok(*range),
        }
    }
}

impl Default for RequestWindow {
    fn default() -> Self {
        Self::Lookback(Lookback::default())
    }
}

/// Prices wanted for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    /// Instrument symbol.
    pub instrument: String,
    /// Benchmark symbol.
    pub benchmark: String,
    /// Date window.
    pub window: RequestWindow,
}

impl PriceRequest {
    /// Create a request, normalising symbols to upper case.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidSymbol`] for blank symbols.
    pub fn new(
        instrument: impl AsRef<str>,
        benchmark: impl AsRef<str>,
        window: RequestWindow,
    ) -> Result<Self> {
        Ok(Self {
            instrument: normalize_symbol(instrument.as_ref())?,
            benchmark: normalize_symbol(benchmark.as_ref())?,
            window,
        })
    }
}

/// Trim and upper-case a ticker.
///
/// # Errors
/// Returns [`DataError::InvalidSymbol`] for blank input.
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }
    Ok(symbol.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("1y", 12)]
    #[case("2y", 24)]
    #[case("3Y", 36)]
    #[case("5y", 60)]
    #[case("6mo", 6)]
    #[case(" 18mo ", 18)]
    fn test_lookback_parse(#[case] input: &str, #[case] months: u32) {
        assert_eq!(input.parse::<Lookback>().unwrap().as_months(), months);
    }

    #[rstest]
    #[case("")]
    #[case("y")]
    #[case("0y")]
    #[case("3d")]
    #[case("-1y")]
    #[case("max")]
    fn test_lookback_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Lookback>(),
            Err(DataError::InvalidLookback(_))
        ));
    }

    #[test]
    fn test_lookback_display_round_trip() {
        assert_eq!(Lookback::years(3).to_string(), "3y");
        assert_eq!(Lookback::months(18).to_string(), "18mo");
        assert_eq!(Lookback::default(), Lookback::years(3));
    }

    #[test]
    fn test_lookback_serde() {
        let lookback: Lookback = serde_json::from_str("\"2y\"").unwrap();
        assert_eq!(lookback, Lookback::years(2));
        assert!(serde_json::from_str::<Lookback>("\"2w\"").is_err());
    }

    #[test]
    fn test_range_from_lookback() {
        let range = DateRange::from_lookback(Lookback::years(1), date(2024, 2, 29)).unwrap();
        assert_eq!(range.start(), date(2023, 2, 28));
        assert_eq!(range.end(), date(2024, 2, 29));
    }

    #[test]
    fn test_invalid_range() {
        let result = DateRange::new(date(2024, 5, 1), date(2024, 4, 1));
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_utc_bounds_cover_end_day() {
        let range = DateRange::new(date(2024, 1, 2), date(2024, 1, 5)).unwrap();
        let (start, end) = range.to_utc_bounds();
        assert_eq!(start.date_naive(), date(2024, 1, 2));
        assert_eq!(end.date_naive(), date(2024, 1, 6));
    }

    #[test]
    fn test_request_normalizes_symbols() {
        let request = PriceRequest::new(" aapl ", "^gspc", RequestWindow::default()).unwrap();
        assert_eq!(request.instrument, "AAPL");
        assert_eq!(request.benchmark, "^GSPC");
        assert!(PriceRequest::new("", "^GSPC", RequestWindow::default()).is_err());
    }
}
