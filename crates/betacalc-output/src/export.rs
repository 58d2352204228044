//! CSV and JSON export for beta estimates and price histories.

use betacalc_core::{AlignedPricePanel, BetaProfile, BetaResult, EstimationMethod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer produced invalid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Pick a format from a file extension (`csv` or `json`).
    ///
    /// # Errors
    /// Returns [`ExportError::InvalidFormat`] for anything else.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(format!(
                "unsupported export extension {:?} (expected csv or json)",
                other.unwrap_or("")
            ))),
        }
    }
}

/// Outcome of a run in a batch export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Beta was estimated.
    Ok,
    /// The run failed; see `error_kind` and `error`.
    Failed,
}

/// One flat row per analysis run.
///
/// Failed runs keep their ticker and error so a batch export lists every
/// requested symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetaRecord {
    /// Instrument ticker.
    pub ticker: String,
    /// Benchmark symbol, when known.
    pub benchmark: Option<String>,
    /// Whether the run succeeded.
    pub status: RecordStatus,
    /// Estimated beta.
    pub beta: Option<f64>,
    /// Profile of the beta value.
    pub profile: Option<BetaProfile>,
    /// Estimation method.
    pub method: Option<EstimationMethod>,
    /// Paired return observations.
    pub sample_size: Option<usize>,
    /// Coefficient of determination.
    pub r_squared: Option<f64>,
    /// Two-sided p-value of the slope.
    pub p_value: Option<f64>,
    /// Standard error of the slope.
    pub std_err: Option<f64>,
    /// Intercept per period.
    pub alpha: Option<f64>,
    /// Pearson correlation.
    pub correlation: Option<f64>,
    /// t-statistic of the slope.
    pub t_statistic: Option<f64>,
    /// First return date.
    pub start_date: Option<NaiveDate>,
    /// Last return date.
    pub end_date: Option<NaiveDate>,
    /// Rows dropped for undefined returns.
    pub dropped_rows: Option<usize>,
    /// Machine-readable error category.
    pub error_kind: Option<String>,
    /// Error message.
    pub error: Option<String>,
}

impl BetaRecord {
    /// Row for a failed run.
    pub fn failure(
        ticker: impl Into<String>,
        benchmark: Option<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            benchmark,
            status: RecordStatus::Failed,
            beta: None,
            profile: None,
            method: None,
            sample_size: None,
            r_squared: None,
            p_value: None,
            std_err: None,
            alpha: None,
            correlation: None,
            t_statistic: None,
            start_date: None,
            end_date: None,
            dropped_rows: None,
            error_kind: Some(kind.into()),
            error: Some(message.into()),
        }
    }
}

impl From<&BetaResult> for BetaRecord {
    fn from(r: &BetaResult) -> Self {
        Self {
            ticker: r.instrument_symbol.clone(),
            benchmark: Some(r.benchmark_symbol.clone()),
            status: RecordStatus::Ok,
            beta: Some(r.beta),
            profile: Some(r.profile()),
            method: Some(r.method),
            sample_size: Some(r.sample_size),
            r_squared: r.r_squared,
            p_value: r.p_value,
            std_err: r.std_err,
            alpha: r.alpha,
            correlation: r.correlation,
            t_statistic: r.t_statistic,
            start_date: r.start_date,
            end_date: r.end_date,
            dropped_rows: Some(r.dropped_rows),
            error_kind: None,
            error: None,
        }
    }
}

/// Aligned prices and cumulative returns for one instrument/benchmark pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceHistoryExport {
    /// Instrument symbol.
    pub instrument_symbol: String,

    /// Benchmark symbol.
    pub benchmark_symbol: String,

    /// One row per common trading date.
    pub rows: Vec<PriceHistoryRow>,
}

/// A single date in a [`PriceHistoryExport`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceHistoryRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Instrument adjusted close.
    pub instrument_price: f64,
    /// Benchmark adjusted close.
    pub benchmark_price: f64,
    /// Instrument growth since its first valid price.
    pub instrument_cumulative_return: Option<f64>,
    /// Benchmark growth since its first valid price.
    pub benchmark_cumulative_return: Option<f64>,
}

impl PriceHistoryExport {
    /// Build from an aligned panel.
    ///
    /// Cumulative returns are relative to each side's first finite positive
    /// price and absent on rows whose price is undefined.
    pub fn from_panel(panel: &AlignedPricePanel) -> Self {
        let inst = cumulative_returns(panel.instrument());
        let bench = cumulative_returns(panel.benchmark());

        let rows = panel
            .dates()
            .iter()
            .enumerate()
            .map(|(i, &date)| PriceHistoryRow {
                date,
                instrument_price: panel.instrument()[i],
                benchmark_price: panel.benchmark()[i],
                instrument_cumulative_return: inst[i],
                benchmark_cumulative_return: bench[i],
            })
            .collect();

        Self {
            instrument_symbol: panel.instrument_symbol().to_string(),
            benchmark_symbol: panel.benchmark_symbol().to_string(),
            rows,
        }
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn is_defined(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

fn cumulative_returns(prices: &[f64]) -> Vec<Option<f64>> {
    let base = prices.iter().copied().find(|&p| is_defined(p));
    prices
        .iter()
        .map(|&p| match base {
            Some(base) if is_defined(p) => Some(p / base - 1.0),
            _ => None,
        })
        .collect()
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn to_csv<'a, T, I>(records: I) -> Result<String, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(serde_json::to_string(value)?),
    }
}

impl Exporter for BetaResult {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv([&BetaRecord::from(self)]),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for Vec<BetaResult> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let records: Vec<BetaRecord> = self.iter().map(BetaRecord::from).collect();
                to_csv(&records)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for Vec<BetaRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => to_csv(self),
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

impl Exporter for PriceHistoryExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Write header information as comments
                output.push_str(&format!("# Instrument: {}\n", self.instrument_symbol));
                output.push_str(&format!("# Benchmark: {}\n", self.benchmark_symbol));
                output.push_str(&to_csv(&self.rows)?);
                Ok(output)
            }
            ExportFormat::Json | ExportFormat::PrettyJson => to_json(self, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use betacalc_core::PriceSeries;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn result() -> BetaResult {
        BetaResult {
            instrument_symbol: "ACME".to_string(),
            benchmark_symbol: "^GSPC".to_string(),
            beta: 0.8,
            sample_size: 250,
            method: EstimationMethod::Covariance,
            r_squared: None,
            p_value: None,
            std_err: None,
            alpha: None,
            correlation: None,
            t_statistic: None,
            start_date: Some(day(2)),
            end_date: Some(day(31)),
            dropped_rows: 1,
        }
    }

    fn panel() -> AlignedPricePanel {
        let inst =
            PriceSeries::from_pairs("ACME", [(day(2), 100.0), (day(3), 0.0), (day(4), 110.0)])
                .unwrap();
        let bench =
            PriceSeries::from_pairs("^GSPC", [(day(2), 50.0), (day(3), 51.0), (day(4), 49.0)])
                .unwrap();
        AlignedPricePanel::align(&inst, &bench).unwrap()
    }

    #[test]
    fn test_beta_result_csv() {
        let csv = result().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("ticker,benchmark,status,beta,profile,method"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("ACME,^GSPC,ok,0.8,defensive,covariance,250,,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_beta_result_json() {
        let json = result().export_to_string(ExportFormat::Json).unwrap();
        let parsed: BetaResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result());
    }

    #[test]
    fn test_batch_with_failure() {
        let records = vec![
            BetaRecord::from(&result()),
            BetaRecord::failure("TYPO", None, "symbol_not_found", "symbol not found: TYPO"),
        ];
        let csv = records.export_to_string(ExportFormat::Csv).unwrap();

        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("TYPO,,failed"));
        assert!(csv.contains("symbol_not_found"));
    }

    #[test]
    fn test_price_history() {
        let history = PriceHistoryExport::from_panel(&panel());
        assert_eq!(history.len(), 3);

        let rows = &history.rows;
        assert_eq!(rows[0].instrument_cumulative_return, Some(0.0));
        assert_eq!(rows[1].instrument_cumulative_return, None);
        assert!((rows[2].instrument_cumulative_return.unwrap() - 0.1).abs() < 1e-12);
        assert!((rows[2].benchmark_cumulative_return.unwrap() + 0.02).abs() < 1e-12);

        let csv = history.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("# Instrument: ACME\n# Benchmark: ^GSPC\n"));
        assert!(csv.contains("date,instrument_price,benchmark_price"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out.CSV")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("out.json")).unwrap(),
            ExportFormat::PrettyJson
        );
        assert!(ExportFormat::from_path(Path::new("out.xlsx")).is_err());
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
