//! Human-readable reports for a single beta estimate.

use betacalc_core::{BetaProfile, BetaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caveat printed next to the p-value.
pub const SIGNIFICANCE_NOTE: &str =
    "p-value assumes i.i.d. normally distributed OLS residuals (Student's t, n - 2 df)";

const WIDTH: usize = 64;

/// Report for one beta estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaReport {
    /// The estimate being reported.
    pub result: BetaResult,

    /// Reading of the beta value.
    pub profile: BetaProfile,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl BetaReport {
    /// Build a report stamped with the current time.
    pub fn from_result(result: &BetaResult) -> Self {
        Self {
            result: result.clone(),
            profile: result.profile(),
            timestamp: Utc::now(),
        }
    }

    /// Convert report to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a fixed-width text table.
    pub fn to_ascii_table(&self) -> String {
        let r = &self.result;
        let mut output = String::new();

        output.push_str(&format!(
            "\nBeta: {} vs {}\n",
            r.instrument_symbol, r.benchmark_symbol
        ));
        output.push_str(&format!("Period: {}\n", self.period()));
        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        for (label, value) in self.rows() {
            output.push_str(&format!("{label:<28} {value:>35}\n"));
        }

        output.push_str(&"-".repeat(WIDTH));
        output.push('\n');
        output.push_str(&format!(
            "{}: {}\n",
            self.profile,
            self.profile.description()
        ));
        if r.p_value.is_some() {
            output.push_str(&format!("Note: {SIGNIFICANCE_NOTE}\n"));
        }
        output.push_str(&"=".repeat(WIDTH));
        output.push('\n');

        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let r = &self.result;
        let mut output = String::new();

        output.push_str(&format!(
            "# Beta: {} vs {}\n\n",
            r.instrument_symbol, r.benchmark_symbol
        ));
        output.push_str(&format!("**Period:** {}\n\n", self.period()));
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|------:|\n");
        for (label, value) in self.rows() {
            output.push_str(&format!("| {label} | {value} |\n"));
        }
        output.push('\n');
        output.push_str(&format!(
            "**{}**: {}\n",
            self.profile,
            self.profile.description()
        ));
        if r.p_value.is_some() {
            output.push_str(&format!("\n> {SIGNIFICANCE_NOTE}\n"));
        }

        output
    }

    fn period(&self) -> String {
        match (self.result.start_date, self.result.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "n/a".to_string(),
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let r = &self.result;
        let mut rows = vec![
            ("Beta", format!("{:.4}", r.beta)),
            ("Method", r.method.to_string()),
            ("Observations", r.sample_size.to_string()),
        ];
        if r.dropped_rows > 0 {
            rows.push(("Dropped rows", r.dropped_rows.to_string()));
        }
        rows.extend([
            ("Alpha (per period)", fmt_opt(r.alpha, 6)),
            ("Correlation", fmt_opt(r.correlation, 4)),
            ("R-squared", fmt_opt(r.r_squared, 4)),
            ("Std. error", fmt_opt(r.std_err, 4)),
            ("t-statistic", fmt_opt(r.t_statistic, 3)),
            ("p-value", fmt_p(r.p_value)),
        ]);
        rows
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

fn fmt_p(value: Option<f64>) -> String {
    match value {
        Some(p) if p < 1e-4 => "< 0.0001".to_string(),
        other => fmt_opt(other, 4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use betacalc_core::EstimationMethod;
    use chrono::NaiveDate;

    fn result(method: EstimationMethod) -> BetaResult {
        let regression = method == EstimationMethod::Regression;
        BetaResult {
            instrument_symbol: "ACME".to_string(),
            benchmark_symbol: "^GSPC".to_string(),
            beta: 1.238_048,
            sample_size: 3,
            method,
            r_squared: regression.then_some(0.9857),
            p_value: regression.then_some(0.0764),
            std_err: regression.then_some(0.1494),
            alpha: regression.then_some(0.004_179),
            correlation: regression.then_some(0.9928),
            t_statistic: regression.then_some(8.289),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 4),
            dropped_rows: 0,
        }
    }

    #[test]
    fn test_ascii_table() {
        let report = BetaReport::from_result(&result(EstimationMethod::Regression));
        let table = report.to_ascii_table();

        assert!(table.contains("Beta: ACME vs ^GSPC"));
        assert!(table.contains("2024-01-02 to 2024-01-04"));
        assert!(table.contains("1.2380"));
        assert!(table.contains("0.0764"));
        assert!(table.contains("Aggressive"));
        assert!(table.contains(SIGNIFICANCE_NOTE));
        assert!(!table.contains("Dropped rows"));
    }

    #[test]
    fn test_covariance_has_no_diagnostics() {
        let report = BetaReport::from_result(&result(EstimationMethod::Covariance));
        let markdown = report.to_markdown();

        assert!(markdown.starts_with("# Beta: ACME vs ^GSPC"));
        assert!(markdown.contains("| R-squared | n/a |"));
        assert!(!markdown.contains(SIGNIFICANCE_NOTE));
    }

    #[test]
    fn test_tiny_p_value() {
        assert_eq!(fmt_p(Some(1e-12)), "< 0.0001");
        assert_eq!(fmt_p(None), "n/a");
    }

    #[test]
    fn test_json() {
        let report = BetaReport::from_result(&result(EstimationMethod::Regression));
        let json = report.to_json().unwrap();
        let parsed: BetaReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.result, report.result);
        assert_eq!(parsed.profile, BetaProfile::Aggressive);
    }
}
