//! Analysis runs: benchmark suggestion, price retrieval, estimation.
//!
//! Each run is independent and side-effect free apart from the provider
//! call, so batches can run concurrently without coordination.

use betacalc_core::{
    BenchmarkResolver, BetaResult, CoreError, EstimatorConfig, compute_beta_with_config,
};
use betacalc_data::{DataError, PricePair, PriceRequest, PriceSeriesProvider, RequestWindow};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error from one analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Price retrieval failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Estimation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AnalysisError {
    /// Short machine-readable category, e.g. for batch reports.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Data(DataError::SymbolNotFound { .. })
            | Self::Core(CoreError::SymbolNotFound { .. }) => "symbol_not_found",
            Self::Core(CoreError::InsufficientData { .. }) => "insufficient_data",
            Self::Core(CoreError::DegenerateVariance { .. }) => "degenerate_variance",
            Self::Core(CoreError::RegressionUnderdetermined { .. }) => "regression_underdetermined",
            Self::Data(DataError::Timeout { .. }) => "timeout",
            Self::Data(
                DataError::InvalidSymbol(_)
                | DataError::InvalidLookback(_)
                | DataError::InvalidDateRange { .. },
            ) => "invalid_request",
            Self::Data(_) => "data_error",
            Self::Core(_) => "estimation_error",
        }
    }
}

/// What to analyse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Instrument ticker.
    pub ticker: String,
    /// Benchmark symbol; suggested from the ticker when `None`.
    pub benchmark: Option<String>,
    /// Date window.
    pub window: RequestWindow,
}

impl AnalysisRequest {
    /// Request for `ticker` with a suggested benchmark and the default window.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            benchmark: None,
            window: RequestWindow::default(),
        }
    }

    /// Use an explicit benchmark.
    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }

    /// Use a specific date window.
    pub const fn with_window(mut self, window: RequestWindow) -> Self {
        self.window = window;
        self
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Beta and diagnostics.
    pub result: BetaResult,
    /// Prices the estimate was computed from.
    pub prices: PricePair,
    /// Whether the benchmark came from the suffix table.
    pub benchmark_suggested: bool,
}

/// Run one analysis.
///
/// # Errors
/// Returns [`AnalysisError::Data`] if prices cannot be retrieved (including
/// unknown symbols) and [`AnalysisError::Core`] if estimation fails.
pub async fn analyze<P: PriceSeriesProvider>(
    provider: &P,
    request: &AnalysisRequest,
    config: &EstimatorConfig,
    resolver: &BenchmarkResolver,
) -> Result<Analysis, AnalysisError> {
    let (benchmark, benchmark_suggested) = match &request.benchmark {
        Some(b) if !b.trim().is_empty() => (b.as_str(), false),
        _ => (resolver.resolve(&request.ticker), true),
    };
    if benchmark_suggested {
        tracing::info!(ticker = %request.ticker, benchmark, "using suggested benchmark");
    }

    let price_request = PriceRequest::new(&request.ticker, benchmark, request.window)?;
    let prices = provider.fetch_pair(&price_request).await?;

    let result = compute_beta_with_config(
        &prices.instrument,
        &prices.benchmark,
        &price_request.benchmark,
        config,
    )?;

    Ok(Analysis {
        result,
        prices,
        benchmark_suggested,
    })
}

/// Run several analyses with at most `concurrency` in flight.
///
/// Results come back in request order, each paired with its ticker.
pub async fn analyze_many<P: PriceSeriesProvider>(
    provider: &P,
    requests: &[AnalysisRequest],
    config: &EstimatorConfig,
    resolver: &BenchmarkResolver,
    concurrency: usize,
) -> Vec<(String, Result<Analysis, AnalysisError>)> {
    stream::iter(requests)
        .map(|request| async move {
            let outcome = analyze(provider, request, config, resolver).await;
            if let Err(e) = &outcome {
                tracing::warn!(ticker = %request.ticker, error = %e, "analysis failed");
            }
            (request.ticker.clone(), outcome)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
