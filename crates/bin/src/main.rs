//! betacalc CLI binary.
//!
//! Estimates a stock's beta against a market benchmark from daily prices.

mod config;

use betacalc::data::{
    CsvPriceProvider, DateRange, Lookback, PriceSeriesProvider, RequestWindow, YahooQuoteProvider,
};
use betacalc::estimation::AlignedPricePanel;
use betacalc::output::{
    BetaRecord, BetaReport, ExportFormat, Exporter, PriceHistoryExport, SIGNIFICANCE_NOTE,
};
use betacalc::{AnalysisRequest, EstimationMethod, analyze, analyze_many};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{AppConfig, CliArgs, build_config};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "betacalc")]
#[command(about = "Stock beta against a market benchmark", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(long, global = true, env = "BETACALC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Read prices from a CSV file (date,symbol,adjusted_close) instead of Yahoo Finance
    #[arg(long, global = true)]
    prices: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Estimate beta for one stock
    Beta {
        /// Stock ticker, e.g. AAPL or RELIANCE.NS
        ticker: String,

        #[command(flatten)]
        estimate: EstimateArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the result to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write aligned prices and cumulative returns to a .csv or .json file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Estimate beta for several stocks concurrently
    Batch {
        /// Stock tickers
        #[arg(required = true)]
        tickers: Vec<String>,

        #[command(flatten)]
        estimate: EstimateArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write all rows, including failures, to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Print the suggested benchmark for a ticker
    Benchmark {
        /// Stock ticker
        ticker: String,
    },

    /// List the exchange suffix to benchmark table
    Benchmarks,
}

#[derive(Debug, Args)]
struct EstimateArgs {
    /// Benchmark symbol; suggested from the ticker suffix when omitted
    #[arg(long)]
    benchmark: Option<String>,

    /// History window, e.g. 1y, 3y, 18mo
    #[arg(long, conflicts_with_all = ["start", "end"])]
    period: Option<Lookback>,

    /// First date (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Estimation method
    #[arg(long)]
    method: Option<EstimationMethod>,
}

impl EstimateArgs {
    fn window(&self, config: &AppConfig) -> Result<RequestWindow, Box<dyn std::error::Error>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(RequestWindow::Range(DateRange::new(start, end)?)),
            _ => Ok(RequestWindow::Lookback(config.lookback)),
        }
    }

    fn request(
        &self,
        ticker: &str,
        config: &AppConfig,
    ) -> Result<AnalysisRequest, Box<dyn std::error::Error>> {
        let request = AnalysisRequest::new(ticker).with_window(self.window(config)?);
        Ok(match &self.benchmark {
            Some(benchmark) => request.with_benchmark(benchmark),
            None => request,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (period, method) = match &cli.command {
        Commands::Beta { estimate, .. } | Commands::Batch { estimate, .. } => {
            (estimate.period, estimate.method)
        }
        Commands::Benchmark { .. } | Commands::Benchmarks => (None, None),
    };
    let config = build_config(&CliArgs {
        config_file: cli.config.clone(),
        log_level: cli.log_level.clone(),
        lookback: period,
        method,
    })?;

    init_tracing(config.log_level.as_filter_str());
    tracing::debug!(version = betacalc::VERSION, ?config, "configuration loaded");

    match cli.prices {
        Some(path) => {
            let provider = CsvPriceProvider::from_path(&path)?;
            tracing::info!(
                path = %path.display(),
                symbols = provider.symbol_count(),
                "loaded prices from CSV"
            );
            dispatch(&provider, cli.command, &config).await
        }
        None => {
            let provider = YahooQuoteProvider::with_settings(
                config.rate_limit_delay(),
                config.request_timeout(),
            )?;
            dispatch(&provider, cli.command, &config).await
        }
    }
}

async fn dispatch<P: PriceSeriesProvider>(
    provider: &P,
    command: Commands,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Beta {
            ticker,
            estimate,
            format,
            export,
            history,
        } => {
            let request = estimate.request(&ticker, config)?;
            run_beta(
                provider,
                &request,
                config,
                format,
                export.as_deref(),
                history.as_deref(),
            )
            .await?;
        }
        Commands::Batch {
            tickers,
            estimate,
            format,
            export,
        } => {
            let requests = tickers
                .iter()
                .map(|t| estimate.request(t, config))
                .collect::<Result<Vec<_>, _>>()?;
            run_batch(provider, &requests, config, format, export.as_deref()).await?;
        }
        Commands::Benchmark { ticker } => {
            println!("{}", config.resolver().resolve(&ticker));
        }
        Commands::Benchmarks => list_benchmarks(config),
    }

    Ok(())
}

fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

async fn run_beta<P: PriceSeriesProvider>(
    provider: &P,
    request: &AnalysisRequest,
    config: &AppConfig,
    format: OutputFormat,
    export: Option<&Path>,
    history: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner(format!("Fetching prices for {}...", request.ticker))?;
    let outcome = analyze(provider, request, &config.estimator, &config.resolver()).await;
    pb.finish_and_clear();
    let analysis = outcome?;

    if analysis.benchmark_suggested && format == OutputFormat::Text {
        println!(
            "Benchmark {} suggested for {} (override with --benchmark)",
            analysis.result.benchmark_symbol, analysis.result.instrument_symbol
        );
    }

    let report = BetaReport::from_result(&analysis.result);
    match format {
        OutputFormat::Text => print!("{}", report.to_ascii_table()),
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = export {
        let format = ExportFormat::from_path(path)?;
        vec![BetaRecord::from(&analysis.result)].export_to_file(path, format)?;
        tracing::info!(path = %path.display(), "result exported");
    }

    if let Some(path) = history {
        let format = ExportFormat::from_path(path)?;
        let panel =
            AlignedPricePanel::align(&analysis.prices.instrument, &analysis.prices.benchmark)?
                .with_benchmark_label(&analysis.result.benchmark_symbol);
        PriceHistoryExport::from_panel(&panel).export_to_file(path, format)?;
        tracing::info!(path = %path.display(), rows = panel.len(), "price history exported");
    }

    Ok(())
}

async fn run_batch<P: PriceSeriesProvider>(
    provider: &P,
    requests: &[AnalysisRequest],
    config: &AppConfig,
    format: OutputFormat,
    export: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner(format!("Analysing {} tickers...", requests.len()))?;
    let outcomes = analyze_many(
        provider,
        requests,
        &config.estimator,
        &config.resolver(),
        config.concurrency,
    )
    .await;
    pb.finish_and_clear();

    let records: Vec<BetaRecord> = outcomes
        .iter()
        .zip(requests)
        .map(|((ticker, outcome), request)| match outcome {
            Ok(analysis) => BetaRecord::from(&analysis.result),
            Err(e) => BetaRecord::failure(
                ticker.to_uppercase(),
                request.benchmark.clone(),
                e.kind(),
                e.to_string(),
            ),
        })
        .collect();

    match format {
        OutputFormat::Text => print!("{}", batch_ascii_table(&records)),
        OutputFormat::Markdown => print!("{}", batch_markdown(&records)),
        OutputFormat::Json => println!("{}", records.export_to_string(ExportFormat::PrettyJson)?),
    }

    if let Some(path) = export {
        records.export_to_file(path, ExportFormat::from_path(path)?)?;
        tracing::info!(path = %path.display(), rows = records.len(), "batch exported");
    }

    let failed = records.iter().filter(|r| r.error.is_some()).count();
    if failed == records.len() {
        return Err(format!("all {failed} analyses failed").into());
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn batch_ascii_table(records: &[BetaRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{:<14} {:<10} {:>8} {:>6} {:>8} {:>8}  {}\n",
        "Ticker", "Benchmark", "Beta", "N", "R²", "p-value", "Status"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for r in records {
        let status = match (&r.profile, &r.error_kind) {
            (Some(profile), _) => profile.to_string(),
            (None, Some(kind)) => format!("failed: {kind}"),
            (None, None) => String::new(),
        };
        output.push_str(&format!(
            "{:<14} {:<10} {:>8} {:>6} {:>8} {:>8}  {}\n",
            r.ticker,
            r.benchmark.as_deref().unwrap_or("-"),
            fmt_opt(r.beta),
            r.sample_size.map_or_else(|| "-".to_string(), |n| n.to_string()),
            fmt_opt(r.r_squared),
            fmt_opt(r.p_value),
            status
        ));
    }

    output.push_str(&"-".repeat(80));
    output.push('\n');
    for r in records.iter().filter(|r| r.error.is_some()) {
        output.push_str(&format!(
            "{}: {}\n",
            r.ticker,
            r.error.as_deref().unwrap_or_default()
        ));
    }
    if records.iter().any(|r| r.p_value.is_some()) {
        output.push_str(&format!("Note: {SIGNIFICANCE_NOTE}\n"));
    }

    output
}

fn batch_markdown(records: &[BetaRecord]) -> String {
    let mut output = String::from("# Beta batch\n\n");
    output.push_str("| Ticker | Benchmark | Beta | N | R² | p-value | Status |\n");
    output.push_str("|--------|-----------|-----:|--:|---:|--------:|--------|\n");
    for r in records {
        let status = r.profile.map_or_else(
            || r.error.clone().unwrap_or_default(),
            |profile| profile.to_string(),
        );
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            r.ticker,
            r.benchmark.as_deref().unwrap_or("-"),
            fmt_opt(r.beta),
            r.sample_size.map_or_else(|| "-".to_string(), |n| n.to_string()),
            fmt_opt(r.r_squared),
            fmt_opt(r.p_value),
            status
        ));
    }
    output
}

fn list_benchmarks(config: &AppConfig) {
    let resolver = config.resolver();

    println!("Exchange suffix benchmarks:");
    println!("===========================\n");
    for entry in resolver.entries() {
        println!("  {:<6} {}", entry.suffix, entry.benchmark);
    }
    println!("\n  {:<6} {}", "other", resolver.fallback());
}
