//! Default benchmark index lookup by exchange suffix.
//!
//! Tickers listed outside the US carry a Yahoo-style exchange suffix
//! (`RELIANCE.NS`, `0700.HK`, `SAP.DE`). The resolver maps that suffix to the
//! exchange's headline index so a sensible benchmark is pre-selected. The
//! result is only a suggestion; callers may override it.

use serde::{Deserialize, Serialize};

/// Benchmark used when no suffix matches (S&P 500).
pub const DEFAULT_FALLBACK_BENCHMARK: &str = "^GSPC";

/// Ordered default suffix table. First match wins.
pub const DEFAULT_SUFFIX_BENCHMARKS: &[(&str, &str)] = &[
    (".NS", "^NSEI"),   // NSE India: Nifty 50
    (".BO", "^BSESN"),  // BSE India: Sensex
    (".HK", "^HSI"),    // Hong Kong: Hang Seng
    (".L", "^FTSE"),    // London: FTSE 100
    (".T", "^N225"),    // Tokyo: Nikkei 225
    (".DE", "^GDAXI"),  // Xetra: DAX
    (".AX", "^AXJO"),   // ASX 200
    (".TO", "^GSPTSE"), // Toronto: S&P/TSX Composite
    (".SI", "^STI"),    // Singapore: Straits Times
];

/// One entry of the suffix table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixBenchmark {
    /// Exchange suffix including the dot, e.g. `.NS`.
    pub suffix: String,
    /// Benchmark index symbol, e.g. `^NSEI`.
    pub benchmark: String,
}

impl SuffixBenchmark {
    /// Create a new table entry.
    pub fn new(suffix: impl Into<String>, benchmark: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            benchmark: benchmark.into(),
        }
    }
}

/// Maps a ticker to its default benchmark index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkResolver {
    entries: Vec<SuffixBenchmark>,
    fallback: String,
}

impl BenchmarkResolver {
    /// Resolver with the default table and the S&P 500 fallback.
    pub fn new() -> Self {
        Self::with_table(
            DEFAULT_SUFFIX_BENCHMARKS
                .iter()
                .map(|&(suffix, benchmark)| SuffixBenchmark::new(suffix, benchmark)),
            DEFAULT_FALLBACK_BENCHMARK,
        )
    }

    /// Resolver with a custom ordered table.
    ///
    /// Suffixes are matched case-insensitively.
    pub fn with_table(
        entries: impl IntoIterator<Item = SuffixBenchmark>,
        fallback: impl Into<String>,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| SuffixBenchmark::new(e.suffix.to_uppercase(), e.benchmark))
            .collect();
        Self {
            entries,
            fallback: fallback.into(),
        }
    }

    /// Suggested benchmark for `ticker`.
    ///
    /// Returns the benchmark of the first entry whose suffix ends the ticker,
    /// otherwise the fallback.
    pub fn resolve(&self, ticker: &str) -> &str {
        let ticker = ticker.trim().to_uppercase();
        self.entries
            .iter()
            .find(|e| ticker.ends_with(e.suffix.as_str()))
            .map_or(self.fallback.as_str(), |e| e.benchmark.as_str())
    }

    /// Table entries in match order.
    pub fn entries(&self) -> &[SuffixBenchmark] {
        &self.entries
    }

    /// Benchmark used when nothing matches.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for BenchmarkResolver {
    fn default() -> Self {
        Self::new()
    }
}
