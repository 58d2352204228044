#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/betacalc/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;

// Re-export main types from sub-crates
pub use betacalc_core as estimation;
pub use betacalc_data as data;
pub use betacalc_output as output;

pub use analysis::{Analysis, AnalysisError, AnalysisRequest, analyze, analyze_many};
pub use betacalc_core::{
    BenchmarkResolver, BetaResult, CoreError, EstimationMethod, EstimatorConfig, compute_beta,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
