#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/betacalc/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;

pub use export::{
    BetaRecord, ExportError, ExportFormat, Exporter, PriceHistoryExport, PriceHistoryRow,
    RecordStatus,
};
pub use report::{BetaReport, ReportError, SIGNIFICANCE_NOTE};
