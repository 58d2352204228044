#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/betacalc/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod csv_source;
pub mod error;
pub mod frame;
pub mod provider;
pub mod request;
pub mod yahoo;

pub use csv_source::CsvPriceProvider;
pub use error::{DataError, Result};
pub use provider::{PricePair, PriceSeriesProvider, StaticProvider};
pub use request::{DateRange, Lookback, PriceRequest, RequestWindow};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
