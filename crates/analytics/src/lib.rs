//! `seriesboard-analytics`: period × category reporting engine.
//!
//! Pure engine crate: receives a pre-loaded record snapshot and a report
//! config, returns count/name matrices, churn matrices and breakdown tables.
//! No CLI or IO dependencies.

pub mod breakdown;
pub mod changes;
pub mod classify;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod label;
pub mod matrix;
pub mod model;
pub mod period;
pub mod request;

pub use config::{ReportConfig, Taxonomy};
pub use engine::run;
pub use error::ReportError;
pub use label::{CategoryKind, CategoryLabel};
pub use model::{Report, Snapshot};
pub use period::{available_fiscal_years, PeriodKey};
