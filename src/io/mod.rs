//! Report output.
//!
//! Writers for summary tables, per-step error series and spectral curves in
//! small plain-text formats that load directly into a spreadsheet or
//! `numpy.loadtxt`. See [`report`] for the layouts.

pub mod report;

pub use report::{ReportError, write_error_series, write_spectral_curve, write_summary_table};
