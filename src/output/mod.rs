//! Output module for check results and reports
//!
//! This module handles:
//! - The per-link [`LinkResult`] records and the run-level [`CheckReport`]
//! - Rendering a report as text, JSON or CSV

mod format;
mod report;

pub use format::{render_report, OutputFormat};
pub use report::{CheckReport, FailureDetail, LinkResult};
