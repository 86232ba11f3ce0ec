// src/status/mod.rs

//! Job status aggregation and report generation.
//!
//! - [`parse`] reads the per-run job log and classifies every
//!   submitted job.
//! - [`report`] renders the short and detailed delimited reports.

pub mod parse;
pub mod report;

pub use parse::{aggregate, JobRow, JobState, RunReport};
pub use report::{render_detailed, render_short, write_reports};
