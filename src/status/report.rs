// src/status/report.rs

//! Delimited report rendering.
//!
//! Two views of the same [`RunReport`]:
//! - short: job id, stage name, state, captured-stderr path
//! - detailed: adds elapsed walltime, cpu count and memory
//!
//! Both are plain tab-delimited text, written under `logfiles/`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::Result;
use crate::status::parse::RunReport;
use crate::submit::submitter::log_dir;

pub const SHORT_REPORT: &str = "jobs.short.tsv";
pub const DETAILED_REPORT: &str = "jobs.detailed.tsv";

fn dash(opt: &Option<String>) -> &str {
    opt.as_deref().unwrap_or("-")
}

pub fn render_short(report: &RunReport) -> String {
    let mut out = String::from("job_id\tstage\tstate\tstderr\n");
    for row in &report.rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            row.job_id,
            row.stage,
            row.state,
            dash(&row.stderr_path)
        ));
    }
    out
}

pub fn render_detailed(report: &RunReport) -> String {
    let mut out = String::from("job_id\tstage\tstate\telapsed\tcpus\tmem\tstderr\n");
    for row in &report.rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            row.job_id,
            row.stage,
            row.state,
            dash(&row.elapsed),
            dash(&row.cpus),
            dash(&row.memory),
            dash(&row.stderr_path)
        ));
    }
    out
}

/// Write both report views under `<outdir>/logfiles/` and return their
/// paths (short, detailed).
pub fn write_reports(report: &RunReport, outdir: &Path) -> Result<(PathBuf, PathBuf)> {
    let logs = log_dir(outdir);
    fs::create_dir_all(&logs)?;

    let short_path = logs.join(SHORT_REPORT);
    let detailed_path = logs.join(DETAILED_REPORT);
    fs::write(&short_path, render_short(report))?;
    fs::write(&detailed_path, render_detailed(report))?;

    info!(
        short = %short_path.display(),
        detailed = %detailed_path.display(),
        rows = report.rows.len(),
        "wrote job status reports"
    );
    Ok((short_path, detailed_path))
}
