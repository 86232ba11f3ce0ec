// src/status/parse.rs

//! Per-run job log parsing.
//!
//! The job log is an append-only text file with one line per scheduler
//! event:
//!
//! ```text
//! Submitted batch job 1001 (align)
//! Job 1001 (align) COMPLETED elapsed=00:12:41 cpus=16 mem=32g
//! Job 1002 (quantify) FAILED stderr=logfiles/quantify.err
//! ```
//!
//! Submission lines register jobs in chronological order; terminal
//! lines attach states and accounting fields. A job id that appears in
//! several submission lines (resubmission after failure) is reported
//! once per appearance, never de-duplicated — operators need the full
//! resubmission history. Jobs with no terminal line by parse time are
//! reported as UNKNOWN, never silently dropped.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::errors::Result;

/// Classified state of one submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    /// No terminal state recorded by the time the log was parsed.
    Unknown,
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // CANCELLED lines may carry a suffix ("CANCELLED+", "CANCELLED by 123").
        let token = s.trim().to_uppercase();
        match token.as_str() {
            "PENDING" => Ok(JobState::Pending),
            "RUNNING" => Ok(JobState::Running),
            "COMPLETED" => Ok(JobState::Completed),
            "FAILED" | "TIMEOUT" | "OUT_OF_MEMORY" | "NODE_FAIL" => Ok(JobState::Failed),
            other if other.starts_with("CANCELLED") => Ok(JobState::Cancelled),
            other => Err(format!("unrecognized job state: {other}")),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
            JobState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// One report row: a single appearance of a job id in the log.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub job_id: String,
    pub stage: String,
    pub state: JobState,
    pub stderr_path: Option<String>,
    pub elapsed: Option<String>,
    pub cpus: Option<String>,
    pub memory: Option<String>,
}

/// Consolidated report for one run, rows in chronological order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rows: Vec<JobRow>,
}

fn submitted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Submitted batch job (\S+)(?: \(([^)]+)\))?\s*$")
            .expect("submission line regex")
    })
}

fn terminal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Job (\S+)(?: \(([^)]+)\))? (\S+)(.*)$").expect("terminal line regex")
    })
}

fn kv_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)=(\S+)").expect("key=value regex"))
}

/// Parse the job log at `log_path` into a consolidated [`RunReport`].
pub fn aggregate(log_path: &Path) -> Result<RunReport> {
    let contents = fs::read_to_string(log_path)?;
    let mut report = RunReport::default();

    for line in contents.lines() {
        if let Some(caps) = submitted_re().captures(line) {
            report.rows.push(JobRow {
                job_id: caps[1].to_string(),
                stage: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
                state: JobState::Unknown,
                stderr_path: None,
                elapsed: None,
                cpus: None,
                memory: None,
            });
            continue;
        }

        if let Some(caps) = terminal_re().captures(line) {
            let job_id = caps[1].to_string();
            let stage = caps.get(2).map(|m| m.as_str().to_string());
            let state = match JobState::from_str(&caps[3]) {
                Ok(state) => state,
                Err(err) => {
                    warn!(line, %err, "ignoring malformed state line");
                    continue;
                }
            };

            let mut stderr_path = None;
            let mut elapsed = None;
            let mut cpus = None;
            let mut memory = None;
            for kv in kv_re().captures_iter(&caps[4]) {
                let value = kv[2].to_string();
                match &kv[1] {
                    "stderr" => stderr_path = Some(value),
                    "elapsed" => elapsed = Some(value),
                    "cpus" => cpus = Some(value),
                    "mem" => memory = Some(value),
                    _ => {}
                }
            }

            // Attach to the earliest appearance of this job id that has
            // no state yet; resubmitted ids fill in order.
            match report
                .rows
                .iter_mut()
                .find(|row| row.job_id == job_id && row.state == JobState::Unknown)
            {
                Some(row) => {
                    row.state = state;
                    if let Some(stage) = stage {
                        row.stage = stage;
                    }
                    row.stderr_path = stderr_path;
                    row.elapsed = elapsed;
                    row.cpus = cpus;
                    row.memory = memory;
                }
                None => {
                    // Terminal line with no matching submission; keep
                    // the row rather than dropping the event.
                    report.rows.push(JobRow {
                        job_id,
                        stage: stage.unwrap_or_default(),
                        state,
                        stderr_path,
                        elapsed,
                        cpus,
                        memory,
                    });
                }
            }
        }
    }

    Ok(report)
}
