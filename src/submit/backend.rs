// src/submit/backend.rs

//! Pluggable scheduler backend abstraction.
//!
//! The submitter talks to a `SchedulerBackend` instead of shelling out
//! directly. This makes it easy to swap in a recording backend in tests
//! while keeping the production `sbatch` implementation in [`slurm`].
//!
//! [`slurm`]: crate::submit::slurm

use std::fmt;
use std::path::PathBuf;

use crate::config::model::ResourceProfile;
use crate::errors::Result;

/// Scheduler-assigned job identifier. Opaque; never parsed beyond
/// trimming the `--parsable` cluster suffix.
pub type JobId = String;

/// Dependency link attached to a submission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Start only after all listed jobs completed successfully.
    AfterOk(Vec<JobId>),
    /// Start after the listed job reaches any terminal state,
    /// success or failure.
    AfterAny(JobId),
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::AfterOk(ids) => write!(f, "afterok:{}", ids.join(":")),
            Dependency::AfterAny(id) => write!(f, "afterany:{}", id),
        }
    }
}

/// One scheduler submission: job name, command, dependency link,
/// resource profile and container bind mounts.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub job_name: String,
    /// Stage this job instantiates; `None` for the master and cleanup
    /// jobs.
    pub stage: Option<String>,
    /// Argv of the command the job runs.
    pub command: Vec<String>,
    pub dependency: Option<Dependency>,
    pub profile: Option<ResourceProfile>,
    /// Paths bound into the stage's container filesystem.
    pub bind_paths: Vec<String>,
    /// Where the job's stdout/stderr are redirected, when fixed.
    pub log_path: Option<PathBuf>,
}

/// Trait abstracting how submission requests reach the scheduler.
///
/// Production code uses [`SlurmBackend`]; tests use
/// [`RecordingBackend`], which records requests and hands out
/// deterministic job ids.
///
/// [`SlurmBackend`]: crate::submit::slurm::SlurmBackend
/// [`RecordingBackend`]: crate::submit::mock::RecordingBackend
pub trait SchedulerBackend {
    /// Issue one submission call and return the scheduler-assigned
    /// job id. Any failure is fatal to the run.
    fn submit(&mut self, request: &SubmissionRequest) -> Result<JobId>;
}

impl<B: SchedulerBackend + ?Sized> SchedulerBackend for &mut B {
    fn submit(&mut self, request: &SubmissionRequest) -> Result<JobId> {
        (**self).submit(request)
    }
}
