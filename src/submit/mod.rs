// src/submit/mod.rs

//! Job submission.
//!
//! - [`backend`] defines the [`SchedulerBackend`] trait and the
//!   submission request/dependency types.
//! - [`slurm`] is the production backend (`sbatch --parsable`).
//! - [`mock`] is a recording backend for tests.
//! - [`submitter`] turns a validated stage graph into one master
//!   submission, one child submission per stage, and a trailing
//!   cleanup submission.

pub mod backend;
pub mod mock;
pub mod slurm;
pub mod submitter;

pub use backend::{Dependency, JobId, SchedulerBackend, SubmissionRequest};
pub use mock::RecordingBackend;
pub use slurm::SlurmBackend;
pub use submitter::{JobSubmitter, SubmitOptions, SubmitOutcome};
