// src/submit/mock.rs

//! Recording scheduler backend for tests.

use std::collections::HashSet;

use crate::errors::{ConveyorError, Result};
use crate::submit::backend::{JobId, SchedulerBackend, SubmissionRequest};

/// A fake scheduler that:
/// - records every submission request, in order
/// - hands out deterministic job ids ("1001", "1002", ...)
/// - optionally rejects submissions for configured job names.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub submitted: Vec<SubmissionRequest>,
    pub assigned_ids: Vec<JobId>,
    fail_job_names: HashSet<String>,
    next_id: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make submissions for `job_name` fail with a submission error.
    pub fn fail_for(mut self, job_name: &str) -> Self {
        self.fail_job_names.insert(job_name.to_string());
        self
    }

    pub fn submitted_names(&self) -> Vec<&str> {
        self.submitted.iter().map(|r| r.job_name.as_str()).collect()
    }
}

impl SchedulerBackend for RecordingBackend {
    fn submit(&mut self, request: &SubmissionRequest) -> Result<JobId> {
        if self.fail_job_names.contains(&request.job_name) {
            return Err(ConveyorError::Submission(format!(
                "scheduler rejected job '{}'",
                request.job_name
            )));
        }

        self.submitted.push(request.clone());
        self.next_id += 1;
        let id = format!("{}", 1000 + self.next_id);
        self.assigned_ids.push(id.clone());
        Ok(id)
    }
}
