// src/submit/slurm.rs

//! SLURM scheduler backend.
//!
//! Shells out to `sbatch --parsable`; the printed job id is captured
//! from stdout. Every invocation goes through the retry executor, so a
//! transiently unavailable scheduler is retried with backoff before the
//! failure surfaces as [`ConveyorError::Submission`].

use std::process::Command;

use tracing::{debug, info};

use crate::errors::{ConveyorError, Result};
use crate::retry::{self, RetryPolicy, Sleeper, ThreadSleeper};
use crate::submit::backend::{JobId, SchedulerBackend, SubmissionRequest};

pub struct SlurmBackend {
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl SlurmBackend {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Substitute the sleeper, e.g. to avoid real backoff in tests.
    pub fn with_sleeper(policy: RetryPolicy, sleeper: Box<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    fn sbatch_args(request: &SubmissionRequest) -> Vec<String> {
        let mut args = vec![
            "--parsable".to_string(),
            format!("--job-name={}", request.job_name),
        ];

        if let Some(dep) = &request.dependency {
            args.push(format!("--dependency={}", dep));
        }
        if let Some(profile) = &request.profile {
            if let Some(partition) = &profile.partition {
                args.push(format!("--partition={}", partition));
            }
            args.push(format!("--time={}", profile.time));
            args.push(format!("--mem={}", profile.memory));
            args.push(format!("--cpus-per-task={}", profile.cpus));
            if let Some(disk) = &profile.disk {
                args.push(format!("--gres=lscratch:{}", disk));
            }
        }
        if let Some(log_path) = &request.log_path {
            // Master stdout/stderr both go to the fixed per-run log.
            args.push(format!("--output={}", log_path.display()));
            args.push(format!("--error={}", log_path.display()));
        }
        if !request.bind_paths.is_empty() {
            args.push(format!(
                "--export=ALL,CONVEYOR_BIND_PATHS={}",
                request.bind_paths.join(",")
            ));
        }

        args.extend(request.command.iter().cloned());
        args
    }

    fn run_sbatch(args: &[String]) -> anyhow::Result<JobId> {
        let output = Command::new("sbatch").args(args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "sbatch exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        // `--parsable` prints `<jobid>[;<cluster>]`.
        let job_id = stdout
            .trim()
            .split(';')
            .next()
            .unwrap_or("")
            .to_string();
        if job_id.is_empty() {
            anyhow::bail!("sbatch produced no job id on stdout");
        }
        Ok(job_id)
    }
}

impl SchedulerBackend for SlurmBackend {
    fn submit(&mut self, request: &SubmissionRequest) -> Result<JobId> {
        let args = Self::sbatch_args(request);
        debug!(job_name = %request.job_name, ?args, "submitting via sbatch");

        let job_id = retry::execute(|| Self::run_sbatch(&args), &self.policy, self.sleeper.as_mut())
            .map_err(|err| match err {
                ConveyorError::Exhausted { attempts, source } => ConveyorError::Submission(
                    format!(
                        "sbatch for job '{}' failed after {} attempts: {}",
                        request.job_name, attempts, source
                    ),
                ),
                other => other,
            })?;

        info!(job_name = %request.job_name, job_id = %job_id, "submitted batch job");
        Ok(job_id)
    }
}
