// src/submit/submitter.rs

//! Translates a validated stage graph into scheduler submissions.
//!
//! Submission order for one run:
//!
//! 1. master job (run wrapper; stdout/stderr to `logfiles/master.log`)
//! 2. one child job per stage, in topological order, each with an
//!    `afterok` dependency on its upstream stages' job ids (roots
//!    depend on the master job)
//! 3. a cleanup job with `afterany:<master>`, so the image cache and
//!    the lock marker are tidied up even when the run fails
//!
//! Any submission failure aborts before the cleanup job is scheduled; a
//! failed run therefore leaves nothing dangling for the cleanup job to
//! race against.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::errors::{ConveyorError, Result};
use crate::lock::{self, LOCK_FILE};
use crate::stage::StageGraph;
use crate::submit::backend::{Dependency, JobId, SchedulerBackend, SubmissionRequest};

pub const LOG_DIR: &str = "logfiles";
pub const MASTER_LOG: &str = "master.log";
pub const MASTER_JOBID_LOG: &str = "mjobid.log";
pub const JOB_LOG: &str = "jobs.log";

pub fn log_dir(outdir: &Path) -> PathBuf {
    outdir.join(LOG_DIR)
}

pub fn job_log_path(outdir: &Path) -> PathBuf {
    log_dir(outdir).join(JOB_LOG)
}

pub fn master_jobid_path(outdir: &Path) -> PathBuf {
    log_dir(outdir).join(MASTER_JOBID_LOG)
}

/// Immutable per-run submission options, passed by reference into the
/// submitter instead of collected into shared mutable state.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub job_name: String,
    /// Additional container bind paths (input data, references).
    pub bind_paths: Vec<String>,
    pub outdir: PathBuf,
    /// Image cache directory; defaults to `<outdir>/.cache`.
    pub cache_dir: Option<PathBuf>,
    /// Compute-node temp directory; defaults to the output directory.
    pub tmp_dir: Option<PathBuf>,
}

impl SubmitOptions {
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.outdir.join(".cache"))
    }

    pub fn effective_tmp_dir(&self) -> PathBuf {
        self.tmp_dir.clone().unwrap_or_else(|| self.outdir.clone())
    }
}

/// Jobs created for one run.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub master_job_id: JobId,
    /// (stage name, job id) pairs in submission order.
    pub stage_jobs: Vec<(String, JobId)>,
    pub cleanup_job_id: JobId,
}

pub struct JobSubmitter<B: SchedulerBackend> {
    backend: B,
}

impl<B: SchedulerBackend> JobSubmitter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Submit the master job, all stage jobs and the cleanup job.
    ///
    /// Fails fast with [`ConveyorError::MissingArgument`] before any
    /// filesystem or scheduler side effect when required options are
    /// empty.
    pub fn submit_master(
        &mut self,
        cfg: &ConfigFile,
        opts: &SubmitOptions,
    ) -> Result<SubmitOutcome> {
        validate_options(opts)?;

        let graph = StageGraph::from_config(cfg)?;
        let bind_paths = resolve_bind_paths(opts);
        prepare_workdir(opts)?;

        // Master job: wraps the run, owns the fixed per-run log.
        let master_request = SubmissionRequest {
            job_name: opts.job_name.clone(),
            stage: None,
            command: master_command(opts, &bind_paths),
            dependency: None,
            profile: None,
            bind_paths: bind_paths.clone(),
            log_path: Some(log_dir(&opts.outdir).join(MASTER_LOG)),
        };
        let master_job_id = self.backend.submit(&master_request)?;
        record_master_job_id(&opts.outdir, &master_job_id)?;
        append_job_log(&opts.outdir, &master_job_id, &opts.job_name)?;

        // Stage jobs, in topological order with explicit dependency
        // links; the graph is resolved exactly once, here.
        let mut stage_jobs: Vec<(String, JobId)> = Vec::with_capacity(graph.len());
        for stage_name in graph.stages() {
            let stage_cfg = cfg.stage.get(stage_name).ok_or_else(|| {
                ConveyorError::Config(format!("stage '{}' missing from config", stage_name))
            })?;

            let upstream_ids: Vec<JobId> = graph
                .dependencies_of(stage_name)
                .iter()
                .filter_map(|dep| {
                    stage_jobs
                        .iter()
                        .find(|(name, _)| name == dep)
                        .map(|(_, id)| id.clone())
                })
                .collect();
            let dependency = if upstream_ids.is_empty() {
                // Roots start once the master job is running.
                Dependency::AfterOk(vec![master_job_id.clone()])
            } else {
                Dependency::AfterOk(upstream_ids)
            };

            let request = SubmissionRequest {
                job_name: stage_name.to_string(),
                stage: Some(stage_name.to_string()),
                command: vec![
                    "/bin/bash".to_string(),
                    "-c".to_string(),
                    stage_cfg.cmd.clone(),
                ],
                dependency: Some(dependency),
                profile: Some(stage_cfg.effective_profile(&cfg.defaults)),
                bind_paths: bind_paths.clone(),
                log_path: None,
            };
            let job_id = self.backend.submit(&request)?;
            append_job_log(&opts.outdir, &job_id, stage_name)?;
            debug!(stage = stage_name, job_id = %job_id, "submitted stage job");
            stage_jobs.push((stage_name.to_string(), job_id));
        }

        // Cleanup job: fire-and-forget, scheduled `afterany` the master
        // job so the cache and lock are removed on success and failure
        // alike.
        let cleanup_name = format!("{}:cleanup", opts.job_name);
        let cleanup_request = SubmissionRequest {
            job_name: cleanup_name.clone(),
            stage: None,
            command: cleanup_command(opts),
            dependency: Some(Dependency::AfterAny(master_job_id.clone())),
            profile: None,
            bind_paths: Vec::new(),
            log_path: None,
        };
        let cleanup_job_id = self.backend.submit(&cleanup_request)?;
        append_job_log(&opts.outdir, &cleanup_job_id, &cleanup_name)?;

        info!(
            master_job_id = %master_job_id,
            stages = stage_jobs.len(),
            cleanup_job_id = %cleanup_job_id,
            "run submitted"
        );

        Ok(SubmitOutcome {
            master_job_id,
            stage_jobs,
            cleanup_job_id,
        })
    }
}

fn validate_options(opts: &SubmitOptions) -> Result<()> {
    if opts.job_name.trim().is_empty() {
        return Err(ConveyorError::MissingArgument("job-name".to_string()));
    }
    if opts.bind_paths.is_empty() || opts.bind_paths.iter().any(|p| p.trim().is_empty()) {
        return Err(ConveyorError::MissingArgument("bind-paths".to_string()));
    }
    Ok(())
}

/// Fold the output and temp directories into the user-provided bind
/// paths when not already present.
fn resolve_bind_paths(opts: &SubmitOptions) -> Vec<String> {
    let mut paths = opts.bind_paths.clone();
    let outdir = opts.outdir.display().to_string();
    let tmp = opts.effective_tmp_dir().display().to_string();
    if !paths.contains(&outdir) {
        paths.push(outdir);
    }
    if !paths.contains(&tmp) {
        paths.push(tmp);
    }
    paths
}

/// Ensure `logfiles/` and the image cache exist; rotate a pre-existing
/// master log so earlier runs are not clobbered.
fn prepare_workdir(opts: &SubmitOptions) -> Result<()> {
    let logs = log_dir(&opts.outdir);
    fs::create_dir_all(&logs)?;

    let master_log = logs.join(MASTER_LOG);
    if master_log.is_file() {
        let rotated = logs.join(format!("master.{}.log", lock::unix_now()));
        fs::rename(&master_log, &rotated)?;
        debug!(rotated = %rotated.display(), "rotated previous master log");
    }

    let cache = opts.effective_cache_dir();
    fs::create_dir_all(&cache)?;
    Ok(())
}

/// The master job re-enters the pipeline runner script shipped in the
/// working directory, carrying the run parameters as explicit argv.
fn master_command(opts: &SubmitOptions, bind_paths: &[String]) -> Vec<String> {
    vec![
        opts.outdir.join("resources").join("runner").display().to_string(),
        "slurm".to_string(),
        "-j".to_string(),
        opts.job_name.clone(),
        "-b".to_string(),
        bind_paths.join(","),
        "-o".to_string(),
        opts.outdir.display().to_string(),
        "-c".to_string(),
        opts.effective_cache_dir().display().to_string(),
        "-t".to_string(),
        opts.effective_tmp_dir().display().to_string(),
    ]
}

fn cleanup_command(opts: &SubmitOptions) -> Vec<String> {
    let cache = opts.effective_cache_dir();
    let marker = opts.outdir.join(LOCK_FILE);
    vec![
        "/bin/bash".to_string(),
        "-c".to_string(),
        format!(
            "rm -rf '{}' && rm -f '{}'",
            cache.display(),
            marker.display()
        ),
    ]
}

fn record_master_job_id(outdir: &Path, job_id: &JobId) -> Result<()> {
    fs::write(master_jobid_path(outdir), format!("{job_id}\n"))?;
    Ok(())
}

/// Append one `Submitted batch job <id> (<name>)` event line to the
/// per-run job log consumed by the status aggregator.
fn append_job_log(outdir: &Path, job_id: &JobId, name: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(job_log_path(outdir))?;
    writeln!(file, "Submitted batch job {} ({})", job_id, name)?;
    Ok(())
}
