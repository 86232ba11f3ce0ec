// src/controller.rs

//! Top-level run state machine.
//!
//! INIT -> LOCKING -> SUBMITTING -> RUNNING, with an absorbing FAILED
//! state reachable from any non-DONE state. RUNNING is asynchronous:
//! the controller hands the run to the scheduler and returns the master
//! job id immediately; the lock is released by the cleanup job, not
//! here. In dry-run mode SUBMITTING is replaced by PLANNING, which only
//! renders the stage graph, and the lock is released synchronously
//! before DONE since no cleanup job will exist to do it.
//!
//! AGGREGATING is re-entered after the run by the `status` subcommand,
//! against whatever the job log contains at that point.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::lock::{self, LockManager};
use crate::stage::StageGraph;
use crate::status::{self, RunReport};
use crate::submit::backend::SchedulerBackend;
use crate::submit::submitter::{self, JobSubmitter, SubmitOptions, SubmitOutcome};

/// Controller phase. See module docs for the transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Locking,
    Planning,
    Submitting,
    Running,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Init => "INIT",
            RunPhase::Locking => "LOCKING",
            RunPhase::Planning => "PLANNING",
            RunPhase::Submitting => "SUBMITTING",
            RunPhase::Running => "RUNNING",
            RunPhase::Aggregating => "AGGREGATING",
            RunPhase::Done => "DONE",
            RunPhase::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Result of a controller run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// `None` for dry runs.
    pub submitted: Option<SubmitOutcome>,
    pub phase: RunPhase,
}

pub struct RunController<B: SchedulerBackend> {
    pub backend: B,
    phase: RunPhase,
}

impl<B: SchedulerBackend> RunController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn transition(&mut self, next: RunPhase) {
        debug!(from = %self.phase, to = %next, "controller transition");
        self.phase = next;
    }

    /// Acquire the lock, then either plan (dry run) or submit.
    pub fn run(
        &mut self,
        cfg: &ConfigFile,
        opts: &SubmitOptions,
        dry_run: bool,
    ) -> Result<RunOutcome> {
        let run_id = format!("{}-{}", opts.job_name, lock::unix_now());
        let lock = LockManager::new(&opts.outdir);

        self.transition(RunPhase::Locking);
        if let Err(err) = lock.acquire(&run_id) {
            self.transition(RunPhase::Failed);
            return Err(err);
        }

        if dry_run {
            self.transition(RunPhase::Planning);
            let result = self.plan(cfg, opts);
            // No cleanup job exists for a plan; release synchronously.
            lock.release()?;
            return match result {
                Ok(()) => {
                    self.transition(RunPhase::Done);
                    Ok(RunOutcome {
                        submitted: None,
                        phase: self.phase,
                    })
                }
                Err(err) => {
                    self.transition(RunPhase::Failed);
                    Err(err)
                }
            };
        }

        self.transition(RunPhase::Submitting);
        let mut submitter = JobSubmitter::new(&mut self.backend);
        match submitter.submit_master(cfg, opts) {
            Ok(outcome) => {
                // The run continues out-of-process; the lock stays held
                // until the cleanup job removes it.
                self.transition(RunPhase::Running);
                info!(
                    master_job_id = %outcome.master_job_id,
                    "master job submitted; run continues on the scheduler"
                );
                Ok(RunOutcome {
                    submitted: Some(outcome),
                    phase: self.phase,
                })
            }
            Err(err) => {
                error!(error = %err, "submission failed; releasing lock");
                // Submission aborted before the cleanup job existed, so
                // nothing else will release the lock.
                lock.release()?;
                self.transition(RunPhase::Failed);
                Err(err)
            }
        }
    }

    /// Render the stage graph and resource profiles without contacting
    /// the scheduler; also writes a timestamped plan log.
    fn plan(&mut self, cfg: &ConfigFile, opts: &SubmitOptions) -> Result<()> {
        let plan = render_plan(cfg)?;
        print!("{plan}");

        let logs = submitter::log_dir(&opts.outdir);
        fs::create_dir_all(&logs)?;
        let plan_path = logs.join(format!("plan.{}.log", lock::unix_now()));
        fs::write(&plan_path, &plan)?;
        info!(plan = %plan_path.display(), "wrote dry-run plan");
        Ok(())
    }
}

/// Textual plan: stages in submission order with dependencies and
/// effective resource profiles.
pub fn render_plan(cfg: &ConfigFile) -> Result<String> {
    let graph = StageGraph::from_config(cfg)?;

    let mut out = String::from("conveyor plan (dry-run)\n");
    out.push_str(&format!("stages ({}):\n", graph.len()));
    for name in graph.stages() {
        let stage = match cfg.stage.get(name) {
            Some(stage) => stage,
            None => continue,
        };
        let profile = stage.effective_profile(&cfg.defaults);

        out.push_str(&format!("  - {name}\n"));
        out.push_str(&format!("      cmd: {}\n", stage.cmd));
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            out.push_str(&format!("      after: {:?}\n", deps));
        }
        if let Some(partition) = &profile.partition {
            out.push_str(&format!("      partition: {partition}\n"));
        }
        out.push_str(&format!(
            "      time: {}  mem: {}  cpus: {}\n",
            profile.time, profile.memory, profile.cpus
        ));
        if let Some(disk) = &profile.disk {
            out.push_str(&format!("      disk: {disk}\n"));
        }
    }
    Ok(out)
}

/// Post-run status aggregation (the AGGREGATING phase): parse the job
/// log and write both report views.
pub fn aggregate_run(outdir: &Path) -> Result<(RunReport, (PathBuf, PathBuf))> {
    debug!(outdir = %outdir.display(), "aggregating job status");
    let report = status::aggregate(&submitter::job_log_path(outdir))?;
    let paths = status::write_reports(&report, outdir)?;
    Ok((report, paths))
}
