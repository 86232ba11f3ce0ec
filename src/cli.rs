// src/cli.rs

//! Command-line interface.
//!
//! `conveyor submit slurm --job-name demo --bind-paths /a,/b` submits a
//! run; `conveyor unlock` clears a working directory's lock marker;
//! `conveyor status` aggregates the job log into status reports.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "conveyor",
    version,
    about = "Batch-pipeline execution controller"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (overrides the CONVEYOR_LOG environment variable).
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a pipeline run to a cluster scheduler.
    Submit {
        /// Scheduler to submit to.
        #[arg(value_enum)]
        executor: Executor,

        /// Name of the master job.
        #[arg(long)]
        job_name: String,

        /// Comma-separated container bind paths (input data, references).
        #[arg(long)]
        bind_paths: String,

        /// Working (output) directory of the run.
        #[arg(long, default_value = ".")]
        outdir: PathBuf,

        /// Stage graph / resource profile config file.
        #[arg(long, default_value = "Conveyor.toml")]
        config: PathBuf,

        /// Image cache directory (default: <outdir>/.cache).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Compute-node temp directory (default: the output directory).
        #[arg(long)]
        tmp_dir: Option<PathBuf>,

        /// Render the stage graph and resource profiles without
        /// contacting the scheduler.
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove a working directory's lock marker.
    ///
    /// The caller is responsible for making sure the owning run has
    /// actually stopped; this command does not verify it.
    Unlock {
        #[arg(long, default_value = ".")]
        outdir: PathBuf,
    },

    /// Aggregate the job log into consolidated status reports.
    Status {
        #[arg(long, default_value = ".")]
        outdir: PathBuf,

        /// Print the detailed view (adds resource accounting).
        #[arg(long)]
        detailed: bool,
    },

    /// Download reference files from the remote data service.
    ///
    /// Reads the service URL from `[transfer]` in the config file and
    /// the bearer token from the CONVEYOR_TOKEN environment variable.
    Fetch {
        /// Remote paths to download, comma-separated.
        #[arg(long)]
        paths: String,

        /// Local directory the files are written into.
        #[arg(long, default_value = ".")]
        dest: PathBuf,

        #[arg(long, default_value = "Conveyor.toml")]
        config: PathBuf,
    },

    /// Upload result files into a remote dataset transaction and commit it.
    Push {
        /// Local files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        dataset_id: String,

        #[arg(long)]
        transaction_id: String,

        #[arg(long, default_value = "Conveyor.toml")]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Executor {
    Slurm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
