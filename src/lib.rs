// src/lib.rs

pub mod cli;
pub mod config;
pub mod controller;
pub mod errors;
pub mod lock;
pub mod logging;
pub mod retry;
pub mod stage;
pub mod status;
pub mod submit;
pub mod transfer;

use std::path::Path;

use tracing::info;

use crate::cli::{CliArgs, Command, Executor};
use crate::config::loader::{load_and_validate, load_from_path};
use crate::controller::RunController;
use crate::errors::{ConveyorError, Result};
use crate::lock::LockManager;
use crate::retry::RetryPolicy;
use crate::submit::{SlurmBackend, SubmitOptions};
use crate::transfer::{ApiConfig, HttpTransferApi, TransferClient};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - lock manager / submitter / controller
/// - scheduler backend
/// - status aggregation
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Submit {
            executor,
            job_name,
            bind_paths,
            outdir,
            config,
            cache_dir,
            tmp_dir,
            dry_run,
        } => {
            let cfg = load_and_validate(&config)?;
            let opts = SubmitOptions {
                job_name,
                bind_paths: split_bind_paths(&bind_paths),
                outdir,
                cache_dir,
                tmp_dir,
            };

            let backend = match executor {
                Executor::Slurm => SlurmBackend::new(RetryPolicy::default()),
            };
            let mut controller = RunController::new(backend);
            let outcome = controller.run(&cfg, &opts, dry_run)?;

            if let Some(submitted) = outcome.submitted {
                // Relay the id recorded on disk so wrapping tooling can
                // capture it from stdout.
                let recorded = read_master_job_id(&opts.outdir)
                    .unwrap_or_else(|| submitted.master_job_id.clone());
                println!("Successfully submitted master job: {recorded}");
            }
            Ok(())
        }

        Command::Unlock { outdir } => {
            LockManager::new(&outdir).force_unlock()?;
            println!("Successfully unlocked the working directory: {}", outdir.display());
            Ok(())
        }

        Command::Status { outdir, detailed } => {
            let (report, (short_path, detailed_path)) = controller::aggregate_run(&outdir)?;
            info!(
                rows = report.rows.len(),
                short = %short_path.display(),
                detailed = %detailed_path.display(),
                "status aggregated"
            );
            if detailed {
                print!("{}", status::render_detailed(&report));
            } else {
                print!("{}", status::render_short(&report));
            }
            Ok(())
        }

        Command::Fetch {
            paths,
            dest,
            config,
        } => {
            let api = transfer_api(&config)?;
            let token = transfer_token()?;
            let remote_paths = split_bind_paths(&paths);

            let mut client = TransferClient::new(&api, RetryPolicy::default());
            let local = client.download(&remote_paths, &dest, &token)?;
            for path in &local {
                println!("{}", path.display());
            }
            Ok(())
        }

        Command::Push {
            files,
            dataset_id,
            transaction_id,
            config,
        } => {
            let api = transfer_api(&config)?;
            let token = transfer_token()?;

            let mut client = TransferClient::new(&api, RetryPolicy::default());
            let transaction = client.upload(&files, &dataset_id, &transaction_id, &token)?;
            println!(
                "Committed transaction {} ({} files)",
                transaction.transaction_id,
                transaction.uploaded.len()
            );
            Ok(())
        }
    }
}

/// Build the production transfer API from `[transfer]` in the config
/// file, with the `CONVEYOR_PROXY` override applied.
fn transfer_api(config: &Path) -> Result<HttpTransferApi> {
    let raw = load_from_path(config)?;
    let base_url = raw.transfer.base_url.ok_or_else(|| {
        ConveyorError::Config("[transfer].base_url is not set".to_string())
    })?;

    let mut api_config = ApiConfig::new(base_url);
    api_config.proxy = raw.transfer.proxy;
    Ok(HttpTransferApi::new(api_config.with_env_proxy())?)
}

fn transfer_token() -> Result<String> {
    std::env::var("CONVEYOR_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConveyorError::MissingArgument("CONVEYOR_TOKEN".to_string()))
}

/// Split the comma-separated `--bind-paths` value, dropping empty
/// segments (a fully empty value surfaces later as MissingArgument).
fn split_bind_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn read_master_job_id(outdir: &Path) -> Option<String> {
    std::fs::read_to_string(submit::submitter::master_jobid_path(outdir))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
