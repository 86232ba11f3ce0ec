// src/transfer/client.rs

//! Transfer client: drives [`TransferApi`] calls through the retry
//! executor and tracks one transaction per upload call.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::{ConveyorError, Result};
use crate::retry::{self, RetryPolicy, Sleeper, ThreadSleeper};
use crate::transfer::api::TransferApi;

/// Commit state of a transfer transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    Aborted,
}

/// An in-flight (or completed) upload transaction.
#[derive(Debug, Clone)]
pub struct TransferTransaction {
    pub transaction_id: String,
    pub dataset_id: String,
    /// File names uploaded so far, in order.
    pub uploaded: Vec<String>,
    pub state: TransactionState,
}

pub struct TransferClient<'a> {
    api: &'a dyn TransferApi,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl<'a> TransferClient<'a> {
    pub fn new(api: &'a dyn TransferApi, policy: RetryPolicy) -> Self {
        Self {
            api,
            policy,
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Substitute the sleeper, e.g. to avoid real backoff in tests.
    pub fn with_sleeper(
        api: &'a dyn TransferApi,
        policy: RetryPolicy,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            api,
            policy,
            sleeper,
        }
    }

    /// Download each remote path into `destination_dir`, returning the
    /// local paths in input order.
    ///
    /// Every request goes through the retry executor; a non-success
    /// status that survives retries is fatal and names the offending
    /// path.
    pub fn download(
        &mut self,
        remote_paths: &[String],
        destination_dir: &Path,
        token: &str,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(destination_dir)?;

        let api = self.api;
        let mut local_paths = Vec::with_capacity(remote_paths.len());
        for remote in remote_paths {
            let bytes = retry::execute(
                || api.download(remote, token),
                &self.policy,
                self.sleeper.as_mut(),
            )
            .map_err(|err| transfer_error("download", remote, err))?;

            let file_name = remote.rsplit('/').next().unwrap_or(remote.as_str());
            let local = destination_dir.join(file_name);
            fs::write(&local, &bytes)?;
            info!(remote, local = %local.display(), bytes = bytes.len(), "downloaded");
            local_paths.push(local);
        }
        Ok(local_paths)
    }

    /// Upload `local_paths` into the given transaction, then commit it.
    ///
    /// Files are uploaded sequentially. A per-file failure is fatal:
    /// already-uploaded files are not rolled back and the transaction
    /// is left open — the overall call still fails and commit is never
    /// attempted. The commit call also goes through the retry executor
    /// and its failure is fatal too.
    pub fn upload(
        &mut self,
        local_paths: &[PathBuf],
        dataset_id: &str,
        transaction_id: &str,
        token: &str,
    ) -> Result<TransferTransaction> {
        let mut transaction = TransferTransaction {
            transaction_id: transaction_id.to_string(),
            dataset_id: dataset_id.to_string(),
            uploaded: Vec::new(),
            state: TransactionState::Open,
        };

        let api = self.api;
        for path in local_paths {
            let result = retry::execute(
                || api.upload(path, dataset_id, transaction_id, token),
                &self.policy,
                self.sleeper.as_mut(),
            );
            if let Err(err) = result {
                warn!(
                    transaction_id,
                    uploaded = transaction.uploaded.len(),
                    "upload failed mid-sequence; transaction left open for manual cleanup"
                );
                return Err(transfer_error(
                    "upload",
                    &path.display().to_string(),
                    err,
                ));
            }
            transaction
                .uploaded
                .push(file_name_of(path));
            info!(path = %path.display(), transaction_id, "uploaded");
        }

        retry::execute(
            || api.commit(dataset_id, transaction_id, token),
            &self.policy,
            self.sleeper.as_mut(),
        )
        .map_err(|err| transfer_error("commit", transaction_id, err))?;

        transaction.state = TransactionState::Committed;
        info!(
            transaction_id,
            files = transaction.uploaded.len(),
            "transaction committed"
        );
        Ok(transaction)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn transfer_error(operation: &str, subject: &str, err: ConveyorError) -> ConveyorError {
    match err {
        ConveyorError::Exhausted { attempts, source } => ConveyorError::Transfer(format!(
            "{operation} of '{subject}' failed after {attempts} attempts: {source}"
        )),
        other => other,
    }
}
