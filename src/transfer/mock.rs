// src/transfer/mock.rs

//! In-memory transfer API for tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::transfer::api::TransferApi;

/// A fake transfer service that:
/// - serves configured byte blobs for download paths
/// - records uploaded file names and commit calls
/// - optionally fails every attempt for one configured file name or
///   remote path (simulating a persistent HTTP error).
#[derive(Debug, Default)]
pub struct MockTransferApi {
    remote_files: HashMap<String, Vec<u8>>,
    fail_upload_of: Option<String>,
    fail_download_of: Option<String>,
    fail_commit: bool,
    pub uploads: Mutex<Vec<String>>,
    pub commits: Mutex<u32>,
    pub download_attempts: Mutex<u32>,
}

impl MockTransferApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.remote_files.insert(path.to_string(), bytes.to_vec());
        self
    }

    /// Uploads of files with this name fail on every attempt.
    pub fn fail_upload_of(mut self, file_name: &str) -> Self {
        self.fail_upload_of = Some(file_name.to_string());
        self
    }

    pub fn fail_download_of(mut self, remote_path: &str) -> Self {
        self.fail_download_of = Some(remote_path.to_string());
        self
    }

    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads.lock().expect("uploads lock").clone()
    }

    pub fn commit_count(&self) -> u32 {
        *self.commits.lock().expect("commits lock")
    }
}

impl TransferApi for MockTransferApi {
    fn download(&self, remote_path: &str, _token: &str) -> anyhow::Result<Vec<u8>> {
        *self.download_attempts.lock().expect("attempts lock") += 1;

        if self.fail_download_of.as_deref() == Some(remote_path) {
            anyhow::bail!("status 404: no such path");
        }
        self.remote_files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("status 404: no such path"))
    }

    fn upload(
        &self,
        local_path: &Path,
        _dataset_id: &str,
        _transaction_id: &str,
        _token: &str,
    ) -> anyhow::Result<()> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.fail_upload_of.as_deref() == Some(name.as_str()) {
            anyhow::bail!("status 500: internal error");
        }
        self.uploads.lock().expect("uploads lock").push(name);
        Ok(())
    }

    fn commit(&self, _dataset_id: &str, _transaction_id: &str, _token: &str) -> anyhow::Result<()> {
        if self.fail_commit {
            anyhow::bail!("status 500: commit refused");
        }
        *self.commits.lock().expect("commits lock") += 1;
        Ok(())
    }
}
