// src/transfer/api.rs

//! HTTP surface of the remote transfer service.
//!
//! Single-shot calls only; retry and transaction bookkeeping live in
//! [`crate::transfer::client`]. Errors from these methods are treated
//! as transient by the caller until retries are exhausted.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

/// Connection settings for the remote transfer API. The proxy URL is
/// an environment knob (`CONVEYOR_PROXY`) consumed, not owned, by the
/// controller.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub proxy: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            proxy: None,
        }
    }

    /// Apply the `CONVEYOR_PROXY` override when set.
    pub fn with_env_proxy(mut self) -> Self {
        if let Ok(proxy) = std::env::var("CONVEYOR_PROXY") {
            if !proxy.is_empty() {
                self.proxy = Some(proxy);
            }
        }
        self
    }
}

/// Trait abstracting the remote transfer endpoints.
///
/// Production code uses [`HttpTransferApi`]; tests use the in-memory
/// mock in [`crate::transfer::mock`].
pub trait TransferApi {
    /// Fetch one remote path; returns the raw bytes on 2xx.
    fn download(&self, remote_path: &str, token: &str) -> anyhow::Result<Vec<u8>>;

    /// Upload one local file into an open transaction.
    fn upload(
        &self,
        local_path: &Path,
        dataset_id: &str,
        transaction_id: &str,
        token: &str,
    ) -> anyhow::Result<()>;

    /// Commit a transaction, making its files visible atomically.
    fn commit(&self, dataset_id: &str, transaction_id: &str, token: &str) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct DownloadBody<'a> {
    path: &'a str,
}

/// reqwest-backed implementation.
pub struct HttpTransferApi {
    config: ApiConfig,
    client: reqwest::blocking::Client,
}

impl HttpTransferApi {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().timeout(Duration::from_secs(300));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy)
                    .with_context(|| format!("invalid proxy URL '{proxy}'"))?,
            );
        }
        let client = builder.build().context("building HTTP client")?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), suffix)
    }
}

impl TransferApi for HttpTransferApi {
    fn download(&self, remote_path: &str, token: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("download"))
            .bearer_auth(token)
            .json(&DownloadBody { path: remote_path })
            .send()
            .with_context(|| format!("requesting '{remote_path}'"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("status {}: {}", status.as_u16(), body.trim());
        }
        Ok(response.bytes().context("reading response body")?.to_vec())
    }

    fn upload(
        &self,
        local_path: &Path,
        dataset_id: &str,
        transaction_id: &str,
        token: &str,
    ) -> anyhow::Result<()> {
        let form = reqwest::blocking::multipart::Form::new()
            .file("file", local_path)
            .with_context(|| format!("opening '{}'", local_path.display()))?;

        let url = self.endpoint(&format!(
            "datasets/{dataset_id}/transactions/{transaction_id}/files"
        ));
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .with_context(|| format!("uploading '{}'", local_path.display()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("status {}: {}", status.as_u16(), body.trim());
        }
        Ok(())
    }

    fn commit(&self, dataset_id: &str, transaction_id: &str, token: &str) -> anyhow::Result<()> {
        let url = self.endpoint(&format!(
            "datasets/{dataset_id}/transactions/{transaction_id}/commit"
        ));
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .send()
            .with_context(|| format!("committing transaction '{transaction_id}'"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("status {}: {}", status.as_u16(), body.trim());
        }
        Ok(())
    }
}
