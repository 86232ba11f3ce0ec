// src/lock.rs

//! Working-directory lock.
//!
//! The lock is advisory: a marker file in the working directory whose
//! presence signals LOCKED. Release is deferred to the cleanup job for
//! real runs, so the controller treats any present marker as an active
//! run; it cannot verify the out-of-process run's liveness locally.
//! Stale markers are cleared by the operator via `unlock`, who is
//! responsible for making sure the owning run has actually stopped.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ConveyorError, Result};

/// Marker file name, relative to the working directory.
pub const LOCK_FILE: &str = ".conveyor.lock";

/// Contents of the lock marker: who acquired it and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMarker {
    pub run_id: String,
    pub host: String,
    pub pid: u32,
    /// Unix timestamp (seconds) at acquisition.
    pub acquired_at: u64,
}

/// Acquire/release interface for one working directory.
#[derive(Debug, Clone)]
pub struct LockManager {
    workdir: PathBuf,
}

impl LockManager {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn marker_path(&self) -> PathBuf {
        self.workdir.join(LOCK_FILE)
    }

    pub fn is_locked(&self) -> bool {
        self.marker_path().is_file()
    }

    /// Read the current marker, if any. A marker that fails to parse is
    /// still a lock; its metadata is just unavailable.
    pub fn read_marker(&self) -> Option<LockMarker> {
        let contents = fs::read_to_string(self.marker_path()).ok()?;
        match toml::from_str(&contents) {
            Ok(marker) => Some(marker),
            Err(err) => {
                warn!(path = %self.marker_path().display(), error = %err, "unreadable lock marker");
                None
            }
        }
    }

    /// Transition UNLOCKED -> LOCKED, writing a marker for `run_id`.
    ///
    /// Fails with [`ConveyorError::AlreadyLocked`] if a marker is
    /// already present.
    pub fn acquire(&self, run_id: &str) -> Result<LockMarker> {
        if self.is_locked() {
            let owner = self
                .read_marker()
                .map(|m| format!("run '{}' (host {}, pid {})", m.run_id, m.host, m.pid))
                .unwrap_or_else(|| "an unknown run".to_string());
            return Err(ConveyorError::AlreadyLocked(format!(
                "{} is held by {}; wait for it to finish or run `conveyor unlock`",
                self.workdir.display(),
                owner
            )));
        }

        let marker = LockMarker {
            run_id: run_id.to_string(),
            host: std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string()),
            pid: std::process::id(),
            acquired_at: unix_now(),
        };

        fs::create_dir_all(&self.workdir)?;
        let serialized = toml::to_string(&marker)
            .map_err(|err| ConveyorError::Config(format!("serializing lock marker: {err}")))?;
        fs::write(self.marker_path(), serialized)?;

        info!(
            workdir = %self.workdir.display(),
            run_id,
            "acquired working-directory lock"
        );
        Ok(marker)
    }

    /// Remove the marker unconditionally. Idempotent: releasing an
    /// already-unlocked directory is a no-op, not an error.
    pub fn release(&self) -> Result<()> {
        match fs::remove_file(self.marker_path()) {
            Ok(()) => {
                info!(workdir = %self.workdir.display(), "released working-directory lock");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(workdir = %self.workdir.display(), "release on unlocked directory; no-op");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Operator-facing unlock: removes the marker regardless of run
    /// state, but reports [`ConveyorError::NotLocked`] when there is
    /// nothing to remove.
    pub fn force_unlock(&self) -> Result<()> {
        if !self.is_locked() {
            return Err(ConveyorError::NotLocked(
                self.workdir.display().to_string(),
            ));
        }
        if let Some(marker) = self.read_marker() {
            warn!(
                run_id = %marker.run_id,
                host = %marker.host,
                pid = marker.pid,
                "force-unlocking; caller is responsible for ensuring the run has stopped"
            );
        }
        fs::remove_file(self.marker_path())?;
        info!(workdir = %self.workdir.display(), "working directory unlocked");
        Ok(())
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
