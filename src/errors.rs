// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConveyorError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Working directory is already locked: {0}")]
    AlreadyLocked(String),

    #[error("Working directory is not locked: {0}")]
    NotLocked(String),

    #[error("Exhausted {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cycle detected in stage DAG: {0}")]
    StageCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ConveyorError>;
