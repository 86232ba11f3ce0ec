// src/config/mod.rs

//! Pipeline configuration: stage graph, resource profiles, transfer knobs.
//!
//! - [`model`] holds the serde types for `Conveyor.toml`.
//! - [`loader`] reads and deserializes a config file.
//! - [`validate`] turns the raw model into a checked [`ConfigFile`]
//!   (known dependencies, acyclic stage DAG).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, DefaultsSection, RawConfigFile, ResourceProfile, StageConfig, TransferSection};
