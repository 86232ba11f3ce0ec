// src/config/model.rs

//! Serde model for `Conveyor.toml`.
//!
//! A config file looks like:
//!
//! ```toml
//! [defaults]
//! partition = "norm"
//! time = "04:00:00"
//! memory = "8g"
//! cpus = 2
//!
//! [transfer]
//! base_url = "https://transfer.example.org/api"
//!
//! [stage.align]
//! cmd = "workflow/align.sh"
//! cpus = 16
//! memory = "32g"
//!
//! [stage.quantify]
//! cmd = "workflow/quantify.sh"
//! after = ["align"]
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

/// Per-stage resource defaults, overridable per `[stage.<name>]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    pub partition: Option<String>,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_cpus")]
    pub cpus: u32,
    /// Scratch-disk size (e.g. "64g"), passed to the scheduler as a
    /// generic resource when set.
    pub disk: Option<String>,
}

fn default_time() -> String {
    "04:00:00".to_string()
}

fn default_memory() -> String {
    "8g".to_string()
}

fn default_cpus() -> u32 {
    2
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            partition: None,
            time: default_time(),
            memory: default_memory(),
            cpus: default_cpus(),
            disk: None,
        }
    }
}

/// Remote transfer API knobs. The controller consumes these, it does
/// not own them; `CONVEYOR_PROXY` overrides `proxy` at runtime.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferSection {
    pub base_url: Option<String>,
    pub proxy: Option<String>,
}

/// One `[stage.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Shell command for this stage (an opaque external executable).
    pub cmd: String,
    /// Names of upstream stages that must succeed first.
    #[serde(default)]
    pub after: Vec<String>,
    pub partition: Option<String>,
    pub time: Option<String>,
    pub memory: Option<String>,
    pub cpus: Option<u32>,
    pub disk: Option<String>,
}

impl StageConfig {
    /// Resource profile for this stage with defaults applied.
    pub fn effective_profile(&self, defaults: &DefaultsSection) -> ResourceProfile {
        ResourceProfile {
            partition: self.partition.clone().or_else(|| defaults.partition.clone()),
            time: self.time.clone().unwrap_or_else(|| defaults.time.clone()),
            memory: self.memory.clone().unwrap_or_else(|| defaults.memory.clone()),
            cpus: self.cpus.unwrap_or(defaults.cpus),
            disk: self.disk.clone().or_else(|| defaults.disk.clone()),
        }
    }
}

/// Fully resolved resource profile attached to a submission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProfile {
    pub partition: Option<String>,
    pub time: String,
    pub memory: String,
    pub cpus: u32,
    pub disk: Option<String>,
}

/// Raw, unvalidated config file as deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub transfer: TransferSection,
    #[serde(default)]
    pub stage: BTreeMap<String, StageConfig>,
}

/// Validated config file.
///
/// Constructed only via `TryFrom<RawConfigFile>` (see
/// [`crate::config::validate`]), so holders can rely on the stage
/// dependency relation being known-name, self-free and acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub defaults: DefaultsSection,
    pub transfer: TransferSection,
    pub stage: BTreeMap<String, StageConfig>,
}

impl ConfigFile {
    /// Construct without validation. Intended for `validate.rs` and
    /// test builders that have already established the invariants.
    pub fn new_unchecked(
        defaults: DefaultsSection,
        transfer: TransferSection,
        stage: BTreeMap<String, StageConfig>,
    ) -> Self {
        Self {
            defaults,
            transfer,
            stage,
        }
    }
}
