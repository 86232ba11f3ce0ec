#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use conveyor::config::{
    ConfigFile, DefaultsSection, RawConfigFile, StageConfig, TransferSection,
};
use conveyor::submit::SubmitOptions;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                defaults: DefaultsSection::default(),
                transfer: TransferSection::default(),
                stage: BTreeMap::new(),
            },
        }
    }

    pub fn with_stage(mut self, name: &str, stage: StageConfig) -> Self {
        self.config.stage.insert(name.to_string(), stage);
        self
    }

    pub fn with_default_cpus(mut self, cpus: u32) -> Self {
        self.config.defaults.cpus = cpus;
        self
    }

    pub fn with_default_partition(mut self, partition: &str) -> Self {
        self.config.defaults.partition = Some(partition.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StageConfig`.
pub struct StageConfigBuilder {
    stage: StageConfig,
}

impl StageConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            stage: StageConfig {
                cmd: cmd.to_string(),
                ..StageConfig::default()
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.stage.after.push(dep.to_string());
        self
    }

    pub fn cpus(mut self, cpus: u32) -> Self {
        self.stage.cpus = Some(cpus);
        self
    }

    pub fn memory(mut self, memory: &str) -> Self {
        self.stage.memory = Some(memory.to_string());
        self
    }

    pub fn time(mut self, time: &str) -> Self {
        self.stage.time = Some(time.to_string());
        self
    }

    pub fn disk(mut self, disk: &str) -> Self {
        self.stage.disk = Some(disk.to_string());
        self
    }

    pub fn build(self) -> StageConfig {
        self.stage
    }
}

/// Submit options rooted at a (usually temporary) working directory.
pub fn submit_options(job_name: &str, outdir: &Path) -> SubmitOptions {
    SubmitOptions {
        job_name: job_name.to_string(),
        bind_paths: vec!["/data/raw".to_string()],
        outdir: outdir.to_path_buf(),
        cache_dir: None,
        tmp_dir: None,
    }
}

/// A minimal two-stage align -> quantify config.
pub fn two_stage_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_stage("align", StageConfigBuilder::new("workflow/align.sh").cpus(16).build())
        .with_stage(
            "quantify",
            StageConfigBuilder::new("workflow/quantify.sh")
                .after("align")
                .build(),
        )
        .build()
}
