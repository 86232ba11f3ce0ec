// src/stage/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{ConveyorError, Result};

/// Immutable view of the stage dependency DAG for one run.
///
/// Holds a fixed topological order: stage submissions are issued in
/// this order so each stage's upstream job ids are known when its own
/// submission request is built. Actual execution order and parallelism
/// are scheduler-determined.
#[derive(Debug, Clone)]
pub struct StageGraph {
    order: Vec<String>,
    deps: BTreeMap<String, Vec<String>>,
}

impl StageGraph {
    /// Resolve the stage graph from a validated [`ConfigFile`].
    ///
    /// Validation has already rejected cycles, so the toposort here
    /// only fails if the config was constructed by other means.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in cfg.stage.keys() {
            graph.add_node(name.as_str());
        }
        for (name, stage) in cfg.stage.iter() {
            for dep in stage.after.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| {
                ConveyorError::StageCycle(format!(
                    "cycle detected in stage DAG involving stage '{}'",
                    cycle.node_id()
                ))
            })?
            .into_iter()
            .map(|n| n.to_string())
            .collect();

        let deps = cfg
            .stage
            .iter()
            .map(|(name, stage)| (name.clone(), stage.after.clone()))
            .collect();

        Ok(Self { order, deps })
    }

    /// Stage names in submission (topological) order.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Direct upstream dependencies of `stage`.
    pub fn dependencies_of(&self, stage: &str) -> &[String] {
        self.deps.get(stage).map(|d| d.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
