// src/stage/mod.rs

//! Stage DAG resolution.
//!
//! The dependency graph is resolved **once**, before anything is
//! submitted; the scheduler only ever sees explicit `afterok` /
//! `afterany` dependency links, never dynamic re-submission.

pub mod graph;

pub use graph::StageGraph;
