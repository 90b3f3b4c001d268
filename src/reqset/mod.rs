//! The requirement dependency graph.
//!
//! A [`RequirementSet`] is filled by ingestion ([`RequirementSet::read_requirements`]), linked by
//! the reference resolution passes, and then read by the master node locator and constraint
//! propagation. Each phase lives in its own submodule:
//!
//! - `ingest`: reading records through the cache, running the requirement set modules
//! - `resolve`: 'Depends on' / 'Solved by' resolution and master node location
//! - `propagate`: CE3 evaluation and reverse topological unite
//!
//! Edges always point from the referenced requirement to the referencing one, so master nodes
//! are the sinks of the graph.

mod base;
mod graph;
mod ingest;
mod propagate;
mod resolve;


pub use base::{RequirementGraph, RequirementSet};
pub use graph::Digraph;
