//! # reqgraph-core
//!
//! A Rust library for building the dependency graph of a set of requirements and propagating
//! constraints through it.
//!
//! ## Overview
//!
//! reqgraph-core reads requirement records (`Tag: value` text files), links them into a directed
//! acyclic graph through their 'Depends on' and 'Solved by' fields, locates the master nodes
//! (the nodes nothing else builds on), and evaluates per-requirement constraint environments
//! (CE3) that are united along the graph in reverse topological order.
//!
//! ### Key Features
//!
//! - **Error tolerant ingestion**: problems with single records are collected as coded
//!   diagnostics, sibling records keep being processed
//! - **Content-versioned cache**: unchanged records are never parsed twice
//! - **Pluggable passes**: reference resolution and checks are requirement set modules ordered
//!   by their declared dependencies
//! - **Pluggable constraint semantics**: a [`constraints::Ce3Evaluator`] supplies local
//!   evaluation and the unite operation
//!
//! ## Architecture
//!
//! - **[`reqset`]**: the requirement graph (`RequirementSet`, `Digraph`) and its passes
//! - **[`codec`]**: record sources, parsing, the object cache and diagnostics
//! - **[`properties`]**: requirements, reference fields and constraint definitions
//! - **[`modules`]**: requirement set modules and their registry
//! - **[`constraints`]**: constraint registry, CE3 values and evaluators
//! - **[`compiler`]**: the end-to-end pipeline
//! - **[`config`]**: TOML configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use reqgraph_core::{
//!     codec::MemorySource,
//!     compiler::RequirementCompiler,
//!     config::{ReqGraphConfig, COLLECTION_REQUIREMENTS},
//!     constraints::NameUnion,
//! };
//!
//! let source = MemorySource::new()
//!     .with(COLLECTION_REQUIREMENTS, "M.req", "Name: Master\nType: master requirement\n")
//!     .with(COLLECTION_REQUIREMENTS, "R1.req", "Name: One\nDepends on: M\n");
//!
//! let compiler = RequirementCompiler::new(ReqGraphConfig::default());
//! let result = compiler.compile(&source, &NameUnion)?;
//! assert!(result.is_usable());
//!
//! let set = &result.set;
//! assert_eq!(set.outgoing("M").into_iter().collect::<Vec<_>>(), vec!["R1"]);
//! assert!(set.is_master_node("R1"));
//! # Ok::<(), reqgraph_core::ReqGraphError>(())
//! ```
//!
//! ### Working with Diagnostics
//!
//! ```rust
//! # use reqgraph_core::{codec::MemorySource, compiler::RequirementCompiler,
//! #     config::{ReqGraphConfig, COLLECTION_REQUIREMENTS}, constraints::NameUnion};
//! let source = MemorySource::new()
//!     .with(COLLECTION_REQUIREMENTS, "R1.req", "Name: One\nDepends on: R1\n");
//! let result = RequirementCompiler::new(ReqGraphConfig::default()).compile(&source, &NameUnion)?;
//! assert!(!result.is_usable());
//! for diagnostic in result.set.diagnostics().entries() {
//!     println!("{diagnostic}");
//! }
//! # Ok::<(), reqgraph_core::ReqGraphError>(())
//! ```
//!
//! ## Features
//!
//! - **default**: the library
//! - **bin**: the `reqgraph` command line checker

pub mod codec;
pub mod compiler;
pub mod config;
pub mod constraints;
pub mod error;
pub mod modules;
pub mod properties;
pub mod reqset;
#[cfg(test)]
mod tests;

pub use error::*;
