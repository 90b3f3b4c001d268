//! Directed graph substrate for requirement relations.
//!
//! [`Digraph`] is a keyed wrapper around a `petgraph::Graph`: nodes are identified by their key
//! (requirement ids in practice), edges carry no payload. It performs no integrity checking of
//! its own; callers validate references before creating edges.

use petgraph::{
    algo::toposort,
    graph::{Graph, NodeIndex},
    visit::EdgeRef,
    Directed, Direction,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::error::ReqGraphError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digraph<K: Ord + Clone> {
    graph: Graph<K, (), Directed>,
    index: BTreeMap<K, NodeIndex>,
}

impl<K: Ord + Clone> Default for Digraph<K> {
    fn default() -> Self {
        Digraph {
            graph: Graph::new(),
            index: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone + fmt::Display> Digraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<I>(iterable: I) -> Self
    where
        I: IntoIterator<Item = (K, K)>,
    {
        let mut digraph = Digraph::new();
        for (source, target) in iterable {
            digraph.create_edge(&source, &target);
        }
        digraph
    }

    pub fn as_graph(&self) -> &Graph<K, (), Directed> {
        &self.graph
    }

    /// Register a node. No-op if the node is already present.
    pub fn add_node(&mut self, key: &K) -> NodeIndex {
        if let Some(idx) = self.index.get(key) {
            return *idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.index.insert(key.clone(), idx);
        idx
    }

    /// Record `source -> target`. Missing endpoints are registered, an existing edge is left
    /// untouched.
    pub fn create_edge(&mut self, source: &K, target: &K) {
        let source_idx = self.add_node(source);
        let target_idx = self.add_node(target);
        self.graph.update_edge(source_idx, target_idx, ());
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All registered keys, in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.index.keys()
    }

    /// All edges as (source, target) pairs, sorted.
    pub fn edges(&self) -> Vec<(K, K)> {
        let mut edges = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                )
            })
            .collect::<Vec<_>>();
        edges.sort();
        edges
    }

    fn neighbors(&self, key: &K, dir: Direction) -> BTreeSet<K> {
        match self.index.get(key) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, dir)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => BTreeSet::new(),
        }
    }

    /// Targets of all edges leaving `key`.
    pub fn outgoing(&self, key: &K) -> BTreeSet<K> {
        self.neighbors(key, Direction::Outgoing)
    }

    /// Sources of all edges entering `key`.
    pub fn incoming(&self, key: &K) -> BTreeSet<K> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Keys without any outgoing edge, in key order.
    pub fn sinks(&self) -> BTreeSet<K> {
        self.graph
            .externals(Direction::Outgoing)
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// A sequence over all nodes such that for every edge `u -> v`, `u` precedes `v`.
    pub fn topological_order(&self) -> Result<Vec<K>, ReqGraphError> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .map_err(|cycle| {
                let id = self.graph[cycle.node_id()].to_string();
                tracing::debug!("[Digraph::topological_order] cycle through '{}'", id);
                ReqGraphError::Cycle { id }
            })
    }

    /// A sequence over all nodes such that every node comes after all nodes reachable from it.
    pub fn reverse_topological_order(&self) -> Result<Vec<K>, ReqGraphError> {
        let mut order = self.topological_order()?;
        order.reverse();
        Ok(order)
    }
}
