use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use super::Digraph;
use crate::{
    codec::{Diagnostic, DiagnosticLog},
    config::ReqGraphConfig,
    properties::Requirement,
};

/// A RequirementSet holds one DAG of requirements.
///
/// Lifecycle: constructed empty, populated by ingestion
/// ([`RequirementSet::read_requirements`]), linked in place by the resolution passes, then read
/// by the master-node locator and constraint propagation. After that it is treated as
/// read-only by downstream consumers.
///
/// Requirements are kept in an id-ordered map, so every pass visits them in the same order and
/// results do not depend on input order.
#[derive(Debug, Clone)]
pub struct RequirementSet {
    pub(super) config: ReqGraphConfig,
    pub(super) graph: Digraph<String>,
    pub(super) requirements: BTreeMap<String, Requirement>,
    pub(super) master_nodes: Option<BTreeSet<String>>,
    pub(super) log: DiagnosticLog,
}

/// Serializable, read-only view of a linked requirement set for output renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementGraph {
    pub requirements: BTreeMap<String, Requirement>,
    pub edges: Vec<(String, String)>,
    pub master_nodes: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub usable: bool,
}

impl Default for RequirementSet {
    fn default() -> Self {
        RequirementSet::new(ReqGraphConfig::default())
    }
}

impl RequirementSet {
    /// Constructs an empty RequirementSet. Use [`RequirementSet::read_requirements`] to fill it.
    pub fn new(config: ReqGraphConfig) -> Self {
        tracing::debug!("[RequirementSet::new] creating empty requirement set");
        RequirementSet {
            config,
            graph: Digraph::new(),
            requirements: BTreeMap::new(),
            master_nodes: None,
            log: DiagnosticLog::new(),
        }
    }

    pub fn config(&self) -> &ReqGraphConfig {
        &self.config
    }

    /// Register a usable requirement in the id map. The requirement is not added to the graph:
    /// that happens when the resolution passes link it.
    ///
    /// Returns false (and registers nothing) for an unusable requirement.
    pub fn add_requirement(&mut self, req: Requirement) -> bool {
        if !req.is_usable() {
            return false;
        }
        tracing::debug!("Add requirement [{}]", req.id);
        if self.requirements.insert(req.id.clone(), req).is_some() {
            tracing::warn!("[RequirementSet::add_requirement] replaced a requirement with the same id");
        }
        true
    }

    /// A new set holding copies of the requirements whose topic is in `topics`.
    ///
    /// Edges this set already linked are carried over when both endpoints are kept, so the
    /// restriction of a linked set is linked as well. Reference slots that are still pending
    /// stay pending and are linked by the resolution passes of the new set.
    pub fn restrict_to_topics(&self, topics: &BTreeSet<String>) -> RequirementSet {
        let mut restricted = RequirementSet::new(self.config.clone());
        for req in self.requirements.values() {
            if req.topic.as_ref().is_some_and(|t| topics.contains(t)) {
                restricted.add_requirement(req.clone());
            }
        }
        for id in self.graph.nodes() {
            if restricted.contains(id) {
                restricted.graph.add_node(id);
            }
        }
        for (source, target) in self.graph.edges() {
            if restricted.contains(&source) && restricted.contains(&target) {
                restricted.graph.create_edge(&source, &target);
            }
        }
        tracing::info!(
            "Restricted [{}] requirements to [{}] for topics {:?}",
            self.requirements.len(),
            restricted.requirements.len(),
            topics
        );
        restricted
    }

    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.get(id)
    }

    pub fn requirement_mut(&mut self, id: &str) -> Option<&mut Requirement> {
        self.requirements.get_mut(id)
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    pub fn requirement_ids(&self) -> impl Iterator<Item = &String> {
        self.requirements.keys()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.requirements.contains_key(id)
    }

    pub fn requirements_count(&self) -> usize {
        self.requirements.len()
    }

    pub fn graph(&self) -> &Digraph<String> {
        &self.graph
    }

    /// Ids this requirement has edges to.
    pub fn outgoing(&self, id: &str) -> BTreeSet<String> {
        self.graph.outgoing(&id.to_string())
    }

    /// Ids with edges to this requirement.
    pub fn incoming(&self, id: &str) -> BTreeSet<String> {
        self.graph.incoming(&id.to_string())
    }

    /// The located master nodes, or `None` before [`RequirementSet::find_master_nodes`] ran.
    pub fn master_nodes(&self) -> Option<&BTreeSet<String>> {
        self.master_nodes.as_ref()
    }

    pub fn master_node_count(&self) -> usize {
        self.master_nodes.as_ref().map(BTreeSet::len).unwrap_or_default()
    }

    pub fn is_master_node(&self, id: &str) -> bool {
        self.master_nodes
            .as_ref()
            .is_some_and(|masters| masters.contains(id))
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticLog {
        &mut self.log
    }

    /// Record a coded error against the set (and optionally one requirement).
    pub fn error(&mut self, code: u32, message: impl Into<String>, id: Option<&str>) {
        self.log.error(code, message, id);
    }

    pub fn set_not_usable(&mut self) {
        self.log.set_not_usable();
    }

    pub fn is_usable(&self) -> bool {
        self.log.is_usable()
    }

    pub fn snapshot(&self) -> RequirementGraph {
        RequirementGraph {
            requirements: self.requirements.clone(),
            edges: self.graph.edges(),
            master_nodes: self
                .master_nodes
                .iter()
                .flatten()
                .cloned()
                .collect(),
            diagnostics: self.log.entries().to_vec(),
            usable: self.log.is_usable(),
        }
    }
}

impl fmt::Display for RequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Master nodes [{}]  Requirements [{}]",
            self.master_nodes
                .iter()
                .flatten()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            self.requirements
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
