//! Reference resolution: turning 'Depends on' / 'Solved by' fields into graph edges.
//!
//! For a field on requirement `req` listing id `x`, the edge is always created as `x -> req`,
//! for both fields. Once linked, the two relations are indistinguishable in the graph.

use std::collections::BTreeSet;

use super::RequirementSet;
use crate::{
    codec::diagnostic::codes,
    properties::{RecordEntry, Reference, TAG_DEPENDS_ON, TAG_SOLVED_BY},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceField {
    DependsOn,
    SolvedBy,
}

impl ReferenceField {
    fn tag(self) -> &'static str {
        match self {
            ReferenceField::DependsOn => TAG_DEPENDS_ON,
            ReferenceField::SolvedBy => TAG_SOLVED_BY,
        }
    }

    fn empty_code(self) -> u32 {
        match self {
            ReferenceField::DependsOn => codes::DEPENDS_ON_EMPTY,
            ReferenceField::SolvedBy => codes::SOLVED_BY_EMPTY,
        }
    }

    fn missing_target_code(self) -> u32 {
        match self {
            ReferenceField::DependsOn => codes::DEPENDS_ON_MISSING_TARGET,
            ReferenceField::SolvedBy => codes::SOLVED_BY_MISSING_TARGET,
        }
    }

    fn self_reference_code(self) -> u32 {
        match self {
            ReferenceField::DependsOn => codes::DEPENDS_ON_SELF,
            ReferenceField::SolvedBy => codes::SOLVED_BY_SELF,
        }
    }
}

impl RequirementSet {
    /// Step through all requirements and evaluate their 'Depends on' field.
    ///
    /// Master requirements must not have one. Every other requirement must, unless
    /// `solved_by_authoritative` is set, in which case a missing field is skipped.
    ///
    /// Returns true iff no requirement failed. Failures are recorded in the diagnostics log and
    /// do not stop the pass.
    pub fn resolve_depends_on(&mut self, solved_by_authoritative: bool) -> bool {
        tracing::debug!("Called.");
        let mut success = true;
        for id in self.requirements.keys().cloned().collect::<Vec<_>>() {
            if !self.resolve_depends_on_one_req(&id, solved_by_authoritative) {
                success = false;
            }
        }
        tracing::debug!("Finished; success [{}].", success);
        success
    }

    fn resolve_depends_on_one_req(&mut self, id: &str, solved_by_authoritative: bool) -> bool {
        self.graph.add_node(&id.to_string());
        let Some((kind, depends_on)) = self
            .requirements
            .get(id)
            .map(|req| (req.kind, req.depends_on.clone()))
        else {
            return false;
        };

        if kind.is_master() {
            if matches!(depends_on, Some(Reference::Pending(_))) {
                self.error(
                    codes::MASTER_HAS_DEPENDS_ON,
                    "master requirement has 'Depends on' field",
                    Some(id),
                );
                return false;
            }
            // It does not depend on anything: this is a master.
            return true;
        }

        let entry = match depends_on {
            Some(Reference::Pending(entry)) => entry,
            Some(Reference::Linked) => return true,
            None if solved_by_authoritative => return true,
            None => {
                self.error(
                    codes::DEPENDS_ON_ABSENT,
                    "non-master requirement has no 'Depends on' field",
                    Some(id),
                );
                return false;
            }
        };

        self.link_reference(id, &entry, ReferenceField::DependsOn)
    }

    /// Step through all requirements and evaluate their (optional) 'Solved by' field.
    ///
    /// Returns true iff no requirement failed.
    pub fn resolve_solved_by(&mut self) -> bool {
        tracing::debug!("Called.");
        let mut success = true;
        for id in self.requirements.keys().cloned().collect::<Vec<_>>() {
            if !self.resolve_solved_by_one_req(&id) {
                success = false;
            }
        }
        tracing::debug!("Finished; success [{}].", success);
        success
    }

    fn resolve_solved_by_one_req(&mut self, id: &str) -> bool {
        self.graph.add_node(&id.to_string());
        let entry = match self.requirements.get(id).and_then(|r| r.solved_by.as_ref()) {
            Some(Reference::Pending(entry)) => entry.clone(),
            // No 'Solved by' (or already linked) is the normal case.
            Some(Reference::Linked) | None => return true,
        };
        self.link_reference(id, &entry, ReferenceField::SolvedBy)
    }

    /// Validate every id of the field, then create the edges and mark the field as linked.
    /// Nothing is linked if any id is rejected.
    fn link_reference(&mut self, id: &str, entry: &RecordEntry, field: ReferenceField) -> bool {
        if entry.content.trim().is_empty() {
            self.error(
                field.empty_code(),
                format!("'{}' field has length 0", field.tag()),
                Some(id),
            );
            return false;
        }

        let targets = entry.content.split_whitespace().collect::<Vec<_>>();
        tracing::debug!("[{}] '{}' list {:?}", id, field.tag(), targets);
        for target in targets.iter() {
            if !self.requirements.contains_key(*target) {
                self.error(
                    field.missing_target_code(),
                    format!(
                        "'{}' points to a non-existing requirement '{}'",
                        field.tag(),
                        target
                    ),
                    Some(id),
                );
                return false;
            }
            // A requirement referencing itself does not make any sense.
            if *target == id {
                self.error(
                    field.self_reference_code(),
                    format!("'{}' points to the requirement itself", field.tag()),
                    Some(id),
                );
                return false;
            }
        }

        let target_id = id.to_string();
        for target in targets {
            tracing::debug!("Add edge [{}] -> [{}]", target, id);
            self.graph.create_edge(&target.to_string(), &target_id);
        }

        if let Some(req) = self.requirements.get_mut(id) {
            let slot = match field {
                ReferenceField::DependsOn => &mut req.depends_on,
                ReferenceField::SolvedBy => &mut req.solved_by,
            };
            *slot = Some(Reference::Linked);
        }
        true
    }

    /// Find all master nodes: the nodes of the graph without outgoing edges.
    ///
    /// The rule is structural. It does not look at [`crate::properties::RequirementKind`], so the
    /// result need not coincide with the requirements declared as masters.
    pub fn find_master_nodes(&mut self) -> &BTreeSet<String> {
        let masters = self.graph.sinks();
        for id in masters.iter() {
            tracing::debug!("Found master node [{}]", id);
        }
        tracing::info!("Found [{}] master nodes", masters.len());
        self.master_nodes.insert(masters)
    }
}
