/// [crate::properties] contains the basic building blocks the requirement graph is assembled
/// from: [Requirement] nodes, their kinds, field maps and constraint definitions.
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
    sync::Arc,
};

use crate::error::ReqGraphError;

/// Field carrying the requirement kind.
pub const TAG_TYPE: &str = "Type";
/// Field carrying the requirement topic.
pub const TAG_TOPIC: &str = "Topic";
/// Field carrying the JSON list of constraint references.
pub const TAG_CONSTRAINTS: &str = "Constraints";
/// Reserved reference field: ids this requirement structurally depends on.
pub const TAG_DEPENDS_ON: &str = "Depends on";
/// Reserved reference field: ids this requirement is solved by.
pub const TAG_SOLVED_BY: &str = "Solved by";
/// Field of a constraint record carrying its evaluation expression.
pub const TAG_CE3: &str = "CE3";

/// Cache kind used for requirement records.
pub const KIND_REQUIREMENT: &str = "Requirement";

/// [RequirementKind] distinguishes master (root) requirements from ordinary ones. Only
/// [RequirementKind::Master] changes graph semantics: a master must never depend on anything.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RequirementKind {
    /// A top level requirement. Written as "master requirement" (or the legacy
    /// "initial requirement").
    Master,
    /// "design decision"
    DesignDecision,
    /// "requirement"
    #[default]
    Requirement,
}

impl RequirementKind {
    pub fn is_master(&self) -> bool {
        matches!(self, RequirementKind::Master)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::Master => "master requirement",
            RequirementKind::DesignDecision => "design decision",
            RequirementKind::Requirement => "requirement",
        }
    }
}

impl FromStr for RequirementKind {
    type Err = ReqGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "master requirement" | "initial requirement" => Ok(RequirementKind::Master),
            "design decision" => Ok(RequirementKind::DesignDecision),
            "requirement" => Ok(RequirementKind::Requirement),
            other => Err(ReqGraphError::Serialization(format!(
                "invalid requirement type '{other}'"
            ))),
        }
    }
}

impl Display for RequirementKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The content of a single record field, plus the comment lines that preceded it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub content: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl RecordEntry {
    pub fn new(content: impl Into<String>) -> Self {
        RecordEntry {
            content: content.into(),
            comment: String::new(),
        }
    }
}

/// Residual fields of a record, keyed by tag, in tag order.
pub type FieldMap = BTreeMap<String, RecordEntry>;

/// State of a reserved reference field.
///
/// `Pending` holds the raw field as read from the record. Once resolution has turned it into
/// graph edges the content is dropped and only the `Linked` marker remains, so the field can
/// never be resolved twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    Pending(RecordEntry),
    Linked,
}

impl Reference {
    pub fn pending(&self) -> Option<&RecordEntry> {
        match self {
            Reference::Pending(entry) => Some(entry),
            Reference::Linked => None,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, Reference::Linked)
    }
}

/// A constraint definition loaded from a constraint record.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    /// The evaluation expression, if the record carried one.
    pub ce3: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: FieldMap,
}

/// The 'Constraints' slot of a requirement.
///
/// Ingestion stores the raw JSON text; constraint propagation rewrites it into the resolved
/// name -> definition mapping. The resolved form keeps the list as written, so the references
/// (with their arguments) can be evaluated again.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraints {
    #[default]
    None,
    Raw(String),
    Resolved {
        raw: String,
        definitions: BTreeMap<String, Arc<Constraint>>,
    },
}

impl Constraints {
    pub fn is_none(&self) -> bool {
        matches!(self, Constraints::None)
    }

    pub fn resolved(&self) -> Option<&BTreeMap<String, Arc<Constraint>>> {
        match self {
            Constraints::Resolved { definitions, .. } => Some(definitions),
            _ => None,
        }
    }
}

/// A single requirement: one node of a [crate::reqset::RequirementSet].
///
/// The reserved reference fields ('Depends on', 'Solved by') are not part of [Self::fields]; they
/// live in typed slots that resolution consumes. `None` means the record never carried the field;
/// a consumed slot is [Reference::Linked] and its relation only exists as graph edges from then
/// on.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub kind: RequirementKind,
    pub topic: Option<String>,
    /// Name of the record this requirement was read from.
    pub source: String,
    #[serde(default)]
    pub fields: FieldMap,
    pub depends_on: Option<Reference>,
    pub solved_by: Option<Reference>,
    #[serde(default)]
    pub constraints: Constraints,
    /// Why parsing failed. A requirement with a failure reason is never registered in a set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Requirement {
    pub fn new(id: impl Into<String>, kind: RequirementKind) -> Self {
        Requirement {
            id: id.into(),
            kind,
            ..Default::default()
        }
    }

    /// Builds a requirement that records why its record could not be parsed.
    pub fn failed(id: impl Into<String>, source: impl Into<String>, reason: impl Into<String>) -> Self {
        Requirement {
            id: id.into(),
            source: source.into(),
            failure: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn with_depends_on(mut self, ids: impl Into<String>) -> Self {
        self.depends_on = Some(Reference::Pending(RecordEntry::new(ids)));
        self
    }

    pub fn with_solved_by(mut self, ids: impl Into<String>) -> Self {
        self.solved_by = Some(Reference::Pending(RecordEntry::new(ids)));
        self
    }

    pub fn with_field(mut self, tag: impl Into<String>, content: impl Into<String>) -> Self {
        self.fields.insert(tag.into(), RecordEntry::new(content));
        self
    }

    pub fn with_constraints(mut self, raw: impl Into<String>) -> Self {
        self.constraints = Constraints::Raw(raw.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn is_usable(&self) -> bool {
        self.failure.is_none()
    }

    pub fn field(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(|entry| entry.content.as_str())
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)
    }
}
