//! Constraint definitions and Constraint Execution Environments (CE3).
//!
//! A requirement lists the constraints it is subject to as a JSON list of references, each either
//! a bare constraint name (`"speed"`) or a name with arguments (`"speed(100ms)"`). The
//! [`ConstraintRegistry`] maps names to definitions loaded from constraint records. What a
//! constraint *means* is up to a [`Ce3Evaluator`]: it computes each requirement's local value and
//! unites a requirement's value with the values of its neighbours. The graph engine only decides
//! when and in which order that happens (see
//! [`RequirementSet::resolve_ce3`](crate::reqset::RequirementSet::resolve_ce3)).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use crate::{
    codec::{diagnostic::codes, DiagnosticLog, RecordParser, RecordSource},
    config::{ReqGraphConfig, COLLECTION_CONSTRAINTS},
    error::ReqGraphError,
    properties::Constraint,
};

static CONSTRAINT_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^\s()]+)\s*(?:\((.*)\))?\s*$").expect("constraint reference pattern is a valid regex")
});

/// A parsed entry of a requirement's 'Constraints' list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRef {
    pub name: String,
    pub args: Option<String>,
    /// The entry as written.
    pub reference: String,
}

impl ConstraintRef {
    pub fn parse(reference: &str) -> Result<Self, ReqGraphError> {
        let caps = CONSTRAINT_REF.captures(reference).ok_or_else(|| {
            ReqGraphError::Serialization(format!("invalid constraint reference '{reference}'"))
        })?;
        Ok(ConstraintRef {
            name: caps[1].to_string(),
            args: caps.get(2).map(|m| m.as_str().trim().to_string()),
            reference: reference.to_string(),
        })
    }
}

/// Parse the raw JSON text of a 'Constraints' field into its references.
pub fn parse_constraint_list(raw: &str) -> Result<Vec<ConstraintRef>, ReqGraphError> {
    let entries: Vec<String> = serde_json::from_str(raw)?;
    entries.iter().map(|entry| ConstraintRef::parse(entry)).collect()
}

/// Name -> definition map of all known constraints.
#[derive(Debug, Default, Clone)]
pub struct ConstraintRegistry {
    constraints: BTreeMap<String, Arc<Constraint>>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every constraint record of the source. Records without the configured suffix are
    /// skipped; records that fail to parse are reported to `log` and left out.
    pub fn load(
        source: &dyn RecordSource,
        parser: &dyn RecordParser,
        config: &ReqGraphConfig,
        log: &mut DiagnosticLog,
    ) -> Result<Self, ReqGraphError> {
        let mut registry = ConstraintRegistry::new();
        for record in source.records(COLLECTION_CONSTRAINTS)? {
            let Some(id) = record.stem(&config.constraints.suffix) else {
                tracing::info!("skipping file [{}]", record.name);
                continue;
            };
            match parser.parse_constraint(&record, id) {
                Ok(constraint) => registry.insert(constraint),
                Err(err) => log.error(
                    codes::UNPARSABLE_CONSTRAINT,
                    format!("could not be parsed: {err}"),
                    Some(id),
                ),
            }
        }
        tracing::info!("Loaded [{}] constraints", registry.len());
        Ok(registry)
    }

    pub fn insert(&mut self, constraint: Constraint) {
        if self.constraints.contains_key(&constraint.id) {
            tracing::info!(
                "[ConstraintRegistry::insert] Overwriting existing constraint: {}",
                constraint.id
            );
        }
        self.constraints
            .insert(constraint.id.clone(), Arc::new(constraint));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Constraint>> {
        self.constraints.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constraints.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.constraints.keys()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// A constraint reference together with its resolved definition.
#[derive(Debug, Clone)]
pub struct ResolvedConstraint<'a> {
    pub reference: &'a ConstraintRef,
    pub constraint: &'a Constraint,
}

/// Supplies the meaning of constraints: local evaluation and the unite operation.
pub trait Ce3Evaluator {
    type Value: Clone + fmt::Debug;

    /// The local value of one requirement given its resolved constraints (possibly none).
    fn evaluate(
        &self,
        req_id: &str,
        constraints: &[ResolvedConstraint<'_>],
    ) -> Result<Self::Value, ReqGraphError>;

    /// Combine a requirement's own local value with the finalized values of its neighbours.
    fn unite(&self, local: &Self::Value, neighbors: &[&Self::Value]) -> Self::Value;
}

/// Per-requirement Constraint Execution Environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ce3<V> {
    pub local: V,
    pub united: Option<V>,
}

impl<V> Ce3<V> {
    pub fn new(local: V) -> Self {
        Ce3 {
            local,
            united: None,
        }
    }

    /// The finalized value if the unite pass reached this node, else the local value.
    pub fn value(&self) -> &V {
        self.united.as_ref().unwrap_or(&self.local)
    }

    pub fn is_united(&self) -> bool {
        self.united.is_some()
    }
}

/// All CE3s of a requirement set, keyed by requirement id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ce3Set<V>(BTreeMap<String, Ce3<V>>);

impl<V> Default for Ce3Set<V> {
    fn default() -> Self {
        Ce3Set(BTreeMap::new())
    }
}

impl<V> Ce3Set<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, ce3: Ce3<V>) {
        self.0.insert(id.into(), ce3);
    }

    pub fn get(&self, id: &str) -> Option<&Ce3<V>> {
        self.0.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Ce3<V>> {
        self.0.get_mut(id)
    }

    /// Shorthand for the finalized (or local) value of a requirement.
    pub fn value(&self, id: &str) -> Option<&V> {
        self.0.get(id).map(Ce3::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Ce3<V>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Evaluator whose value is the set of constraint names in effect: a requirement's own
/// constraints plus everything its neighbours carry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameUnion;

impl Ce3Evaluator for NameUnion {
    type Value = BTreeSet<String>;

    fn evaluate(
        &self,
        _req_id: &str,
        constraints: &[ResolvedConstraint<'_>],
    ) -> Result<Self::Value, ReqGraphError> {
        Ok(constraints
            .iter()
            .map(|c| c.constraint.id.clone())
            .collect())
    }

    fn unite(&self, local: &Self::Value, neighbors: &[&Self::Value]) -> Self::Value {
        let mut united = local.clone();
        for neighbor in neighbors {
            united.extend(neighbor.iter().cloned());
        }
        united
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MemorySource, TextRecordParser};

    #[test]
    fn test_constraint_ref_parsing() {
        let bare = ConstraintRef::parse("speed").unwrap();
        assert_eq!(bare.name, "speed");
        assert_eq!(bare.args, None);

        let with_args = ConstraintRef::parse(" speed( 100ms, strict ) ").unwrap();
        assert_eq!(with_args.name, "speed");
        assert_eq!(with_args.args.as_deref(), Some("100ms, strict"));
        assert_eq!(with_args.reference, " speed( 100ms, strict ) ");

        assert!(ConstraintRef::parse("").is_err());
        assert!(ConstraintRef::parse("a b").is_err());
    }

    #[test]
    fn test_constraint_list_must_be_json_strings() {
        let refs = parse_constraint_list(r#"["speed", "size(10)"]"#).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].name, "size");
        assert!(matches!(
            parse_constraint_list("speed").unwrap_err(),
            ReqGraphError::Serialization(_)
        ));
        assert!(parse_constraint_list("[1, 2]").is_err());
    }

    #[test]
    fn test_registry_load() {
        let source = MemorySource::new()
            .with(COLLECTION_CONSTRAINTS, "speed.ctr", "Name: speed\nCE3: fast\n")
            .with(COLLECTION_CONSTRAINTS, "broken.ctr", "Name: a\nName: b\n")
            .with(COLLECTION_CONSTRAINTS, "README", "not a constraint");
        let mut log = DiagnosticLog::new();
        let registry = ConstraintRegistry::load(
            &source,
            &TextRecordParser,
            &ReqGraphConfig::default(),
            &mut log,
        )
        .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("speed").unwrap().ce3.as_deref(), Some("fast"));
        assert_eq!(log.codes(), vec![codes::UNPARSABLE_CONSTRAINT]);
        assert_eq!(log.entries()[0].id.as_deref(), Some("broken"));
    }

    #[test]
    fn test_name_union() {
        let local = BTreeSet::from(["a".to_string()]);
        let b = BTreeSet::from(["b".to_string()]);
        let ab = BTreeSet::from(["a".to_string(), "b".to_string()]);
        let united = NameUnion.unite(&local, &[&b, &ab]);
        assert_eq!(united, ab);
    }

    #[test]
    fn test_ce3_value_prefers_united() {
        let mut ce3 = Ce3::new(1);
        assert_eq!(*ce3.value(), 1);
        assert!(!ce3.is_united());
        ce3.united = Some(3);
        assert_eq!(*ce3.value(), 3);
    }
}
