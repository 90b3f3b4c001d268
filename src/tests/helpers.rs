//! Shared test utilities for requirement set testing

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    codec::{ParseContext, RecordFile, RecordParser, TextRecordParser},
    config::ReqGraphConfig,
    constraints::{Ce3Evaluator, ResolvedConstraint},
    error::ReqGraphError,
    properties::{Requirement, RequirementKind},
    reqset::RequirementSet,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn master(id: &str) -> Requirement {
    Requirement::new(id, RequirementKind::Master)
}

pub fn requirement(id: &str, depends_on: &str) -> Requirement {
    Requirement::new(id, RequirementKind::Requirement).with_depends_on(depends_on)
}

/// An unlinked set holding the given requirements, with default configuration.
pub fn create_test_set(requirements: Vec<Requirement>) -> RequirementSet {
    init_logging();
    let mut set = RequirementSet::new(ReqGraphConfig::default());
    for req in requirements {
        set.add_requirement(req);
    }
    set
}

/// The scenario used throughout the tests: M (master), R1 depends on M, R2 depends on R1.
pub fn create_chain_set() -> RequirementSet {
    create_test_set(vec![
        master("M"),
        requirement("R1", "M"),
        requirement("R2", "R1"),
    ])
}

/// Evaluator whose local value is the requirement id and whose unite appends the neighbours'
/// values to it. Order sensitive, which makes the traversal order visible in the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatEvaluator;

impl Ce3Evaluator for ConcatEvaluator {
    type Value = String;

    fn evaluate(
        &self,
        req_id: &str,
        _constraints: &[ResolvedConstraint<'_>],
    ) -> Result<Self::Value, ReqGraphError> {
        Ok(req_id.to_lowercase())
    }

    fn unite(&self, local: &Self::Value, neighbors: &[&Self::Value]) -> Self::Value {
        let mut united = local.clone();
        for neighbor in neighbors {
            united.push_str(neighbor);
        }
        united
    }
}

/// Delegates to [`TextRecordParser`] and counts how often it was asked to parse. Clones share
/// the counter.
#[derive(Debug, Default, Clone)]
pub struct CountingParser {
    calls: Arc<AtomicUsize>,
}

impl CountingParser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordParser for CountingParser {
    fn parse(&self, record: &RecordFile, id: &str, ctx: &ParseContext<'_>) -> Requirement {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TextRecordParser.parse(record, id, ctx)
    }
}
