//! Record ingestion infrastructure: sources, parsing, caching and diagnostics.
//!
//! ## Key Components
//!
//! - [`RecordSource`] - enumerates raw records per collection ([`DirectorySource`], [`MemorySource`])
//! - [`RecordParser`] trait - turns one raw record into a [`Requirement`]; [`TextRecordParser`]
//!   implements the `Tag: value` syntax
//! - [`ObjectCache`] - content-version keyed reuse of parsed requirements across runs
//! - [`DiagnosticLog`] - coded, per-requirement problems and the aggregate usable flag
//!
//! Custom parsers plug in through [`RecordParser`]:
//!
//! ```rust
//! use reqgraph_core::{codec::{ParseContext, RecordFile, RecordParser}, properties::{Requirement, RequirementKind}};
//!
//! struct EverythingIsMaster;
//!
//! impl RecordParser for EverythingIsMaster {
//!     fn parse(&self, record: &RecordFile, id: &str, _ctx: &ParseContext<'_>) -> Requirement {
//!         let mut req = Requirement::new(id, RequirementKind::Master);
//!         req.source = record.name.clone();
//!         req
//!     }
//! }
//! ```

use std::str::FromStr;

use crate::{
    config::ReqGraphConfig,
    error::ReqGraphError,
    modules::ModuleRegistry,
    properties::{
        Constraint, Constraints, Reference, Requirement, RequirementKind, TAG_CE3,
        TAG_CONSTRAINTS, TAG_DEPENDS_ON, TAG_SOLVED_BY, TAG_TOPIC, TAG_TYPE,
    },
};

pub mod cache;
pub mod diagnostic;
pub mod record;
pub mod source;

pub use cache::ObjectCache;
pub use diagnostic::{Diagnostic, DiagnosticLog};
pub use record::parse_record;
pub use source::{content_version, DirectorySource, MemorySource, RecordFile, RecordSource};

/// What a parser gets to see besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub config: &'a ReqGraphConfig,
    pub modules: &'a ModuleRegistry,
}

pub trait RecordParser {
    /// Parse one requirement record. Parsing never aborts ingestion: a record that cannot be
    /// used is returned as a requirement carrying a failure reason (see [`Requirement::failed`]).
    fn parse(&self, record: &RecordFile, id: &str, ctx: &ParseContext<'_>) -> Requirement;

    /// Parse one constraint definition record.
    fn parse_constraint(&self, record: &RecordFile, id: &str) -> Result<Constraint, ReqGraphError> {
        let mut fields = parse_record(&record.content)?;
        let ce3 = fields.remove(TAG_CE3).map(|entry| entry.content);
        Ok(Constraint {
            id: id.to_string(),
            ce3,
            fields,
        })
    }
}

/// Parser for the `Tag: value` record syntax (see [`record`]).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRecordParser;

impl TextRecordParser {
    fn try_parse(&self, record: &RecordFile, id: &str) -> Result<Requirement, ReqGraphError> {
        let mut fields = parse_record(&record.content)?;
        let kind = match fields.remove(TAG_TYPE) {
            Some(entry) => RequirementKind::from_str(&entry.content)?,
            None => RequirementKind::default(),
        };
        let topic = fields.remove(TAG_TOPIC).map(|entry| entry.content);
        let constraints = fields
            .remove(TAG_CONSTRAINTS)
            .map(|entry| Constraints::Raw(entry.content))
            .unwrap_or_default();
        let depends_on = fields.remove(TAG_DEPENDS_ON).map(Reference::Pending);
        let solved_by = fields.remove(TAG_SOLVED_BY).map(Reference::Pending);
        Ok(Requirement {
            id: id.to_string(),
            kind,
            topic,
            source: record.name.clone(),
            fields,
            depends_on,
            solved_by,
            constraints,
            failure: None,
        })
    }
}

impl RecordParser for TextRecordParser {
    fn parse(&self, record: &RecordFile, id: &str, _ctx: &ParseContext<'_>) -> Requirement {
        match self.try_parse(record, id) {
            Ok(req) => req,
            Err(err) => {
                tracing::warn!("[TextRecordParser] {} could not be parsed: {}", record.name, err);
                Requirement::failed(id, record.name.clone(), err.to_string())
            }
        }
    }
}
