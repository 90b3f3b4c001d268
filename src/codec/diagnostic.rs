//! Diagnostic types for requirement ingestion and reference resolution.
//!
//! Every recoverable, per-record problem found while building a
//! [`RequirementSet`](crate::reqset::RequirementSet) is recorded as a [`Diagnostic`] carrying a
//! stable numeric code, a human readable message and (usually) the id of the offending
//! requirement. The [`DiagnosticLog`] keeps them in the order they were found and tracks the
//! aggregate usability of the set: once anything has been recorded the set is no longer usable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric diagnostic codes.
pub mod codes {
    /// A requirement set module signalled a semantic failure.
    pub const MODULE_FAILED: u32 = 43;
    /// A requirement record could not be parsed.
    pub const UNPARSABLE_REQUIREMENT: u32 = 45;
    /// A master requirement carries a 'Depends on' field.
    pub const MASTER_HAS_DEPENDS_ON: u32 = 46;
    /// 'Depends on' names an id that is not part of the set.
    pub const DEPENDS_ON_MISSING_TARGET: u32 = 47;
    /// A non-master requirement has no 'Depends on' field.
    pub const DEPENDS_ON_ABSENT: u32 = 48;
    /// 'Depends on' is present but empty.
    pub const DEPENDS_ON_EMPTY: u32 = 49;
    /// Summary error emitted after unhandled tags were found.
    pub const UNHANDLED_TAGS_SUMMARY: u32 = 56;
    /// A residual field has no handler.
    pub const UNHANDLED_TAG: u32 = 57;
    /// 'Depends on' points to the requirement itself.
    pub const DEPENDS_ON_SELF: u32 = 59;
    /// The requirement graph contains a cycle.
    pub const CYCLE: u32 = 60;
    /// 'Solved by' names an id that is not part of the set.
    pub const SOLVED_BY_MISSING_TARGET: u32 = 74;
    /// 'Solved by' points to the requirement itself.
    pub const SOLVED_BY_SELF: u32 = 75;
    /// 'Solved by' is present but empty.
    pub const SOLVED_BY_EMPTY: u32 = 77;
    /// A constraint record could not be parsed.
    pub const UNPARSABLE_CONSTRAINT: u32 = 87;
    /// A requirement references an undefined constraint.
    pub const UNDEFINED_CONSTRAINT: u32 = 88;
}

/// One coded problem, optionally tied to a requirement id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: u32,
    pub message: String,
    pub id: Option<String>,
}

impl Diagnostic {
    pub fn new(code: u32, message: impl Into<String>, id: Option<&str>) -> Self {
        Self {
            code,
            message: message.into(),
            id: id.map(str::to_string),
        }
    }

    /// Check whether this diagnostic was recorded against the given requirement id
    pub fn concerns(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "+++ Error:{:>3}:{}:{}", self.code, id, self.message),
            None => write!(f, "+++ Error:{:>3}:{}", self.code, self.message),
        }
    }
}

/// Ordered diagnostic log plus the aggregate usable flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    usable: bool,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        DiagnosticLog {
            entries: Vec::new(),
            usable: true,
        }
    }
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a coded error. This always marks the log as not usable.
    pub fn error(&mut self, code: u32, message: impl Into<String>, id: Option<&str>) {
        let diagnostic = Diagnostic::new(code, message, id);
        tracing::error!("{}", diagnostic);
        self.entries.push(diagnostic);
        self.usable = false;
    }

    /// Mark the log as not usable without recording anything (e.g. a module reported failure
    /// and already logged its own reason).
    pub fn set_not_usable(&mut self) {
        self.usable = false;
    }

    pub fn is_usable(&self) -> bool {
        self.usable
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Codes of all recorded diagnostics, in recording order
    pub fn codes(&self) -> Vec<u32> {
        self.entries.iter().map(|d| d.code).collect()
    }

    /// All diagnostics recorded against the given requirement id
    pub fn for_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.concerns(id))
    }

    /// Append the diagnostics of another log (e.g. the constraint loading log) to this one.
    pub fn extend(&mut self, other: DiagnosticLog) {
        if !other.usable {
            self.usable = false;
        }
        self.entries.extend(other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_log_is_usable() {
        let log = DiagnosticLog::new();
        assert!(log.is_usable());
        assert!(log.is_empty());
    }

    #[test]
    fn test_error_marks_unusable_and_keeps_order() {
        let mut log = DiagnosticLog::new();
        log.error(codes::DEPENDS_ON_SELF, "points to itself", Some("R1"));
        log.error(codes::UNHANDLED_TAGS_SUMMARY, "can't continue", None);

        assert!(!log.is_usable());
        assert_eq!(log.codes(), vec![59, 56]);
        assert_eq!(log.for_id("R1").count(), 1);
        assert_eq!(log.for_id("R2").count(), 0);
        assert_eq!(log.entries()[1].id, None);
    }

    #[test]
    fn test_display_format() {
        let with_id = Diagnostic::new(47, "'Depends on' points to a non-existing requirement 'X'", Some("R1"));
        assert_eq!(
            with_id.to_string(),
            "+++ Error: 47:R1:'Depends on' points to a non-existing requirement 'X'"
        );
        let without_id = Diagnostic::new(43, "module problem", None);
        assert_eq!(without_id.to_string(), "+++ Error: 43:module problem");
    }

    #[test]
    fn test_extend_propagates_unusable() {
        let mut log = DiagnosticLog::new();
        let mut other = DiagnosticLog::new();
        other.set_not_usable();
        log.extend(other);
        assert!(!log.is_usable());
        assert!(log.is_empty());
    }
}
