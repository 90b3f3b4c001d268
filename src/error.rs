use std::{fmt, io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use walkdir::Error as WalkdirError;

use crate::codec::diagnostic::codes;

/// Errors that abort the current operation outright.
///
/// Per-record content problems (dangling references, malformed records, ...) are not errors in
/// this sense; they are accumulated as [`crate::codec::Diagnostic`]s on the owning
/// [`crate::reqset::RequirementSet`] so that sibling records keep being processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum ReqGraphError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Dependency cycle detected at node '{id}'")]
    Cycle { id: String },
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Requirement set module '{name}' failed: {message}")]
    Module { name: String, message: String },
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Constraint [{name}] does not exist (referenced by '{id}')")]
    UndefinedConstraint { name: String, id: String },
}

impl ReqGraphError {
    /// The stable numeric code of this error, for the variants that have one.
    pub fn code(&self) -> Option<u32> {
        match self {
            ReqGraphError::Cycle { .. } => Some(codes::CYCLE),
            ReqGraphError::Module { .. } => Some(codes::MODULE_FAILED),
            ReqGraphError::UndefinedConstraint { .. } => Some(codes::UNDEFINED_CONSTRAINT),
            _ => None,
        }
    }
}

impl From<StripPrefixError> for ReqGraphError {
    fn from(src: StripPrefixError) -> ReqGraphError {
        ReqGraphError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for ReqGraphError {
    fn from(src: toml::de::Error) -> ReqGraphError {
        ReqGraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for ReqGraphError {
    fn from(src: toml::ser::Error) -> ReqGraphError {
        ReqGraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for ReqGraphError {
    fn from(src: JsonError) -> ReqGraphError {
        ReqGraphError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for ReqGraphError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => ReqGraphError::NotFound(format!("{x}")),
            _ => ReqGraphError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<WalkdirError> for ReqGraphError {
    fn from(x: WalkdirError) -> Self {
        match x.path() {
            Some(path) => ReqGraphError::Io(format!("Directory walk failed at {path:?}: {x}")),
            None => ReqGraphError::Io(format!("Directory walk failed: {x}")),
        }
    }
}

impl From<fmt::Error> for ReqGraphError {
    fn from(x: fmt::Error) -> Self {
        ReqGraphError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for ReqGraphError {
    fn from(x: RegexError) -> Self {
        ReqGraphError::Serialization(format!("Regex parse failed: {x}"))
    }
}
