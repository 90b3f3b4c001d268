//! Record sources: where raw requirement and constraint records come from.

use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{config::ReqGraphConfig, error::ReqGraphError};

/// Content-version identifier of a record: the hex encoded SHA-256 of its content. Stable for
/// unchanged content and distinct for changed content.
pub fn content_version(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// One raw record as delivered by a [`RecordSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFile {
    /// Stable name of the record, relative to its collection root (e.g. `sub/R1.req`).
    pub name: String,
    pub version_id: String,
    pub content: String,
}

impl RecordFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        RecordFile {
            name: name.into(),
            version_id: content_version(&content),
            content,
        }
    }

    /// The record name without `suffix`, or `None` if the name does not carry it.
    pub fn stem(&self, suffix: &str) -> Option<&str> {
        self.name.strip_suffix(suffix)
    }
}

/// Enumerates the records of a named collection ("requirements", "constraints").
pub trait RecordSource {
    fn records(&self, collection: &str) -> Result<Vec<RecordFile>, ReqGraphError>;
}

/// Records held in memory, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    collections: BTreeMap<String, Vec<RecordFile>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: &str, name: &str, content: &str) {
        let records = self.collections.entry(collection.to_string()).or_default();
        records.retain(|r| r.name != name);
        records.push(RecordFile::new(name, content));
    }

    pub fn with(mut self, collection: &str, name: &str, content: &str) -> Self {
        self.insert(collection, name, content);
        self
    }
}

impl RecordSource for MemorySource {
    fn records(&self, collection: &str) -> Result<Vec<RecordFile>, ReqGraphError> {
        Ok(self.collections.get(collection).cloned().unwrap_or_default())
    }
}

/// Records read from directories on disk, one directory list per collection.
#[derive(Debug, Default, Clone)]
pub struct DirectorySource {
    collections: BTreeMap<String, Vec<PathBuf>>,
}

impl DirectorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(mut self, collection: &str, dir: impl AsRef<Path>) -> Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(dir.as_ref().to_path_buf());
        self
    }

    /// Directories of both collections from the configuration, resolved against `base_dir`.
    pub fn from_config(config: &ReqGraphConfig, base_dir: impl AsRef<Path>) -> Self {
        let mut source = DirectorySource::new();
        for collection in [
            crate::config::COLLECTION_REQUIREMENTS,
            crate::config::COLLECTION_CONSTRAINTS,
        ] {
            for dir in config.directories(collection) {
                source = source.with_directory(collection, base_dir.as_ref().join(dir));
            }
        }
        source
    }
}

impl RecordSource for DirectorySource {
    fn records(&self, collection: &str) -> Result<Vec<RecordFile>, ReqGraphError> {
        let mut records = Vec::new();
        let Some(dirs) = self.collections.get(collection) else {
            return Ok(records);
        };
        for root in dirs {
            if !root.is_dir() {
                tracing::warn!("skipping non-existent {} directory [{:?}]", collection, root);
                continue;
            }
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry.path().strip_prefix(root)?;
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let bytes = fs::read(entry.path()).map_err(|err| {
                    ReqGraphError::Io(format!("Failed to read record {:?}: {err}", entry.path()))
                })?;
                // Collections may hold unrelated binary files next to the records. Those are
                // filtered by suffix during ingestion and must not abort the walk.
                let content = match String::from_utf8(bytes) {
                    Ok(content) => content,
                    Err(err) => {
                        tracing::debug!("[{}] is not valid UTF-8, reading it lossily", name);
                        String::from_utf8_lossy(err.as_bytes()).into_owned()
                    }
                };
                records.push(RecordFile::new(name, content));
            }
        }
        Ok(records)
    }
}
