use crate::error::ReqGraphError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

/// Record collection holding requirement records.
pub const COLLECTION_REQUIREMENTS: &str = "requirements";
/// Record collection holding constraint definitions.
pub const COLLECTION_CONSTRAINTS: &str = "constraints";

/// Tags a requirement record may carry besides the ones lifted into typed slots. Anything else
/// left over after the requirement set modules ran is reported as unhandled.
pub const DEFAULT_HANDLED_FIELDS: &[&str] = &[
    "Class",
    "Description",
    "Effort estimation",
    "Invented by",
    "Invented on",
    "Name",
    "Note",
    "Owner",
    "Priority",
    "Rationale",
    "Status",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsConfig {
    /// Directories searched for requirement records, relative to the configuration file.
    pub directories: Vec<PathBuf>,
    pub suffix: String,
    /// When set, a non-master requirement without 'Depends on' is accepted because its
    /// relations are expected to come from 'Solved by' fields.
    pub solved_by_authoritative: bool,
    pub handled_fields: Vec<String>,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        RequirementsConfig {
            directories: vec![PathBuf::from("requirements")],
            suffix: ".req".to_string(),
            solved_by_authoritative: false,
            handled_fields: DEFAULT_HANDLED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintsConfig {
    pub directories: Vec<PathBuf>,
    pub suffix: String,
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        ConstraintsConfig {
            directories: vec![PathBuf::from("constraints")],
            suffix: ".ctr".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReqGraphConfig {
    pub requirements: RequirementsConfig,
    pub constraints: ConstraintsConfig,
}

impl ReqGraphConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ReqGraphError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ReqGraphError> {
        Ok(toml::to_string(self)?)
    }

    pub fn is_handled_field(&self, tag: &str) -> bool {
        self.requirements.handled_fields.iter().any(|f| f == tag)
    }

    /// Configured directories of a record collection.
    pub fn directories(&self, collection: &str) -> &[PathBuf] {
        match collection {
            COLLECTION_REQUIREMENTS => &self.requirements.directories,
            COLLECTION_CONSTRAINTS => &self.constraints.directories,
            _ => &[],
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<ReqGraphConfig, ReqGraphError>;
    fn set_config(&self, config: &ReqGraphConfig) -> Result<(), ReqGraphError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that relative record directories are resolved against.
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<ReqGraphConfig, ReqGraphError> {
        tracing::debug!("Attempting to read configuration from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using the default configuration.");
            return Ok(ReqGraphConfig::default());
        }
        let content = read_to_string(&self.path)?;
        ReqGraphConfig::from_toml_str(&content)
    }

    fn set_config(&self, config: &ReqGraphConfig) -> Result<(), ReqGraphError> {
        tracing::debug!("Attempting to write configuration to: {:?}", &self.path);
        write(&self.path, config.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ReqGraphConfig::from_toml_str(
            r#"
[requirements]
directories = ["reqs", "more_reqs"]
solved_by_authoritative = true
"#,
        )
        .unwrap();
        assert_eq!(config.requirements.suffix, ".req");
        assert!(config.requirements.solved_by_authoritative);
        assert_eq!(config.directories(COLLECTION_REQUIREMENTS).len(), 2);
        assert_eq!(config.constraints, ConstraintsConfig::default());
        assert!(config.is_handled_field("Rationale"));
        assert!(!config.is_handled_field("Rationalle"));
    }

    #[test]
    fn test_invalid_toml_is_a_serialization_error() {
        let err = ReqGraphConfig::from_toml_str("[requirements\n").unwrap_err();
        assert!(matches!(err, ReqGraphError::Serialization(_)));
    }

    #[test]
    fn test_toml_provider_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TomlConfigProvider::new(dir.path().join("reqgraph.toml"));

        // missing file falls back to defaults
        assert_eq!(provider.get_config().unwrap(), ReqGraphConfig::default());

        let mut config = ReqGraphConfig::default();
        config.constraints.suffix = ".constraint".to_string();
        provider.set_config(&config).unwrap();
        assert_eq!(provider.get_config().unwrap(), config);
        assert_eq!(provider.base_dir(), dir.path());
    }
}
