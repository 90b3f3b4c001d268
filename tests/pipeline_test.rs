//! End to end tests of the requirement pipeline over record directories on disk.

mod common;

use common::{create_test_project, init_logging, write_record};
use reqgraph_core::{
    codec::{diagnostic::codes, DirectorySource},
    compiler::RequirementCompiler,
    config::{ConfigProvider, ReqGraphConfig, TomlConfigProvider, COLLECTION_REQUIREMENTS},
    constraints::NameUnion,
    reqset::RequirementGraph,
};
use std::{collections::BTreeSet, path::PathBuf};
use tempfile::TempDir;
use test_log::test;

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_check_project() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = create_test_project(&temp_dir);

    // No configuration file: the default layout applies.
    let (compiler, source) = RequirementCompiler::simple(&config_path).unwrap();
    let result = compiler.compile(&source, &NameUnion).unwrap();

    assert!(result.is_usable(), "{:?}", result.set.diagnostics());
    let set = &result.set;
    assert_eq!(set.requirements_count(), 3);
    assert_eq!(set.master_nodes(), Some(&names(&["R2"])));
    assert_eq!(set.incoming("R2"), names(&["R1"]));
    assert_eq!(
        set.requirement("R1").unwrap().field("Description"),
        Some("The first refinement,\nspanning two lines.")
    );

    let ce3 = result.ce3.as_ref().unwrap();
    assert_eq!(ce3.value("M").unwrap(), &names(&["speed"]));
    assert!(ce3.value("R2").unwrap().is_empty());
}

#[test]
fn test_snapshot_json() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = create_test_project(&temp_dir);
    let (compiler, source) = RequirementCompiler::simple(&config_path).unwrap();
    let result = compiler.compile(&source, &NameUnion).unwrap();

    let json = serde_json::to_value(result.set.snapshot()).unwrap();
    assert_eq!(json["master_nodes"], serde_json::json!(["R2"]));
    assert_eq!(json["edges"], serde_json::json!([["M", "R1"], ["R1", "R2"]]));
    assert_eq!(json["usable"], serde_json::json!(true));

    let graph: RequirementGraph = serde_json::from_value(json).unwrap();
    assert_eq!(graph.requirements.len(), 3);
}

#[test]
fn test_cache_reused_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = create_test_project(&temp_dir);
    let (compiler, source) = RequirementCompiler::simple(&config_path).unwrap();

    compiler.compile(&source, &NameUnion).unwrap();
    assert_eq!(compiler.cache().len(), 3);

    // Unchanged records are served from the cache.
    compiler.compile(&source, &NameUnion).unwrap();
    assert_eq!(compiler.cache().len(), 3);

    // A changed record gets a new content version.
    let requirements = config_path.parent().unwrap().join("requirements");
    write_record(&requirements, "R2.req", "Name: Two, revised\nDepends on: R1\n");
    let result = compiler.compile(&source, &NameUnion).unwrap();
    assert_eq!(compiler.cache().len(), 4);
    assert_eq!(
        result.set.requirement("R2").unwrap().field("Name"),
        Some("Two, revised")
    );

    // Only the superseded version of R2 goes away.
    assert_eq!(compiler.prune_cache(&source).unwrap(), 1);
    assert_eq!(compiler.cache().len(), 3);
    compiler.compile(&source, &NameUnion).unwrap();
    assert_eq!(compiler.cache().len(), 3);
}

#[test]
fn test_binary_file_next_to_records() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = create_test_project(&temp_dir);
    let requirements = config_path.parent().unwrap().join("requirements");
    std::fs::write(
        requirements.join("diagram.png"),
        [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, 0x00],
    )
    .unwrap();

    let (compiler, source) = RequirementCompiler::simple(&config_path).unwrap();
    let result = compiler.compile(&source, &NameUnion).unwrap();
    assert!(result.is_usable(), "{:?}", result.set.diagnostics());
    assert_eq!(result.set.requirements_count(), 3);
    assert!(result.set.diagnostics().is_empty());
}

#[test]
fn test_dangling_reference_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = create_test_project(&temp_dir);
    let requirements = config_path.parent().unwrap().join("requirements");
    write_record(&requirements, "R3.req", "Name: Three\nDepends on: R1 R7\n");

    let (compiler, source) = RequirementCompiler::simple(&config_path).unwrap();
    let result = compiler.compile(&source, &NameUnion).unwrap();
    assert!(!result.is_usable());
    assert!(result.ce3.is_none());

    let diagnostics = result.set.diagnostics();
    let r3 = diagnostics.for_id("R3").collect::<Vec<_>>();
    assert_eq!(r3.len(), 1);
    assert_eq!(r3[0].code, codes::DEPENDS_ON_MISSING_TARGET);
    assert_eq!(
        r3[0].to_string(),
        "+++ Error: 47:R3:'Depends on' points to a non-existing requirement 'R7'"
    );
}

#[test]
fn test_configured_layout() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().to_path_buf();
    write_record(&project.join("specs"), "top.txt", "Name: Top\n");
    write_record(&project.join("specs"), "leaf.txt", "Name: Leaf\n");
    write_record(&project.join("specs"), "leaf.req", "ignored: because of the suffix\n");

    let mut config = ReqGraphConfig::default();
    config.requirements.directories = vec![PathBuf::from("specs")];
    config.requirements.suffix = ".txt".to_string();
    config.requirements.solved_by_authoritative = true;
    let config_path = project.join("reqgraph.toml");
    let provider = TomlConfigProvider::new(config_path.clone());
    provider.set_config(&config).unwrap();
    assert_eq!(provider.get_config().unwrap(), config);

    // Without 'Depends on' fields the records only form isolated nodes.
    let (compiler, source) = RequirementCompiler::simple(&config_path).unwrap();
    let result = compiler.compile(&source, &NameUnion).unwrap();
    assert!(result.is_usable());
    assert_eq!(
        result.set.master_nodes(),
        Some(&names(&["leaf", "top"]))
    );
}

#[test]
fn test_missing_directories_give_an_empty_set() {
    let temp_dir = TempDir::new().unwrap();
    let source = DirectorySource::new()
        .with_directory(COLLECTION_REQUIREMENTS, temp_dir.path().join("nowhere"));
    let compiler = RequirementCompiler::new(ReqGraphConfig::default());
    let result = compiler.compile(&source, &NameUnion).unwrap();
    assert!(result.is_usable());
    assert_eq!(result.set.requirements_count(), 0);
    assert_eq!(result.set.master_node_count(), 0);
}
