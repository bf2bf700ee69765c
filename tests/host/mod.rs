//! Compile sessions through `ModelHost`.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use modelweave::diagnostics::codes;
use modelweave::host::ModelHost;
use modelweave::save::{MemorySaveHandler, SaveError};
use modelweave::EngineConfig;

use crate::helpers::fixtures::{COMMON_NS, COMMON_V14, HOTEL_NS, HOTEL_V16};

fn write_sources(dir: &TempDir) -> Vec<PathBuf> {
    let hotel = dir.path().join("hotel.json");
    let common = dir.path().join("common.json");
    std::fs::write(&hotel, HOTEL_V16).unwrap();
    std::fs::write(&common, COMMON_V14).unwrap();
    vec![hotel, common]
}

#[test]
fn test_compile_loads_resolves_and_validates() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(&dir);

    let mut host = ModelHost::new();
    let findings = host.compile(&sources);

    assert!(!findings.has_errors(), "unexpected findings: {findings:?}");
    assert_eq!(host.model().library_count(), 3);
    assert!(host.model().find_entity(HOTEL_NS, "Room").is_some());
    assert!(host.model().find_entity(COMMON_NS, "Amount").is_some());
    // Hotel is read before Common, so its reference into Common is forward.
    assert_eq!(host.forward_declarations().len(), 1);
}

#[test]
fn test_missing_source_is_a_finding() {
    let dir = TempDir::new().unwrap();
    let mut sources = write_sources(&dir);
    sources.push(dir.path().join("absent.json"));

    let mut host = ModelHost::new();
    let findings = host.compile(&sources);

    let missing = findings.with_code(codes::MISSING_SOURCE);
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("absent.json"));
    assert_eq!(host.model().library_count(), 3);
}

#[test]
fn test_malformed_source_is_a_finding() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"Dialect\": \"9.9\" }").unwrap();

    let mut host = ModelHost::new();
    let findings = host.compile(&[broken]);

    assert_eq!(findings.with_code(codes::LOAD_FAILED).len(), 1);
    assert_eq!(host.model().library_count(), 1);
}

#[test]
fn test_recompile_starts_from_fresh_findings() {
    let dir = TempDir::new().unwrap();
    let mut host = ModelHost::new();
    host.compile(&[dir.path().join("absent.json")]);
    assert_eq!(host.findings().len(), 1);

    host.compile(&[]);
    assert!(host.findings().is_empty());
}

#[test]
fn test_config_file_drives_default_pipeline() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("engine.json");
    std::fs::write(
        &config_path,
        format!(r#"{{ "lock_timeout_ms": 250, "protected_namespaces": ["{HOTEL_NS}"] }}"#),
    )
    .unwrap();
    let config = EngineConfig::load(&config_path).unwrap();
    assert_eq!(config.lock_timeout().as_millis(), 250);

    let mut host = ModelHost::new().with_config(config);
    host.compile(&write_sources(&dir));
    let handler = Arc::new(MemorySaveHandler::new());
    let pipeline = host.default_pipeline(handler.clone());
    assert_eq!(pipeline.lock_timeout().as_millis(), 250);

    let batch = host.save_all(&pipeline, None);
    assert_eq!(batch.saved.len(), 1);
    assert_eq!(batch.saved[0].name.as_str(), "Common");
    assert!(matches!(batch.failed[0].2, SaveError::AccessDenied { .. }));
    assert_eq!(handler.len(), 1);
}

#[test]
fn test_file_pipeline_uses_configured_backup_suffix() {
    let dir = TempDir::new().unwrap();
    let sources = write_sources(&dir);
    let config = EngineConfig::from_json(r#"{ "backup_suffix": ".orig" }"#).unwrap();

    let mut host = ModelHost::new().with_config(config);
    host.compile(&sources);
    let common = host
        .model()
        .libraries()
        .find(|l| l.name == "Common")
        .map(|l| l.id())
        .unwrap();

    let pipeline = host.file_pipeline();
    host.save(&pipeline, common, None).unwrap();

    let backup = dir.path().join("common.json.orig");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), COMMON_V14);
    assert!(!dir.path().join("common.json.bak").exists());
}
