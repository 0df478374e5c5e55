//! Batch runs over directories.

mod helpers;

use std::fs;
use std::path::{Path, PathBuf};

use cppmodel::hir::codes;
use cppmodel::interchange::{Json, ModelFormat};
use cppmodel::project::{EngineConfig, FileStatus, Report, Workspace};
use cppmodel::{TypeKind, TypeLookup};
use helpers::{VALID_FIXTURES, fixture};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Copy the named fixtures into a fresh directory.
fn project(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        fs::write(dir.path().join(name), fixture(name)).unwrap();
    }
    dir
}

fn config(jobs: usize) -> EngineConfig {
    EngineConfig {
        jobs: Some(jobs),
        ..EngineConfig::default()
    }
}

fn status_of(report: &Report, name: &str) -> FileStatus {
    report
        .files
        .iter()
        .find(|f| f.path.file_name().is_some_and(|n| n == name))
        .unwrap_or_else(|| panic!("`{name}` not in report"))
        .status
}

fn file_names(dir: &Path, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == extension))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

#[test]
fn test_extract_directory() {
    let input = project(&["Vehicle.h", "Node.h", "Sensor.h"]);
    let output = TempDir::new().unwrap();

    let report = Workspace::new(config(2))
        .extract_path(input.path(), output.path())
        .unwrap();

    assert_eq!(report.files.len(), 3);
    assert!(report.has_errors());
    assert_eq!(status_of(&report, "Vehicle.h"), FileStatus::Ok);
    assert_eq!(status_of(&report, "Node.h"), FileStatus::Failed);
    // syntax errors fail the file but the recovered model is still written
    assert_eq!(status_of(&report, "Sensor.h"), FileStatus::Failed);
    assert_eq!(file_names(output.path(), "json"), vec!["Sensor.json", "Vehicle.json"]);

    let cycle: Vec<_> = report
        .diagnostics()
        .filter(|d| d.code == codes::CYCLIC_VALUE_COMPOSITION)
        .collect();
    assert_eq!(cycle.len(), 1);
    assert_eq!(cycle[0].file.as_deref(), Some(input.path().join("Node.h").as_path()));

    let bytes = fs::read(output.path().join("Vehicle.json")).unwrap();
    let module = Json.read_module(&bytes).unwrap();
    assert_eq!(module.name, "Vehicle");
    assert!(module.find_class("Garage").is_some());
}

#[test]
fn test_extract_mirrors_subdirectories_in_yaml() {
    let input = TempDir::new().unwrap();
    fs::create_dir_all(input.path().join("shapes")).unwrap();
    fs::write(input.path().join("shapes").join("Geometry.h"), fixture("Geometry.h")).unwrap();
    let output = TempDir::new().unwrap();

    let config = EngineConfig {
        format: "yaml".to_string(),
        ..config(1)
    };
    let report = Workspace::new(config)
        .extract_path(input.path(), output.path())
        .unwrap();

    assert!(!report.has_errors());
    let expected: PathBuf = output.path().join("shapes").join("Geometry.yaml");
    assert_eq!(report.files[0].output.as_deref(), Some(expected.as_path()));
    assert!(expected.is_file());
}

#[test]
fn test_extract_synthesize_validate_pipeline() {
    let input = project(VALID_FIXTURES);
    let models = TempDir::new().unwrap();
    let headers = TempDir::new().unwrap();
    let workspace = Workspace::new(config(4));

    let extracted = workspace.extract_path(input.path(), models.path()).unwrap();
    assert!(!extracted.has_errors(), "{:#?}", extracted.files);
    assert_eq!(extracted.files.len(), VALID_FIXTURES.len());

    let synthesized = workspace.synthesize_path(models.path(), headers.path()).unwrap();
    assert!(!synthesized.has_errors(), "{:#?}", synthesized.files);
    assert_eq!(file_names(headers.path(), "h").len(), VALID_FIXTURES.len());

    let validated = workspace.validate_path(headers.path()).unwrap();
    assert_eq!(validated.count(FileStatus::Ok), VALID_FIXTURES.len(), "{:#?}", validated.files);
}

#[test]
fn test_validate_headers_and_models() {
    let input = project(&["Vehicle.h", "Legacy.h"]);
    let models = TempDir::new().unwrap();
    let workspace = Workspace::new(config(2));
    workspace.extract_path(input.path(), models.path()).unwrap();

    for dir in [input.path(), models.path()] {
        let report = workspace.validate_path(dir).unwrap();
        assert_eq!(report.files.len(), 2);
        assert!(report.files.iter().all(|f| f.passed()), "{:#?}", report.files);
        assert!(report.files.iter().all(|f| f.mismatches.is_empty()));
    }
}

#[test]
fn test_validate_reports_broken_model() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Broken.json"), "{ \"format\": \"cppmodel\", ").unwrap();

    let report = Workspace::new(config(1)).validate_path(dir.path()).unwrap();
    assert_eq!(report.files[0].status, FileStatus::Failed);
    assert!(report.files[0].failure.is_some());
}

#[test]
fn test_fail_fast_skips_remaining_files() {
    let input = project(&["Node.h", "Vehicle.h"]);
    let output = TempDir::new().unwrap();
    let config = EngineConfig {
        fail_fast: true,
        ..config(1)
    };

    let report = Workspace::new(config)
        .extract_path(input.path(), output.path())
        .unwrap();

    assert_eq!(status_of(&report, "Node.h"), FileStatus::Failed);
    assert_eq!(status_of(&report, "Vehicle.h"), FileStatus::Cancelled);
    assert!(file_names(output.path(), "json").is_empty());
}

#[test]
fn test_cancelled_run_starts_nothing() {
    let input = project(&["Vehicle.h", "Packet.h"]);
    let output = TempDir::new().unwrap();
    let workspace = Workspace::new(config(2));
    workspace.cancel_token().cancel();

    let report = workspace.extract_path(input.path(), output.path()).unwrap();
    assert_eq!(report.count(FileStatus::Cancelled), 2);
    assert!(!report.has_errors());
}

const CAR: &str = "class Car {\npublic:\n    void drive();\nprivate:\n    Engine engine;\n};\n";

#[test]
fn test_strict_lookup_uses_project_headers() {
    let input = TempDir::new().unwrap();
    fs::write(input.path().join("Car.h"), CAR).unwrap();
    let output = TempDir::new().unwrap();
    let mut config = config(1);
    config.extract.strict_lookup = true;
    let workspace = Workspace::new(config);

    let alone = workspace.extract_path(input.path(), output.path()).unwrap();
    assert_eq!(alone.files[0].status, FileStatus::Failed);
    let codes_found: Vec<_> = alone.diagnostics().map(|d| d.code).collect();
    assert_eq!(codes_found, vec![codes::UNRESOLVED_TARGET]);

    fs::write(input.path().join("Engine.h"), "class Engine {\n    int power;\n};\n").unwrap();
    let together = workspace.extract_path(input.path(), output.path()).unwrap();
    assert!(!together.has_errors(), "{:#?}", together.files);
}

#[test]
fn test_injected_lookup_resolves_external_types() {
    let input = TempDir::new().unwrap();
    fs::write(input.path().join("Car.h"), CAR).unwrap();
    let output = TempDir::new().unwrap();
    let mut config = config(1);
    config.extract.strict_lookup = true;

    let mut lookup = TypeLookup::new();
    lookup.insert("Engine", TypeKind::default());
    let report = Workspace::new(config)
        .with_lookup(lookup)
        .extract_path(input.path(), output.path())
        .unwrap();
    assert!(!report.has_errors(), "{:#?}", report.files);

    let module = Json
        .read_module(&fs::read(output.path().join("Car.json")).unwrap())
        .unwrap();
    let car = module.find_class("Car").unwrap();
    assert_eq!(car.relationships.len(), 1);
    assert_eq!(car.relationships[0].target, "Engine");
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = Workspace::new(config(1)).validate_path(&dir.path().join("absent"));
    assert!(result.is_err());
}
