//! Shared fixture access for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use cppmodel::{ExtractOptions, Extraction, Module, TypeLookup, extract};

/// Fixtures that extract without errors.
pub const VALID_FIXTURES: &[&str] = &[
    "Vehicle.h",
    "LinkedNode.h",
    "Packet.h",
    "Twice.h",
    "Legacy.h",
    "Geometry.h",
];

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

fn stem(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

pub fn extract_fixture(name: &str) -> Extraction {
    extract(&fixture(name), stem(name), &TypeLookup::new(), &ExtractOptions::default())
}

/// Extract a fixture that must not produce errors.
pub fn module_of(name: &str) -> Module {
    let extraction = extract_fixture(name);
    assert!(
        !extraction.has_errors(),
        "{name}: unexpected errors: {:#?}",
        extraction.diagnostics
    );
    extraction.module.expect("module")
}
