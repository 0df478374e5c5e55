//! Model interchange: IR documents, synthesis and round-trip validation.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │  JSON file   │     │  YAML file   │
//! └──────┬───────┘     └──────┬───────┘
//!        ▼                    ▼
//! ┌──────────────────────────────────────────┐
//! │            ModelFormat trait             │
//! │  - read(&[u8]) -> Result<IrDocument>     │
//! │  - write(&IrDocument) -> Result<Vec<u8>> │
//! └──────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────┐  synthesize   ┌──────────────┐
//! │    Module    │ ────────────▶ │  header text │
//! └──────────────┘ ◀──────────── └──────────────┘
//!                      extract
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use cppmodel::interchange::{Json, ModelFormat, SynthesisOptions, synthesize};
//!
//! let module = Json.read_module(&std::fs::read("Car.json")?)?;
//! let text = synthesize(&module, &SynthesisOptions::default())?;
//! ```

mod error;
mod format;
mod json;
pub mod roundtrip;
pub mod synthesize;
mod yaml;

pub use error::{InterchangeError, SynthesisError};
pub use format::ModelFormat;
pub use json::Json;
pub use roundtrip::{Mismatch, RoundTrip, compare_modules, round_trip};
pub use synthesize::{SynthesisOptions, check_invariants, guard_name, synthesize};
pub use yaml::Yaml;

/// Detect format from file extension.
pub fn detect_format(path: &std::path::Path) -> Result<Box<dyn ModelFormat>, InterchangeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    format_named(&ext).ok_or_else(|| InterchangeError::UnsupportedExtension(path.display().to_string()))
}

/// Format by name or extension (`json`, `yaml`, `yml`).
pub fn format_named(name: &str) -> Option<Box<dyn ModelFormat>> {
    match name {
        "json" => Some(Box::new(Json)),
        "yaml" | "yml" => Some(Box::new(Yaml)),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
