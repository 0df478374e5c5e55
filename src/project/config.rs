//! Run configuration and the injected type-kind lookup.
//!
//! ```yaml
//! jobs: 4
//! fail_fast: true
//! format: yaml
//! extract:
//!   strict_lookup: true
//! synthesis:
//!   tab_size: 2
//!   include_guard: false
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::WorkspaceError;
use super::file_loader::{get_extension, load_file};
use crate::hir::{ExtractOptions, TypeLookup};
use crate::interchange::{ModelFormat, SynthesisOptions, format_named};

/// Everything a run can be configured with. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extract: ExtractOptions,
    pub synthesis: SynthesisOptions,
    /// Worker threads; `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// Stop starting new files after the first one with an error.
    pub fail_fast: bool,
    /// IR document format written by `extract` (`json` or `yaml`).
    pub format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            synthesis: SynthesisOptions::default(),
            jobs: None,
            fail_fast: false,
            format: "json".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read a YAML config file.
    pub fn load(path: &Path) -> Result<Self, WorkspaceError> {
        let text = load_file(path).map_err(|e| WorkspaceError::io(path, e))?;
        let config: Self = serde_yaml::from_str(&text).map_err(|e| WorkspaceError::config(path, e))?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Number of worker threads to start.
    pub fn jobs(&self) -> usize {
        self.jobs
            .filter(|&n| n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(NonZeroUsize::get))
            .unwrap_or(1)
    }

    /// Handler for the configured output format.
    pub fn output_format(&self) -> Result<Box<dyn ModelFormat>, WorkspaceError> {
        format_named(&self.format.to_lowercase())
            .ok_or_else(|| WorkspaceError::UnknownFormat(self.format.clone()))
    }
}

/// Read a type-kind lookup from a JSON or YAML document mapping type names
/// to `{ isAbstract, isLocallyDefined }`.
pub fn load_lookup(path: &Path) -> Result<TypeLookup, WorkspaceError> {
    let text = load_file(path).map_err(|e| WorkspaceError::io(path, e))?;
    let lookup: TypeLookup = match get_extension(path).as_deref() {
        Some("json") => serde_json::from_str(&text).map_err(|e| WorkspaceError::config(path, e))?,
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&text).map_err(|e| WorkspaceError::config(path, e))?
        }
        _ => return Err(WorkspaceError::UnsupportedInput(path.to_path_buf())),
    };
    debug!(path = %path.display(), entries = lookup.len(), "loaded type lookup");
    Ok(lookup)
}
