//! YAML format support.
//!
//! Same structure as the JSON document, in YAML syntax:
//!
//! ```yaml
//! format: cppmodel-ir
//! version: 1
//! module:
//!   name: Car
//!   decls:
//!   - decl: class
//!     name: Car
//! ```

use super::format::check_envelope;
use super::{InterchangeError, ModelFormat};
use crate::model::IrDocument;

/// YAML format handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

impl ModelFormat for Yaml {
    fn name(&self) -> &'static str {
        "YAML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn read(&self, input: &[u8]) -> Result<IrDocument, InterchangeError> {
        let content = std::str::from_utf8(input)
            .map_err(|e| InterchangeError::yaml(format!("Invalid UTF-8: {e}")))?;
        let document: IrDocument =
            serde_yaml::from_str(content).map_err(|e| InterchangeError::yaml(e.to_string()))?;
        check_envelope(document)
    }

    fn write(&self, document: &IrDocument) -> Result<Vec<u8>, InterchangeError> {
        serde_yaml::to_string(document)
            .map(String::into_bytes)
            .map_err(|e| InterchangeError::yaml(e.to_string()))
    }
}
