//! JSON format support.
//!
//! ```json
//! {
//!   "format": "cppmodel-ir",
//!   "version": 1,
//!   "module": { "name": "Car", "decls": [ { "decl": "class", ... } ] }
//! }
//! ```

use super::format::check_envelope;
use super::{InterchangeError, ModelFormat};
use crate::model::IrDocument;

/// JSON format handler (pretty-printed).
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl ModelFormat for Json {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn read(&self, input: &[u8]) -> Result<IrDocument, InterchangeError> {
        let document: IrDocument =
            serde_json::from_slice(input).map_err(|e| InterchangeError::json(e.to_string()))?;
        check_envelope(document)
    }

    fn write(&self, document: &IrDocument) -> Result<Vec<u8>, InterchangeError> {
        let mut out =
            serde_json::to_vec_pretty(document).map_err(|e| InterchangeError::json(e.to_string()))?;
        out.push(b'\n');
        Ok(out)
    }
}
