//! Common trait for IR document formats.

use super::InterchangeError;
use crate::model::{IR_FORMAT, IR_VERSION, IrDocument, Module};

/// Trait for IR document formats.
///
/// Implementations serialize the versioned [`IrDocument`] envelope. Reading
/// rejects documents of another format or schema version.
pub trait ModelFormat: Send + Sync {
    /// Human-readable name of the format.
    fn name(&self) -> &'static str;

    /// File extension(s) for this format, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Read a document from bytes.
    fn read(&self, input: &[u8]) -> Result<IrDocument, InterchangeError>;

    /// Write a document to bytes.
    fn write(&self, document: &IrDocument) -> Result<Vec<u8>, InterchangeError>;

    /// Read a document and unwrap its module.
    fn read_module(&self, input: &[u8]) -> Result<Module, InterchangeError> {
        self.read(input).map(|document| document.module)
    }

    /// Wrap a module in the current envelope and write it.
    fn write_module(&self, module: &Module) -> Result<Vec<u8>, InterchangeError> {
        self.write(&IrDocument::new(module.clone()))
    }
}

/// Reject envelopes this version cannot interpret.
pub(crate) fn check_envelope(document: IrDocument) -> Result<IrDocument, InterchangeError> {
    if document.format != IR_FORMAT {
        return Err(InterchangeError::UnknownFormat(document.format));
    }
    if document.version != IR_VERSION {
        return Err(InterchangeError::UnsupportedVersion {
            found: document.version,
            expected: IR_VERSION,
        });
    }
    Ok(document)
}
