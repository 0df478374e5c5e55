//! Error types for IR document and synthesis operations.

use thiserror::Error;

/// Errors reading or writing an IR document.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML parsing or serialization error.
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Document written for another schema version.
    #[error("Unsupported IR version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// `format` field does not identify an IR document.
    #[error("Unknown document format: {0}")]
    UnknownFormat(String),

    /// No format handler for a file extension.
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),
}

impl InterchangeError {
    /// Create a JSON error.
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json(message.into())
    }

    /// Create a YAML error.
    pub fn yaml(message: impl Into<String>) -> Self {
        Self::Yaml(message.into())
    }
}

/// A model that violates an IR invariant and cannot be rendered.
///
/// Extraction never produces such a model; hand-written or foreign IR can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// Fixed array whose size is not the product of its dimensions.
    #[error("field `{owner}::{field}`: array size {size} does not match dimensions {dims:?}")]
    ArraySize {
        owner: String,
        field: String,
        size: u64,
        dims: Vec<u64>,
    },

    /// Fixed array without dimensions.
    #[error("field `{owner}::{field}`: fixed array has no dimensions")]
    MissingDimensions { owner: String, field: String },

    /// Name that is not a valid identifier.
    #[error("{what} name `{name}` is not an identifier")]
    InvalidName { what: &'static str, name: String },

    /// Type reference with an empty name.
    #[error("`{owner}`: empty type name")]
    EmptyType { owner: String },

    /// `duplicate_of` pointing at a later or different base.
    #[error("class `{class}`: base {index} has an invalid duplicate link")]
    DuplicateLink { class: String, index: usize },

    /// Two top-level declarations share a qualified name.
    #[error("type `{0}` is declared more than once")]
    DuplicateType(String),

    /// Pointer-qualified type marked as owned by value, or the reverse.
    #[error("`{owner}`: ownership of `{ty}` contradicts its qualifiers")]
    Ownership { owner: String, ty: String },

    /// Ordinary method without a return type.
    #[error("method `{owner}::{method}` has no return type")]
    MissingReturnType { owner: String, method: String },
}
