//! Foundation types for the cppmodel engine.
//!
//! This module provides fundamental types used throughout the engine:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`Position`], [`Span`] - Line/column ranges attached to diagnostics
//!
//! This module has NO dependencies on other cppmodel modules.

mod position;
mod span;

pub use position::{Position, Span};
pub use span::{LineCol, LineIndex};
pub use text_size::{TextRange, TextSize};

// Re-export text-size for convenience
pub use text_size;
