//! # cppmodel
//!
//! Bidirectional engine between C++ class declarations and a
//! class/relationship model.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project     → Config, input discovery, worker pool
//!   ↓
//! interchange → IR documents (JSON/YAML), synthesis, round-trip validation
//!   ↓
//! hir         → Extraction: lowering, classification, diagnostics
//!   ↓
//! parser      → Logos lexer, recursive-descent declaration parser
//!   ↓
//! model       → The IR: modules, types, members, relationships
//!   ↓
//! base        → Primitives (TextRange, LineIndex, Span)
//! ```

// ============================================================================
// MODULES (dependency order: base → model → parser → hir → interchange → project)
// ============================================================================

/// Foundation types: TextRange, LineIndex, Span
pub mod base;

/// The class model shared by extraction and synthesis
pub mod model;

/// Parser: Logos lexer, recursive-descent parser with statement recovery
pub mod parser;

/// Extraction: header text → classified model plus diagnostics
pub mod hir;

/// IR documents, synthesis and round-trip validation
pub mod interchange;

/// Batch runs over files and directories
pub mod project;

// Re-export the main entry points
pub use hir::{Diagnostic, ExtractOptions, Extraction, Severity, TypeKind, TypeLookup, extract};
pub use interchange::{SynthesisError, SynthesisOptions, round_trip, synthesize};
pub use model::{IrDocument, Module};

// Re-export foundation types
pub use base::{LineCol, LineIndex, Position, Span, TextRange, TextSize};
