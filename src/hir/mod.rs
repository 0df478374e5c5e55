//! Extraction: declaration text → classified model.
//!
//! ```text
//! text ──parse──▶ SourceFile ──lower──▶ Module (structure)
//!                                          │
//!                       TypeLookup ───────▶ classify ──▶ Module (bases, relationships)
//! ```
//!
//! Extraction never fails. Lexer and syntax problems are recovered locally
//! and reported; semantic errors (duplicate type, duplicate enumerator,
//! unresolved target under `strict_lookup`, cyclic value composition) are
//! reported and withhold the module.
//!
//! ## Key Types
//!
//! - [`Extraction`] - the module (if any) plus every diagnostic
//! - [`TypeLookup`] - injected cross-file knowledge about type names
//! - [`Diagnostic`] - a located problem with a stable code

mod classify;
mod diagnostics;
mod lookup;
mod lower;

pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, Severity, codes};
pub use lookup::{TypeKind, TypeLookup};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::base::LineIndex;
use crate::model::Module;
use crate::parser;

/// Options that change what extraction accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Every stored or inherited user type must resolve locally or through
    /// the lookup; unresolved names become semantic errors.
    pub strict_lookup: bool,
}

/// Result of extracting one file.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// `None` when a semantic error was reported.
    pub module: Option<Module>,
    /// Diagnostics in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

/// Extract the model of one declaration file.
///
/// `name` becomes the module name (usually the file stem).
pub fn extract(text: &str, name: &str, lookup: &TypeLookup, options: &ExtractOptions) -> Extraction {
    debug!(module = name, bytes = text.len(), "extracting");
    let index = LineIndex::new(text);
    let parse = parser::parse(text);

    let mut diagnostics = DiagnosticCollector::new(&index);
    for range in &parse.unknown {
        let found = text.get(range.start().into()..range.end().into()).unwrap_or("?");
        diagnostics.warning(
            DiagnosticKind::LexWarning,
            codes::UNKNOWN_CHARACTER,
            *range,
            format!("unknown character `{found}` skipped"),
        );
    }
    for error in &parse.errors {
        trace!(message = %error.message, "recovered syntax error");
        diagnostics.error(
            DiagnosticKind::SyntaxError,
            codes::SYNTAX_ERROR,
            error.range,
            error.message.clone(),
        );
    }
    for skipped in &parse.unsupported {
        debug!(message = %skipped.message, "skipped unsupported construct");
        diagnostics.warning(
            DiagnosticKind::Unsupported,
            codes::UNSUPPORTED,
            skipped.range,
            skipped.message.clone(),
        );
    }

    let module = lower::Lowering::new(&mut diagnostics, lookup, options).lower(name, parse.file);
    let module = if diagnostics.has_semantic_errors() {
        debug!(module = name, "semantic errors, model withheld");
        None
    } else {
        Some(module)
    };

    Extraction {
        module,
        diagnostics: diagnostics.finish(),
    }
}

#[cfg(test)]
mod tests;
