//! Problems found while extracting a model.
//!
//! Diagnostics are data, not errors: extraction always completes and hands
//! back everything it found, in source order per category.

use std::fmt;
use std::path::PathBuf;

use crate::base::{LineIndex, Span, TextRange};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// Category of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Unknown character, skipped by the lexer.
    LexWarning,
    /// Unparsable member or declaration, skipped at a statement boundary.
    SyntaxError,
    /// Construct recognised but not modelled.
    Unsupported,
    /// Duplicate name, unresolved target or cyclic value composition;
    /// no model is produced for the file.
    SemanticError,
    /// Suspicious but valid structure (zero-length array, duplicate base).
    StructureWarning,
    /// File could not be read.
    IoError,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file containing this diagnostic, once known.
    pub file: Option<PathBuf>,
    pub range: TextRange,
    /// Line/column form of `range` (0-indexed).
    pub span: Span,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Error/warning code (e.g., "E0101").
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(kind: DiagnosticKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            file: None,
            range: TextRange::default(),
            span: Span::default(),
            severity: Severity::Error,
            kind,
            code,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(kind: DiagnosticKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, code, message)
        }
    }

    /// Set the source range, resolving line and column through `index`.
    pub fn with_range(mut self, range: TextRange, index: &LineIndex) -> Self {
        self.range = range;
        self.span = index.span(range);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// `path:line:col: severity[code]: message`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file.display())?;
        }
        write!(
            f,
            "{}: {}[{}]: {}",
            self.span.start, self.severity, self.code, self.message
        )
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Code Ranges
///
/// - **W0001-W0099**: Lexer warnings
/// - **E0101-E0199 / W0101-W0199**: Syntax errors and unsupported constructs
/// - **E0201-E0299 / W0201-W0299**: Semantic errors and structure warnings
/// - **E0301-E0399**: IO errors
pub mod codes {
    /// Unknown character.
    pub const UNKNOWN_CHARACTER: &str = "W0001";

    /// Unparsable declaration or member.
    pub const SYNTAX_ERROR: &str = "E0101";
    /// Construct not modelled (nested class, member template, anonymous enum).
    pub const UNSUPPORTED: &str = "W0101";

    /// Two declarations with the same qualified name.
    pub const DUPLICATE_TYPE: &str = "E0201";
    /// Two enumerators with the same name in one enumeration.
    pub const DUPLICATE_ENUMERATOR: &str = "E0202";
    /// Relationship target not found while the lookup is mandatory.
    pub const UNRESOLVED_TARGET: &str = "E0203";
    /// A class contains itself by value.
    pub const CYCLIC_VALUE_COMPOSITION: &str = "E0204";
    /// Fixed array with zero elements.
    pub const ZERO_LENGTH_ARRAY: &str = "W0201";
    /// Same base listed more than once.
    pub const DUPLICATE_BASE: &str = "W0202";

    /// Unreadable input.
    pub const IO_ERROR: &str = "E0301";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during extraction.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector<'a> {
    index: &'a LineIndex,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DiagnosticCollector<'a> {
    pub fn new(index: &'a LineIndex) -> Self {
        Self {
            index,
            diagnostics: Vec::new(),
        }
    }

    pub fn error(&mut self, kind: DiagnosticKind, code: &'static str, range: TextRange, message: impl Into<String>) {
        let diagnostic = Diagnostic::error(kind, code, message).with_range(range, self.index);
        self.diagnostics.push(diagnostic);
    }

    pub fn warning(&mut self, kind: DiagnosticKind, code: &'static str, range: TextRange, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(kind, code, message).with_range(range, self.index);
        self.diagnostics.push(diagnostic);
    }

    /// Whether any semantic error was reported.
    pub fn has_semantic_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.is_error() && d.kind == DiagnosticKind::SemanticError)
    }

    /// Finish collecting, sorted by position.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| d.range.start());
        self.diagnostics
    }
}
