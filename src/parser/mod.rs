//! Declaration-text parser
//!
//! This module turns header text into a raw syntax tree using:
//! - **logos** for fast lexing
//! - a hand-written recursive descent parser with statement-level recovery
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind, doc comments attached
//!     ↓
//! Parser → SourceFile (raw items, members, bases) + SyntaxErrors
//!     ↓
//! HIR lowering → Module (classified model)
//! ```
//!
//! Function bodies, initializers and template arguments that are not types
//! are never interpreted; they are skipped or kept as opaque text.

#[allow(clippy::module_inception)]
mod parser;

pub mod ast;
pub mod keywords;
mod lexer;
mod syntax_kind;

pub use ast::{BaseNode, ClassNode, Item, ItemKind, MemberNode, SourceFile};
pub use lexer::{Lexed, Lexer, Token, lex, tokenize};
pub use parser::{Parse, SyntaxError, parse};
pub use syntax_kind::SyntaxKind;

/// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};

#[cfg(test)]
mod tests;
