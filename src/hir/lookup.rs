//! Cross-file type-kind lookup.
//!
//! A read-only table from type name to what is known about it elsewhere in
//! the project. It is built once before a run and shared by reference with
//! every worker.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::model::Module;

/// What is known about a type declared outside the file being extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeKind {
    /// Interface-like: inheriting from it is a realization.
    pub is_abstract: bool,
    /// Defined with a body somewhere in the project.
    pub is_locally_defined: bool,
}

/// Name → [`TypeKind`] table.
///
/// Entries are keyed by the name as written in declarations; qualified names
/// are also found by their last segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeLookup {
    entries: FxHashMap<SmolStr, TypeKind>,
}

impl TypeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, kind: TypeKind) {
        self.entries.insert(name.into(), kind);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look a name up, trying it as written, without a leading `::`, and by
    /// its last segment.
    pub fn get(&self, name: &str) -> Option<TypeKind> {
        let name = name.strip_prefix("::").unwrap_or(name);
        self.entries.get(name).copied().or_else(|| {
            let (_, last) = name.rsplit_once("::")?;
            self.entries.get(last).copied()
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Merge `other` into this table; entries already present win.
    pub fn merge(&mut self, other: &TypeLookup) {
        for (name, kind) in &other.entries {
            self.entries.entry(name.clone()).or_insert(*kind);
        }
    }

    /// Record every class of `module`, by plain and qualified name.
    pub fn record_module(&mut self, module: &Module) {
        for class in module.classes() {
            let kind = TypeKind {
                is_abstract: class.is_interface(),
                is_locally_defined: true,
            };
            self.entries.insert(class.name.clone(), kind);
            if !class.namespace.is_empty() {
                self.entries.insert(SmolStr::new(class.qualified_name()), kind);
            }
        }
        for forward in &module.forward_decls {
            self.entries.entry(forward.name.clone()).or_default();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &TypeKind)> {
        self.entries.iter()
    }
}

impl FromIterator<(SmolStr, TypeKind)> for TypeLookup {
    fn from_iter<I: IntoIterator<Item = (SmolStr, TypeKind)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
