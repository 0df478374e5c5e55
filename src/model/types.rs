//! Type references, ownership and multiplicity.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Write;

/// How a member holds the object it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ownership {
    /// Stored inline.
    Value,
    /// Held through a pointer or reference.
    Pointer,
}

/// Reference qualifier on a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Reference {
    #[default]
    None,
    LValue,
    RValue,
}

/// A referenced type.
///
/// `name` is the qualified base name without template arguments
/// (`std::vector`, `unsigned long`, `Node`); template arguments are parsed
/// into `args`, and anything that is not a type (`5`, `N + 1`) is kept as an
/// argument whose `name` is the opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub name: SmolStr,
    pub args: Vec<TypeRef>,
    pub is_const: bool,
    pub pointer_depth: u8,
    pub reference: Reference,
    /// Always `Pointer` when `pointer_depth > 0` or `reference` is set.
    pub ownership: Ownership,
}

impl TypeRef {
    /// A plain value type with no qualifiers.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            is_const: false,
            pointer_depth: 0,
            reference: Reference::None,
            ownership: Ownership::Value,
        }
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_pointers(mut self, depth: u8) -> Self {
        self.pointer_depth = depth;
        self.ownership = self.derived_ownership();
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = reference;
        self.ownership = self.derived_ownership();
        self
    }

    /// Ownership implied by the pointer and reference qualifiers.
    pub fn derived_ownership(&self) -> Ownership {
        if self.pointer_depth > 0 || self.reference != Reference::None {
            Ownership::Pointer
        } else {
            Ownership::Value
        }
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.pointer_depth == 0 && self.args.is_empty()
    }

    /// Base name with any leading `std::` or `::` removed.
    pub fn unqualified_std_name(&self) -> &str {
        let name = self.name.strip_prefix("::").unwrap_or(&self.name);
        name.strip_prefix("std::").unwrap_or(name)
    }

    /// Element type when this is a dynamically sized standard container.
    pub fn collection_element(&self) -> Option<&TypeRef> {
        if self.pointer_depth > 0 || !DYNAMIC_COLLECTIONS.contains(&self.unqualified_std_name()) {
            return None;
        }
        self.args.last()
    }

    /// Smart pointer kind and pointee.
    pub fn smart_pointer(&self) -> Option<(SmartPointer, &TypeRef)> {
        if self.pointer_depth > 0 {
            return None;
        }
        let kind = match self.unqualified_std_name() {
            "unique_ptr" => SmartPointer::Unique,
            "shared_ptr" => SmartPointer::Shared,
            "weak_ptr" => SmartPointer::Weak,
            _ => return None,
        };
        self.args.first().map(|inner| (kind, inner))
    }

    /// Render the type as declaration text (`const std::vector<Node*>&`).
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        if self.is_const {
            out.push_str("const ");
        }
        out.push_str(&self.name);
        if !self.args.is_empty() {
            out.push('<');
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                arg.write_source(out);
            }
            out.push('>');
        }
        for _ in 0..self.pointer_depth {
            out.push('*');
        }
        match self.reference {
            Reference::None => {}
            Reference::LValue => out.push('&'),
            Reference::RValue => out.push_str("&&"),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_source())
    }
}

/// Standard and common library containers with a dynamic element count.
pub const DYNAMIC_COLLECTIONS: &[&str] = &[
    "vector",
    "list",
    "deque",
    "set",
    "multiset",
    "unordered_set",
    "unordered_multiset",
    "forward_list",
    "map",
    "multimap",
    "unordered_map",
    "QList",
    "QVector",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartPointer {
    Unique,
    Shared,
    Weak,
}

/// Cardinality of a member's storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Multiplicity {
    Scalar,
    /// `size` is the product of `dims`; `dims` keeps the declared extents
    /// (`[10][10]` is `size: 100, dims: [10, 10]`).
    FixedArray { size: u64, dims: Vec<u64> },
    DynamicCollection,
}

impl Multiplicity {
    /// Fold declared array extents into a multiplicity.
    ///
    /// `None` when the element count does not fit in `u64`.
    pub fn from_dims(dims: Vec<u64>) -> Option<Self> {
        if dims.is_empty() {
            return Some(Multiplicity::Scalar);
        }
        let size = dims.iter().try_fold(1u64, |acc, d| acc.checked_mul(*d))?;
        Some(Multiplicity::FixedArray { size, dims })
    }

    /// Array suffix text (`[10][10]`), empty for non-arrays.
    pub fn array_suffix(&self) -> String {
        let mut out = String::new();
        if let Multiplicity::FixedArray { dims, .. } = self {
            for dim in dims {
                let _ = write!(out, "[{dim}]");
            }
        }
        out
    }

    pub fn is_inline_storage(&self) -> bool {
        !matches!(self, Multiplicity::DynamicCollection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_source_nested_template() {
        let ty = TypeRef::named("std::vector")
            .with_args(vec![TypeRef::named("Node").with_pointers(1)])
            .with_const()
            .with_reference(Reference::LValue);
        assert_eq!(ty.to_source(), "const std::vector<Node*>&");
        assert_eq!(ty.ownership, Ownership::Pointer);
    }

    #[test]
    fn test_collection_element() {
        let ty = TypeRef::named("std::vector").with_args(vec![TypeRef::named("Wheel")]);
        assert_eq!(ty.collection_element().map(|t| t.name.as_str()), Some("Wheel"));
        let map = TypeRef::named("map").with_args(vec![TypeRef::named("int"), TypeRef::named("Part")]);
        assert_eq!(map.collection_element().map(|t| t.name.as_str()), Some("Part"));
        assert!(TypeRef::named("std::string").collection_element().is_none());
    }

    #[test]
    fn test_smart_pointer() {
        let ty = TypeRef::named("std::unique_ptr").with_args(vec![TypeRef::named("Engine")]);
        let (kind, inner) = ty.smart_pointer().unwrap();
        assert_eq!(kind, SmartPointer::Unique);
        assert_eq!(inner.name, "Engine");
    }

    #[test]
    fn test_from_dims() {
        assert_eq!(Multiplicity::from_dims(vec![]), Some(Multiplicity::Scalar));
        let m = Multiplicity::from_dims(vec![10, 10]).unwrap();
        assert_eq!(
            m,
            Multiplicity::FixedArray {
                size: 100,
                dims: vec![10, 10]
            }
        );
        assert_eq!(m.array_suffix(), "[10][10]");
    }

    #[test]
    fn test_from_dims_overflow() {
        assert_eq!(Multiplicity::from_dims(vec![1 << 32, 1 << 32, 16]), None);
        assert_eq!(
            Multiplicity::from_dims(vec![1 << 32, 1 << 31]).map(|m| m.array_suffix()),
            Some("[4294967296][2147483648]".to_string())
        );
    }
}
