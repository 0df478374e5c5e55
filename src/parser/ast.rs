//! Raw syntax tree produced by the declaration parser.
//!
//! The tree keeps source ranges and the declarations exactly as written.
//! Leaf data (types, members, docs) reuse the model types; what the tree
//! lacks compared to the model is everything derived: base kinds, duplicate
//! links, abstractness and relationships.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::model::{
    AliasDecl, ClassKey, DocComment, EnumDecl, ForwardDecl, Member, NestedDecl, Visibility,
};

/// One parsed declaration file.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    pub doc: Option<DocComment>,
    pub includes: Vec<String>,
    pub items: Vec<Item>,
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub struct Item {
    pub range: TextRange,
    pub kind: ItemKind,
}

impl Item {
    pub fn name(&self) -> &SmolStr {
        match &self.kind {
            ItemKind::Enum(e) => &e.name,
            ItemKind::Alias(a) => &a.name,
            ItemKind::Class(c) => &c.name,
            ItemKind::Forward(f) => &f.name,
        }
    }

    pub fn namespace(&self) -> &[SmolStr] {
        match &self.kind {
            ItemKind::Enum(e) => &e.namespace,
            ItemKind::Alias(a) => &a.namespace,
            ItemKind::Class(c) => &c.namespace,
            ItemKind::Forward(f) => &f.namespace,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Enum(EnumDecl),
    Alias(AliasDecl),
    Class(ClassNode),
    Forward(ForwardDecl),
}

/// A class, struct or union with a body.
#[derive(Debug, Clone)]
pub struct ClassNode {
    pub key: ClassKey,
    pub name: SmolStr,
    pub namespace: Vec<SmolStr>,
    pub doc: Option<DocComment>,
    pub template: Option<String>,
    pub is_final: bool,
    pub via_typedef: bool,
    pub bases: Vec<BaseNode>,
    pub members: Vec<MemberNode>,
    pub nested: Vec<NestedDecl>,
}

/// One entry of a base-clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseNode {
    pub name: SmolStr,
    pub access: Visibility,
    pub is_virtual: bool,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct MemberNode {
    pub range: TextRange,
    pub member: Member,
}
