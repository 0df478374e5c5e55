//! The class model (IR) shared by extraction and synthesis.
//!
//! The model is a plain, serializable tree. Extraction builds one
//! [`Module`] per declaration file and never mutates it afterwards; synthesis
//! only reads it.
//!
//! ```text
//! Module
//! ├── includes, forward_decls
//! └── decls: Vec<TypeDecl>
//!       ├── Enum(EnumDecl)   entries
//!       ├── Alias(AliasDecl) opaque target text
//!       └── Class(ClassDecl) bases, members, nested, relationships
//! ```
//!
//! Relationships are derived: they can always be rebuilt from the fields,
//! method signatures and bases of a class.

pub mod doc;
mod types;

pub use doc::{DocAnnotations, DocComment, DocTag, ParamDoc};
pub use types::{
    DYNAMIC_COLLECTIONS, Multiplicity, Ownership, Reference, SmartPointer, TypeRef,
};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identifier written into every IR document.
pub const IR_FORMAT: &str = "cppmodel-ir";
/// Current IR document schema version.
pub const IR_VERSION: u32 = 1;

// ============================================================================
// DOCUMENT AND MODULE
// ============================================================================

/// Versioned envelope around one module; the serialized boundary artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IrDocument {
    pub format: String,
    pub version: u32,
    pub module: Module,
}

impl IrDocument {
    pub fn new(module: Module) -> Self {
        Self {
            format: IR_FORMAT.to_string(),
            version: IR_VERSION,
            module,
        }
    }
}

/// One declaration-text unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// File stem (`Node` for `Node.h`).
    pub name: SmolStr,
    /// File-level documentation (the block carrying `@file`).
    pub doc: Option<DocComment>,
    pub includes: Vec<String>,
    pub forward_decls: Vec<ForwardDecl>,
    pub decls: Vec<TypeDecl>,
}

impl Module {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            includes: Vec::new(),
            forward_decls: Vec::new(),
            decls: Vec::new(),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.decls.iter().filter_map(|d| match d {
            TypeDecl::Class(c) => Some(c),
            _ => None,
        })
    }

    /// Find a declaration by qualified name.
    pub fn find(&self, qualified: &str) -> Option<&TypeDecl> {
        self.decls.iter().find(|d| d.qualified_name() == qualified)
    }

    pub fn find_class(&self, qualified: &str) -> Option<&ClassDecl> {
        match self.find(qualified) {
            Some(TypeDecl::Class(c)) => Some(c),
            _ => None,
        }
    }

    pub fn is_forward_declared(&self, qualified: &str) -> bool {
        self.forward_decls
            .iter()
            .any(|f| qualified_name(&f.namespace, &f.name) == qualified)
    }
}

/// `class X;` without a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardDecl {
    pub key: ClassKey,
    pub name: SmolStr,
    pub namespace: Vec<SmolStr>,
}

/// Join a namespace path and a name with `::`.
pub fn qualified_name(namespace: &[SmolStr], name: &str) -> String {
    let mut out = String::new();
    for segment in namespace {
        out.push_str(segment);
        out.push_str("::");
    }
    out.push_str(name);
    out
}

// ============================================================================
// TYPE DECLARATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "camelCase")]
pub enum TypeDecl {
    Enum(EnumDecl),
    Alias(AliasDecl),
    Class(ClassDecl),
}

impl TypeDecl {
    pub fn name(&self) -> &SmolStr {
        match self {
            TypeDecl::Enum(e) => &e.name,
            TypeDecl::Alias(a) => &a.name,
            TypeDecl::Class(c) => &c.name,
        }
    }

    pub fn namespace(&self) -> &[SmolStr] {
        match self {
            TypeDecl::Enum(e) => &e.namespace,
            TypeDecl::Alias(a) => &a.namespace,
            TypeDecl::Class(c) => &c.namespace,
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(self.namespace(), self.name())
    }

    pub fn doc(&self) -> Option<&DocComment> {
        match self {
            TypeDecl::Enum(e) => e.doc.as_ref(),
            TypeDecl::Alias(a) => a.doc.as_ref(),
            TypeDecl::Class(c) => c.doc.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDecl {
    pub name: SmolStr,
    pub namespace: Vec<SmolStr>,
    pub doc: Option<DocComment>,
    /// `enum class` / `enum struct`.
    pub scoped: bool,
    pub underlying: Option<TypeRef>,
    /// Declared as `typedef enum { ... } Name;`.
    pub via_typedef: bool,
    pub entries: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enumerator {
    pub name: SmolStr,
    /// Explicit value, kept as opaque text.
    pub value: Option<String>,
    pub doc: Option<DocComment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasForm {
    /// `typedef <target> Name;`
    Typedef,
    /// `using Name = <target>;`
    Using,
    /// A declaration whose right-hand side could not be parsed as a type;
    /// `target` holds the whole declaration without the trailing `;`.
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasDecl {
    pub name: SmolStr,
    pub namespace: Vec<SmolStr>,
    pub doc: Option<DocComment>,
    pub form: AliasForm,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassKey {
    Class,
    Struct,
    Union,
}

impl ClassKey {
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKey::Class => "class",
            ClassKey::Struct => "struct",
            ClassKey::Union => "union",
        }
    }

    /// Visibility of members declared before any label.
    pub fn default_visibility(self) -> Visibility {
        match self {
            ClassKey::Class => Visibility::Private,
            ClassKey::Struct | ClassKey::Union => Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Section order used by synthesis.
    pub const ALL: [Visibility; 3] = [Visibility::Public, Visibility::Protected, Visibility::Private];

    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

// ============================================================================
// CLASSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDecl {
    pub name: SmolStr,
    pub namespace: Vec<SmolStr>,
    pub key: ClassKey,
    pub doc: Option<DocComment>,
    /// `template<...>` head, verbatim.
    pub template: Option<String>,
    pub is_final: bool,
    /// Declared as `typedef struct { ... } Name;`.
    pub via_typedef: bool,
    /// True iff at least one method is pure virtual.
    pub is_abstract: bool,
    pub bases: Vec<BaseRef>,
    /// Members in declaration order.
    pub members: Vec<Member>,
    pub nested: Vec<NestedDecl>,
    /// Derived edges with this class as source.
    pub relationships: Vec<Relationship>,
}

impl ClassDecl {
    pub fn new(key: ClassKey, name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
            key,
            doc: None,
            template: None,
            is_final: false,
            via_typedef: false,
            is_abstract: false,
            bases: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(&self.namespace, &self.name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(f) => Some(f),
            Member::Method(_) => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(m) => Some(m),
            Member::Field(_) => None,
        })
    }

    /// Abstractness implied by the methods.
    pub fn has_pure_virtual(&self) -> bool {
        self.methods().any(|m| m.modifiers.is_pure_virtual)
    }

    /// Interface-like: tagged `@interface`, or only pure-virtual operations
    /// and no instance state.
    pub fn is_interface(&self) -> bool {
        if self.doc.as_ref().is_some_and(|d| d.has_tag(doc::INTERFACE_TAG)) {
            return true;
        }
        let mut operations = self
            .methods()
            .filter(|m| m.kind.is_ordinary() && m.modifiers.function_pointer.is_none())
            .peekable();
        if operations.peek().is_none() {
            return false;
        }
        let all_pure = operations.all(|m| m.modifiers.is_pure_virtual);
        let has_state = self.fields().any(|f| !f.modifiers.is_static)
            || self
                .methods()
                .any(|m| m.modifiers.function_pointer.is_some() && !m.modifiers.is_static);
        all_pure && !has_state
    }

    /// Members grouped by visibility in the canonical synthesis order:
    /// nested declarations, constructors/destructors, methods, fields.
    pub fn sections(&self) -> Vec<Section<'_>> {
        Visibility::ALL
            .iter()
            .map(|&visibility| {
                let mut section = Section {
                    visibility,
                    nested: self
                        .nested
                        .iter()
                        .filter(|n| n.visibility == visibility)
                        .collect(),
                    special: Vec::new(),
                    methods: Vec::new(),
                    fields: Vec::new(),
                };
                for member in self.members.iter().filter(|m| m.visibility() == visibility) {
                    match member {
                        Member::Method(m) if m.kind.is_special() => section.special.push(m),
                        Member::Method(m) => section.methods.push(m),
                        Member::Field(f) => section.fields.push(f),
                    }
                }
                section
            })
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// One visibility block of a class, in synthesis order.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub visibility: Visibility,
    pub nested: Vec<&'a NestedDecl>,
    pub special: Vec<&'a Method>,
    pub methods: Vec<&'a Method>,
    pub fields: Vec<&'a Field>,
}

impl Section<'_> {
    pub fn is_empty(&self) -> bool {
        self.nested.is_empty()
            && self.special.is_empty()
            && self.methods.is_empty()
            && self.fields.is_empty()
    }
}

/// Kind of an inheritance edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseKind {
    Generalization,
    Realization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseRef {
    /// Base type as written, template arguments included.
    pub name: SmolStr,
    pub access: Visibility,
    pub is_virtual: bool,
    pub kind: BaseKind,
    /// Index of the earlier base naming the same type.
    pub duplicate_of: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedDecl {
    pub visibility: Visibility,
    pub decl: NestedKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "camelCase")]
pub enum NestedKind {
    Enum(EnumDecl),
    Alias(AliasDecl),
}

// ============================================================================
// MEMBERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "camelCase")]
pub enum Member {
    Field(Field),
    Method(Method),
}

impl Member {
    pub fn name(&self) -> &SmolStr {
        match self {
            Member::Field(f) => &f.name,
            Member::Method(m) => &m.name,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Member::Field(f) => f.visibility,
            Member::Method(m) => m.visibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: SmolStr,
    pub visibility: Visibility,
    pub doc: Option<DocComment>,
    pub ty: TypeRef,
    pub multiplicity: Multiplicity,
    pub modifiers: FieldModifiers,
    /// Initializer text: `5` for `= 5`, `{5}` for a brace initializer.
    pub default_value: Option<String>,
    pub bit_width: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldModifiers {
    pub is_static: bool,
    /// Mirrors `ty.is_const`.
    pub is_const: bool,
    pub is_mutable: bool,
    pub is_constexpr: bool,
    pub is_volatile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodKind {
    Ordinary,
    Constructor,
    /// Name is `~` followed by the class name.
    Destructor,
    /// `operator T()`; the name carries the target type.
    Conversion,
}

impl MethodKind {
    pub fn is_special(self) -> bool {
        matches!(self, MethodKind::Constructor | MethodKind::Destructor)
    }

    pub fn is_ordinary(self) -> bool {
        self == MethodKind::Ordinary
    }

    /// Whether a declared return type is expected.
    pub fn has_return_type(self) -> bool {
        self == MethodKind::Ordinary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: SmolStr,
    pub visibility: Visibility,
    pub doc: Option<DocComment>,
    pub kind: MethodKind,
    pub return_type: Option<TypeRef>,
    pub params: Vec<Parameter>,
    pub is_variadic: bool,
    pub modifiers: MethodModifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: Option<SmolStr>,
    pub ty: TypeRef,
    pub multiplicity: Multiplicity,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodModifiers {
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_const: bool,
    pub is_inline: bool,
    pub is_explicit: bool,
    pub is_constexpr: bool,
    pub is_friend: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub is_noexcept: bool,
    pub is_defaulted: bool,
    pub is_deleted: bool,
    /// Set for members declared as `R (Scope::* name)(params)`.
    pub function_pointer: Option<FunctionPointer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionPointer {
    /// `MyClass` in `(MyClass::* name)`; `None` for `(*name)`.
    pub scope: Option<SmolStr>,
}

// ============================================================================
// RELATIONSHIPS
// ============================================================================

/// Closed set of class-diagram edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    Generalization,
    Realization,
    Association,
    Aggregation,
    Composition,
    Dependency,
}

impl From<BaseKind> for RelationKind {
    fn from(kind: BaseKind) -> Self {
        match kind {
            BaseKind::Generalization => RelationKind::Generalization,
            BaseKind::Realization => RelationKind::Realization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source: SmolStr,
    pub target: SmolStr,
    pub kind: RelationKind,
    pub multiplicity: Multiplicity,
    pub ownership: Ownership,
    /// Member that carries the edge (`None` for bases and dependencies).
    pub role: Option<SmolStr>,
}
