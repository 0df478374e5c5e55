//! Relationship classification.
//!
//! Turns the structural data of a class (bases, field types, method
//! signatures) into typed edges:
//!
//! | Shape                                   | Kind          |
//! |-----------------------------------------|---------------|
//! | base that is interface-like             | Realization   |
//! | any other base                          | Generalization|
//! | `@aggregation` on member or target      | Aggregation   |
//! | `shared_ptr<T>`                         | Aggregation   |
//! | value, collection of values, `unique_ptr<T>` | Composition |
//! | raw pointer or reference, `weak_ptr<T>`, static member | Association |
//! | only in parameters or return types      | Dependency    |
//!
//! Only class-like targets produce edges: classes of the same module,
//! forward declarations, and names present in the lookup.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::lookup::{TypeKind, TypeLookup};
use crate::model::doc::AGGREGATION_TAG;
use crate::model::{
    AliasDecl, BaseKind, ClassDecl, EnumDecl, Field, Module, Multiplicity, NestedKind, Ownership,
    RelationKind, Relationship, SmartPointer, TypeDecl, TypeRef, qualified_name,
};
use crate::parser::keywords::is_builtin_type_word;

/// What a type name refers to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'m> {
    Local(&'m ClassDecl),
    External(TypeKind),
    Forward,
}

/// Name resolution over one module plus the injected lookup.
pub(crate) struct Resolver<'m> {
    classes: FxHashMap<String, &'m ClassDecl>,
    forward: FxHashSet<String>,
    /// Enumerations and aliases: known, but never relationship targets.
    plain: FxHashSet<String>,
    lookup: &'m TypeLookup,
}

impl<'m> Resolver<'m> {
    pub(crate) fn new(module: &'m Module, lookup: &'m TypeLookup) -> Self {
        let mut classes = FxHashMap::default();
        let mut plain = FxHashSet::default();
        for decl in &module.decls {
            match decl {
                TypeDecl::Class(class) => {
                    classes.entry(class.qualified_name()).or_insert(class);
                    for nested in &class.nested {
                        let name = match &nested.decl {
                            NestedKind::Enum(EnumDecl { name, .. })
                            | NestedKind::Alias(AliasDecl { name, .. }) => name,
                        };
                        plain.insert(format!("{}::{}", class.qualified_name(), name));
                    }
                }
                TypeDecl::Enum(_) | TypeDecl::Alias(_) => {
                    plain.insert(decl.qualified_name());
                }
            }
        }
        let forward = module
            .forward_decls
            .iter()
            .map(|f| qualified_name(&f.namespace, &f.name))
            .collect();
        Self {
            classes,
            forward,
            plain,
            lookup,
        }
    }

    /// Resolve `name` as seen from inside `namespace`.
    ///
    /// Returns the name the edge should use and what it refers to.
    pub(crate) fn resolve(&self, name: &str, namespace: &[SmolStr]) -> Option<(SmolStr, Target<'m>)> {
        let bare = strip_args(name.strip_prefix("::").unwrap_or(name));
        let candidates = scoped_candidates(bare, namespace);

        if let Some((candidate, class)) = candidates
            .iter()
            .find_map(|c| self.classes.get(c).map(|class| (c, *class)))
        {
            return Some((SmolStr::new(candidate), Target::Local(class)));
        }
        if let Some(kind) = self.lookup.get(bare) {
            return Some((SmolStr::new(bare), Target::External(kind)));
        }
        candidates
            .into_iter()
            .find(|c| self.forward.contains(c))
            .map(|c| (SmolStr::new(c), Target::Forward))
    }

    /// Whether `name` names anything this module or the lookup knows.
    pub(crate) fn is_known(&self, name: &str, namespace: &[SmolStr]) -> bool {
        let bare = strip_args(name.strip_prefix("::").unwrap_or(name));
        self.resolve(name, namespace).is_some()
            || scoped_candidates(bare, namespace)
                .iter()
                .any(|c| self.plain.contains(c))
    }

    pub(crate) fn base_kind(&self, name: &str, namespace: &[SmolStr]) -> BaseKind {
        match self.resolve(name, namespace) {
            Some((_, Target::Local(class))) if class.is_interface() => BaseKind::Realization,
            Some((_, Target::External(kind))) if kind.is_abstract => BaseKind::Realization,
            _ => BaseKind::Generalization,
        }
    }
}

/// `a::b::Name` tried from the innermost namespace outwards.
fn scoped_candidates(name: &str, namespace: &[SmolStr]) -> Vec<String> {
    (0..=namespace.len())
        .rev()
        .map(|depth| qualified_name(&namespace[..depth], name))
        .collect()
}

pub(crate) fn strip_args(name: &str) -> &str {
    name.split_once('<').map_or(name, |(head, _)| head).trim_end()
}

/// Pointee of a smart pointer, or the type itself.
fn unwrap_smart(ty: &TypeRef) -> (&TypeRef, Option<SmartPointer>) {
    match ty.smart_pointer() {
        Some((kind, inner)) => (inner, Some(kind)),
        None => (ty, None),
    }
}

/// Type a member actually refers to, through collections and smart pointers.
pub(crate) fn referenced_type(ty: &TypeRef) -> &TypeRef {
    let element = ty.collection_element().unwrap_or(ty);
    unwrap_smart(element).0
}

/// Derive all relationships with `class` as source.
pub(crate) fn classify(class: &ClassDecl, resolver: &Resolver<'_>) -> Vec<Relationship> {
    let source = SmolStr::new(class.qualified_name());
    let mut out = Vec::new();

    for base in &class.bases {
        let target = resolver
            .resolve(&base.name, &class.namespace)
            .map_or_else(|| base.name.clone(), |(name, _)| name);
        out.push(Relationship {
            source: source.clone(),
            target,
            kind: base.kind.into(),
            multiplicity: Multiplicity::Scalar,
            ownership: Ownership::Value,
            role: None,
        });
    }

    let mut stored = FxHashSet::default();
    for field in class.fields() {
        if let Some(edge) = field_edge(&source, class, field, resolver) {
            stored.insert(edge.target.clone());
            out.push(edge);
        }
    }

    let mut seen = FxHashSet::default();
    for method in class.methods() {
        let types = method
            .params
            .iter()
            .map(|p| &p.ty)
            .chain(method.return_type.as_ref());
        for ty in types {
            let (inner, smart) = unwrap_smart(ty.collection_element().unwrap_or(ty));
            let Some((target, _)) = resolver.resolve(&inner.name, &class.namespace) else {
                continue;
            };
            if target == source || stored.contains(&target) || !seen.insert(target.clone()) {
                continue;
            }
            out.push(Relationship {
                source: source.clone(),
                target,
                kind: RelationKind::Dependency,
                multiplicity: Multiplicity::Scalar,
                ownership: if smart.is_some() {
                    Ownership::Pointer
                } else {
                    inner.ownership
                },
                role: None,
            });
        }
    }

    out
}

fn field_edge(
    source: &SmolStr,
    class: &ClassDecl,
    field: &Field,
    resolver: &Resolver<'_>,
) -> Option<Relationship> {
    let (element, multiplicity) = match field.ty.collection_element() {
        Some(element) => (element, Multiplicity::DynamicCollection),
        None => (&field.ty, field.multiplicity.clone()),
    };
    let (inner, smart) = unwrap_smart(element);
    let (target, resolved) = resolver.resolve(&inner.name, &class.namespace)?;

    let ownership = if smart.is_some() {
        Ownership::Pointer
    } else {
        inner.ownership
    };
    let tagged = field.doc.as_ref().is_some_and(|d| d.has_tag(AGGREGATION_TAG))
        || matches!(resolved, Target::Local(c) if c.doc.as_ref().is_some_and(|d| d.has_tag(AGGREGATION_TAG)));

    let kind = if tagged {
        RelationKind::Aggregation
    } else if field.modifiers.is_static {
        RelationKind::Association
    } else {
        match smart {
            Some(SmartPointer::Unique) => RelationKind::Composition,
            Some(SmartPointer::Shared) => RelationKind::Aggregation,
            Some(SmartPointer::Weak) => RelationKind::Association,
            None => match ownership {
                Ownership::Pointer => RelationKind::Association,
                Ownership::Value => RelationKind::Composition,
            },
        }
    };

    Some(Relationship {
        source: source.clone(),
        target,
        kind,
        multiplicity,
        ownership,
        role: Some(field.name.clone()),
    })
}

/// Classes that contain themselves by value, directly or transitively.
///
/// Only inline storage counts: pointers, references, smart pointers,
/// collections and static members all break a cycle. Each cycle is reported
/// once, as the path from its first class back to itself.
pub(crate) fn value_cycles(module: &Module, resolver: &Resolver<'_>) -> Vec<Vec<SmolStr>> {
    let mut graph: Vec<(SmolStr, Vec<SmolStr>)> = Vec::new();
    for class in module.classes() {
        let mut edges: Vec<SmolStr> = Vec::new();
        let targets = class
            .fields()
            .filter(|f| {
                !f.modifiers.is_static
                    && f.ty.ownership == Ownership::Value
                    && f.ty.smart_pointer().is_none()
                    && f.ty.collection_element().is_none()
            })
            .filter_map(|f| match resolver.resolve(&f.ty.name, &class.namespace) {
                Some((name, Target::Local(_))) => Some(name),
                _ => None,
            });
        for target in targets {
            if !edges.contains(&target) {
                edges.push(target);
            }
        }
        graph.push((SmolStr::new(class.qualified_name()), edges));
    }
    let index: FxHashMap<&SmolStr, usize> =
        graph.iter().enumerate().map(|(i, (name, _))| (name, i)).collect();

    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        OnStack,
        Done,
    }

    let mut state = vec![State::Unvisited; graph.len()];
    let mut cycles = Vec::new();

    for root in 0..graph.len() {
        if state[root] != State::Unvisited {
            continue;
        }
        // Iterative DFS: (node, next edge to follow).
        let mut stack = vec![(root, 0usize)];
        state[root] = State::OnStack;
        while let Some(&(node, next)) = stack.last() {
            let Some(target) = graph[node].1.get(next) else {
                state[node] = State::Done;
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            let Some(&target) = index.get(target) else {
                continue;
            };
            match state[target] {
                State::Unvisited => {
                    state[target] = State::OnStack;
                    stack.push((target, 0));
                }
                State::OnStack => {
                    let start = stack.iter().position(|(n, _)| *n == target).unwrap_or(0);
                    let mut path: Vec<SmolStr> =
                        stack[start..].iter().map(|(n, _)| graph[*n].0.clone()).collect();
                    path.push(graph[target].0.clone());
                    cycles.push(path);
                }
                State::Done => {}
            }
        }
    }
    cycles
}

/// Names declared by a `template<...>` head.
pub(crate) fn template_params(head: &str) -> Vec<SmolStr> {
    let Some(inner) = head
        .split_once('<')
        .and_then(|(_, rest)| rest.rsplit_once('>'))
        .map(|(inner, _)| inner)
    else {
        return Vec::new();
    };
    let mut depth = 0usize;
    let mut parts = vec![String::new()];
    for c in inner.chars() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(String::new());
                continue;
            }
            _ => {}
        }
        if let Some(part) = parts.last_mut() {
            part.push(c);
        }
    }
    parts
        .iter()
        .filter_map(|part| {
            let declaration = part.split('=').next().unwrap_or(part);
            declaration
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .rfind(|w| !w.is_empty())
                .map(SmolStr::new)
        })
        .collect()
}

/// Whether `ty` needs resolving at all: builtins, standard library names
/// and opaque text never do.
pub(crate) fn needs_resolution(ty: &TypeRef, template_params: &[SmolStr]) -> bool {
    let name = ty.name.as_str();
    if name.split_whitespace().all(is_builtin_type_word) {
        return false;
    }
    if name.starts_with("std::") || name.starts_with("::std::") {
        return false;
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':') {
        return false;
    }
    !template_params.iter().any(|p| p == name)
}
