//! Round-trip validation.
//!
//! `M → synthesize → text → extract → M'`, then `M` and `M'` are compared
//! structurally. Documentation and source positions are ignored. Member
//! order is compared per visibility section in synthesis order, because
//! synthesis groups members; relationships are compared as a multiset.

use std::fmt::{self, Debug};

use rustc_hash::FxHashMap;
use tracing::debug;

use super::SynthesisError;
use super::synthesize::{SynthesisOptions, synthesize};
use crate::hir::{Diagnostic, ExtractOptions, TypeLookup, extract};
use crate::model::{
    AliasDecl, ClassDecl, EnumDecl, Field, Method, Module, NestedDecl, NestedKind, Relationship,
    Section, TypeDecl, Visibility,
};

/// One structural difference between a model and its re-extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Where the difference is (`Car.public.fields[1]`).
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, found {}", self.path, self.expected, self.found)
    }
}

/// Outcome of one round trip.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    /// Synthesized text.
    pub text: String,
    /// Model extracted back from `text`.
    pub module: Option<Module>,
    /// Diagnostics of the re-extraction.
    pub diagnostics: Vec<Diagnostic>,
    pub mismatches: Vec<Mismatch>,
    /// Re-synthesizing the re-extracted model reproduced `text` exactly.
    pub stable: bool,
}

impl RoundTrip {
    pub fn passed(&self) -> bool {
        self.module.is_some()
            && self.mismatches.is_empty()
            && self.stable
            && !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Run `module` through synthesis and extraction and compare the result.
///
/// `lookup` and `extract_options` must be the ones the module was extracted
/// with, since they decide base kinds and relationships.
pub fn round_trip(
    module: &Module,
    lookup: &TypeLookup,
    extract_options: &ExtractOptions,
    synthesis_options: &SynthesisOptions,
) -> Result<RoundTrip, SynthesisError> {
    let text = synthesize(module, synthesis_options)?;
    let extraction = extract(&text, &module.name, lookup, extract_options);

    let (mismatches, stable) = match &extraction.module {
        Some(found) => {
            let mismatches = compare_modules(module, found);
            let again = synthesize(found, synthesis_options)?;
            (mismatches, again == text)
        }
        None => (
            vec![Mismatch {
                path: module.name.to_string(),
                expected: "a model".to_string(),
                found: "no model (semantic errors)".to_string(),
            }],
            false,
        ),
    };
    debug!(
        module = %module.name,
        mismatches = mismatches.len(),
        stable,
        "round trip finished"
    );

    Ok(RoundTrip {
        text,
        module: extraction.module,
        diagnostics: extraction.diagnostics,
        mismatches,
        stable,
    })
}

/// Structural differences between two models.
pub fn compare_modules(expected: &Module, found: &Module) -> Vec<Mismatch> {
    let mut cmp = Comparer::default();
    cmp.eq("module.name", &expected.name, &found.name);
    cmp.eq("module.includes", &expected.includes, &found.includes);
    cmp.eq("module.forwardDecls", &expected.forward_decls, &found.forward_decls);

    let names = |m: &Module| m.decls.iter().map(TypeDecl::qualified_name).collect::<Vec<_>>();
    if cmp.eq("module.decls", &names(expected), &names(found)) {
        for (a, b) in expected.decls.iter().zip(&found.decls) {
            let path = a.qualified_name();
            match (a, b) {
                (TypeDecl::Enum(a), TypeDecl::Enum(b)) => cmp.eq(&path, &enum_shape(a), &enum_shape(b)),
                (TypeDecl::Alias(a), TypeDecl::Alias(b)) => {
                    cmp.eq(&path, &alias_shape(a), &alias_shape(b))
                }
                (TypeDecl::Class(a), TypeDecl::Class(b)) => {
                    compare_classes(&mut cmp, &path, a, b);
                    true
                }
                _ => cmp.eq(&format!("{path}.decl"), &decl_kind(a), &decl_kind(b)),
            };
        }
    }
    cmp.mismatches
}

fn compare_classes(cmp: &mut Comparer, path: &str, a: &ClassDecl, b: &ClassDecl) {
    cmp.eq(&format!("{path}.key"), &a.key, &b.key);
    cmp.eq(&format!("{path}.template"), &a.template, &b.template);
    cmp.eq(&format!("{path}.isFinal"), &a.is_final, &b.is_final);
    cmp.eq(&format!("{path}.viaTypedef"), &a.via_typedef, &b.via_typedef);
    cmp.eq(&format!("{path}.isAbstract"), &a.is_abstract, &b.is_abstract);
    cmp.eq(&format!("{path}.bases"), &a.bases, &b.bases);

    let (sections_a, sections_b) = (a.sections(), b.sections());
    if cmp.eq(&format!("{path}.sections"), &visibilities(&sections_a), &visibilities(&sections_b)) {
        for (sa, sb) in sections_a.iter().zip(&sections_b) {
            let section = format!("{path}.{}", sa.visibility);
            cmp.eq(
                &format!("{section}.nested"),
                &shapes(&sa.nested, nested_shape),
                &shapes(&sb.nested, nested_shape),
            );
            cmp.eq(
                &format!("{section}.special"),
                &shapes(&sa.special, method_shape),
                &shapes(&sb.special, method_shape),
            );
            cmp.eq(
                &format!("{section}.methods"),
                &shapes(&sa.methods, method_shape),
                &shapes(&sb.methods, method_shape),
            );
            cmp.eq(
                &format!("{section}.fields"),
                &shapes(&sa.fields, field_shape),
                &shapes(&sb.fields, field_shape),
            );
        }
    }

    let mut counts: FxHashMap<&Relationship, i64> = FxHashMap::default();
    for edge in &a.relationships {
        *counts.entry(edge).or_default() += 1;
    }
    for edge in &b.relationships {
        *counts.entry(edge).or_default() -= 1;
    }
    let mut unbalanced: Vec<_> = counts.into_iter().filter(|(_, n)| *n != 0).collect();
    unbalanced.sort_by_key(|(edge, _)| format!("{edge:?}"));
    for (edge, n) in unbalanced {
        let described = describe(edge);
        let (expected, found) = if n > 0 {
            (described, "missing".to_string())
        } else {
            ("nothing".to_string(), described)
        };
        cmp.mismatches.push(Mismatch {
            path: format!("{path}.relationships"),
            expected,
            found,
        });
    }
}

fn visibilities(sections: &[Section<'_>]) -> Vec<Visibility> {
    sections.iter().map(|s| s.visibility).collect()
}

fn describe(edge: &Relationship) -> String {
    let role = edge.role.as_deref().map(|r| format!(" ({r})")).unwrap_or_default();
    format!(
        "{:?} {} -> {}{role} {:?} {:?}",
        edge.kind, edge.source, edge.target, edge.multiplicity, edge.ownership
    )
}

#[derive(Default)]
struct Comparer {
    mismatches: Vec<Mismatch>,
}

impl Comparer {
    /// Record a mismatch unless `a == b`; returns whether they were equal.
    fn eq<T: PartialEq + Debug>(&mut self, path: &str, a: &T, b: &T) -> bool {
        if a == b {
            return true;
        }
        self.mismatches.push(Mismatch {
            path: path.to_string(),
            expected: format!("{a:?}"),
            found: format!("{b:?}"),
        });
        false
    }
}

// Copies with documentation removed.

fn shapes<T>(items: &[&T], shape: fn(&T) -> T) -> Vec<T> {
    items.iter().map(|item| shape(item)).collect()
}

fn enum_shape(decl: &EnumDecl) -> EnumDecl {
    let mut shape = decl.clone();
    shape.doc = None;
    for entry in &mut shape.entries {
        entry.doc = None;
    }
    shape
}

fn alias_shape(decl: &AliasDecl) -> AliasDecl {
    AliasDecl {
        doc: None,
        ..decl.clone()
    }
}

fn nested_shape(decl: &NestedDecl) -> NestedDecl {
    NestedDecl {
        visibility: decl.visibility,
        decl: match &decl.decl {
            NestedKind::Enum(e) => NestedKind::Enum(enum_shape(e)),
            NestedKind::Alias(a) => NestedKind::Alias(alias_shape(a)),
        },
    }
}

fn field_shape(field: &Field) -> Field {
    Field {
        doc: None,
        ..field.clone()
    }
}

fn method_shape(method: &Method) -> Method {
    Method {
        doc: None,
        ..method.clone()
    }
}

fn decl_kind(decl: &TypeDecl) -> &'static str {
    match decl {
        TypeDecl::Enum(_) => "enum",
        TypeDecl::Alias(_) => "alias",
        TypeDecl::Class(_) => "class",
    }
}
