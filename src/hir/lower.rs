//! Lowering: raw syntax tree → classified [`Module`].
//!
//! Runs in two passes. The structural pass copies declarations into the
//! model and reports per-declaration problems (duplicate names, duplicate
//! enumerators, duplicate bases, zero-length arrays). The semantic pass
//! resolves names against the whole module and the lookup, classifies base
//! kinds and relationships, and checks for value cycles.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use text_size::TextRange;
use tracing::debug;

use super::ExtractOptions;
use super::classify::{
    Resolver, classify, needs_resolution, referenced_type, strip_args, template_params,
    value_cycles,
};
use super::diagnostics::{DiagnosticCollector, DiagnosticKind, codes};
use super::lookup::TypeLookup;
use crate::model::{
    BaseKind, BaseRef, ClassDecl, EnumDecl, Member, Module, Multiplicity, NestedKind, TypeDecl,
    TypeRef,
};
use crate::parser::{ClassNode, Item, ItemKind, SourceFile};

/// Source ranges kept for a lowered class, for semantic-pass diagnostics.
struct ClassRanges {
    item: TextRange,
    members: Vec<TextRange>,
}

pub(crate) struct Lowering<'a, 'd> {
    diagnostics: &'d mut DiagnosticCollector<'a>,
    lookup: &'a TypeLookup,
    options: &'a ExtractOptions,
}

impl<'a, 'd> Lowering<'a, 'd> {
    pub(crate) fn new(
        diagnostics: &'d mut DiagnosticCollector<'a>,
        lookup: &'a TypeLookup,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            diagnostics,
            lookup,
            options,
        }
    }

    pub(crate) fn lower(mut self, name: &str, file: SourceFile) -> Module {
        let mut module = Module::new(name);
        module.doc = file.doc;
        module.includes = file.includes;

        let mut ranges = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for Item { range, kind } in file.items {
            let decl = match kind {
                ItemKind::Forward(forward) => {
                    module.forward_decls.push(forward);
                    continue;
                }
                ItemKind::Enum(decl) => {
                    self.check_enumerators(&decl, range);
                    TypeDecl::Enum(decl)
                }
                ItemKind::Alias(decl) => TypeDecl::Alias(decl),
                ItemKind::Class(node) => {
                    let (class, class_ranges) = self.lower_class(node, range);
                    ranges.push(class_ranges);
                    TypeDecl::Class(class)
                }
            };
            let qualified = decl.qualified_name();
            if !seen.insert(qualified.clone()) {
                self.diagnostics.error(
                    DiagnosticKind::SemanticError,
                    codes::DUPLICATE_TYPE,
                    range,
                    format!("type `{qualified}` is declared more than once"),
                );
            }
            module.decls.push(decl);
        }

        self.classify_bases(&mut module);
        self.derive_relationships(&mut module, &ranges);

        debug!(
            module = %module.name,
            decls = module.decls.len(),
            forward = module.forward_decls.len(),
            "lowered module"
        );
        module
    }

    // ========================================================================
    // STRUCTURAL PASS
    // ========================================================================

    fn lower_class(&mut self, node: ClassNode, range: TextRange) -> (ClassDecl, ClassRanges) {
        let ClassNode {
            key,
            name,
            namespace,
            doc,
            template,
            is_final,
            via_typedef,
            bases,
            members,
            nested,
        } = node;

        let mut class = ClassDecl::new(key, name);
        class.namespace = namespace;
        class.doc = doc;
        class.template = template;
        class.is_final = is_final;
        class.via_typedef = via_typedef;

        for (i, base) in bases.iter().enumerate() {
            let duplicate_of = bases[..i].iter().position(|b| b.name == base.name);
            if duplicate_of.is_some() {
                self.diagnostics.warning(
                    DiagnosticKind::StructureWarning,
                    codes::DUPLICATE_BASE,
                    base.range,
                    format!("base `{}` of `{}` is listed more than once", base.name, class.name),
                );
            }
            class.bases.push(BaseRef {
                name: base.name.clone(),
                access: base.access,
                is_virtual: base.is_virtual,
                kind: BaseKind::Generalization,
                duplicate_of,
            });
        }

        for decl in &nested {
            if let NestedKind::Enum(e) = &decl.decl {
                self.check_enumerators(e, range);
            }
        }
        class.nested = nested;

        let mut member_ranges = Vec::with_capacity(members.len());
        for node in members {
            if let Member::Field(field) = &node.member {
                if let Multiplicity::FixedArray { dims, .. } = &field.multiplicity {
                    if dims.contains(&0) {
                        self.diagnostics.warning(
                            DiagnosticKind::StructureWarning,
                            codes::ZERO_LENGTH_ARRAY,
                            node.range,
                            format!("field `{}` is an array of zero elements", field.name),
                        );
                    }
                }
            }
            member_ranges.push(node.range);
            class.members.push(node.member);
        }
        class.is_abstract = class.has_pure_virtual();

        (
            class,
            ClassRanges {
                item: range,
                members: member_ranges,
            },
        )
    }

    fn check_enumerators(&mut self, decl: &EnumDecl, range: TextRange) {
        let mut names = FxHashSet::default();
        for entry in &decl.entries {
            if !names.insert(&entry.name) {
                self.diagnostics.error(
                    DiagnosticKind::SemanticError,
                    codes::DUPLICATE_ENUMERATOR,
                    range,
                    format!("enumerator `{}` appears more than once in `{}`", entry.name, decl.name),
                );
            }
        }
    }

    // ========================================================================
    // SEMANTIC PASS
    // ========================================================================

    /// Base kinds need every class of the module to be known first.
    fn classify_bases(&self, module: &mut Module) {
        let kinds: Vec<Vec<BaseKind>> = {
            let resolver = Resolver::new(module, self.lookup);
            module
                .classes()
                .map(|class| {
                    class
                        .bases
                        .iter()
                        .map(|b| resolver.base_kind(&b.name, &class.namespace))
                        .collect()
                })
                .collect()
        };
        for (class, kinds) in classes_mut(module).zip(kinds) {
            for (base, kind) in class.bases.iter_mut().zip(kinds) {
                base.kind = kind;
            }
        }
    }

    fn derive_relationships(&mut self, module: &mut Module, ranges: &[ClassRanges]) {
        let relationships: Vec<_> = {
            let resolver = Resolver::new(module, self.lookup);

            let mut by_name: FxHashMap<String, TextRange> = FxHashMap::default();
            for (class, ranges) in module.classes().zip(ranges) {
                by_name.entry(class.qualified_name()).or_insert(ranges.item);
                if self.options.strict_lookup {
                    self.check_resolved(class, ranges, &resolver);
                }
            }

            for cycle in value_cycles(module, &resolver) {
                let range = cycle
                    .first()
                    .and_then(|name| by_name.get(name.as_str()))
                    .copied()
                    .unwrap_or_default();
                let path = cycle.iter().map(SmolStr::as_str).collect::<Vec<_>>().join(" -> ");
                self.diagnostics.error(
                    DiagnosticKind::SemanticError,
                    codes::CYCLIC_VALUE_COMPOSITION,
                    range,
                    format!("cyclic value composition: {path}"),
                );
            }

            module.classes().map(|class| classify(class, &resolver)).collect()
        };

        let mut total = 0;
        for (class, edges) in classes_mut(module).zip(relationships) {
            total += edges.len();
            class.relationships = edges;
        }
        debug!(module = %module.name, relationships = total, "classified relationships");
    }

    /// Every named type a class stores or inherits from must be known when
    /// the lookup is mandatory.
    fn check_resolved(&mut self, class: &ClassDecl, ranges: &ClassRanges, resolver: &Resolver<'_>) {
        let params = class
            .template
            .as_deref()
            .map(template_params)
            .unwrap_or_default();
        let mut scope = class.namespace.clone();
        scope.push(class.name.clone());

        for base in &class.bases {
            let ty = TypeRef::named(strip_args(&base.name));
            if needs_resolution(&ty, &params) && !resolver.is_known(&ty.name, &scope) {
                self.diagnostics.error(
                    DiagnosticKind::SemanticError,
                    codes::UNRESOLVED_TARGET,
                    ranges.item,
                    format!("base `{}` of `{}` cannot be resolved", base.name, class.name),
                );
            }
        }

        for (member, range) in class.members.iter().zip(&ranges.members) {
            let Member::Field(field) = member else {
                continue;
            };
            let ty = referenced_type(&field.ty);
            if needs_resolution(ty, &params) && !resolver.is_known(&ty.name, &scope) {
                self.diagnostics.error(
                    DiagnosticKind::SemanticError,
                    codes::UNRESOLVED_TARGET,
                    *range,
                    format!("type `{}` of field `{}` cannot be resolved", ty.name, field.name),
                );
            }
        }
    }
}

fn classes_mut(module: &mut Module) -> impl Iterator<Item = &mut ClassDecl> {
    module.decls.iter_mut().filter_map(|d| match d {
        TypeDecl::Class(c) => Some(c),
        _ => None,
    })
}

