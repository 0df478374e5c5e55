//! Synthesis: model → declaration text.
//!
//! Output is a canonical normal form. Within each class, sections come in
//! the order public, protected, private; inside a section nested
//! declarations come first, then constructors and destructors, then
//! methods, then fields, each in declaration order. Synthesizing the
//! extraction of synthesized text reproduces it byte for byte.
//!
//! Relationships are never rendered: they follow from the fields, method
//! signatures and bases that are.

use std::fmt::Write as _;

use smol_str::SmolStr;
use tracing::debug;

use super::SynthesisError;
use crate::model::{
    AliasDecl, AliasForm, ClassDecl, DocAnnotations, DocComment, EnumDecl, Field, ForwardDecl,
    Member, Method, MethodKind, Module, Multiplicity, NestedKind, Parameter, TypeDecl, TypeRef,
};
use crate::parser::keywords::is_identifier;

/// Options for rendering declaration text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Number of spaces per indentation level (or tab width if using tabs)
    pub tab_size: usize,
    /// Use spaces for indentation (false = use tabs)
    pub insert_spaces: bool,
    /// Wrap the output in `#ifndef _NAME_H_` / `#define` / `#endif`.
    pub include_guard: bool,
    /// Generate doc blocks for the file, classes and methods that have none.
    pub doc_templates: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
            include_guard: true,
            doc_templates: true,
        }
    }
}

impl SynthesisOptions {
    /// Generate indentation string for the given level
    pub fn indent(&self, level: usize) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size * level)
        } else {
            "\t".repeat(level)
        }
    }
}

/// Render `module` as declaration text.
///
/// Fails without producing any text when the module breaks a model
/// invariant (see [`check_invariants`]).
pub fn synthesize(module: &Module, options: &SynthesisOptions) -> Result<String, SynthesisError> {
    check_invariants(module)?;
    debug!(module = %module.name, decls = module.decls.len(), "synthesizing");

    let mut w = Writer::new(options);
    let guard = guard_name(&module.name);

    match &module.doc {
        Some(doc) => w.file_doc(doc, &module.name),
        None if options.doc_templates => {
            w.block(0, &[format!("@file {}.h", module.name)]);
        }
        None => {}
    }

    if options.include_guard {
        w.blank();
        w.line(0, &format!("#ifndef {guard}"));
        w.line(0, &format!("#define {guard}"));
    }

    if !module.includes.is_empty() {
        w.blank();
        for include in &module.includes {
            w.line(0, &format!("#include {include}"));
        }
    }

    if !module.forward_decls.is_empty() {
        w.blank();
        w.line(0, "// forward declarations");
        let mut scope = Scope::new(false);
        for forward in &module.forward_decls {
            scope.enter(&mut w, &forward.namespace);
            w.forward(forward);
        }
        scope.close(&mut w);
    }

    let mut scope = Scope::new(true);
    for decl in &module.decls {
        scope.enter(&mut w, decl.namespace());
        w.blank();
        match decl {
            TypeDecl::Enum(e) => w.enumeration(0, e),
            TypeDecl::Alias(a) => w.alias(0, a),
            TypeDecl::Class(c) => w.class(c),
        }
    }
    scope.close(&mut w);

    if options.include_guard {
        w.blank();
        w.line(0, &format!("#endif // {guard}"));
    }
    Ok(w.out)
}

/// `_NAME_H_` for module `Name`.
pub fn guard_name(module: &str) -> String {
    let upper: String = module
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("_{upper}_H_")
}

// ============================================================================
// INVARIANTS
// ============================================================================

/// Check the invariants synthesis relies on.
///
/// Extraction always produces conforming modules; a violation means the
/// model was authored or edited by something else.
pub fn check_invariants(module: &Module) -> Result<(), SynthesisError> {
    let mut seen = rustc_hash::FxHashSet::default();
    for decl in &module.decls {
        let qualified = decl.qualified_name();
        if !seen.insert(qualified.clone()) {
            return Err(SynthesisError::DuplicateType(qualified));
        }
        check_name("type", decl.name())?;
        for segment in decl.namespace() {
            check_name("namespace", segment)?;
        }
        match decl {
            TypeDecl::Enum(e) => check_enum(e)?,
            TypeDecl::Alias(a) => check_name("alias", &a.name)?,
            TypeDecl::Class(c) => check_class(c)?,
        }
    }
    for forward in &module.forward_decls {
        check_name("forward-declared type", &forward.name)?;
    }
    Ok(())
}

fn check_name(what: &'static str, name: &str) -> Result<(), SynthesisError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SynthesisError::InvalidName {
            what,
            name: name.to_string(),
        })
    }
}

fn check_enum(decl: &EnumDecl) -> Result<(), SynthesisError> {
    for entry in &decl.entries {
        check_name("enumerator", &entry.name)?;
    }
    if let Some(underlying) = &decl.underlying {
        check_type(&decl.name, underlying)?;
    }
    Ok(())
}

fn check_class(class: &ClassDecl) -> Result<(), SynthesisError> {
    let owner = class.qualified_name();
    for (index, base) in class.bases.iter().enumerate() {
        if let Some(first) = base.duplicate_of {
            if first >= index || class.bases[first].name != base.name {
                return Err(SynthesisError::DuplicateLink {
                    class: owner,
                    index,
                });
            }
        }
    }
    for nested in &class.nested {
        match &nested.decl {
            NestedKind::Enum(e) => {
                check_name("type", &e.name)?;
                check_enum(e)?;
            }
            NestedKind::Alias(a) => check_name("alias", &a.name)?,
        }
    }
    for member in &class.members {
        match member {
            Member::Field(field) => {
                check_name("field", &field.name)?;
                check_type(&owner, &field.ty)?;
                check_multiplicity(&owner, &field.name, &field.multiplicity)?;
            }
            Member::Method(method) => check_method(&owner, method)?,
        }
    }
    Ok(())
}

fn check_method(owner: &str, method: &Method) -> Result<(), SynthesisError> {
    let name_ok = match method.kind {
        MethodKind::Ordinary if method.name.starts_with("operator") => true,
        MethodKind::Ordinary | MethodKind::Constructor => is_identifier(&method.name),
        MethodKind::Destructor => method
            .name
            .strip_prefix('~')
            .is_some_and(is_identifier),
        MethodKind::Conversion => method.name.starts_with("operator "),
    };
    if !name_ok {
        return Err(SynthesisError::InvalidName {
            what: "method",
            name: method.name.to_string(),
        });
    }
    match &method.return_type {
        Some(ty) => check_type(owner, ty)?,
        None if method.kind.has_return_type() => {
            return Err(SynthesisError::MissingReturnType {
                owner: owner.to_string(),
                method: method.name.to_string(),
            });
        }
        None => {}
    }
    for param in &method.params {
        if let Some(name) = &param.name {
            check_name("parameter", name)?;
        }
        check_type(owner, &param.ty)?;
        check_multiplicity(owner, &method.name, &param.multiplicity)?;
    }
    Ok(())
}

fn check_type(owner: &str, ty: &TypeRef) -> Result<(), SynthesisError> {
    if ty.name.trim().is_empty() {
        return Err(SynthesisError::EmptyType {
            owner: owner.to_string(),
        });
    }
    if ty.ownership != ty.derived_ownership() {
        return Err(SynthesisError::Ownership {
            owner: owner.to_string(),
            ty: ty.to_source(),
        });
    }
    ty.args.iter().try_for_each(|arg| check_type(owner, arg))
}

fn check_multiplicity(owner: &str, field: &str, multiplicity: &Multiplicity) -> Result<(), SynthesisError> {
    let Multiplicity::FixedArray { size, dims } = multiplicity else {
        return Ok(());
    };
    if dims.is_empty() {
        return Err(SynthesisError::MissingDimensions {
            owner: owner.to_string(),
            field: field.to_string(),
        });
    }
    if Multiplicity::from_dims(dims.clone()).as_ref() != Some(multiplicity) {
        return Err(SynthesisError::ArraySize {
            owner: owner.to_string(),
            field: field.to_string(),
            size: *size,
            dims: dims.clone(),
        });
    }
    Ok(())
}

// ============================================================================
// WRITER
// ============================================================================

struct Writer<'o> {
    out: String,
    options: &'o SynthesisOptions,
}

/// Currently open namespace path.
struct Scope {
    open: Vec<SmolStr>,
    /// Blank lines around namespace braces.
    spaced: bool,
}

impl Scope {
    fn new(spaced: bool) -> Self {
        Self {
            open: Vec::new(),
            spaced,
        }
    }

    fn enter(&mut self, w: &mut Writer<'_>, namespace: &[SmolStr]) {
        if self.open.as_slice() == namespace {
            return;
        }
        self.close(w);
        if namespace.is_empty() {
            return;
        }
        if self.spaced {
            w.blank();
        }
        for segment in namespace {
            w.line(0, &format!("namespace {segment} {{"));
        }
        self.open = namespace.to_vec();
    }

    fn close(&mut self, w: &mut Writer<'_>) {
        if self.open.is_empty() {
            return;
        }
        if self.spaced {
            w.blank();
        }
        for segment in self.open.drain(..).rev() {
            w.line(0, &format!("}} // namespace {segment}"));
        }
    }
}

impl<'o> Writer<'o> {
    fn new(options: &'o SynthesisOptions) -> Self {
        Self {
            out: String::new(),
            options,
        }
    }

    fn line(&mut self, level: usize, text: &str) {
        if !text.is_empty() {
            self.out.push_str(&self.options.indent(level));
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// A single empty line, never two in a row and never at the start.
    fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    // ------------------------------------------------------------------------
    // Doc blocks
    // ------------------------------------------------------------------------

    /// Echo a doc block as written, or render its annotations.
    fn doc(&mut self, level: usize, doc: &DocComment) {
        match &doc.verbatim {
            Some(text) => {
                for (i, line) in text.lines().enumerate() {
                    if i > 0 && line.starts_with('*') {
                        self.line(level, &format!(" {line}"));
                    } else {
                        self.line(level, line);
                    }
                }
            }
            None => {
                let tags = annotation_lines(&doc.annotations);
                self.block(level, &tags);
            }
        }
    }

    fn file_doc(&mut self, doc: &DocComment, module: &str) {
        if doc.verbatim.is_some() {
            self.doc(0, doc);
            return;
        }
        let mut tags = Vec::new();
        if !doc.annotations.has_tag(crate::model::doc::FILE_TAG) {
            tags.push(format!("@file {module}.h"));
        }
        tags.extend(annotation_lines(&doc.annotations));
        self.block(0, &tags);
    }

    /// `/** ... */` with one tag line per entry; multi-line entries continue
    /// on ` * ` lines.
    fn block(&mut self, level: usize, entries: &[String]) {
        self.line(level, "/**");
        for entry in entries {
            for line in entry.lines() {
                if line.is_empty() {
                    self.line(level, " *");
                } else {
                    self.line(level, &format!(" * {line}"));
                }
            }
        }
        self.line(level, " */");
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn forward(&mut self, forward: &ForwardDecl) {
        self.line(0, &format!("{} {};", forward.key.keyword(), forward.name));
    }

    fn enumeration(&mut self, level: usize, decl: &EnumDecl) {
        if let Some(doc) = &decl.doc {
            self.doc(level, doc);
        }
        let mut head = String::from(if decl.via_typedef { "typedef enum" } else { "enum" });
        if decl.scoped {
            head.push_str(" class");
        }
        if !decl.via_typedef {
            head.push(' ');
            head.push_str(&decl.name);
        }
        if let Some(underlying) = &decl.underlying {
            let _ = write!(head, " : {}", underlying.to_source());
        }
        head.push_str(" {");
        self.line(level, &head);

        let last = decl.entries.len().saturating_sub(1);
        for (i, entry) in decl.entries.iter().enumerate() {
            if let Some(doc) = &entry.doc {
                self.doc(level + 1, doc);
            }
            let mut text = entry.name.to_string();
            if let Some(value) = &entry.value {
                let _ = write!(text, " = {value}");
            }
            if i < last {
                text.push(',');
            }
            self.line(level + 1, &text);
        }

        if decl.via_typedef {
            self.line(level, &format!("}} {};", decl.name));
        } else {
            self.line(level, "};");
        }
    }

    fn alias(&mut self, level: usize, decl: &AliasDecl) {
        if let Some(doc) = &decl.doc {
            self.doc(level, doc);
        }
        let text = match decl.form {
            AliasForm::Typedef => format!("typedef {} {};", decl.target, decl.name),
            AliasForm::Using => format!("using {} = {};", decl.name, decl.target),
            AliasForm::Verbatim => format!("{};", decl.target),
        };
        self.line(level, &text);
    }

    fn class(&mut self, class: &ClassDecl) {
        match &class.doc {
            Some(doc) => self.doc(0, doc),
            None if self.options.doc_templates => {
                let entries = [
                    format!("@{} {}", class.key.keyword(), class.name),
                    format!("@brief {}", class.name),
                ];
                self.block(0, &entries);
            }
            None => {}
        }
        if let Some(template) = &class.template {
            self.line(0, template);
        }

        let mut head = if class.via_typedef {
            format!("typedef {}", class.key.keyword())
        } else {
            format!("{} {}", class.key.keyword(), class.name)
        };
        if class.is_final {
            head.push_str(" final");
        }
        if !class.bases.is_empty() {
            let bases: Vec<String> = class
                .bases
                .iter()
                .map(|b| {
                    let virtual_kw = if b.is_virtual { "virtual " } else { "" };
                    format!("{virtual_kw}{} {}", b.access.keyword(), b.name)
                })
                .collect();
            let _ = write!(head, " : {}", bases.join(", "));
        }
        head.push_str(" {");
        self.line(0, &head);

        for (i, section) in class.sections().iter().enumerate() {
            if i > 0 {
                self.blank();
            }
            if i > 0 || section.visibility != class.key.default_visibility() {
                self.line(0, &format!("{}:", section.visibility.keyword()));
            }
            for nested in &section.nested {
                match &nested.decl {
                    NestedKind::Enum(e) => self.enumeration(1, e),
                    NestedKind::Alias(a) => self.alias(1, a),
                }
            }
            for method in section.special.iter().chain(&section.methods) {
                self.method(method);
            }
            for field in &section.fields {
                self.field(field);
            }
        }

        if class.via_typedef {
            self.line(0, &format!("}} {};", class.name));
        } else {
            self.line(0, "};");
        }
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    fn field(&mut self, field: &Field) {
        if let Some(doc) = &field.doc {
            self.doc(1, doc);
        }
        let m = field.modifiers;
        let mut text = String::new();
        for (set, keyword) in [
            (m.is_static, "static "),
            (m.is_mutable, "mutable "),
            (m.is_constexpr, "constexpr "),
            (m.is_volatile, "volatile "),
        ] {
            if set {
                text.push_str(keyword);
            }
        }
        let _ = write!(
            text,
            "{} {}{}",
            field.ty.to_source(),
            field.name,
            field.multiplicity.array_suffix()
        );
        if let Some(width) = field.bit_width {
            let _ = write!(text, " : {width}");
        }
        match field.default_value.as_deref() {
            Some(value) if value.starts_with('{') => text.push_str(value),
            Some(value) => {
                let _ = write!(text, " = {value}");
            }
            None => {}
        }
        text.push(';');
        self.line(1, &text);
    }

    fn method(&mut self, method: &Method) {
        match &method.doc {
            Some(doc) => self.doc(1, doc),
            None if self.options.doc_templates => {
                let entries = method_template(method);
                self.block(1, &entries);
            }
            None => {}
        }

        let m = &method.modifiers;
        let params = render_params(&method.params, method.is_variadic);
        let mut text = String::new();

        if let Some(pointer) = &m.function_pointer {
            if m.is_static {
                text.push_str("static ");
            }
            let ret = method.return_type.as_ref().map(TypeRef::to_source).unwrap_or_default();
            let scope = pointer
                .scope
                .as_ref()
                .map(|s| format!("{s}::"))
                .unwrap_or_default();
            let _ = write!(text, "{ret} ({scope}*{})({params})", method.name);
            if m.is_const {
                text.push_str(" const");
            }
            text.push(';');
            self.line(1, &text);
            return;
        }

        for (set, keyword) in [
            (m.is_friend, "friend "),
            (m.is_static, "static "),
            (m.is_virtual, "virtual "),
            (m.is_inline, "inline "),
            (m.is_explicit, "explicit "),
            (m.is_constexpr, "constexpr "),
        ] {
            if set {
                text.push_str(keyword);
            }
        }
        if let Some(ret) = &method.return_type {
            text.push_str(&ret.to_source());
            text.push(' ');
        }
        let _ = write!(text, "{}({params})", method.name);
        for (set, keyword) in [
            (m.is_const, " const"),
            (m.is_noexcept, " noexcept"),
            (m.is_override, " override"),
            (m.is_final, " final"),
        ] {
            if set {
                text.push_str(keyword);
            }
        }
        if m.is_pure_virtual {
            text.push_str(" = 0");
        } else if m.is_defaulted {
            text.push_str(" = default");
        } else if m.is_deleted {
            text.push_str(" = delete");
        }
        text.push(';');
        self.line(1, &text);
    }
}

fn render_params(params: &[Parameter], is_variadic: bool) -> String {
    let mut parts: Vec<String> = params
        .iter()
        .map(|p| {
            let mut text = p.ty.to_source();
            if let Some(name) = &p.name {
                text.push(' ');
                text.push_str(name);
            }
            text.push_str(&p.multiplicity.array_suffix());
            if let Some(value) = &p.default_value {
                let _ = write!(text, " = {value}");
            }
            text
        })
        .collect();
    if is_variadic {
        parts.push("...".to_string());
    }
    parts.join(", ")
}

fn annotation_lines(annotations: &DocAnnotations) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(brief) = &annotations.brief {
        lines.push(format!("@brief {brief}"));
    }
    if let Some(details) = &annotations.details {
        lines.push(format!("@details {details}"));
    }
    for param in &annotations.params {
        lines.push(tag_line("param", &format!("{} {}", param.name, param.text)));
    }
    if let Some(returns) = &annotations.returns {
        lines.push(tag_line("return", returns));
    }
    for tag in &annotations.tags {
        lines.push(tag_line(&tag.name, &tag.text));
    }
    lines
}

fn tag_line(tag: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        format!("@{tag}")
    } else {
        format!("@{tag} {text}")
    }
}

fn method_template(method: &Method) -> Vec<String> {
    let brief = match method.kind {
        MethodKind::Constructor => "Constructor".to_string(),
        MethodKind::Destructor => "Destructor".to_string(),
        _ => method.name.to_string(),
    };
    let mut lines = vec![format!("@brief {brief}")];
    for param in &method.params {
        if let Some(name) = &param.name {
            lines.push(format!("@param {name}"));
        }
    }
    if method.return_type.as_ref().is_some_and(|ty| !ty.is_void()) {
        lines.push("@return".to_string());
    }
    lines
}
