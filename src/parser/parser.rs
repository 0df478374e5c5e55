//! Recursive descent parser for declaration text
//!
//! Builds a [`SourceFile`] from the significant tokens of one file.
//! Top-level constructs are parsed one at a time; a malformed declaration is
//! reported and skipped up to the next statement boundary, the rest of the
//! file is still read. Inside a class body each member statement is parsed
//! on its own, so one bad member never takes its neighbours with it.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use tracing::trace;

use super::ast::{BaseNode, ClassNode, Item, ItemKind, MemberNode, SourceFile};
use super::keywords::is_builtin_type_word;
use super::lexer::{Token, lex};
use super::syntax_kind::SyntaxKind;
use crate::model::{
    AliasDecl, AliasForm, ClassKey, DocComment, EnumDecl, Enumerator, Field, FieldModifiers,
    ForwardDecl, FunctionPointer, Member, Method, MethodKind, MethodModifiers, Multiplicity,
    NestedDecl, NestedKind, Parameter, Reference, TypeRef, Visibility,
};

/// Parse result: the raw tree plus everything worth reporting
#[derive(Debug, Clone)]
pub struct Parse {
    pub file: SourceFile,
    pub errors: Vec<SyntaxError>,
    /// Constructs that were recognised but are not modelled.
    pub unsupported: Vec<SyntaxError>,
    /// Characters the lexer did not recognise.
    pub unknown: Vec<TextRange>,
}

impl Parse {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse declaration text into a raw tree
pub fn parse(input: &str) -> Parse {
    let lexed = lex(input);
    let mut parser = Parser::new(&lexed.tokens, input);
    parser.parse_source_file();
    Parse {
        file: SourceFile {
            doc: lexed.file_doc,
            includes: lexed.includes,
            items: parser.items,
        },
        errors: parser.errors,
        unsupported: parser.unsupported,
        unknown: lexed.unknown,
    }
}

type PResult<T> = Result<T, SyntaxError>;

/// Extent of one statement found by [`Parser::scan_statement`].
#[derive(Debug, Clone, Copy)]
struct Statement {
    /// Token index where the declaration part ends (exclusive).
    end: usize,
    /// Token index to resume at.
    next: usize,
    terminated: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Specifiers {
    is_static: bool,
    is_virtual: bool,
    is_inline: bool,
    is_explicit: bool,
    is_constexpr: bool,
    is_friend: bool,
    is_mutable: bool,
    is_volatile: bool,
}

/// The parser state
struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    input: &'a str,
    pos: usize,
    namespace: Vec<SmolStr>,
    /// Namespace segments pushed by each open `namespace {` / `extern "C" {`.
    scopes: Vec<usize>,
    items: Vec<Item>,
    errors: Vec<SyntaxError>,
    unsupported: Vec<SyntaxError>,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>], input: &'a str) -> Self {
        Self {
            tokens,
            input,
            pos: 0,
            namespace: Vec::new(),
            scopes: Vec::new(),
            items: Vec::new(),
            errors: Vec::new(),
            unsupported: Vec::new(),
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.nth(0) == Some(kind)
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        self.nth(0).is_some_and(|k| kinds.contains(&k))
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_word(&self, word: &str) -> bool {
        self.current()
            .is_some_and(|t| t.kind == SyntaxKind::IDENT && t.text == word)
    }

    fn current_doc(&self) -> Option<DocComment> {
        self.current().and_then(|t| t.doc.clone())
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> PResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<SmolStr> {
        match self.current() {
            Some(token) if token.kind == SyntaxKind::IDENT => {
                self.bump();
                Ok(SmolStr::new(token.text))
            }
            _ => Err(self.error_here(format!("expected {what}"))),
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        let range = match self.current() {
            Some(token) => token.range,
            None => self
                .tokens
                .last()
                .map(|t| TextRange::empty(t.range.end()))
                .unwrap_or_else(|| TextRange::empty(TextSize::new(0))),
        };
        SyntaxError::new(self.describe(message.into()), range)
    }

    fn describe(&self, message: String) -> String {
        match self.current() {
            Some(token) => format!("{message}, found `{}`", token.text),
            None => format!("{message}, found end of input"),
        }
    }

    /// Range covering tokens `from..to`.
    fn range_of(&self, from: usize, to: usize) -> TextRange {
        let to = to.min(self.tokens.len());
        match (self.tokens.get(from), to.checked_sub(1).and_then(|i| self.tokens.get(i))) {
            (Some(first), Some(last)) if to > from => first.range.cover(last.range),
            (Some(first), _) => TextRange::empty(first.range.start()),
            _ => self
                .tokens
                .last()
                .map(|t| TextRange::empty(t.range.end()))
                .unwrap_or_default(),
        }
    }

    fn range_from(&self, start: usize) -> TextRange {
        self.range_of(start, self.pos)
    }

    fn unsupported(&mut self, message: impl Into<String>, range: TextRange) {
        let message = message.into();
        trace!(%message, "skipping unsupported construct");
        self.unsupported.push(SyntaxError::new(message, range));
    }

    /// Source text of tokens `from..to`, one space wherever the source had a gap.
    fn text(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        let mut prev_end: Option<TextSize> = None;
        for token in &self.tokens[from..to.min(self.tokens.len())] {
            if prev_end.is_some_and(|end| token.range.start() > end) {
                out.push(' ');
            }
            out.push_str(token.text);
            prev_end = Some(token.range.end());
        }
        out
    }

    /// Whether token `index` is the first on its line.
    fn starts_line(&self, index: usize) -> bool {
        let (Some(prev), Some(token)) = (
            index.checked_sub(1).and_then(|i| self.tokens.get(i)),
            self.tokens.get(index),
        ) else {
            return false;
        };
        let gap = TextRange::new(prev.range.end(), token.range.start());
        self.input
            .get(std::ops::Range::<usize>::from(gap))
            .is_some_and(|text| text.contains('\n'))
    }

    // =========================================================================
    // Statement scanning
    // =========================================================================

    /// Find the end of the statement starting at the current token.
    ///
    /// A statement ends at `;` outside any bracket, or after a function body.
    /// Reaching a closing `}` of the enclosing scope, a visibility label or the
    /// end of input first means the statement is unterminated.
    fn scan_statement(&self) -> Statement {
        let (mut paren, mut bracket, mut brace, mut angle) = (0usize, 0usize, 0usize, 0usize);
        let mut after_params = false;
        let mut init_list = false;
        let mut i = self.pos;

        while let Some(token) = self.tokens.get(i) {
            let nested = paren > 0 || bracket > 0 || brace > 0;
            match token.kind {
                SyntaxKind::L_PAREN => paren += 1,
                SyntaxKind::R_PAREN => {
                    paren = paren.saturating_sub(1);
                    if paren == 0 && bracket == 0 && brace == 0 && angle == 0 {
                        after_params = true;
                    }
                }
                SyntaxKind::L_BRACKET => bracket += 1,
                SyntaxKind::R_BRACKET => bracket = bracket.saturating_sub(1),
                SyntaxKind::L_ANGLE if paren == 0 && brace == 0 => angle += 1,
                SyntaxKind::R_ANGLE if paren == 0 && brace == 0 => {
                    angle = angle.saturating_sub(1)
                }
                SyntaxKind::COLON if !nested && angle == 0 && after_params => init_list = true,
                SyntaxKind::L_BRACE if !nested && angle == 0 => {
                    let prev = i.checked_sub(1).and_then(|j| self.tokens.get(j)).map(|t| t.kind);
                    let item_init = init_list
                        && matches!(prev, Some(SyntaxKind::IDENT | SyntaxKind::R_ANGLE));
                    if after_params && !item_init {
                        return match self.matching_brace(i) {
                            Some(close) => {
                                let mut next = close + 1;
                                if self.tokens.get(next).map(|t| t.kind) == Some(SyntaxKind::SEMICOLON) {
                                    next += 1;
                                }
                                Statement { end: i, next, terminated: true }
                            }
                            None => Statement {
                                end: i,
                                next: self.tokens.len(),
                                terminated: false,
                            },
                        };
                    }
                    brace += 1;
                }
                SyntaxKind::L_BRACE => brace += 1,
                SyntaxKind::R_BRACE if brace == 0 => {
                    return Statement { end: i, next: i, terminated: false };
                }
                SyntaxKind::R_BRACE => brace -= 1,
                SyntaxKind::SEMICOLON if !nested => {
                    return Statement { end: i, next: i + 1, terminated: true };
                }
                kind if kind.is_visibility()
                    && !nested
                    && self.tokens.get(i + 1).map(|t| t.kind) == Some(SyntaxKind::COLON) =>
                {
                    return Statement { end: i, next: i, terminated: false };
                }
                _ => {}
            }
            i += 1;
        }

        Statement { end: i, next: i, terminated: false }
    }

    /// Index of the `}` closing the `{` at `open`.
    fn matching_brace(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_BRACE => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Skip the statement at the current position without reporting it.
    fn skip_statement(&mut self) {
        let statement = self.scan_statement();
        if statement.next > self.pos {
            self.pos = statement.next;
        } else {
            self.bump();
        }
    }

    /// Skip `[[...]]` attribute lists.
    fn skip_attributes(&mut self) {
        while self.at(SyntaxKind::L_BRACKET) && self.nth(1) == Some(SyntaxKind::L_BRACKET) {
            let mut depth = 0usize;
            while let Some(token) = self.current() {
                self.bump();
                match token.kind {
                    SyntaxKind::L_BRACKET => depth += 1,
                    SyntaxKind::R_BRACKET => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Whether the construct starting at the current keyword has a `{` body
    /// before anything that makes it a plain declaration.
    fn body_follows(&self) -> bool {
        for token in self.tokens.iter().skip(self.pos + 1) {
            match token.kind {
                SyntaxKind::L_BRACE => return true,
                SyntaxKind::SEMICOLON
                | SyntaxKind::L_PAREN
                | SyntaxKind::STAR
                | SyntaxKind::AMP
                | SyntaxKind::EQ
                | SyntaxKind::R_BRACE => return false,
                _ => {}
            }
        }
        false
    }

    // =========================================================================
    // Top level
    // =========================================================================

    fn parse_source_file(&mut self) {
        while !self.at_eof() {
            let pos_before = self.pos;
            self.parse_top_level();
            // Safety: if we didn't make progress, force-skip a token
            if self.pos == pos_before && !self.at_eof() {
                let error = self.error_here("unexpected token");
                self.errors.push(error);
                self.bump();
            }
        }
        if !self.scopes.is_empty() {
            let error = self.error_here("expected `}` closing the namespace");
            self.errors.push(error);
        }
    }

    fn parse_top_level(&mut self) {
        let Some(token) = self.current() else {
            return;
        };
        match token.kind {
            SyntaxKind::SEMICOLON => self.bump(),
            SyntaxKind::R_BRACE => match self.scopes.pop() {
                Some(pushed) => {
                    let keep = self.namespace.len().saturating_sub(pushed);
                    self.namespace.truncate(keep);
                    self.bump();
                    self.eat(SyntaxKind::SEMICOLON);
                }
                None => {
                    let error = self.error_here("unmatched `}`");
                    self.errors.push(error);
                    self.bump();
                }
            },
            SyntaxKind::NAMESPACE_KW => self.declaration(|p| p.parse_namespace().map(|()| None)),
            SyntaxKind::INLINE_KW if self.nth(1) == Some(SyntaxKind::NAMESPACE_KW) => self.bump(),
            SyntaxKind::EXTERN_KW if self.nth(1) == Some(SyntaxKind::STRING) => {
                self.bump();
                self.bump();
                if self.eat(SyntaxKind::L_BRACE) {
                    self.scopes.push(0);
                }
            }
            SyntaxKind::L_BRACKET if self.nth(1) == Some(SyntaxKind::L_BRACKET) => {
                self.skip_attributes()
            }
            SyntaxKind::ENUM_KW => self.declaration(Self::parse_enum_item),
            SyntaxKind::TYPEDEF_KW => self.declaration(Self::parse_typedef),
            SyntaxKind::USING_KW => self.declaration(Self::parse_using),
            SyntaxKind::TEMPLATE_KW => self.declaration(Self::parse_template),
            kind if kind.is_class_key() => {
                let doc = self.current_doc();
                self.declaration(|p| p.parse_class_item(doc, None))
            }
            _ => {
                trace!(token = token.text, "skipping declaration");
                self.skip_statement();
            }
        }
    }

    /// Run one declaration parser, record its item, recover on error.
    fn declaration(&mut self, parse: impl FnOnce(&mut Self) -> PResult<Option<ItemKind>>) {
        let start = self.pos;
        match parse(self) {
            Ok(Some(kind)) => {
                let range = self.range_from(start);
                self.items.push(Item { range, kind });
            }
            Ok(None) => {}
            Err(error) => {
                trace!(message = %error.message, "recovering from syntax error");
                self.errors.push(error);
                if !self.at(SyntaxKind::R_BRACE) {
                    self.skip_statement();
                }
            }
        }
    }

    /// `namespace a::b {`, `namespace {` or `namespace x = y;`
    fn parse_namespace(&mut self) -> PResult<()> {
        self.expect(SyntaxKind::NAMESPACE_KW, "`namespace`")?;
        let mut segments = Vec::new();
        while self.at(SyntaxKind::IDENT) {
            segments.push(self.expect_ident("namespace name")?);
            if !self.eat(SyntaxKind::COLON_COLON) {
                break;
            }
        }
        if self.at(SyntaxKind::EQ) {
            self.skip_statement();
            return Ok(());
        }
        self.expect(SyntaxKind::L_BRACE, "`{`")?;
        self.scopes.push(segments.len());
        self.namespace.extend(segments);
        Ok(())
    }

    /// Consume the rest of a declaration after its body: optional declarators
    /// and the closing `;`.
    fn finish_declaration(&mut self) {
        if self.eat(SyntaxKind::SEMICOLON) {
            return;
        }
        if self.at_any(&[
            SyntaxKind::IDENT,
            SyntaxKind::STAR,
            SyntaxKind::AMP,
            SyntaxKind::COMMA,
        ]) {
            self.skip_statement();
            return;
        }
        let error = self.error_here("expected `;` after declaration");
        self.errors.push(error);
    }

    // =========================================================================
    // Enumerations
    // =========================================================================

    fn parse_enum_item(&mut self) -> PResult<Option<ItemKind>> {
        let start = self.pos;
        if !self.body_follows() {
            self.skip_statement();
            return Ok(None);
        }
        let doc = self.current_doc();
        let decl = self.parse_enum(doc)?;
        self.finish_declaration();
        if decl.name.is_empty() {
            let range = self.range_from(start);
            self.unsupported("anonymous enumeration is not modelled", range);
            return Ok(None);
        }
        Ok(Some(ItemKind::Enum(decl)))
    }

    /// `enum [class] [Name] [: type] { entries }`, stopping after the `}`.
    fn parse_enum(&mut self, doc: Option<DocComment>) -> PResult<EnumDecl> {
        self.expect(SyntaxKind::ENUM_KW, "`enum`")?;
        let scoped = self.eat(SyntaxKind::CLASS_KW) || self.eat(SyntaxKind::STRUCT_KW);
        self.skip_attributes();
        let name = if self.at(SyntaxKind::IDENT) {
            self.expect_ident("enumeration name")?
        } else {
            SmolStr::default()
        };
        let underlying = if self.eat(SyntaxKind::COLON) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(SyntaxKind::L_BRACE, "`{`")?;

        let mut entries = Vec::new();
        while !self.eat(SyntaxKind::R_BRACE) {
            let Some(token) = self.current() else {
                return Err(self.error_here("expected `}` closing the enumeration"));
            };
            if token.kind != SyntaxKind::IDENT {
                let error = self.error_here("expected enumerator name");
                self.errors.push(error);
                self.skip_enumerator();
                continue;
            }
            self.bump();
            let value = if self.eat(SyntaxKind::EQ) {
                match self.enumerator_value() {
                    Ok(value) => Some(value),
                    Err(error) => {
                        self.errors.push(error);
                        self.skip_enumerator();
                        continue;
                    }
                }
            } else {
                None
            };
            entries.push(Enumerator {
                name: SmolStr::new(token.text),
                value,
                doc: token.doc.clone(),
            });
            if self.eat(SyntaxKind::COMMA) || self.at(SyntaxKind::R_BRACE) {
                continue;
            }
            let error = self.error_here("expected `,` between enumerators");
            self.errors.push(error);
            self.skip_enumerator();
        }

        Ok(EnumDecl {
            name,
            namespace: self.namespace.clone(),
            doc,
            scoped,
            underlying,
            via_typedef: false,
            entries,
        })
    }

    /// Enumerator initializer, opaque. Two adjacent operands end it, so a
    /// missing comma does not swallow the next entry.
    fn enumerator_value(&mut self) -> PResult<String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut prev: Option<SyntaxKind> = None;
        while let Some(token) = self.current() {
            match token.kind {
                SyntaxKind::COMMA | SyntaxKind::R_BRACE if depth == 0 => break,
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => depth = depth.saturating_sub(1),
                _ => {}
            }
            if depth == 0 && prev.is_some_and(ends_operand) && starts_operand(token.kind) {
                break;
            }
            prev = Some(token.kind);
            self.bump();
        }
        if self.pos == start {
            return Err(self.error_here("expected enumerator value"));
        }
        Ok(self.text(start, self.pos))
    }

    /// Skip to the next `,` (consumed) or the closing `}` (kept).
    fn skip_enumerator(&mut self) {
        while let Some(token) = self.current() {
            match token.kind {
                SyntaxKind::R_BRACE => return,
                SyntaxKind::COMMA => {
                    self.bump();
                    return;
                }
                _ => self.bump(),
            }
        }
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    fn parse_typedef(&mut self) -> PResult<Option<ItemKind>> {
        let start = self.pos;
        let doc = self.current_doc();
        self.expect(SyntaxKind::TYPEDEF_KW, "`typedef`")?;

        if self.at(SyntaxKind::ENUM_KW) && self.body_follows() {
            let mut decl = self.parse_enum(doc)?;
            decl.name = self.expect_ident("typedef name")?;
            decl.via_typedef = true;
            self.finish_declaration();
            return Ok(Some(ItemKind::Enum(decl)));
        }

        if self.current().is_some_and(|t| t.kind.is_class_key()) && self.body_follows() {
            let Some(mut node) = self.parse_class_head(doc, None)? else {
                return Err(self.error_here("expected class body"));
            };
            self.parse_class_body(&mut node)?;
            node.name = self.expect_ident("typedef name")?;
            node.via_typedef = true;
            self.finish_declaration();
            return Ok(Some(ItemKind::Class(node)));
        }

        let statement = self.scan_statement();
        if !statement.terminated {
            return Err(self.error_here("expected `;` after typedef"));
        }
        let rhs = self.pos;
        self.pos = statement.next;

        // `typedef <type> Name;`
        let mut sub = Parser::new(&self.tokens[rhs..statement.end], self.input);
        let simple = sub.parse_type().is_ok() && sub.at(SyntaxKind::IDENT) && sub.pos + 1 == sub.tokens.len();
        if simple {
            let name_index = rhs + sub.pos;
            return Ok(Some(ItemKind::Alias(AliasDecl {
                name: SmolStr::new(self.tokens[name_index].text),
                namespace: self.namespace.clone(),
                doc,
                form: AliasForm::Typedef,
                target: self.text(rhs, name_index),
            })));
        }

        let Some(name) = self.declared_name(rhs, statement.end) else {
            return Err(SyntaxError::new(
                "cannot find the name declared by this typedef",
                self.range_of(start, statement.end),
            ));
        };
        Ok(Some(ItemKind::Alias(AliasDecl {
            name,
            namespace: self.namespace.clone(),
            doc,
            form: AliasForm::Verbatim,
            target: self.text(start, statement.end),
        })))
    }

    /// Name introduced by a declarator that is not a plain `type name`:
    /// `(*Name)(...)`, `(Scope::*Name)(...)` or `Name[4]`.
    fn declared_name(&self, from: usize, to: usize) -> Option<SmolStr> {
        let tokens = &self.tokens[from..to];
        for (i, token) in tokens.iter().enumerate() {
            if token.kind == SyntaxKind::STAR
                && tokens.get(i + 1).is_some_and(|t| t.kind == SyntaxKind::IDENT)
                && tokens.get(i + 2).is_some_and(|t| t.kind == SyntaxKind::R_PAREN)
            {
                return tokens.get(i + 1).map(|t| SmolStr::new(t.text));
            }
        }
        let end = tokens
            .iter()
            .position(|t| t.kind == SyntaxKind::L_BRACKET)
            .unwrap_or(tokens.len());
        tokens[..end]
            .iter()
            .rev()
            .find(|t| t.kind == SyntaxKind::IDENT)
            .map(|t| SmolStr::new(t.text))
    }

    /// `using Name = target;`; using-directives and using-declarations are
    /// skipped.
    fn parse_using(&mut self) -> PResult<Option<ItemKind>> {
        let doc = self.current_doc();
        self.expect(SyntaxKind::USING_KW, "`using`")?;
        if !(self.at(SyntaxKind::IDENT) && self.nth(1) == Some(SyntaxKind::EQ)) {
            self.skip_statement();
            return Ok(None);
        }
        let name = self.expect_ident("alias name")?;
        self.expect(SyntaxKind::EQ, "`=`")?;
        let statement = self.scan_statement();
        if !statement.terminated || statement.end == self.pos {
            return Err(self.error_here("expected alias target"));
        }
        let target = self.text(self.pos, statement.end);
        self.pos = statement.next;
        Ok(Some(ItemKind::Alias(AliasDecl {
            name,
            namespace: self.namespace.clone(),
            doc,
            form: AliasForm::Using,
            target,
        })))
    }

    // =========================================================================
    // Templates and classes
    // =========================================================================

    fn parse_template(&mut self) -> PResult<Option<ItemKind>> {
        let start = self.pos;
        let doc = self.current_doc();
        let head = self.template_head()?;
        if self.current().is_some_and(|t| t.kind.is_class_key()) {
            return self.parse_class_item(doc, Some(head));
        }
        self.skip_statement();
        let range = self.range_from(start);
        self.unsupported("template declaration is not modelled", range);
        Ok(None)
    }

    /// `template<...>` kept as written.
    fn template_head(&mut self) -> PResult<String> {
        let start = self.pos;
        self.expect(SyntaxKind::TEMPLATE_KW, "`template`")?;
        if !self.at(SyntaxKind::L_ANGLE) {
            return Err(self.error_here("expected `<`"));
        }
        let mut depth = 0usize;
        while let Some(token) = self.current() {
            self.bump();
            match token.kind {
                SyntaxKind::L_ANGLE => depth += 1,
                SyntaxKind::R_ANGLE => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.text(start, self.pos));
                    }
                }
                _ => {}
            }
        }
        Err(self.error_here("expected `>` closing the template parameter list"))
    }

    fn parse_class_item(
        &mut self,
        doc: Option<DocComment>,
        template: Option<String>,
    ) -> PResult<Option<ItemKind>> {
        let start = self.pos;
        let Some(key) = self.current().and_then(|t| class_key(t.kind)) else {
            return Err(self.error_here("expected `class`, `struct` or `union`"));
        };

        // `class X;`
        if self.nth(1) == Some(SyntaxKind::IDENT) && self.nth(2) == Some(SyntaxKind::SEMICOLON) {
            self.bump();
            let name = self.expect_ident("class name")?;
            self.bump();
            return Ok(Some(ItemKind::Forward(ForwardDecl {
                key,
                name,
                namespace: self.namespace.clone(),
            })));
        }

        let Some(mut node) = self.parse_class_head(doc, template)? else {
            // An elaborated type in some other declaration.
            self.skip_statement();
            return Ok(None);
        };
        self.parse_class_body(&mut node)?;
        self.finish_declaration();
        if node.name.is_empty() {
            let range = self.range_from(start);
            self.unsupported("anonymous class is not modelled", range);
            return Ok(None);
        }
        Ok(Some(ItemKind::Class(node)))
    }

    /// Class key, name, `final` and base clause, up to the `{`.
    ///
    /// Returns `None` without consuming anything when no body follows.
    fn parse_class_head(
        &mut self,
        doc: Option<DocComment>,
        template: Option<String>,
    ) -> PResult<Option<ClassNode>> {
        if !self.body_follows() {
            return Ok(None);
        }
        let Some(key) = self.current().and_then(|t| class_key(t.kind)) else {
            return Ok(None);
        };
        self.bump();
        self.skip_attributes();

        // Export macros may precede the name: take the last identifier.
        let mut words = Vec::new();
        while let Some(token) = self.current() {
            match token.kind {
                SyntaxKind::IDENT => words.push(SmolStr::new(token.text)),
                SyntaxKind::COLON_COLON => {}
                _ => break,
            }
            self.bump();
        }
        let is_final = words.len() > 1 && words.last().is_some_and(|w| w == "final");
        if is_final {
            words.pop();
        }

        let mut node = ClassNode {
            key,
            name: words.pop().unwrap_or_default(),
            namespace: self.namespace.clone(),
            doc,
            template,
            is_final,
            via_typedef: false,
            bases: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
        };

        if self.eat(SyntaxKind::COLON) {
            loop {
                node.bases.push(self.parse_base()?);
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
        }
        if !self.at(SyntaxKind::L_BRACE) {
            return Err(self.error_here("expected `{`"));
        }
        Ok(Some(node))
    }

    /// `[virtual] [access] Name<args>`
    fn parse_base(&mut self) -> PResult<BaseNode> {
        let start = self.pos;
        let mut access = Visibility::Public;
        let mut is_virtual = false;
        loop {
            match self.current().map(|t| t.kind) {
                Some(SyntaxKind::PUBLIC_KW) => access = Visibility::Public,
                Some(SyntaxKind::PROTECTED_KW) => access = Visibility::Protected,
                Some(SyntaxKind::PRIVATE_KW) => access = Visibility::Private,
                Some(SyntaxKind::VIRTUAL_KW) => is_virtual = true,
                _ => break,
            }
            self.bump();
        }

        let name_start = self.pos;
        let mut angle = 0usize;
        while let Some(token) = self.current() {
            match token.kind {
                SyntaxKind::COMMA | SyntaxKind::L_BRACE if angle == 0 => break,
                SyntaxKind::L_ANGLE => angle += 1,
                SyntaxKind::R_ANGLE => angle = angle.saturating_sub(1),
                SyntaxKind::SEMICOLON | SyntaxKind::R_BRACE => break,
                _ => {}
            }
            self.bump();
        }
        if self.pos == name_start {
            return Err(self.error_here("expected base class name"));
        }
        Ok(BaseNode {
            name: SmolStr::new(self.text(name_start, self.pos)),
            access,
            is_virtual,
            range: self.range_from(start),
        })
    }

    /// `{ members }`, leaving the parser after the closing `}`.
    ///
    /// Fails only when the body runs into the end of input.
    fn parse_class_body(&mut self, class: &mut ClassNode) -> PResult<()> {
        let open = self.pos;
        self.expect(SyntaxKind::L_BRACE, "`{`")?;
        let mut visibility = class.key.default_visibility();

        loop {
            let Some(token) = self.current() else {
                return Err(SyntaxError::new(
                    format!("class `{}` is not closed before the end of input", class.name),
                    self.range_of(open, open + 1),
                ));
            };
            match token.kind {
                SyntaxKind::R_BRACE => {
                    self.bump();
                    return Ok(());
                }
                SyntaxKind::SEMICOLON => self.bump(),
                kind if kind.is_visibility() && self.nth(1) == Some(SyntaxKind::COLON) => {
                    visibility = match kind {
                        SyntaxKind::PUBLIC_KW => Visibility::Public,
                        SyntaxKind::PROTECTED_KW => Visibility::Protected,
                        _ => Visibility::Private,
                    };
                    self.bump();
                    self.bump();
                }
                SyntaxKind::L_BRACKET if self.nth(1) == Some(SyntaxKind::L_BRACKET) => {
                    self.skip_attributes()
                }
                SyntaxKind::ENUM_KW if self.body_follows() => {
                    self.nested_declaration(class, visibility, Self::parse_enum_item)
                }
                SyntaxKind::TYPEDEF_KW => {
                    self.nested_declaration(class, visibility, Self::parse_typedef)
                }
                SyntaxKind::USING_KW => self.nested_declaration(class, visibility, Self::parse_using),
                kind if kind.is_class_key() && self.body_follows() => {
                    let start = self.pos;
                    self.skip_statement();
                    let range = self.range_from(start);
                    self.unsupported(
                        format!("nested class in `{}` is not modelled", class.name),
                        range,
                    );
                }
                kind if kind.is_class_key()
                    && self.nth(1) == Some(SyntaxKind::IDENT)
                    && self.nth(2) == Some(SyntaxKind::SEMICOLON) =>
                {
                    self.skip_statement()
                }
                SyntaxKind::FRIEND_KW
                    if self.tokens.get(self.pos + 1).is_some_and(|t| t.kind.is_class_key()) =>
                {
                    self.skip_statement()
                }
                SyntaxKind::TEMPLATE_KW => {
                    let start = self.pos;
                    self.skip_statement();
                    let range = self.range_from(start);
                    self.unsupported("member template is not modelled", range);
                }
                SyntaxKind::IDENT if token.text == "static_assert" => self.skip_statement(),
                _ => self.parse_member_statement(class, visibility),
            }
        }
    }

    /// Enumerations and aliases declared inside a class body.
    fn nested_declaration(
        &mut self,
        class: &mut ClassNode,
        visibility: Visibility,
        parse: impl FnOnce(&mut Self) -> PResult<Option<ItemKind>>,
    ) {
        let start = self.pos;
        let decl = match parse(self) {
            Ok(Some(ItemKind::Enum(mut decl))) => {
                decl.namespace.clear();
                NestedKind::Enum(decl)
            }
            Ok(Some(ItemKind::Alias(mut decl))) => {
                decl.namespace.clear();
                NestedKind::Alias(decl)
            }
            Ok(Some(ItemKind::Class(_))) => {
                let range = self.range_from(start);
                self.unsupported(format!("nested class in `{}` is not modelled", class.name), range);
                return;
            }
            Ok(Some(ItemKind::Forward(_)) | None) => return,
            Err(error) => {
                self.errors.push(error);
                if !self.at(SyntaxKind::R_BRACE) {
                    self.skip_statement();
                }
                return;
            }
        };
        class.nested.push(NestedDecl { visibility, decl });
    }

    /// One member statement: fields or a method.
    fn parse_member_statement(&mut self, class: &mut ClassNode, visibility: Visibility) {
        let start = self.pos;
        let statement = self.scan_statement();
        let end = statement.end.max(start + 1).min(self.tokens.len());
        self.pos = if statement.next > start { statement.next } else { start + 1 };

        if !statement.terminated {
            self.errors.push(SyntaxError::new(
                "member declaration is not terminated by `;`",
                self.range_of(start, end),
            ));
            return;
        }

        let mut sub = Parser::new(&self.tokens[start..end], self.input);
        match sub.parse_member(&class.name, visibility) {
            Ok(members) => {
                let range = self.range_of(start, end);
                class
                    .members
                    .extend(members.into_iter().map(|member| MemberNode { range, member }));
            }
            Err(error) => {
                // A missing `;` glues two declarations together: retry from
                // each later line and keep what parses.
                let salvaged = (start + 1..end).filter(|&i| self.starts_line(i)).find_map(|i| {
                    Parser::new(&self.tokens[i..end], self.input)
                        .parse_member(&class.name, visibility)
                        .ok()
                        .map(|members| (i, members))
                });
                match salvaged {
                    Some((split, members)) => {
                        self.errors.push(SyntaxError::new(
                            "expected `;` after member declaration",
                            self.range_of(start, split),
                        ));
                        let range = self.range_of(split, end);
                        class
                            .members
                            .extend(members.into_iter().map(|member| MemberNode { range, member }));
                    }
                    None => self.errors.push(error),
                }
            }
        }
    }

    // =========================================================================
    // Members (run on a sub-parser over one statement)
    // =========================================================================

    fn parse_member(&mut self, class_name: &str, visibility: Visibility) -> PResult<Vec<Member>> {
        let doc = self.current_doc();
        let spec = self.specifiers();

        if self.eat(SyntaxKind::TILDE) {
            let name = self.expect_ident("destructor name")?;
            let method = self.method_tail(
                SmolStr::new(format!("~{name}")),
                MethodKind::Destructor,
                None,
                spec,
                doc,
                visibility,
            )?;
            return Ok(vec![Member::Method(method)]);
        }

        if self.eat(SyntaxKind::OPERATOR_KW) {
            let target = self.parse_type()?;
            let name = SmolStr::new(format!("operator {}", target.to_source()));
            let method =
                self.method_tail(name, MethodKind::Conversion, None, spec, doc, visibility)?;
            return Ok(vec![Member::Method(method)]);
        }

        if self.at_word(class_name)
            && self.nth(1) == Some(SyntaxKind::L_PAREN)
            && !self.at_pointer_declarator(1)
        {
            self.bump();
            let method = self.method_tail(
                SmolStr::new(class_name),
                MethodKind::Constructor,
                None,
                spec,
                doc,
                visibility,
            )?;
            return Ok(vec![Member::Method(method)]);
        }

        let ty = self.parse_type()?;

        if self.at_pointer_declarator(0) {
            let method = self.function_pointer(ty, spec, doc, visibility)?;
            return Ok(vec![Member::Method(method)]);
        }

        let name = if self.at(SyntaxKind::OPERATOR_KW) {
            self.operator_name()?
        } else {
            self.expect_ident("member name")?
        };

        if self.at(SyntaxKind::L_PAREN) {
            let method =
                self.method_tail(name, MethodKind::Ordinary, Some(ty), spec, doc, visibility)?;
            return Ok(vec![Member::Method(method)]);
        }

        self.fields(ty, name, spec, doc, visibility)
    }

    /// `(*name)` or `(Scope::*name)` starting at lookahead `n`.
    fn at_pointer_declarator(&self, n: usize) -> bool {
        if self.nth(n) != Some(SyntaxKind::L_PAREN) {
            return false;
        }
        let mut i = n + 1;
        if self.nth(i) == Some(SyntaxKind::COLON_COLON) {
            i += 1;
        }
        while self.nth(i) == Some(SyntaxKind::IDENT) && self.nth(i + 1) == Some(SyntaxKind::COLON_COLON) {
            i += 2;
        }
        self.nth(i) == Some(SyntaxKind::STAR)
    }

    fn specifiers(&mut self) -> Specifiers {
        let mut spec = Specifiers::default();
        loop {
            match self.current().map(|t| t.kind) {
                Some(SyntaxKind::STATIC_KW) => spec.is_static = true,
                Some(SyntaxKind::VIRTUAL_KW) => spec.is_virtual = true,
                Some(SyntaxKind::INLINE_KW) => spec.is_inline = true,
                Some(SyntaxKind::EXPLICIT_KW) => spec.is_explicit = true,
                Some(SyntaxKind::CONSTEXPR_KW) => spec.is_constexpr = true,
                Some(SyntaxKind::FRIEND_KW) => spec.is_friend = true,
                Some(SyntaxKind::MUTABLE_KW) => spec.is_mutable = true,
                Some(SyntaxKind::VOLATILE_KW) => spec.is_volatile = true,
                Some(SyntaxKind::EXTERN_KW) => {}
                Some(SyntaxKind::L_BRACKET) if self.nth(1) == Some(SyntaxKind::L_BRACKET) => {
                    self.skip_attributes();
                    continue;
                }
                _ => return spec,
            }
            self.bump();
        }
    }

    fn method_tail(
        &mut self,
        name: SmolStr,
        kind: MethodKind,
        return_type: Option<TypeRef>,
        spec: Specifiers,
        doc: Option<DocComment>,
        visibility: Visibility,
    ) -> PResult<Method> {
        let (params, is_variadic) = self.parse_params()?;
        let mut return_type = return_type;
        let mut modifiers = MethodModifiers {
            is_static: spec.is_static,
            is_virtual: spec.is_virtual,
            is_inline: spec.is_inline,
            is_explicit: spec.is_explicit,
            is_constexpr: spec.is_constexpr,
            is_friend: spec.is_friend,
            ..MethodModifiers::default()
        };

        while let Some(token) = self.current() {
            match token.kind {
                SyntaxKind::CONST_KW => modifiers.is_const = true,
                SyntaxKind::VOLATILE_KW | SyntaxKind::AMP | SyntaxKind::AMP_AMP => {}
                SyntaxKind::IDENT if token.text == "override" => modifiers.is_override = true,
                SyntaxKind::IDENT if token.text == "final" => modifiers.is_final = true,
                SyntaxKind::IDENT if token.text == "noexcept" || token.text == "throw" => {
                    modifiers.is_noexcept |= token.text == "noexcept";
                    self.bump();
                    if self.at(SyntaxKind::L_PAREN) {
                        self.skip_group()?;
                    }
                    continue;
                }
                SyntaxKind::ARROW => {
                    self.bump();
                    return_type = Some(self.parse_type()?);
                    continue;
                }
                SyntaxKind::EQ => {
                    self.bump();
                    match self.current() {
                        Some(t) if t.kind == SyntaxKind::NUMBER && t.text == "0" => {
                            modifiers.is_pure_virtual = true;
                            modifiers.is_virtual = true;
                        }
                        Some(t) if t.kind == SyntaxKind::DEFAULT_KW => modifiers.is_defaulted = true,
                        Some(t) if t.kind == SyntaxKind::DELETE_KW => modifiers.is_deleted = true,
                        _ => return Err(self.error_here("expected `0`, `default` or `delete`")),
                    }
                }
                // Constructor initializer list; opaque.
                SyntaxKind::COLON if kind == MethodKind::Constructor => {
                    self.pos = self.tokens.len();
                    break;
                }
                _ => return Err(self.error_here("unexpected token after parameter list")),
            }
            self.bump();
        }

        Ok(Method {
            name,
            visibility,
            doc,
            kind,
            return_type,
            params,
            is_variadic,
            modifiers,
        })
    }

    /// `(params)`; returns the parameters and whether the list ends in `...`.
    fn parse_params(&mut self) -> PResult<(Vec<Parameter>, bool)> {
        self.expect(SyntaxKind::L_PAREN, "`(`")?;
        let mut params = Vec::new();
        if self.eat(SyntaxKind::R_PAREN) {
            return Ok((params, false));
        }
        if self.at_word("void") && self.nth(1) == Some(SyntaxKind::R_PAREN) {
            self.bump();
            self.bump();
            return Ok((params, false));
        }
        loop {
            if self.eat(SyntaxKind::ELLIPSIS) {
                self.expect(SyntaxKind::R_PAREN, "`)` after `...`")?;
                return Ok((params, true));
            }
            params.push(self.parse_param()?);
            if self.eat(SyntaxKind::COMMA) {
                continue;
            }
            self.expect(SyntaxKind::R_PAREN, "`,` or `)`")?;
            return Ok((params, false));
        }
    }

    fn parse_param(&mut self) -> PResult<Parameter> {
        self.skip_attributes();
        let ty = self.parse_type()?;
        if self.at(SyntaxKind::L_PAREN) {
            return Err(self.error_here("function pointer parameters are not supported"));
        }
        let name = if self.at(SyntaxKind::IDENT) {
            Some(self.expect_ident("parameter name")?)
        } else {
            None
        };
        let fixed = self.parse_dims()?;
        let default_value = if self.eat(SyntaxKind::EQ) {
            Some(self.default_value(&[SyntaxKind::COMMA, SyntaxKind::R_PAREN])?)
        } else {
            None
        };
        let multiplicity = multiplicity_of(&ty, fixed);
        Ok(Parameter {
            name,
            ty,
            multiplicity,
            default_value,
        })
    }

    /// `R (*name)(params)` or `R (Scope::*name)(params)`
    fn function_pointer(
        &mut self,
        return_type: TypeRef,
        spec: Specifiers,
        doc: Option<DocComment>,
        visibility: Visibility,
    ) -> PResult<Method> {
        self.expect(SyntaxKind::L_PAREN, "`(`")?;
        let scope_start = self.pos;
        while self.at_any(&[SyntaxKind::IDENT, SyntaxKind::COLON_COLON]) {
            self.bump();
        }
        let scope = (self.pos > scope_start).then(|| {
            let text = self.text(scope_start, self.pos);
            SmolStr::new(text.trim_end_matches("::"))
        });
        self.expect(SyntaxKind::STAR, "`*`")?;
        let name = self.expect_ident("function pointer name")?;
        self.expect(SyntaxKind::R_PAREN, "`)`")?;
        let (params, is_variadic) = self.parse_params()?;
        let is_const = self.eat(SyntaxKind::CONST_KW);
        if !self.at_eof() {
            return Err(self.error_here("unexpected token after function pointer"));
        }
        Ok(Method {
            name,
            visibility,
            doc,
            kind: MethodKind::Ordinary,
            return_type: Some(return_type),
            params,
            is_variadic,
            modifiers: MethodModifiers {
                is_static: spec.is_static,
                is_const,
                function_pointer: Some(FunctionPointer { scope }),
                ..MethodModifiers::default()
            },
        })
    }

    /// `operator==`, `operator()`, `operator[]`, `operator new`
    fn operator_name(&mut self) -> PResult<SmolStr> {
        self.expect(SyntaxKind::OPERATOR_KW, "`operator`")?;
        let mut name = String::from("operator");
        match self.current().map(|t| t.kind) {
            Some(SyntaxKind::L_PAREN) if self.nth(1) == Some(SyntaxKind::R_PAREN) => {
                self.bump();
                self.bump();
                name.push_str("()");
            }
            Some(SyntaxKind::L_BRACKET) => {
                self.bump();
                self.expect(SyntaxKind::R_BRACKET, "`]`")?;
                name.push_str("[]");
            }
            Some(SyntaxKind::DELETE_KW) | Some(SyntaxKind::IDENT) if self.at_word("new") || self.at(SyntaxKind::DELETE_KW) => {
                let word = self.current().map(|t| t.text).unwrap_or_default();
                name.push(' ');
                name.push_str(word);
                self.bump();
                if self.at(SyntaxKind::L_BRACKET) && self.nth(1) == Some(SyntaxKind::R_BRACKET) {
                    self.bump();
                    self.bump();
                    name.push_str("[]");
                }
            }
            _ => {
                let start = self.pos;
                while let Some(token) = self.current() {
                    if token.kind == SyntaxKind::L_PAREN || token.kind == SyntaxKind::IDENT {
                        break;
                    }
                    name.push_str(token.text);
                    self.bump();
                }
                if self.pos == start {
                    return Err(self.error_here("expected operator symbol"));
                }
            }
        }
        Ok(SmolStr::new(name))
    }

    /// One or more field declarators sharing a base type.
    fn fields(
        &mut self,
        first_ty: TypeRef,
        first_name: SmolStr,
        spec: Specifiers,
        doc: Option<DocComment>,
        visibility: Visibility,
    ) -> PResult<Vec<Member>> {
        let base = first_ty.clone().with_pointers(0).with_reference(Reference::None);
        let mut ty = first_ty;
        let mut name = first_name;
        let mut doc = doc;
        let mut out = Vec::new();

        loop {
            let fixed = self.parse_dims()?;
            let bit_width = if self.eat(SyntaxKind::COLON) {
                Some(self.bit_width()?)
            } else {
                None
            };
            let default_value = if self.eat(SyntaxKind::EQ) {
                Some(self.default_value(&[SyntaxKind::COMMA])?)
            } else if self.at(SyntaxKind::L_BRACE) {
                Some(self.braced_text()?)
            } else {
                None
            };
            let modifiers = FieldModifiers {
                is_static: spec.is_static,
                is_const: ty.is_const,
                is_mutable: spec.is_mutable,
                is_constexpr: spec.is_constexpr,
                is_volatile: spec.is_volatile,
            };
            out.push(Member::Field(Field {
                name,
                visibility,
                doc: doc.take(),
                multiplicity: multiplicity_of(&ty, fixed),
                ty,
                modifiers,
                default_value,
                bit_width,
            }));

            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
            let mut depth = 0u8;
            while self.eat(SyntaxKind::STAR) {
                depth = depth.saturating_add(1);
            }
            let reference = self.reference();
            ty = base.clone().with_pointers(depth).with_reference(reference);
            name = self.expect_ident("member name")?;
        }

        if !self.at_eof() {
            return Err(self.error_here("unexpected token in member declaration"));
        }
        Ok(out)
    }

    /// `[N][M]...`; bounds must be integer literals whose product fits in
    /// `u64`. `None` when no brackets follow.
    fn parse_dims(&mut self) -> PResult<Option<Multiplicity>> {
        let mut dims = Vec::new();
        let mut size = 1u64;
        while self.eat(SyntaxKind::L_BRACKET) {
            let bound = self
                .current()
                .filter(|t| t.kind == SyntaxKind::NUMBER)
                .and_then(|t| parse_integer(t.text));
            let Some(bound) = bound else {
                return Err(self.error_here("array bound must be an integer literal"));
            };
            size = match size.checked_mul(bound) {
                Some(size) => size,
                None => return Err(self.error_here("array size overflows")),
            };
            self.bump();
            self.expect(SyntaxKind::R_BRACKET, "`]`")?;
            dims.push(bound);
        }
        if dims.is_empty() {
            return Ok(None);
        }
        Ok(Some(Multiplicity::FixedArray { size, dims }))
    }

    fn bit_width(&mut self) -> PResult<u32> {
        let width = self
            .current()
            .filter(|t| t.kind == SyntaxKind::NUMBER)
            .and_then(|t| parse_integer(t.text))
            .and_then(|w| u32::try_from(w).ok());
        match width {
            Some(width) => {
                self.bump();
                Ok(width)
            }
            None => Err(self.error_here("bit-field width must be an integer literal")),
        }
    }

    /// Opaque initializer text up to one of `stops` outside brackets.
    fn default_value(&mut self, stops: &[SyntaxKind]) -> PResult<String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut angle = 0usize;
        while let Some(token) = self.current() {
            if depth == 0 && angle == 0 && stops.contains(&token.kind) {
                break;
            }
            match token.kind {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                SyntaxKind::L_ANGLE
                    if self.pos > start
                        && self.tokens[self.pos - 1].kind == SyntaxKind::IDENT =>
                {
                    angle += 1
                }
                SyntaxKind::R_ANGLE if angle > 0 => angle -= 1,
                _ => {}
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.error_here("expected default value"));
        }
        Ok(self.text(start, self.pos))
    }

    /// `{ ... }` kept with its braces.
    fn braced_text(&mut self) -> PResult<String> {
        let start = self.pos;
        self.skip_group()?;
        Ok(self.text(start, self.pos))
    }

    /// Skip a balanced `(...)`, `[...]` or `{...}` group.
    fn skip_group(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        while let Some(token) = self.current() {
            self.bump();
            match token.kind {
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(self.error_here("unbalanced brackets"))
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// `[const] name[<args>] [const] *... [&|&&]`
    fn parse_type(&mut self) -> PResult<TypeRef> {
        let mut is_const = false;
        loop {
            match self.current().map(|t| t.kind) {
                Some(SyntaxKind::CONST_KW) => is_const = true,
                Some(
                    SyntaxKind::VOLATILE_KW
                    | SyntaxKind::TYPENAME_KW
                    | SyntaxKind::CLASS_KW
                    | SyntaxKind::STRUCT_KW
                    | SyntaxKind::UNION_KW
                    | SyntaxKind::ENUM_KW,
                ) => {}
                _ => break,
            }
            self.bump();
        }

        let mut ty = self.type_name()?;
        while self.at_any(&[SyntaxKind::CONST_KW, SyntaxKind::VOLATILE_KW]) {
            is_const |= self.at(SyntaxKind::CONST_KW);
            self.bump();
        }
        ty.is_const = is_const;

        let mut depth = 0u8;
        while self.eat(SyntaxKind::STAR) {
            depth = depth.saturating_add(1);
            while self.eat(SyntaxKind::CONST_KW) || self.eat(SyntaxKind::VOLATILE_KW) {}
        }
        let reference = self.reference();
        Ok(ty.with_pointers(depth).with_reference(reference))
    }

    fn reference(&mut self) -> Reference {
        if self.eat(SyntaxKind::AMP) {
            Reference::LValue
        } else if self.eat(SyntaxKind::AMP_AMP) {
            Reference::RValue
        } else {
            Reference::None
        }
    }

    /// Qualified or builtin type name with template arguments.
    fn type_name(&mut self) -> PResult<TypeRef> {
        if self
            .current()
            .is_some_and(|t| t.kind == SyntaxKind::IDENT && is_builtin_type_word(t.text))
        {
            let mut words = Vec::new();
            while let Some(token) = self.current() {
                if token.kind != SyntaxKind::IDENT || !is_builtin_type_word(token.text) {
                    break;
                }
                words.push(token.text);
                self.bump();
            }
            return Ok(TypeRef::named(words.join(" ")));
        }

        let mut name = String::new();
        if self.eat(SyntaxKind::COLON_COLON) {
            name.push_str("::");
        }
        let mut args = Vec::new();
        loop {
            let segment = self.expect_ident("type name")?;
            name.push_str(&segment);
            if self.at(SyntaxKind::L_ANGLE) {
                args = self.template_args()?;
            }
            if !(self.at(SyntaxKind::COLON_COLON) && self.nth(1) == Some(SyntaxKind::IDENT)) {
                break;
            }
            // `Outer<T>::Inner`: arguments of an inner segment stay in the name.
            if !args.is_empty() {
                let rendered: Vec<String> = args.iter().map(TypeRef::to_source).collect();
                name.push('<');
                name.push_str(&rendered.join(", "));
                name.push('>');
                args.clear();
            }
            name.push_str("::");
            self.bump();
        }
        Ok(TypeRef::named(name).with_args(args))
    }

    /// `<arg, ...>`; arguments that are not types are kept as opaque names.
    fn template_args(&mut self) -> PResult<Vec<TypeRef>> {
        self.expect(SyntaxKind::L_ANGLE, "`<`")?;
        let mut args = Vec::new();
        if self.eat(SyntaxKind::R_ANGLE) {
            return Ok(args);
        }
        loop {
            let start = self.pos;
            let arg = match self.parse_type() {
                Ok(ty) if self.at_any(&[SyntaxKind::COMMA, SyntaxKind::R_ANGLE]) => ty,
                _ => {
                    self.pos = start;
                    TypeRef::named(self.opaque_arg()?)
                }
            };
            args.push(arg);
            if self.eat(SyntaxKind::COMMA) {
                continue;
            }
            self.expect(SyntaxKind::R_ANGLE, "`,` or `>`")?;
            return Ok(args);
        }
    }

    fn opaque_arg(&mut self) -> PResult<String> {
        let start = self.pos;
        let (mut depth, mut angle) = (0usize, 0usize);
        while let Some(token) = self.current() {
            match token.kind {
                SyntaxKind::COMMA | SyntaxKind::R_ANGLE if depth == 0 && angle == 0 => break,
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET => depth = depth.saturating_sub(1),
                SyntaxKind::L_ANGLE => angle += 1,
                SyntaxKind::R_ANGLE => angle = angle.saturating_sub(1),
                SyntaxKind::SEMICOLON | SyntaxKind::L_BRACE | SyntaxKind::R_BRACE => break,
                _ => {}
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.error_here("expected template argument"));
        }
        Ok(self.text(start, self.pos))
    }
}

fn class_key(kind: SyntaxKind) -> Option<ClassKey> {
    match kind {
        SyntaxKind::CLASS_KW => Some(ClassKey::Class),
        SyntaxKind::STRUCT_KW => Some(ClassKey::Struct),
        SyntaxKind::UNION_KW => Some(ClassKey::Union),
        _ => None,
    }
}

fn multiplicity_of(ty: &TypeRef, fixed: Option<Multiplicity>) -> Multiplicity {
    if let Some(fixed) = fixed {
        fixed
    } else if ty.collection_element().is_some() {
        Multiplicity::DynamicCollection
    } else {
        Multiplicity::Scalar
    }
}

fn ends_operand(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IDENT
            | SyntaxKind::NUMBER
            | SyntaxKind::CHAR
            | SyntaxKind::STRING
            | SyntaxKind::R_PAREN
    )
}

fn starts_operand(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IDENT | SyntaxKind::NUMBER | SyntaxKind::CHAR | SyntaxKind::STRING
    )
}

/// Integer literal value: decimal, hex, octal or binary, with separators and
/// suffixes.
pub(crate) fn parse_integer(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|&c| c != '\'').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    let body = body.trim_end_matches(['u', 'l', 'z']);
    if body.is_empty() {
        return (radix == 8).then_some(0);
    }
    u64::from_str_radix(body, radix).ok()
}
