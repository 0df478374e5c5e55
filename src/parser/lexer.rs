//! Logos-based lexer for declaration text
//!
//! Fast tokenization using the logos crate. [`Lexer`] yields every token,
//! trivia included; [`lex`] drops trivia, attaches doc comments to the token
//! that follows them, and records `#include` targets.

use crate::model::doc::{DocComment, FILE_TAG, is_doc_comment, is_line_doc};
use super::syntax_kind::SyntaxKind;
use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, position and attached documentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub range: TextRange,
    /// Doc comment written directly before this token, if any.
    pub doc: Option<DocComment>,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let span = self.inner.span();
        let range = TextRange::new(
            TextSize::new(span.start as u32),
            TextSize::new(span.end as u32),
        );

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::UNKNOWN,
        };

        Some(Token {
            kind,
            text,
            range,
            doc: None,
        })
    }
}

/// Tokenize an entire string into a Vec, trivia included
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Output of [`lex`]: the significant tokens of one file.
#[derive(Debug, Clone, Default)]
pub struct Lexed<'a> {
    /// Non-trivia tokens in source order. `UNKNOWN` tokens are kept so the
    /// parser's recovery path consumes them.
    pub tokens: Vec<Token<'a>>,
    /// Targets of `#include` directives, delimiters included (`<string>`).
    pub includes: Vec<String>,
    /// Ranges of characters the lexer did not recognise.
    pub unknown: Vec<TextRange>,
    /// First doc block carrying an `@file` tag.
    pub file_doc: Option<DocComment>,
}

/// Lex `input`, dropping trivia and attaching doc comments.
///
/// Never fails: unrecognised characters become `UNKNOWN` tokens and are also
/// listed in [`Lexed::unknown`] so callers can report them.
pub fn lex(input: &str) -> Lexed<'_> {
    let mut out = Lexed::default();
    let mut pending: Option<PendingDoc> = None;

    for mut token in Lexer::new(input) {
        match token.kind {
            SyntaxKind::WHITESPACE => {
                // A blank line between two `///` blocks separates them.
                if token.text.matches('\n').count() > 1 {
                    if let Some(doc) = pending.as_mut() {
                        doc.mergeable = false;
                    }
                }
            }
            SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT => {
                if !is_doc_comment(token.text) {
                    continue;
                }
                let line_doc = is_line_doc(token.text);
                let merge = matches!(
                    pending.as_ref(),
                    Some(doc) if line_doc && doc.line_doc && doc.mergeable
                );
                if merge {
                    if let Some(doc) = pending.as_mut() {
                        doc.text.push('\n');
                        doc.text.push_str(token.text);
                    }
                    continue;
                }
                if let Some(previous) = pending.take() {
                    out.claim_file_doc(previous.parse());
                }
                pending = Some(PendingDoc {
                    text: token.text.to_string(),
                    line_doc,
                    mergeable: true,
                });
            }
            SyntaxKind::PREPROCESSOR => {
                if let Some(target) = include_target(token.text) {
                    out.includes.push(target.to_string());
                }
            }
            kind => {
                if kind == SyntaxKind::UNKNOWN {
                    out.unknown.push(token.range);
                }
                token.doc = pending
                    .take()
                    .map(|doc| doc.parse())
                    .and_then(|doc| out.claim_file_doc(doc));
                out.tokens.push(token);
            }
        }
    }
    if let Some(doc) = pending {
        out.claim_file_doc(doc.parse());
    }

    out
}

impl Lexed<'_> {
    /// Keep `doc` as the file doc if it is the first `@file` block; hand it
    /// back otherwise.
    fn claim_file_doc(&mut self, doc: DocComment) -> Option<DocComment> {
        if self.file_doc.is_none() && doc.has_tag(FILE_TAG) {
            self.file_doc = Some(doc);
            None
        } else {
            Some(doc)
        }
    }
}

struct PendingDoc {
    text: String,
    line_doc: bool,
    mergeable: bool,
}

impl PendingDoc {
    fn parse(&self) -> DocComment {
        DocComment::parse(&self.text)
    }
}

/// Extract the target of an `#include` directive.
fn include_target(directive: &str) -> Option<&str> {
    let rest = directive.strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("include")?.trim();
    if rest.is_empty() { None } else { Some(rest) }
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\x0B\x0C]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,

    #[regex(r"#([^\n\\]|\\\r?\n|\\[^\r\n])*")]
    Preprocessor,

    // =========================================================================
    // LITERALS
    // =========================================================================
    /// XID identifiers, the same set `keywords::is_identifier` accepts.
    #[regex(r"[\p{XID_Start}_]\p{XID_Continue}*")]
    Ident,

    #[regex(r"[0-9]([0-9a-zA-Z_'.]|[eEpP][+-])*")]
    Number,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,

    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    Char,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("::")]
    ColonColon,

    #[token("&&")]
    AmpAmp,

    #[token("...")]
    Ellipsis,

    #[token("->")]
    Arrow,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[token("=")]
    Eq,
    #[token("~")]
    Tilde,
    #[token(".")]
    Dot,
    #[regex(r"[+\-/%!|^?]")]
    Operator,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("class")]
    ClassKw,
    #[token("struct")]
    StructKw,
    #[token("union")]
    UnionKw,
    #[token("enum")]
    EnumKw,
    #[token("typedef")]
    TypedefKw,
    #[token("using")]
    UsingKw,
    #[token("namespace")]
    NamespaceKw,
    #[token("template")]
    TemplateKw,
    #[token("typename")]
    TypenameKw,
    #[token("public")]
    PublicKw,
    #[token("protected")]
    ProtectedKw,
    #[token("private")]
    PrivateKw,
    #[token("static")]
    StaticKw,
    #[token("const")]
    ConstKw,
    #[token("virtual")]
    VirtualKw,
    #[token("inline")]
    InlineKw,
    #[token("explicit")]
    ExplicitKw,
    #[token("friend")]
    FriendKw,
    #[token("constexpr")]
    ConstexprKw,
    #[token("mutable")]
    MutableKw,
    #[token("volatile")]
    VolatileKw,
    #[token("extern")]
    ExternKw,
    #[token("operator")]
    OperatorKw,
    #[token("default")]
    DefaultKw,
    #[token("delete")]
    DeleteKw,

    /// Any non-ASCII character outside comments and literals.
    #[regex(r"[^\x00-\x7F]", priority = 1)]
    NonAscii,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            // Trivia
            Whitespace => SyntaxKind::WHITESPACE,
            LineComment => SyntaxKind::LINE_COMMENT,
            BlockComment => SyntaxKind::BLOCK_COMMENT,
            Preprocessor => SyntaxKind::PREPROCESSOR,

            // Literals
            Ident => SyntaxKind::IDENT,
            Number => SyntaxKind::NUMBER,
            String => SyntaxKind::STRING,
            Char => SyntaxKind::CHAR,

            // Punctuation
            ColonColon => SyntaxKind::COLON_COLON,
            AmpAmp => SyntaxKind::AMP_AMP,
            Ellipsis => SyntaxKind::ELLIPSIS,
            Arrow => SyntaxKind::ARROW,
            LBrace => SyntaxKind::L_BRACE,
            RBrace => SyntaxKind::R_BRACE,
            LParen => SyntaxKind::L_PAREN,
            RParen => SyntaxKind::R_PAREN,
            LBracket => SyntaxKind::L_BRACKET,
            RBracket => SyntaxKind::R_BRACKET,
            Lt => SyntaxKind::L_ANGLE,
            Gt => SyntaxKind::R_ANGLE,
            Comma => SyntaxKind::COMMA,
            Semicolon => SyntaxKind::SEMICOLON,
            Colon => SyntaxKind::COLON,
            Star => SyntaxKind::STAR,
            Amp => SyntaxKind::AMP,
            Eq => SyntaxKind::EQ,
            Tilde => SyntaxKind::TILDE,
            Dot => SyntaxKind::DOT,
            Operator => SyntaxKind::OPERATOR,

            // Keywords
            ClassKw => SyntaxKind::CLASS_KW,
            StructKw => SyntaxKind::STRUCT_KW,
            UnionKw => SyntaxKind::UNION_KW,
            EnumKw => SyntaxKind::ENUM_KW,
            TypedefKw => SyntaxKind::TYPEDEF_KW,
            UsingKw => SyntaxKind::USING_KW,
            NamespaceKw => SyntaxKind::NAMESPACE_KW,
            TemplateKw => SyntaxKind::TEMPLATE_KW,
            TypenameKw => SyntaxKind::TYPENAME_KW,
            PublicKw => SyntaxKind::PUBLIC_KW,
            ProtectedKw => SyntaxKind::PROTECTED_KW,
            PrivateKw => SyntaxKind::PRIVATE_KW,
            StaticKw => SyntaxKind::STATIC_KW,
            ConstKw => SyntaxKind::CONST_KW,
            VirtualKw => SyntaxKind::VIRTUAL_KW,
            InlineKw => SyntaxKind::INLINE_KW,
            ExplicitKw => SyntaxKind::EXPLICIT_KW,
            FriendKw => SyntaxKind::FRIEND_KW,
            ConstexprKw => SyntaxKind::CONSTEXPR_KW,
            MutableKw => SyntaxKind::MUTABLE_KW,
            VolatileKw => SyntaxKind::VOLATILE_KW,
            ExternKw => SyntaxKind::EXTERN_KW,
            OperatorKw => SyntaxKind::OPERATOR_KW,
            DefaultKw => SyntaxKind::DEFAULT_KW,
            DeleteKw => SyntaxKind::DELETE_KW,

            NonAscii => SyntaxKind::UNKNOWN,
        }
    }
}
