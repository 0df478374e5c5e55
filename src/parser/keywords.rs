//! Keyword tables used by the lexer and the declaration parser.

/// Reserved words lexed as dedicated keyword tokens.
pub const DECLARATION_KEYWORDS: &[&str] = &[
    "class",
    "struct",
    "union",
    "enum",
    "typedef",
    "using",
    "namespace",
    "template",
    "typename",
    "public",
    "protected",
    "private",
    "static",
    "const",
    "virtual",
    "inline",
    "explicit",
    "friend",
    "constexpr",
    "mutable",
    "volatile",
    "extern",
    "operator",
    "default",
    "delete",
];

/// Words that combine into a single builtin type name (`unsigned long int`).
pub const BUILTIN_TYPE_WORDS: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int", "long",
    "signed", "unsigned", "float", "double", "auto",
];

/// Builtin scalar types that never form relationship edges.
pub fn is_builtin_type_word(text: &str) -> bool {
    BUILTIN_TYPE_WORDS.contains(&text)
}

/// Check whether `text` is a reserved declaration keyword.
pub fn is_declaration_keyword(text: &str) -> bool {
    DECLARATION_KEYWORDS.contains(&text)
}

/// Check whether `text` is a valid identifier that is not reserved.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || unicode_ident::is_xid_start(first))
        && chars.all(unicode_ident::is_xid_continue)
        && !is_declaration_keyword(text)
}
