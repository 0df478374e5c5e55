//! Token kinds produced by the lexer.
//!
//! The set covers what declaration-level parsing needs: identifiers,
//! declaration keywords, opaque literals, punctuation, and trivia
//! (whitespace, comments, preprocessor lines).

/// All token kinds in declaration text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (whitespace, comments, preprocessor - never seen by the parser)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,
    PREPROCESSOR,

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,
    NUMBER,  // 42, 0x1F, 3.14f
    STRING,  // "hello"
    CHAR,    // 'a'

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,     // {
    R_BRACE,     // }
    L_PAREN,     // (
    R_PAREN,     // )
    L_BRACKET,   // [
    R_BRACKET,   // ]
    L_ANGLE,     // <
    R_ANGLE,     // >
    COMMA,       // ,
    SEMICOLON,   // ;
    COLON,       // :
    COLON_COLON, // ::
    STAR,        // *
    AMP,         // &
    AMP_AMP,     // &&
    EQ,          // =
    TILDE,       // ~
    DOT,         // .
    ELLIPSIS,    // ...
    ARROW,       // ->
    OPERATOR,    // any other operator character (+ - / % ! | ^ ?)

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    CLASS_KW,
    STRUCT_KW,
    UNION_KW,
    ENUM_KW,
    TYPEDEF_KW,
    USING_KW,
    NAMESPACE_KW,
    TEMPLATE_KW,
    TYPENAME_KW,
    PUBLIC_KW,
    PROTECTED_KW,
    PRIVATE_KW,
    STATIC_KW,
    CONST_KW,
    VIRTUAL_KW,
    INLINE_KW,
    EXPLICIT_KW,
    FRIEND_KW,
    CONSTEXPR_KW,
    MUTABLE_KW,
    VOLATILE_KW,
    EXTERN_KW,
    OPERATOR_KW,
    DEFAULT_KW,
    DELETE_KW,

    // =========================================================================
    // SPECIAL
    // =========================================================================
    /// Unrecognised character, reported as a lexer warning.
    UNKNOWN,
}

impl SyntaxKind {
    /// Check if this is trivia (whitespace, comments, preprocessor lines)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT | Self::PREPROCESSOR
        )
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::CLASS_KW as u16) && (self as u16) <= (Self::DELETE_KW as u16)
    }

    /// Check if this is a visibility keyword (`public`, `protected`, `private`)
    pub fn is_visibility(self) -> bool {
        matches!(self, Self::PUBLIC_KW | Self::PROTECTED_KW | Self::PRIVATE_KW)
    }

    /// Check if this is a class key (`class`, `struct`, `union`)
    pub fn is_class_key(self) -> bool {
        matches!(self, Self::CLASS_KW | Self::STRUCT_KW | Self::UNION_KW)
    }

    /// Check if this kind can start or continue a name
    pub fn is_name_like(self) -> bool {
        self == Self::IDENT
    }

    /// Check if this is a literal
    pub fn is_literal(self) -> bool {
        matches!(self, Self::NUMBER | Self::STRING | Self::CHAR)
    }
}
