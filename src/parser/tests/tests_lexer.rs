use rstest::rstest;

use crate::parser::keywords::is_identifier;
use crate::parser::{SyntaxKind, lex, tokenize};

fn kinds(input: &str) -> Vec<SyntaxKind> {
    lex(input).tokens.iter().map(|t| t.kind).collect()
}

#[rstest]
#[case("class", SyntaxKind::CLASS_KW)]
#[case("struct", SyntaxKind::STRUCT_KW)]
#[case("virtual", SyntaxKind::VIRTUAL_KW)]
#[case("classy", SyntaxKind::IDENT)]
#[case("::", SyntaxKind::COLON_COLON)]
#[case("&&", SyntaxKind::AMP_AMP)]
#[case("...", SyntaxKind::ELLIPSIS)]
#[case("0x1Fu", SyntaxKind::NUMBER)]
#[case("3.14f", SyntaxKind::NUMBER)]
#[case("\"a \\\" b\"", SyntaxKind::STRING)]
#[case("'x'", SyntaxKind::CHAR)]
fn test_single_token(#[case] input: &str, #[case] expected: SyntaxKind) {
    assert_eq!(kinds(input), vec![expected]);
}

#[test]
fn test_trivia_is_dropped() {
    let input = "#include <vector>\n// plain\n/* block */ int x;";
    assert_eq!(
        kinds(input),
        vec![SyntaxKind::IDENT, SyntaxKind::IDENT, SyntaxKind::SEMICOLON]
    );
}

#[test]
fn test_tokenize_keeps_trivia() {
    let tokens = tokenize("int  x;");
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[1].kind, SyntaxKind::WHITESPACE);
}

#[test]
fn test_includes_are_recorded() {
    let lexed = lex("#include <vector>\n#include \"Node.h\"\n#pragma once\n");
    assert_eq!(lexed.includes, vec!["<vector>", "\"Node.h\""]);
    assert!(lexed.tokens.is_empty());
}

#[test]
fn test_doc_comment_attaches_to_next_token() {
    let lexed = lex("/** @brief A wheel. */\nclass Wheel {};");
    let doc = lexed.tokens[0].doc.as_ref().unwrap();
    assert_eq!(doc.annotations.brief.as_deref(), Some("A wheel."));
    assert!(lexed.tokens[1].doc.is_none());
}

#[test]
fn test_line_docs_merge_until_blank_line() {
    let lexed = lex("/// first\n/// second\n\n/// third\nint x;");
    let doc = lexed.tokens[0].doc.as_ref().unwrap();
    assert_eq!(doc.verbatim.as_deref(), Some("/// third"));

    let lexed = lex("/// first\n/// second\nint x;");
    let doc = lexed.tokens[0].doc.as_ref().unwrap();
    assert_eq!(doc.annotations.brief.as_deref(), Some("first second"));
}

#[test]
fn test_file_doc_is_separated() {
    let lexed = lex("/** @file Car.h */\n#pragma once\n/** @brief A car. */\nclass Car {};");
    assert!(lexed.file_doc.is_some());
    let doc = lexed.tokens[0].doc.as_ref().unwrap();
    assert_eq!(doc.annotations.brief.as_deref(), Some("A car."));
}

#[test]
fn test_unicode_identifiers() {
    let tokens = tokenize("int \u{00e9}t\u{00e9} = _\u{03bb}2;");
    let idents: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == SyntaxKind::IDENT)
        .map(|t| t.text)
        .collect();
    assert_eq!(idents, vec!["\u{00e9}t\u{00e9}", "_\u{03bb}2"]);
    assert!(idents.iter().all(|name| is_identifier(name)));
}

#[test]
fn test_unknown_character_recovered() {
    let lexed = lex("int x; \u{00a7} int y;");
    assert_eq!(lexed.unknown.len(), 1);
    assert!(lexed.tokens.iter().any(|t| t.kind == SyntaxKind::UNKNOWN));
    assert_eq!(
        lexed.tokens.iter().filter(|t| t.kind == SyntaxKind::SEMICOLON).count(),
        2
    );
}
