use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::base::Position;
use crate::hir::{
    DiagnosticKind, ExtractOptions, Extraction, Severity, TypeKind, TypeLookup, codes, extract,
};
use crate::model::{Member, Multiplicity};

fn run(text: &str) -> Extraction {
    extract(text, "test", &TypeLookup::new(), &ExtractOptions::default())
}

fn codes_of(extraction: &Extraction) -> Vec<&'static str> {
    extraction.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn test_clean_file_has_no_diagnostics() {
    let extraction = run("struct Point { int x; int y; };");
    assert!(extraction.diagnostics.is_empty());
    let module = extraction.module.expect("module");
    assert_eq!(module.name, "test");
    assert_eq!(module.decls.len(), 1);
}

#[test]
fn test_recovery_keeps_every_valid_member() {
    let text = "class Buffer {\npublic:\n    int size;\n    char data[n];\n    int capacity;\n    bool empty() const;\n};";
    let extraction = run(text);
    assert_eq!(codes_of(&extraction), vec![codes::SYNTAX_ERROR]);
    let module = extraction.module.expect("syntax errors keep the model");
    let class = module.find_class("Buffer").expect("class");
    let names: Vec<_> = class.members.iter().map(|m| m.name().as_str()).collect();
    assert_eq!(names, vec!["size", "capacity", "empty"]);
    assert_eq!(extraction.diagnostics[0].span.start.line, 3);
}

#[test]
fn test_array_size_overflow_drops_member() {
    let text = "class A {\n    int a[4294967296][4294967296][16];\n    int b[4294967296][4294967295];\n};";
    let extraction = run(text);
    assert_eq!(codes_of(&extraction), vec![codes::SYNTAX_ERROR]);
    let error = &extraction.diagnostics[0];
    assert!(error.message.starts_with("array size overflows"), "{}", error.message);
    assert_eq!(error.span.start.line, 1);

    let module = extraction.module.expect("syntax errors keep the model");
    let class = module.find_class("A").expect("class");
    let [Member::Field(b)] = class.members.as_slice() else {
        panic!("expected only `b`: {:?}", class.members);
    };
    assert_eq!(
        b.multiplicity,
        Multiplicity::FixedArray { size: 4294967296 * 4294967295, dims: vec![4294967296, 4294967295] }
    );
    crate::interchange::check_invariants(&module).expect("extracted model is valid");
}

#[test]
fn test_zero_length_array_is_a_warning() {
    let extraction = run("struct Packet {\n    int header;\n    char payload[0];\n};");
    assert_eq!(codes_of(&extraction), vec![codes::ZERO_LENGTH_ARRAY]);
    let diagnostic = &extraction.diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(diagnostic.kind, DiagnosticKind::StructureWarning);
    assert_eq!(diagnostic.span.start, Position::new(2, 4));

    let module = extraction.module.expect("warnings keep the model");
    let class = module.find_class("Packet").expect("class");
    let Member::Field(payload) = &class.members[1] else {
        panic!("expected field");
    };
    assert_eq!(payload.multiplicity, Multiplicity::FixedArray { size: 0, dims: vec![0] });
}

#[test]
fn test_duplicate_base_is_kept_and_flagged() {
    let extraction = run("class Base {};\nclass Twice : public Base, public Base {};");
    assert_eq!(codes_of(&extraction), vec![codes::DUPLICATE_BASE]);
    assert!(!extraction.has_errors());
    let module = extraction.module.expect("module");
    let class = module.find_class("Twice").expect("class");
    let duplicates: Vec<_> = class.bases.iter().map(|b| b.duplicate_of).collect();
    assert_eq!(duplicates, vec![None, Some(0)]);
    let base_edges = class.relationships.iter().filter(|r| r.role.is_none()).count();
    assert_eq!(base_edges, 2);
}

#[test]
fn test_direct_value_cycle_withholds_module() {
    let extraction = run("struct Node {\n    Node left;\n    Node right;\n};");
    assert!(extraction.module.is_none());
    let errors: Vec<_> = extraction.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, codes::CYCLIC_VALUE_COMPOSITION);
    assert_eq!(errors[0].kind, DiagnosticKind::SemanticError);
    assert_eq!(errors[0].message, "cyclic value composition: Node -> Node");
}

#[test]
fn test_transitive_value_cycle() {
    let text = "class B;\nclass A { B b; };\nclass B { int n; A a; };";
    let extraction = run(text);
    assert!(extraction.module.is_none());
    let messages: Vec<_> = extraction.errors().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["cyclic value composition: A -> B -> A"]);
}

#[rstest]
#[case::pointer("struct Node { Node* next; };")]
#[case::reference_collection("struct Node { std::vector<Node> children; };")]
#[case::smart_pointer("struct Node { std::unique_ptr<Node> next; };")]
#[case::static_member("struct Node { static Node sentinel; };")]
fn test_indirection_breaks_cycles(#[case] text: &str) {
    let extraction = run(text);
    assert!(!extraction.has_errors(), "{:?}", extraction.diagnostics);
    assert!(extraction.module.is_some());
}

#[test]
fn test_duplicate_type_name() {
    let extraction = run("struct A { int x; };\nenum A { One };");
    assert!(extraction.module.is_none());
    assert_eq!(codes_of(&extraction), vec![codes::DUPLICATE_TYPE]);
}

#[test]
fn test_same_name_in_different_namespaces_is_fine() {
    let extraction = run("namespace a { struct Id { int v; }; }\nnamespace b { struct Id { int v; }; }");
    assert!(extraction.diagnostics.is_empty());
    assert_eq!(extraction.module.expect("module").decls.len(), 2);
}

#[rstest]
#[case::top_level("enum Color { Red, Green, Red };")]
#[case::nested("class Light {\npublic:\n    enum State { On, Off, On };\n};")]
fn test_duplicate_enumerator(#[case] text: &str) {
    let extraction = run(text);
    assert!(extraction.module.is_none());
    assert_eq!(codes_of(&extraction), vec![codes::DUPLICATE_ENUMERATOR]);
}

#[test]
fn test_unknown_character_warning() {
    let extraction = run("struct A { int x; } $;");
    let warnings: Vec<_> = extraction.warnings().map(|d| d.code).collect();
    assert!(warnings.contains(&codes::UNKNOWN_CHARACTER));
    assert!(extraction.module.is_some());
}

#[test]
fn test_strict_lookup_reports_unresolved_field_types() {
    let text = r#"
template<typename T>
class Holder {
    T value;
    Widget widget;
    std::string label;
    unsigned long count;
    Gadget* gadget;
};
"#;
    let lenient = extract(text, "test", &TypeLookup::new(), &ExtractOptions::default());
    assert!(lenient.module.is_some());

    let strict = ExtractOptions { strict_lookup: true };
    let extraction = extract(text, "test", &TypeLookup::new(), &strict);
    assert!(extraction.module.is_none());
    let messages: Vec<_> = extraction.errors().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "type `Widget` of field `widget` cannot be resolved",
            "type `Gadget` of field `gadget` cannot be resolved",
        ]
    );

    let mut lookup = TypeLookup::new();
    lookup.insert("Widget", TypeKind::default());
    lookup.insert("Gadget", TypeKind::default());
    let resolved = extract(text, "test", &lookup, &strict);
    assert!(resolved.module.is_some(), "{:?}", resolved.diagnostics);
}

#[test]
fn test_strict_lookup_accepts_local_enums_and_aliases() {
    let text = r#"
enum class Mode { Fast, Slow };
typedef unsigned int Handle;
class Device {
public:
    enum Status { Idle, Busy };
private:
    Mode mode;
    Handle handle;
    Status status;
};
"#;
    let strict = ExtractOptions { strict_lookup: true };
    let extraction = extract(text, "test", &TypeLookup::new(), &strict);
    assert!(extraction.diagnostics.is_empty(), "{:?}", extraction.diagnostics);
}

#[test]
fn test_diagnostics_sorted_by_position() {
    let text = "struct A {\n    char z[0];\n    int x[n];\n    char y[0];\n};";
    let extraction = run(text);
    let lines: Vec<_> = extraction.diagnostics.iter().map(|d| d.span.start.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
}

#[test]
fn test_diagnostic_display() {
    let extraction = run("struct P {\n    int data[0];\n};");
    let diagnostic = extraction.diagnostics[0].clone().with_file("include/P.h");
    assert_eq!(
        diagnostic.to_string(),
        "include/P.h:2:5: warning[W0201]: field `data` is an array of zero elements"
    );
}
