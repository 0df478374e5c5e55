use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::model::{
    AliasForm, ClassKey, Member, MethodKind, Multiplicity, NestedKind, Ownership, Reference,
    Visibility,
};
use crate::parser::parser::parse_integer;
use crate::parser::{ClassNode, ItemKind, Parse, parse};

fn only_class(parse: &Parse) -> &ClassNode {
    let classes: Vec<_> = parse
        .file
        .items
        .iter()
        .filter_map(|item| match &item.kind {
            ItemKind::Class(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(classes.len(), 1, "expected exactly one class");
    classes[0]
}

fn member_names(class: &ClassNode) -> Vec<&str> {
    class.members.iter().map(|m| m.member.name().as_str()).collect()
}

#[test]
fn test_class_visibility_sections() {
    let parse = parse(
        "class Car {\n    int hidden;\npublic:\n    Car();\n    void drive();\nprotected:\n    int speed;\n};",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    assert_eq!(class.key, ClassKey::Class);
    let visibilities: Vec<_> = class.members.iter().map(|m| m.member.visibility()).collect();
    assert_eq!(
        visibilities,
        vec![
            Visibility::Private,
            Visibility::Public,
            Visibility::Public,
            Visibility::Protected
        ]
    );
}

#[test]
fn test_struct_defaults_to_public() {
    let parse = parse("struct Point { int x; int y; };");
    let class = only_class(&parse);
    assert!(
        class
            .members
            .iter()
            .all(|m| m.member.visibility() == Visibility::Public)
    );
}

#[test]
fn test_method_and_field_disambiguation() {
    let parse = parse(
        "class A {\npublic:\n    Node* next;\n    Node* find(int key) const;\n    static const int LIMIT = 5;\n};",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    match &class.members[0].member {
        Member::Field(f) => {
            assert_eq!(f.ty.name, "Node");
            assert_eq!(f.ty.ownership, Ownership::Pointer);
        }
        other => panic!("expected field, got {other:?}"),
    }
    match &class.members[1].member {
        Member::Method(m) => {
            assert_eq!(m.name, "find");
            assert!(m.modifiers.is_const);
            assert_eq!(m.params.len(), 1);
            assert_eq!(m.params[0].name.as_deref(), Some("key"));
            assert_eq!(m.return_type.as_ref().unwrap().pointer_depth, 1);
        }
        other => panic!("expected method, got {other:?}"),
    }
    match &class.members[2].member {
        Member::Field(f) => {
            assert!(f.modifiers.is_static);
            assert!(f.modifiers.is_const);
            assert_eq!(f.default_value.as_deref(), Some("5"));
        }
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn test_special_members() {
    let parse = parse(
        "class Shape {\npublic:\n    explicit Shape(int sides = 3);\n    virtual ~Shape() = default;\n    virtual double area() const = 0;\n    operator bool() const;\n};",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    let methods: Vec<_> = class
        .members
        .iter()
        .filter_map(|m| match &m.member {
            Member::Method(m) => Some(m),
            Member::Field(_) => None,
        })
        .collect();
    assert_eq!(methods[0].kind, MethodKind::Constructor);
    assert!(methods[0].modifiers.is_explicit);
    assert_eq!(methods[0].params[0].default_value.as_deref(), Some("3"));
    assert_eq!(methods[1].kind, MethodKind::Destructor);
    assert_eq!(methods[1].name, "~Shape");
    assert!(methods[1].modifiers.is_defaulted);
    assert!(methods[2].modifiers.is_pure_virtual);
    assert!(methods[2].modifiers.is_virtual);
    assert_eq!(methods[3].kind, MethodKind::Conversion);
    assert_eq!(methods[3].name, "operator bool");
    assert!(methods[3].return_type.is_none());
}

#[test]
fn test_multi_dimensional_array_is_folded() {
    let parse = parse("struct Grid { int cells[10][10]; };");
    let class = only_class(&parse);
    match &class.members[0].member {
        Member::Field(f) => assert_eq!(
            f.multiplicity,
            Multiplicity::FixedArray {
                size: 100,
                dims: vec![10, 10]
            }
        ),
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn test_dynamic_collection_field() {
    let parse = parse("struct Car { std::vector<Wheel*> wheels; };");
    let class = only_class(&parse);
    match &class.members[0].member {
        Member::Field(f) => {
            assert_eq!(f.multiplicity, Multiplicity::DynamicCollection);
            assert_eq!(f.ty.to_source(), "std::vector<Wheel*>");
        }
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn test_function_pointer_field() {
    let parse = parse(
        "class Dispatcher {\npublic:\n    void (Dispatcher::* handler)(int, double);\n    int (*callback)(void);\n};",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    match &class.members[0].member {
        Member::Method(m) => {
            assert_eq!(m.name, "handler");
            let pointer = m.modifiers.function_pointer.as_ref().unwrap();
            assert_eq!(pointer.scope.as_deref(), Some("Dispatcher"));
            assert_eq!(m.params.len(), 2);
        }
        other => panic!("expected method, got {other:?}"),
    }
    match &class.members[1].member {
        Member::Method(m) => {
            assert_eq!(m.name, "callback");
            assert!(m.modifiers.function_pointer.as_ref().unwrap().scope.is_none());
            assert!(m.params.is_empty());
        }
        other => panic!("expected method, got {other:?}"),
    }
}

#[rstest]
#[case("struct Foo {\n    Foo (*make)(int);\n};", None)]
#[case("struct Foo {\n    Foo (Foo::*clone)() const;\n};", Some("Foo"))]
fn test_function_pointer_returning_own_class(#[case] input: &str, #[case] scope: Option<&str>) {
    let parse = parse(input);
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    match &class.members[..] {
        [member] => match &member.member {
            Member::Method(m) => {
                assert_eq!(m.kind, MethodKind::Ordinary);
                assert_eq!(m.return_type.as_ref().map(|t| t.to_source()).as_deref(), Some("Foo"));
                let pointer = m.modifiers.function_pointer.as_ref().unwrap();
                assert_eq!(pointer.scope.as_deref(), scope);
            }
            other => panic!("expected method, got {other:?}"),
        },
        other => panic!("expected one member, got {other:?}"),
    }
}

#[test]
fn test_constructor_taking_own_nested_type() {
    let parse = parse("struct Foo {\n    Foo(Foo::Options options);\n};");
    assert!(parse.ok(), "{:?}", parse.errors);
    match &only_class(&parse).members[0].member {
        Member::Method(m) => {
            assert_eq!(m.kind, MethodKind::Constructor);
            assert_eq!(m.params[0].ty.to_source(), "Foo::Options");
        }
        other => panic!("expected constructor, got {other:?}"),
    }
}

#[test]
fn test_multiple_declarators_and_initializers() {
    let parse = parse("struct S { int a, *b, c[3]; unsigned flag : 1; double ratio{0.5}; };");
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    assert_eq!(member_names(class), vec!["a", "b", "c", "flag", "ratio"]);
    match &class.members[1].member {
        Member::Field(f) => assert_eq!(f.ty.pointer_depth, 1),
        other => panic!("expected field, got {other:?}"),
    }
    match &class.members[3].member {
        Member::Field(f) => assert_eq!(f.bit_width, Some(1)),
        other => panic!("expected field, got {other:?}"),
    }
    match &class.members[4].member {
        Member::Field(f) => assert_eq!(f.default_value.as_deref(), Some("{0.5}")),
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn test_inline_bodies_are_skipped() {
    let parse = parse(
        "class Counter {\npublic:\n    Counter() : value(0), step{1} { reset(); }\n    int get() const { return value; }\n    void inc();\nprivate:\n    int value;\n    int step;\n};",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    assert_eq!(member_names(class), vec!["Counter", "get", "inc", "value", "step"]);
}

#[test]
fn test_recovery_drops_only_the_malformed_member() {
    let parse = parse("class A {\npublic:\n    int a;\n    int b[n];\n    int c;\n};");
    assert_eq!(parse.errors.len(), 1);
    let class = only_class(&parse);
    assert_eq!(member_names(class), vec!["a", "c"]);
}

#[test]
fn test_recovery_after_missing_semicolon() {
    let parse = parse("class A {\npublic:\n    int a\n    int b;\n    int c;\n};");
    assert_eq!(parse.errors.len(), 1);
    let class = only_class(&parse);
    assert_eq!(member_names(class), vec!["b", "c"]);
}

#[test]
fn test_unterminated_member_before_closing_brace() {
    let parse = parse("struct A { int a; int b };\nstruct B { int c; };");
    assert_eq!(parse.errors.len(), 1);
    assert_eq!(parse.file.items.len(), 2);
}

#[test]
fn test_unterminated_class_is_abandoned() {
    let parse = parse("enum E { X };\nclass A {\npublic:\n    int a;\n");
    assert_eq!(parse.errors.len(), 1);
    assert_eq!(parse.file.items.len(), 1);
}

#[test]
fn test_duplicate_bases_are_kept() {
    let parse = parse("class D : public Base, protected Base, virtual public Mixin<int, 2> {};");
    assert!(parse.ok(), "{:?}", parse.errors);
    let class = only_class(&parse);
    let bases: Vec<_> = class.bases.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(bases, vec!["Base", "Base", "Mixin<int, 2>"]);
    assert_eq!(class.bases[1].access, Visibility::Protected);
    assert!(class.bases[2].is_virtual);
}

#[test]
fn test_enum_forms() {
    let parse = parse(
        "enum Color { Red, Green = 2, Blue };\nenum class Mode : unsigned char { On = 1 << 0, Off };\ntypedef enum { A, B } Letter;",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let enums: Vec<_> = parse
        .file
        .items
        .iter()
        .filter_map(|item| match &item.kind {
            ItemKind::Enum(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(enums.len(), 3);
    assert_eq!(enums[0].entries[1].value.as_deref(), Some("2"));
    assert!(enums[1].scoped);
    assert_eq!(enums[1].underlying.as_ref().unwrap().name, "unsigned char");
    assert_eq!(enums[1].entries[0].value.as_deref(), Some("1 << 0"));
    assert_eq!(enums[2].name, "Letter");
    assert!(enums[2].via_typedef);
}

#[test]
fn test_enum_missing_comma_keeps_neighbours() {
    let parse = parse("enum E { A = 1 B = 2, C };");
    assert_eq!(parse.errors.len(), 1);
    match &parse.file.items[0].kind {
        ItemKind::Enum(e) => {
            let names: Vec<_> = e.entries.iter().map(|x| x.name.as_str()).collect();
            assert_eq!(names, vec!["A", "C"]);
        }
        other => panic!("expected enum, got {other:?}"),
    }
}

#[test]
fn test_aliases() {
    let parse = parse(
        "typedef unsigned long Size;\nusing Names = std::vector<std::string>;\ntypedef void (*Callback)(int);",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let aliases: Vec<_> = parse
        .file
        .items
        .iter()
        .filter_map(|item| match &item.kind {
            ItemKind::Alias(a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(aliases[0].form, AliasForm::Typedef);
    assert_eq!(aliases[0].target, "unsigned long");
    assert_eq!(aliases[1].form, AliasForm::Using);
    assert_eq!(aliases[1].target, "std::vector<std::string>");
    assert_eq!(aliases[2].form, AliasForm::Verbatim);
    assert_eq!(aliases[2].name, "Callback");
    assert_eq!(aliases[2].target, "typedef void (*Callback)(int)");
}

#[test]
fn test_namespaces_and_forward_declarations() {
    let parse = parse(
        "namespace app::model {\nclass Engine;\nextern \"C\" {\nstruct Wheel { int size; };\n}\n}\nclass Car {};",
    );
    assert!(parse.ok(), "{:?}", parse.errors);
    let items = &parse.file.items;
    assert!(matches!(&items[0].kind, ItemKind::Forward(f) if f.name == "Engine"));
    assert_eq!(items[1].namespace(), ["app", "model"]);
    assert!(items[2].namespace().is_empty());
}

#[test]
fn test_template_class_and_nested_declarations() {
    let parse = parse(
        "template<typename T, int N>\nclass Buffer final {\npublic:\n    enum State { Empty, Full };\n    typedef T value_type;\n    struct Inner { int x; };\n    T data[N];\n};",
    );
    let class = only_class(&parse);
    assert_eq!(class.template.as_deref(), Some("template<typename T, int N>"));
    assert!(class.is_final);
    assert_eq!(class.nested.len(), 2);
    assert!(matches!(&class.nested[0].decl, NestedKind::Enum(e) if e.name == "State"));
    assert_eq!(parse.unsupported.len(), 1);
    // `N` is not an integer literal.
    assert_eq!(parse.errors.len(), 1);
}

#[test]
fn test_reference_types() {
    let parse = parse("class A { public: void set(const std::string& name, Node&& node); };");
    let class = only_class(&parse);
    match &class.members[0].member {
        Member::Method(m) => {
            assert_eq!(m.params[0].ty.reference, Reference::LValue);
            assert!(m.params[0].ty.is_const);
            assert_eq!(m.params[1].ty.reference, Reference::RValue);
        }
        other => panic!("expected method, got {other:?}"),
    }
}

#[rstest]
#[case("10", Some(10))]
#[case("0x10", Some(16))]
#[case("010", Some(8))]
#[case("0b11", Some(3))]
#[case("1'000u", Some(1000))]
#[case("0", Some(0))]
#[case("1.5", None)]
fn test_parse_integer(#[case] text: &str, #[case] expected: Option<u64>) {
    assert_eq!(parse_integer(text), expected);
}
