//! Synthesis of extracted fixtures.

mod helpers;

use cppmodel::interchange::{Json, ModelFormat, Yaml};
use cppmodel::{SynthesisOptions, synthesize};
use helpers::module_of;
use pretty_assertions::assert_eq;

fn lines_of(text: &str) -> Vec<&str> {
    text.lines().map(str::trim_end).collect()
}

/// Position of `line` in `text`, panicking with the full text when absent.
fn line_at(text: &str, line: &str) -> usize {
    lines_of(text)
        .iter()
        .position(|l| *l == line)
        .unwrap_or_else(|| panic!("line `{line}` not found in:\n{text}"))
}

#[test]
fn test_vehicle_header_layout() {
    let text = synthesize(&module_of("Vehicle.h"), &SynthesisOptions::default()).unwrap();

    let guard = line_at(&text, "#ifndef _VEHICLE_H_");
    let define = line_at(&text, "#define _VEHICLE_H_");
    let include = line_at(&text, "#include <string>");
    let forward = line_at(&text, "// forward declarations");
    let vehicle = line_at(&text, "class Vehicle : public IMovable {");
    let endif = line_at(&text, "#endif // _VEHICLE_H_");
    assert!(guard < define && define < include && include < forward);
    assert!(forward < vehicle && vehicle < endif);
    assert_eq!(lines_of(&text).last(), Some(&"#endif // _VEHICLE_H_"));

    assert!(lines_of(&text).contains(&"class Driver;"));
    assert!(lines_of(&text).contains(&"struct Wheel;"));
}

#[test]
fn test_vehicle_members_render() {
    let text = synthesize(&module_of("Vehicle.h"), &SynthesisOptions::default()).unwrap();
    for expected in [
        "    explicit Vehicle(const std::string& name, int seats = 4);",
        "    virtual ~Vehicle();",
        "    void move(double dx, double dy) override;",
        "    double speed() const override;",
        "    static Vehicle* create(const char* kind, ...);",
        "    void (Vehicle::*on_event)(int code);",
        "    std::unique_ptr<Engine> engine;",
        "    std::vector<Wheel*> wheels;",
        "    static int count;",
        "    double position[2][3];",
        "    int m_id = 0;",
        "    int slots[8];",
    ] {
        line_at(&text, expected);
    }
}

#[test]
fn test_sections_follow_canonical_order() {
    let text = synthesize(&module_of("Vehicle.h"), &SynthesisOptions::default()).unwrap();
    let start = line_at(&text, "class Vehicle : public IMovable {");
    let body: Vec<_> = lines_of(&text)[start..]
        .iter()
        .copied()
        .take_while(|l| *l != "};")
        .collect();
    let labels: Vec<_> = body.iter().copied().filter(|l| l.ends_with(':') && !l.starts_with(' ')).collect();
    assert_eq!(labels, vec!["public:", "protected:", "private:"]);

    let position = |needle: &str| {
        body.iter()
            .position(|l| l.trim_start().starts_with(needle))
            .unwrap_or_else(|| panic!("`{needle}` missing"))
    };
    // nested declarations, then special members, then operations
    assert!(position("typedef void (Vehicle::*Listener)") < position("Vehicle();"));
    assert!(position("virtual ~Vehicle();") < position("void move("));
    assert!(position("void move(") < position("void (Vehicle::*on_event)"));
}

#[test]
fn test_default_visibility_section_is_unlabelled() {
    let options = SynthesisOptions {
        doc_templates: false,
        ..SynthesisOptions::default()
    };
    let text = synthesize(&module_of("Packet.h"), &options).unwrap();
    let expected = "\
#ifndef _PACKET_H_
#define _PACKET_H_

#include <cstdint>

struct Packet {
    uint16_t length;
    unsigned char flags : 4;
    char payload[0];
};

#endif // _PACKET_H_
";
    assert_eq!(text, expected);
}

#[test]
fn test_legacy_c_style_declarations() {
    let options = SynthesisOptions {
        include_guard: false,
        doc_templates: false,
        ..SynthesisOptions::default()
    };
    let text = synthesize(&module_of("Legacy.h"), &options).unwrap();
    for expected in [
        "enum Color {",
        "typedef enum {",
        "} MyType;",
        "typedef struct {",
        "} Point;",
        "class MyClass : public MyBaseClass {",
        "    int m_value[10][10];",
        "    virtual void doSomething(int param[10]);",
        "    virtual int calculate() const = 0;",
        "    enum status {",
    ] {
        line_at(&text, expected);
    }
    assert!(!text.contains("m_data(0)"), "initializer lists are not part of the model");
    assert!(!text.contains("return m_data"), "inline bodies are not part of the model");
}

#[test]
fn test_namespace_change_reopens_outer_scope() {
    let options = SynthesisOptions {
        include_guard: false,
        doc_templates: false,
        ..SynthesisOptions::default()
    };
    let text = synthesize(&module_of("Geometry.h"), &options).unwrap();
    let opened = lines_of(&text).iter().filter(|l| **l == "namespace geo {").count();
    assert_eq!(opened, 2, "geo and geo::shapes each open the outer namespace:\n{text}");
    line_at(&text, "namespace shapes {");
    line_at(&text, "enum class Axis : unsigned char {");
    line_at(&text, "class Polygon final : public IShape {");
    line_at(&text, "} // namespace shapes");
}

#[test]
fn test_tab_indentation() {
    let options = SynthesisOptions {
        insert_spaces: false,
        include_guard: false,
        doc_templates: false,
        ..SynthesisOptions::default()
    };
    let text = synthesize(&module_of("LinkedNode.h"), &options).unwrap();
    assert_eq!(text, "struct Node {\n\tint value;\n\tNode* left;\n\tNode* right;\n};\n");
}

#[test]
fn test_synthesis_from_documents_matches_direct() {
    let module = module_of("Vehicle.h");
    let options = SynthesisOptions::default();
    let direct = synthesize(&module, &options).unwrap();

    let formats: [&dyn ModelFormat; 2] = [&Json, &Yaml];
    for format in formats {
        let bytes = format.write_module(&module).unwrap();
        let read = format.read_module(&bytes).unwrap();
        assert_eq!(synthesize(&read, &options).unwrap(), direct, "via {}", format.name());
    }
}
