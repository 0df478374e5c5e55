//! Round trips over the header fixtures.

mod helpers;

use cppmodel::hir::{ExtractOptions, TypeLookup};
use cppmodel::interchange::{Json, ModelFormat, Yaml, compare_modules, round_trip};
use cppmodel::{SynthesisOptions, synthesize};
use helpers::{VALID_FIXTURES, module_of};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn options(include_guard: bool, doc_templates: bool) -> SynthesisOptions {
    SynthesisOptions {
        include_guard,
        doc_templates,
        ..SynthesisOptions::default()
    }
}

#[rstest]
#[case::defaults(options(true, true))]
#[case::bare(options(false, false))]
fn test_every_fixture_round_trips(#[case] synthesis: SynthesisOptions) {
    for name in VALID_FIXTURES {
        let module = module_of(name);
        let result = round_trip(&module, &TypeLookup::new(), &ExtractOptions::default(), &synthesis)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert!(
            result.mismatches.is_empty(),
            "{name}: {:#?}\n{}",
            result.mismatches,
            result.text
        );
        assert!(result.stable, "{name}: unstable synthesis\n{}", result.text);
        assert!(result.passed(), "{name}: {:#?}", result.diagnostics);
    }
}

#[rstest]
#[case::json(&Json)]
#[case::yaml(&Yaml)]
fn test_documents_preserve_the_model(#[case] format: &dyn ModelFormat) {
    for name in VALID_FIXTURES {
        let module = module_of(name);
        let bytes = format.write_module(&module).unwrap();
        let read = format.read_module(&bytes).unwrap();
        assert_eq!(read, module, "{name} via {}", format.name());
    }
}

#[test]
fn test_synthesized_text_extracts_to_same_model() {
    for name in VALID_FIXTURES {
        let module = module_of(name);
        let text = synthesize(&module, &SynthesisOptions::default()).unwrap();
        let again = cppmodel::extract(&text, &module.name, &TypeLookup::new(), &ExtractOptions::default());
        let found = again.module.unwrap_or_else(|| panic!("{name}: {:#?}", again.diagnostics));
        assert_eq!(compare_modules(&module, &found), vec![], "{name}");
    }
}

#[test]
fn test_relationships_survive_round_trip() {
    let module = module_of("Vehicle.h");
    let result = round_trip(
        &module,
        &TypeLookup::new(),
        &ExtractOptions::default(),
        &SynthesisOptions::default(),
    )
    .unwrap();
    let found = result.module.expect("module");
    let before = module.find_class("Vehicle").unwrap();
    let after = found.find_class("Vehicle").unwrap();
    assert_eq!(after.relationships, before.relationships);
    assert_eq!(after.bases, before.bases);
}
