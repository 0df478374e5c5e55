
use crate::hir::{ExtractOptions, TypeLookup, extract};
use crate::model::Module;

/// Extract `text` as module `name`, failing the test on any error.
fn module_from(text: &str, name: &str) -> Module {
    let extraction = extract(text, name, &TypeLookup::new(), &ExtractOptions::default());
    assert!(
        !extraction.has_errors(),
        "unexpected errors: {:?}",
        extraction.diagnostics
    );
    extraction.module.expect("module")
}
