//! Shared helpers for the unit tests

use crate::{Diagnostics, LowerError, LoweringContext, NameMangler};
use kl_intern::Interner;
use kl_ir::Module;
use kl_span::FileId;
use kl_syntax::Item;
use kl_syntax::make::AstFactory;
use kl_ty::TargetTypes;

/// Builds items with a fresh factory and lowers them as one source file
pub(crate) fn lower_items(
    build: impl FnOnce(&AstFactory<'_>) -> Vec<Item>,
) -> Result<(Module, Diagnostics), LowerError> {
    let interner = Interner::new();
    let factory = AstFactory::new(&interner, FileId(0));
    let file = factory.source_file("test.ts", build(&factory));
    let types = TargetTypes::new(&interner);
    let mut cx = LoweringContext::new("test", &types, &interner, NameMangler::default());
    cx.lower_source_file(&file)?;
    Ok(cx.finish())
}

/// Text of the function called `name`
pub(crate) fn function_text(module: &Module, name: &str) -> String {
    module
        .function_by_name(name)
        .and_then(|id| module.display_function(id))
        .unwrap_or_else(|| panic!("no function `{name}`"))
}
