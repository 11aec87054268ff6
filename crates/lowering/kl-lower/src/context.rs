//! Lowering state shared by declarations, statements and expressions

use crate::decl::lower_item;
use crate::diagnostics::Diagnostics;
use crate::error::LowerError;
use crate::mangle::NameMangler;
use crate::scope::ScopeTable;
use kl_intern::{Interner, Symbol};
use kl_ir::Module;
use kl_syntax::SourceFile;
use kl_ty::TypeResolver;
use std::fmt;

/// Context for lowering source files into one IR module
///
/// The scope table lives as long as the context, so names declared by one
/// source file are visible to the files lowered after it.
pub struct LoweringContext<'src> {
    pub(crate) module: Module,
    pub(crate) scopes: ScopeTable,
    pub(crate) types: &'src dyn TypeResolver,
    pub(crate) interner: &'src Interner,
    pub(crate) mangler: NameMangler,
    pub(crate) diagnostics: Diagnostics,
}

impl<'src> LoweringContext<'src> {
    /// Creates a context lowering into an empty module called `module_name`
    pub fn new(
        module_name: &str,
        types: &'src dyn TypeResolver,
        interner: &'src Interner,
        mangler: NameMangler,
    ) -> Self {
        Self {
            module: Module::new(module_name),
            scopes: ScopeTable::new(),
            types,
            interner,
            mangler,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Lowers every top-level item of `file` into the global scope
    ///
    /// A function whose body fails to lower is removed again, so the module
    /// only ever holds complete functions and external declarations.
    ///
    /// # Errors
    /// The first fatal [`LowerError`]; items after it are not lowered.
    pub fn lower_source_file(&mut self, file: &SourceFile) -> Result<(), LowerError> {
        log::debug!("lowering `{}` ({} item(s))", file.name, file.items.len());
        let global = self.scopes.global();
        file.items
            .iter()
            .try_for_each(|item| lower_item(self, global, item))
    }

    /// Module built so far
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Scope table
    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    /// Warnings recorded so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hands back the module and the recorded warnings
    pub fn finish(self) -> (Module, Diagnostics) {
        (self.module, self.diagnostics)
    }

    pub(crate) fn name(&self, sym: Symbol) -> String {
        self.interner
            .try_resolve(&sym)
            .unwrap_or("<unknown>")
            .to_owned()
    }
}

impl fmt::Debug for LoweringContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoweringContext")
            .field("module", &self.module.name())
            .field("mangler", &self.mangler)
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}
