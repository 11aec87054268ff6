//! Linkage names for declarations nested in namespaces

use crate::scope::{ScopeId, ScopeTable};
use kl_intern::Interner;

/// Separator placed between namespace names by default
pub const DEFAULT_SEPARATOR: &str = "__";

/// Builds external symbol names from a simple name and its enclosing namespaces
///
/// `f` in `M.N` becomes `M__N__f`; a global `f` stays `f`. The result depends
/// only on its inputs and is not checked for uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMangler {
    separator: String,
}

impl NameMangler {
    /// Mangler joining names with `separator`
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Linkage name of `name` declared in `scope`
    pub fn mangle(
        &self,
        name: &str,
        scope: ScopeId,
        scopes: &ScopeTable,
        interner: &Interner,
    ) -> String {
        let mut parts = scopes
            .namespace_path(scope)
            .iter()
            .map(|sym| interner.resolve(sym).to_owned())
            .collect::<Vec<_>>();
        parts.push(name.to_owned());
        parts.join(&self.separator)
    }
}

impl Default for NameMangler {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}
