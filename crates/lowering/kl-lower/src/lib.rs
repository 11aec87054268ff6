//! AST → IR lowering
//!
//! This crate turns source syntax trees into an [`kl_ir::Module`]:
//! - **Scope table**: nested scopes mapping identifiers to bound values
//! - **Name mangling**: linkage names for declarations inside namespaces
//! - **Declarations**: functions (with or without a body) and namespaces
//! - **Statements**: blocks, `if`/`else`, returns and variable declarations
//! - **Expressions**: names, one-level qualified access, calls, `=`, `+`
//!   and literals
//!
//! Constructs outside the supported subset are never dropped silently. Item
//! and statement kinds are skipped with a warning in [`Diagnostics`];
//! expression kinds abort with [`LowerError::UnsupportedExpression`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let types = TargetTypes::new(&interner);
//! let mut cx = LoweringContext::new("main", &types, &interner, NameMangler::default());
//! cx.lower_source_file(&file)?;
//! let (module, diagnostics) = cx.finish();
//! ```

mod context;
mod decl;
pub mod diagnostics;
pub mod error;
mod expr;
pub mod mangle;
pub mod scope;
mod stmt;

pub use context::LoweringContext;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::LowerError;
pub use expr::ExprValue;
pub use mangle::{DEFAULT_SEPARATOR, NameMangler};
pub use scope::{BoundValue, ScopeData, ScopeId, ScopeTable, StackSlot};

#[cfg(test)]
mod test_utils;
