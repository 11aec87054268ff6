//! Lowering driver
//!
//! Wires configuration, the type resolver and the lowering engine together
//! and verifies the whole module before handing it out.

mod config;

pub use config::{CONFIG_FILE_NAME, LowerConfig};

use kl_intern::Interner;
use kl_ir::{Module, verify_module};
use kl_lower::{Diagnostics, LowerError, LoweringContext};
use kl_syntax::SourceFile;
use kl_ty::{TargetTypes, TypeResolver};

/// A lowered module and the warnings produced along the way
#[derive(Debug)]
pub struct LoweredModule {
    /// The IR module
    pub module: Module,
    /// Non-fatal diagnostics
    pub diagnostics: Diagnostics,
}

/// Lowers `units` into one module using the primitive type mapping
///
/// # Errors
/// The first fatal [`LowerError`], including verification failures.
pub fn lower_program(
    units: &[SourceFile],
    interner: &Interner,
    config: &LowerConfig,
) -> Result<LoweredModule, LowerError> {
    let types = TargetTypes::new(interner);
    lower_program_with(units, interner, config, &types)
}

/// Lowers `units` with a caller-supplied type resolver
///
/// Units are lowered in order into one global scope; the first fatal error
/// aborts the run.
///
/// # Errors
/// The first fatal [`LowerError`], or [`LowerError::Verification`] when the
/// finished module is malformed.
pub fn lower_program_with(
    units: &[SourceFile],
    interner: &Interner,
    config: &LowerConfig,
    types: &dyn TypeResolver,
) -> Result<LoweredModule, LowerError> {
    let mut cx = LoweringContext::new(&config.module_name, types, interner, config.mangler());
    for unit in units {
        cx.lower_source_file(unit)?;
    }
    let (module, diagnostics) = cx.finish();

    verify_module(&module)?;
    log::debug!(
        "lowered {} unit(s) into `{}`: {} function(s), {} warning(s)",
        units.len(),
        module.name(),
        module.function_count(),
        diagnostics.len()
    );
    Ok(LoweredModule {
        module,
        diagnostics,
    })
}
