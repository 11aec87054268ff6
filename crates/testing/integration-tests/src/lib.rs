//! Integration test utilities for the lowering pipeline

use kl_driver::{LowerConfig, LoweredModule, lower_program};
use kl_intern::Interner;
use kl_ir::{Function, InstKind, Module};
use kl_lower::LowerError;
use kl_span::FileId;
use kl_syntax::make::AstFactory;
use kl_syntax::{Item, SourceFile};

/// Test fixture: source units built in memory plus the lowering configuration
#[derive(Debug, Default)]
pub struct TestFixture {
    /// Interner shared by all units
    pub interner: Interner,
    /// Units in lowering order
    pub files: Vec<SourceFile>,
    /// Configuration passed to the driver
    pub config: LowerConfig,
}

impl TestFixture {
    /// Creates an empty fixture with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit whose items are produced by `build`
    pub fn add_file(
        &mut self,
        name: &str,
        build: impl FnOnce(&AstFactory<'_>) -> Vec<Item>,
    ) {
        let file = FileId(u32::try_from(self.files.len()).unwrap_or(u32::MAX));
        let factory = AstFactory::new(&self.interner, file);
        let unit = factory.source_file(name, build(&factory));
        self.files.push(unit);
    }

    /// Runs the driver over every unit
    ///
    /// # Errors
    ///
    /// Returns the first fatal lowering error
    pub fn lower(&self) -> Result<LoweredModule, LowerError> {
        lower_program(&self.files, &self.interner, &self.config)
    }
}

/// Lowers a single unit with the default configuration
///
/// # Errors
///
/// Returns the first fatal lowering error
pub fn lower_one(
    build: impl FnOnce(&AstFactory<'_>) -> Vec<Item>,
) -> Result<LoweredModule, LowerError> {
    let mut fixture = TestFixture::new();
    fixture.add_file("main.ts", build);
    fixture.lower()
}

/// The function called `name`, if the module has one
#[must_use]
pub fn function<'ir>(module: &'ir Module, name: &str) -> Option<&'ir Function> {
    module
        .function_by_name(name)
        .and_then(|id| module.function(id))
}

/// Number of instructions with the given opcode in `function`
#[must_use]
pub fn count_opcode(function: &Function, opcode: &str) -> usize {
    function
        .instructions()
        .filter(|inst| inst.kind.opcode() == opcode)
        .count()
}

/// Whether every load in `function` reads a stack slot
#[must_use]
pub fn loads_only_from_slots(function: &Function) -> bool {
    function.instructions().all(|inst| match &inst.kind {
        InstKind::Load { ptr, .. } => function.allocated_type(ptr).is_some(),
        _ => true,
    })
}
