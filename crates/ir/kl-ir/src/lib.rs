//! Low-level, SSA-oriented intermediate representation
//!
//! The IR is a flat list of functions made of basic blocks. Every block ends
//! in exactly one [`Terminator`]; every value is defined once and must dominate
//! its uses. [`FunctionBuilder`] enforces the local rules while instructions
//! are emitted, [`verify_function`] and [`verify_module`] re-check the whole
//! structure after construction.

mod builder;
mod display;
mod error;
mod function;
mod instr;
mod module;
mod typeck;
mod types;
mod value;
mod verify;

pub use builder::FunctionBuilder;
pub use error::{IrError, VerifyError};
pub use function::{BasicBlock, Function, ValueData, ValueDef};
pub use instr::{InstKind, Instruction, Terminator};
pub use module::{Global, Module};
pub use types::{FunctionType, IrType, StructType, STRING_TYPE_NAME};
pub use value::{BlockId, Constant, FuncId, GlobalId, Operand, ValueId};
pub use verify::{verify_function, verify_module};
