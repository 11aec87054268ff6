//! Error types for IR construction and verification

use crate::types::IrType;
use crate::value::{BlockId, FuncId, ValueId};

/// Errors raised while emitting IR
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    /// No block is selected for insertion
    #[error("no insertion point is set")]
    NoInsertionPoint,

    /// Emitting into a block that already ended
    #[error("block `{block}` already has a terminator")]
    BlockTerminated {
        /// Label of the terminated block
        block: String,
    },

    /// Block id outside the function
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    /// Value id outside the function's value table
    #[error("unknown value {0}")]
    UnknownValue(ValueId),

    /// Function id outside the module
    #[error("unknown function {0}")]
    UnknownFunction(FuncId),

    /// Operand type does not fit the instruction
    #[error("type mismatch in {context}: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        /// Instruction or position being checked
        context: &'static str,
        /// Required type
        expected: IrType,
        /// Actual type
        found: IrType,
    },

    /// Type cannot be used where a value is required
    #[error("{context} requires a sized, non-void type, found `{ty}`")]
    InvalidType {
        /// Instruction or position being checked
        context: &'static str,
        /// Offending type
        ty: IrType,
    },

    /// Call with the wrong number of arguments
    #[error("call to {callee} expects {expected} argument(s), found {found}")]
    ArgumentCount {
        /// Called function
        callee: FuncId,
        /// Parameter count
        expected: usize,
        /// Argument count
        found: usize,
    },

    /// Two module symbols with one name
    #[error("symbol `{0}` is already defined in the module")]
    DuplicateSymbol(String),

    /// Installing a second body into a function
    #[error("function `{0}` already has a body")]
    AlreadyDefined(String),

    /// Installing a body whose name or signature differs from the declaration
    #[error("body for `{found}` does not match the declaration of `{declared}`")]
    DeclarationMismatch {
        /// Declared name
        declared: String,
        /// Name carried by the body
        found: String,
    },
}

/// Structural well-formedness violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Block without a terminator
    #[error("function `{function}`: block `{block}` has no terminator")]
    MissingTerminator {
        /// Function name
        function: String,
        /// Block label
        block: String,
    },

    /// Branch to a block that does not exist
    #[error("function `{function}`: branch to unknown block {target}")]
    UnknownBlock {
        /// Function name
        function: String,
        /// Missing target
        target: BlockId,
    },

    /// Use of a value that no instruction or parameter defines
    #[error("function `{function}`: use of undefined value {value}")]
    UndefinedValue {
        /// Function name
        function: String,
        /// Offending value
        value: ValueId,
    },

    /// Value defined by more than one instruction
    #[error("function `{function}`: value {value} is defined more than once")]
    Redefined {
        /// Function name
        function: String,
        /// Offending value
        value: ValueId,
    },

    /// Use not dominated by its definition
    #[error("function `{function}`: value {value} does not dominate its use in block `{block}`")]
    NotDominated {
        /// Function name
        function: String,
        /// Used value
        value: ValueId,
        /// Block containing the use
        block: String,
    },

    /// Ill-typed instruction or terminator
    #[error("function `{function}`, block `{block}`: {error}")]
    Instruction {
        /// Function name
        function: String,
        /// Block label
        block: String,
        /// What is wrong
        #[source]
        error: IrError,
    },

    /// Two functions share a name
    #[error("duplicate function `{0}`")]
    DuplicateFunction(String),
}
