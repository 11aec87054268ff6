//! Instructions and block terminators

use crate::types::IrType;
use crate::value::{BlockId, FuncId, Operand, ValueId};

/// Non-terminating instruction kinds
#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// Reserve a stack slot; yields its address
    Alloca {
        /// Type stored in the slot
        ty: IrType,
    },
    /// Read a value of type `ty` from `ptr`
    Load {
        /// Loaded type
        ty: IrType,
        /// Address
        ptr: Operand,
    },
    /// Write `value` to `ptr`
    Store {
        /// Stored value
        value: Operand,
        /// Address
        ptr: Operand,
    },
    /// Floating-point addition
    FAdd {
        /// Left operand
        lhs: Operand,
        /// Right operand
        rhs: Operand,
    },
    /// Direct call
    Call {
        /// Called function
        callee: FuncId,
        /// Arguments in parameter order
        args: Vec<Operand>,
    },
}

impl InstKind {
    /// Operands read by the instruction
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Self::Alloca { .. } => Vec::new(),
            Self::Load { ptr, .. } => vec![ptr],
            Self::Store { value, ptr } => vec![value, ptr],
            Self::FAdd { lhs, rhs } => vec![lhs, rhs],
            Self::Call { args, .. } => args.iter().collect(),
        }
    }

    /// Mnemonic used by the printer
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Alloca { .. } => "alloca",
            Self::Load { .. } => "load",
            Self::Store { .. } => "store",
            Self::FAdd { .. } => "fadd",
            Self::Call { .. } => "call",
        }
    }
}

/// An instruction and the value it defines, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Defined value (`None` for stores and void calls)
    pub result: Option<ValueId>,
    /// What the instruction does
    pub kind: InstKind,
}

/// Block terminator (how control flow exits a block)
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Unconditional jump
    Br {
        /// Target block
        target: BlockId,
    },
    /// Two-way branch on an `i1`
    CondBr {
        /// Condition
        cond: Operand,
        /// Taken when the condition is true
        then_block: BlockId,
        /// Taken when the condition is false
        else_block: BlockId,
    },
    /// Return from the function
    Ret {
        /// Returned value, `None` for `ret void`
        value: Option<Operand>,
    },
    /// Control never reaches this point
    Unreachable,
}

impl Terminator {
    /// Blocks control may continue in
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Self::Br { target } => vec![*target],
            Self::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Self::Ret { .. } | Self::Unreachable => Vec::new(),
        }
    }

    /// Operands read by the terminator
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Self::CondBr { cond, .. } => vec![cond],
            Self::Ret { value: Some(value) } => vec![value],
            Self::Br { .. } | Self::Ret { value: None } | Self::Unreachable => Vec::new(),
        }
    }
}
