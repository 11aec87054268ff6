//! Instruction typing rules shared by the builder and the verifier

use crate::error::IrError;
use crate::function::Function;
use crate::instr::{InstKind, Terminator};
use crate::types::{FunctionType, IrType};
use crate::value::Operand;

/// Type of an operand inside `function`
pub fn operand_type(function: &Function, operand: &Operand) -> Result<IrType, IrError> {
    match operand {
        Operand::Value(id) => function
            .value(*id)
            .map(|value| value.ty.clone())
            .ok_or(IrError::UnknownValue(*id)),
        Operand::Constant(constant) => Ok(constant.ty()),
        Operand::Function(_) => Ok(IrType::Ptr),
    }
}

fn expect_type(
    function: &Function,
    operand: &Operand,
    expected: &IrType,
    context: &'static str,
) -> Result<(), IrError> {
    let found = operand_type(function, operand)?;
    if &found == expected {
        Ok(())
    } else {
        Err(IrError::TypeMismatch {
            context,
            expected: expected.clone(),
            found,
        })
    }
}

fn expect_sized(ty: &IrType, context: &'static str) -> Result<(), IrError> {
    if ty.is_sized() {
        Ok(())
    } else {
        Err(IrError::InvalidType {
            context,
            ty: ty.clone(),
        })
    }
}

/// Checks an instruction and returns the type of the value it defines
pub fn check_inst(
    function: &Function,
    kind: &InstKind,
    callee: Option<&FunctionType>,
) -> Result<Option<IrType>, IrError> {
    match kind {
        InstKind::Alloca { ty } => {
            expect_sized(ty, "alloca")?;
            Ok(Some(IrType::Ptr))
        }
        InstKind::Load { ty, ptr } => {
            expect_sized(ty, "load")?;
            expect_type(function, ptr, &IrType::Ptr, "load address")?;
            match function.allocated_type(ptr) {
                Some(slot) if slot != ty => Err(IrError::TypeMismatch {
                    context: "load",
                    expected: slot.clone(),
                    found: ty.clone(),
                }),
                _ => Ok(Some(ty.clone())),
            }
        }
        InstKind::Store { value, ptr } => {
            expect_type(function, ptr, &IrType::Ptr, "store address")?;
            let stored = operand_type(function, value)?;
            expect_sized(&stored, "store")?;
            match function.allocated_type(ptr) {
                Some(slot) if slot != &stored => Err(IrError::TypeMismatch {
                    context: "store",
                    expected: slot.clone(),
                    found: stored,
                }),
                _ => Ok(None),
            }
        }
        InstKind::FAdd { lhs, rhs } => {
            expect_type(function, lhs, &IrType::Double, "fadd")?;
            expect_type(function, rhs, &IrType::Double, "fadd")?;
            Ok(Some(IrType::Double))
        }
        InstKind::Call { callee: id, args } => {
            let signature = callee.ok_or(IrError::UnknownFunction(*id))?;
            if args.len() != signature.params.len() {
                return Err(IrError::ArgumentCount {
                    callee: *id,
                    expected: signature.params.len(),
                    found: args.len(),
                });
            }
            for (arg, param) in args.iter().zip(&signature.params) {
                expect_type(function, arg, param, "call argument")?;
            }
            Ok((!signature.ret.is_void()).then(|| (*signature.ret).clone()))
        }
    }
}

/// Checks a terminator against the function it ends a block of
pub fn check_terminator(
    function: &Function,
    terminator: &Terminator,
) -> Result<(), IrError> {
    for target in terminator.successors() {
        if function.block(target).is_none() {
            return Err(IrError::UnknownBlock(target));
        }
    }
    match terminator {
        Terminator::CondBr { cond, .. } => {
            expect_type(function, cond, &IrType::Bool, "branch condition")
        }
        Terminator::Ret { value } => {
            let ret = function.return_type();
            match value {
                None if ret.is_void() => Ok(()),
                None => Err(IrError::TypeMismatch {
                    context: "ret",
                    expected: ret.clone(),
                    found: IrType::Void,
                }),
                Some(value) => expect_type(function, value, ret, "ret"),
            }
        }
        Terminator::Br { .. } | Terminator::Unreachable => Ok(()),
    }
}
