//! Instruction builder for one function body

use crate::error::IrError;
use crate::function::{BasicBlock, Function, ValueData, ValueDef};
use crate::instr::{InstKind, Instruction, Terminator};
use crate::typeck;
use crate::types::{FunctionType, IrType};
use crate::value::{BlockId, FuncId, Operand, ValueId};
use rustc_hash::FxHashSet;

/// Appends blocks and instructions to a [`Function`]
///
/// Every emission is type checked against the function's value table, and
/// nothing can be appended after a block's terminator.
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    current_block: Option<BlockId>,
    block_names: FxHashSet<String>,
    value_names: FxHashSet<String>,
}

impl FunctionBuilder {
    /// Starts building a body for `function`
    #[must_use]
    pub fn new(function: Function) -> Self {
        let block_names = function.blocks.iter().map(|block| block.name.clone()).collect();
        let value_names = function
            .values
            .iter()
            .filter_map(|value| value.name.clone())
            .collect();
        Self {
            function,
            current_block: None,
            block_names,
            value_names,
        }
    }

    /// Function under construction
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Declared return type
    pub fn return_type(&self) -> &IrType {
        self.function.return_type()
    }

    /// Value of the `index`-th parameter
    pub fn param(&self, index: usize) -> Option<ValueId> {
        self.function.params().get(index).copied()
    }

    /// Appends an empty block; the label is made unique with a numeric suffix
    pub fn append_block(&mut self, name: &str) -> BlockId {
        let name = unique_name(&mut self.block_names, name);
        let id = BlockId::from_index(self.function.blocks.len());
        self.function.blocks.push(BasicBlock {
            name,
            instructions: Vec::new(),
            terminator: None,
        });
        id
    }

    /// Moves the cursor to the end of `block`
    ///
    /// # Errors
    /// [`IrError::UnknownBlock`] when `block` is not part of the function.
    pub fn position_at_end(&mut self, block: BlockId) -> Result<(), IrError> {
        if self.function.block(block).is_none() {
            return Err(IrError::UnknownBlock(block));
        }
        self.current_block = Some(block);
        Ok(())
    }

    /// Block the cursor is in
    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    /// First block of the body
    pub fn entry_block(&self) -> Option<BlockId> {
        self.function.entry_block()
    }

    /// Whether `block` already ends in a terminator
    pub fn has_terminator(&self, block: BlockId) -> bool {
        self.function
            .block(block)
            .is_some_and(|data| data.terminator.is_some())
    }

    /// Whether the current block is closed (or there is no current block)
    pub fn is_terminated(&self) -> bool {
        self.current_block
            .is_none_or(|block| self.has_terminator(block))
    }

    /// Type of an operand
    ///
    /// # Errors
    /// [`IrError::UnknownValue`] for a value outside the function.
    pub fn value_type(&self, operand: &Operand) -> Result<IrType, IrError> {
        typeck::operand_type(&self.function, operand)
    }

    /// Names an unnamed value; returns `false` if it already had a name
    ///
    /// # Errors
    /// [`IrError::UnknownValue`] for a value outside the function.
    pub fn set_value_name(&mut self, value: ValueId, name: &str) -> Result<bool, IrError> {
        let data = self
            .function
            .values
            .get_mut(value.index())
            .ok_or(IrError::UnknownValue(value))?;
        if data.name.is_some() {
            return Ok(false);
        }
        data.name = Some(unique_name(&mut self.value_names, name));
        Ok(true)
    }

    /// Reserves a stack slot at the top of the entry block
    ///
    /// The slot is placed after any slots already there, so it dominates
    /// every use regardless of where the cursor currently is.
    ///
    /// # Errors
    /// Fails without an entry block or when `ty` cannot live in a slot.
    pub fn build_entry_alloca(&mut self, ty: IrType, name: &str) -> Result<ValueId, IrError> {
        let entry = self.entry_block().ok_or(IrError::NoInsertionPoint)?;
        let kind = InstKind::Alloca { ty };
        typeck::check_inst(&self.function, &kind, None)?;

        let value = self.new_value(IrType::Ptr, entry);
        self.set_value_name(value, name)?;
        let block = &mut self.function.blocks[entry.index()];
        let position = block
            .instructions
            .iter()
            .take_while(|inst| matches!(inst.kind, InstKind::Alloca { .. }))
            .count();
        block.instructions.insert(
            position,
            Instruction {
                result: Some(value),
                kind,
            },
        );
        Ok(value)
    }

    /// `load ty, ptr`
    ///
    /// # Errors
    /// Fails when the current block is closed or `ptr` is not a `ty` slot.
    pub fn build_load(&mut self, ty: IrType, ptr: impl Into<Operand>) -> Result<ValueId, IrError> {
        let kind = InstKind::Load {
            ty,
            ptr: ptr.into(),
        };
        self.emit_value(kind, None)
    }

    /// `store value, ptr`
    ///
    /// # Errors
    /// Fails when the current block is closed or the slot type differs.
    pub fn build_store(
        &mut self,
        value: impl Into<Operand>,
        ptr: impl Into<Operand>,
    ) -> Result<(), IrError> {
        let kind = InstKind::Store {
            value: value.into(),
            ptr: ptr.into(),
        };
        self.emit(kind, None).map(|_| ())
    }

    /// `fadd double lhs, rhs`
    ///
    /// # Errors
    /// Fails when the current block is closed or an operand is not `double`.
    pub fn build_fadd(
        &mut self,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Result<ValueId, IrError> {
        let kind = InstKind::FAdd {
            lhs: lhs.into(),
            rhs: rhs.into(),
        };
        self.emit_value(kind, None)
    }

    /// Direct call; `None` when the callee returns `void`
    ///
    /// # Errors
    /// Fails on a closed block, a wrong argument count or an argument type
    /// that differs from `signature`.
    pub fn build_call(
        &mut self,
        callee: FuncId,
        signature: &FunctionType,
        args: Vec<Operand>,
    ) -> Result<Option<ValueId>, IrError> {
        self.emit(InstKind::Call { callee, args }, Some(signature))
    }

    /// Unconditional branch
    ///
    /// # Errors
    /// Fails when the current block is closed or `target` does not exist.
    pub fn build_br(&mut self, target: BlockId) -> Result<(), IrError> {
        self.terminate(Terminator::Br { target })
    }

    /// Two-way branch on an `i1`
    ///
    /// # Errors
    /// Fails on a closed block, an unknown target or a non-`i1` condition.
    pub fn build_cond_br(
        &mut self,
        cond: impl Into<Operand>,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), IrError> {
        self.terminate(Terminator::CondBr {
            cond: cond.into(),
            then_block,
            else_block,
        })
    }

    /// `ret` with an optional value
    ///
    /// # Errors
    /// Fails when the current block is closed or `value` does not match the
    /// return type.
    pub fn build_return(&mut self, value: Option<Operand>) -> Result<(), IrError> {
        self.terminate(Terminator::Ret { value })
    }

    /// `unreachable`
    ///
    /// # Errors
    /// [`IrError::NoInsertionPoint`] or [`IrError::BlockTerminated`].
    pub fn build_unreachable(&mut self) -> Result<(), IrError> {
        self.terminate(Terminator::Unreachable)
    }

    /// Finishes construction and hands back the function
    #[must_use]
    pub fn finish(self) -> Function {
        self.function
    }

    fn open_block(&self) -> Result<BlockId, IrError> {
        let block = self.current_block.ok_or(IrError::NoInsertionPoint)?;
        let data = self
            .function
            .block(block)
            .ok_or(IrError::UnknownBlock(block))?;
        if data.terminator.is_some() {
            return Err(IrError::BlockTerminated {
                block: data.name.clone(),
            });
        }
        Ok(block)
    }

    fn new_value(&mut self, ty: IrType, block: BlockId) -> ValueId {
        let id = ValueId::from_index(self.function.values.len());
        self.function.values.push(ValueData {
            name: None,
            ty,
            def: ValueDef::Inst(block),
        });
        id
    }

    fn emit(
        &mut self,
        kind: InstKind,
        callee: Option<&FunctionType>,
    ) -> Result<Option<ValueId>, IrError> {
        let block = self.open_block()?;
        let result = typeck::check_inst(&self.function, &kind, callee)?
            .map(|ty| self.new_value(ty, block));
        self.function.blocks[block.index()]
            .instructions
            .push(Instruction { result, kind });
        Ok(result)
    }

    fn emit_value(
        &mut self,
        kind: InstKind,
        callee: Option<&FunctionType>,
    ) -> Result<ValueId, IrError> {
        let opcode = kind.opcode();
        self.emit(kind, callee)?.ok_or(IrError::InvalidType {
            context: opcode,
            ty: IrType::Void,
        })
    }

    fn terminate(&mut self, terminator: Terminator) -> Result<(), IrError> {
        let block = self.open_block()?;
        typeck::check_terminator(&self.function, &terminator)?;
        self.function.blocks[block.index()].terminator = Some(terminator);
        Ok(())
    }
}

fn unique_name(used: &mut FxHashSet<String>, base: &str) -> String {
    let mut candidate = base.to_owned();
    let mut suffix = 1;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}.{suffix}");
        suffix += 1;
    }
    candidate
}
