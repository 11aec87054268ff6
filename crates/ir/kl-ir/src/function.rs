//! Functions, basic blocks and the per-function value table

use crate::instr::{InstKind, Instruction, Terminator};
use crate::types::{FunctionType, IrType};
use crate::value::{BlockId, Operand, ValueId};
use rustc_hash::FxHashSet;

/// Where a value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueDef {
    /// N-th function parameter
    Param(usize),
    /// Result of an instruction in the given block
    Inst(BlockId),
}

/// Entry of the value table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueData {
    /// Readable name, if one was assigned
    pub name: Option<String>,
    /// Type of the value
    pub ty: IrType,
    /// Defining site
    pub def: ValueDef,
}

/// Basic block in the control flow graph
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Label
    pub name: String,
    /// Straight-line instructions
    pub instructions: Vec<Instruction>,
    /// Terminator, `None` while the block is still open
    pub terminator: Option<Terminator>,
}

/// IR function: a declaration when it has no blocks
///
/// Every function is externally visible under its name.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Linkage name
    pub name: String,
    /// Signature
    pub ty: FunctionType,
    params: Vec<ValueId>,
    pub(crate) values: Vec<ValueData>,
    pub(crate) blocks: Vec<BasicBlock>,
}

impl Function {
    /// Creates a bodiless function with one value per parameter
    pub fn new(name: impl Into<String>, ty: FunctionType) -> Self {
        let values = ty
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| ValueData {
                name: None,
                ty: param.clone(),
                def: ValueDef::Param(index),
            })
            .collect::<Vec<_>>();
        let params = (0..values.len()).map(ValueId::from_index).collect();

        Self {
            name: name.into(),
            ty,
            params,
            values,
            blocks: Vec::new(),
        }
    }

    /// Parameter values in order
    pub fn params(&self) -> &[ValueId] {
        &self.params
    }

    /// Return type
    pub fn return_type(&self) -> &IrType {
        &self.ty.ret
    }

    /// Whether the function has no body
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Value table entry
    pub fn value(&self, id: ValueId) -> Option<&ValueData> {
        self.values.get(id.index())
    }

    /// All blocks; the first one is the entry block
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Block by id
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Block by label
    pub fn block_by_name(&self, name: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|block| block.name == name)
            .map(BlockId::from_index)
    }

    /// Entry block, if the function has a body
    pub fn entry_block(&self) -> Option<BlockId> {
        (!self.blocks.is_empty()).then_some(BlockId(0))
    }

    /// Every instruction in block order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }

    /// Type of an operand, `None` for a value outside the table
    pub fn operand_type(&self, operand: &Operand) -> Option<IrType> {
        match operand {
            Operand::Value(id) => self.value(*id).map(|value| value.ty.clone()),
            Operand::Constant(constant) => Some(constant.ty()),
            Operand::Function(_) => Some(IrType::Ptr),
        }
    }

    /// Type stored in the slot `ptr` points at, when `ptr` is an `alloca`
    pub fn allocated_type(&self, ptr: &Operand) -> Option<&IrType> {
        let id = ptr.as_value()?;
        self.instructions().find_map(|inst| match &inst.kind {
            InstKind::Alloca { ty } if inst.result == Some(id) => Some(ty),
            _ => None,
        })
    }

    /// Successor blocks of `block`
    pub fn successors(&self, block: BlockId) -> Vec<BlockId> {
        let Some(terminator) = self.block(block).and_then(|data| data.terminator.as_ref()) else {
            return Vec::new();
        };
        terminator.successors()
    }

    /// Blocks reachable from the entry block
    pub fn reachable_blocks(&self) -> FxHashSet<BlockId> {
        let mut reachable = FxHashSet::default();
        let Some(entry) = self.entry_block() else {
            return reachable;
        };
        let mut worklist = vec![entry];
        while let Some(block) = worklist.pop() {
            if self.block(block).is_none() || !reachable.insert(block) {
                continue;
            }
            worklist.extend(self.successors(block));
        }
        reachable
    }
}
