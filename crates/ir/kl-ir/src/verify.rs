//! Structural verification of finished functions and modules

use crate::error::{IrError, VerifyError};
use crate::function::Function;
use crate::instr::InstKind;
use crate::module::Module;
use crate::typeck;
use crate::value::{BlockId, Operand, ValueId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::iter;

/// Maps each value to its defining (block, position); `None` for parameters
type DefinitionSites = FxHashMap<ValueId, Option<(BlockId, usize)>>;

/// Checks one function against the rules the builder enforces locally plus
/// the global ones: every block terminated and every use dominated by its
/// definition
///
/// # Errors
/// The first [`VerifyError`] found, in block order.
pub fn verify_function(function: &Function, module: &Module) -> Result<(), VerifyError> {
    if function.is_declaration() {
        return Ok(());
    }
    check_terminators(function)?;
    check_typing(function, module)?;
    check_dominance(function)
}

/// Verifies every function and checks that function names are unique
///
/// # Errors
/// [`VerifyError::DuplicateFunction`], or the first error of
/// [`verify_function`].
pub fn verify_module(module: &Module) -> Result<(), VerifyError> {
    let mut seen = FxHashSet::default();
    for (_, function) in module.functions() {
        if !seen.insert(function.name.as_str()) {
            return Err(VerifyError::DuplicateFunction(function.name.clone()));
        }
    }
    module
        .functions()
        .try_for_each(|(_, function)| verify_function(function, module))
}

fn check_terminators(function: &Function) -> Result<(), VerifyError> {
    for block in function.blocks() {
        let Some(terminator) = &block.terminator else {
            return Err(VerifyError::MissingTerminator {
                function: function.name.clone(),
                block: block.name.clone(),
            });
        };
        if let Some(target) = terminator
            .successors()
            .into_iter()
            .find(|target| function.block(*target).is_none())
        {
            return Err(VerifyError::UnknownBlock {
                function: function.name.clone(),
                target,
            });
        }
    }
    Ok(())
}

fn check_typing(function: &Function, module: &Module) -> Result<(), VerifyError> {
    for block in function.blocks() {
        let wrap = |error: IrError| VerifyError::Instruction {
            function: function.name.clone(),
            block: block.name.clone(),
            error,
        };
        for inst in &block.instructions {
            let signature = match &inst.kind {
                InstKind::Call { callee, .. } => {
                    module.function(*callee).map(|declared| &declared.ty)
                }
                _ => None,
            };
            typeck::check_inst(function, &inst.kind, signature).map_err(wrap)?;
        }
        if let Some(terminator) = &block.terminator {
            typeck::check_terminator(function, terminator).map_err(wrap)?;
        }
    }
    Ok(())
}

fn check_dominance(function: &Function) -> Result<(), VerifyError> {
    let definitions = definition_sites(function)?;
    let reachable = function.reachable_blocks();
    let dominators = dominators(function, &reachable);

    for (index, block) in function.blocks().iter().enumerate() {
        let block_id = BlockId::from_index(index);
        let uses = block
            .instructions
            .iter()
            .enumerate()
            .flat_map(|(position, inst)| {
                inst.kind.operands().into_iter().map(move |op| (position, op))
            })
            .chain(
                block
                    .terminator
                    .iter()
                    .flat_map(|term| term.operands())
                    .map(|op| (block.instructions.len(), op)),
            );

        for (position, operand) in uses {
            let Operand::Value(value) = operand else {
                continue;
            };
            let Some(&site) = definitions.get(value) else {
                return Err(VerifyError::UndefinedValue {
                    function: function.name.clone(),
                    value: *value,
                });
            };
            // Parameters dominate everything; unreachable code is never executed
            let Some((def_block, def_position)) = site else {
                continue;
            };
            if !reachable.contains(&block_id) {
                continue;
            }
            let dominated = if def_block == block_id {
                def_position < position
            } else {
                dominators
                    .get(&block_id)
                    .is_some_and(|doms| doms.contains(&def_block))
            };
            if !dominated {
                return Err(VerifyError::NotDominated {
                    function: function.name.clone(),
                    value: *value,
                    block: block.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn definition_sites(function: &Function) -> Result<DefinitionSites, VerifyError> {
    let mut sites: DefinitionSites = function
        .params()
        .iter()
        .map(|param| (*param, None))
        .collect();

    for (index, block) in function.blocks().iter().enumerate() {
        for (position, inst) in block.instructions.iter().enumerate() {
            let Some(result) = inst.result else {
                continue;
            };
            if function.value(result).is_none() {
                return Err(VerifyError::UndefinedValue {
                    function: function.name.clone(),
                    value: result,
                });
            }
            if sites
                .insert(result, Some((BlockId::from_index(index), position)))
                .is_some()
            {
                return Err(VerifyError::Redefined {
                    function: function.name.clone(),
                    value: result,
                });
            }
        }
    }
    Ok(sites)
}

/// Iterative dominator sets over the reachable blocks
fn dominators(
    function: &Function,
    reachable: &FxHashSet<BlockId>,
) -> FxHashMap<BlockId, FxHashSet<BlockId>> {
    let Some(entry) = function.entry_block() else {
        return FxHashMap::default();
    };
    let mut blocks: Vec<BlockId> = reachable.iter().copied().collect();
    blocks.sort();

    let mut predecessors: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
    for &block in &blocks {
        for successor in function.successors(block) {
            predecessors.entry(successor).or_default().push(block);
        }
    }

    let all: FxHashSet<BlockId> = blocks.iter().copied().collect();
    let mut doms: FxHashMap<BlockId, FxHashSet<BlockId>> = blocks
        .iter()
        .map(|&block| {
            let initial: FxHashSet<BlockId> = if block == entry {
                iter::once(entry).collect()
            } else {
                all.clone()
            };
            (block, initial)
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for &block in blocks.iter().filter(|&&block| block != entry) {
            let mut next: Option<FxHashSet<BlockId>> = None;
            for pred in predecessors.get(&block).into_iter().flatten() {
                let Some(pred_doms) = doms.get(pred) else {
                    continue;
                };
                next = Some(next.map_or_else(
                    || pred_doms.clone(),
                    |acc| acc.intersection(pred_doms).copied().collect(),
                ));
            }
            let mut next = next.unwrap_or_default();
            next.insert(block);
            if doms.get(&block) != Some(&next) {
                doms.insert(block, next);
                changed = true;
            }
        }
    }
    doms
}
