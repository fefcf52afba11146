//! Execution engine.
//!
//! Executes one process of one warrior: pop its program counter, run the
//! instruction found there, and queue zero, one or two successors.

use crate::vm::operand::{self, Operand};
use crate::vm::{Core, Instruction, Opcode, Warrior};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which operand of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// A disallowed addressing-mode combination.
///
/// Never fatal: the instruction does nothing and its process falls through
/// to the next cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{opcode} cannot take an immediate {slot}-operand")]
pub struct InvalidOperand {
    pub opcode: Opcode,
    pub slot: Slot,
}

/// Where control goes after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The process dies.
    Terminate,
    /// The process continues at this address.
    Continue(usize),
    /// The process continues at the first address and a new process
    /// starts at the second.
    Split(usize, usize),
}

/// Record of one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Address the instruction was fetched from.
    pub pc: usize,
    /// The instruction as it was fetched.
    pub instruction: Instruction,
    /// Successor program counters.
    pub flow: Flow,
    /// Set when the instruction was disallowed and skipped.
    pub fault: Option<InvalidOperand>,
}

/// Execute the front process of `warrior`.
///
/// Returns `None` when the warrior has no process left.
pub fn execute(core: &mut Core, warrior: &mut Warrior) -> Option<Step> {
    let pc = warrior.pop()?;
    let instruction = core.read(pc);
    let (flow, fault) = match run(core, pc, instruction) {
        Ok(flow) => (flow, None),
        Err(fault) => (Flow::Continue(core.offset(pc, 1)), Some(fault)),
    };

    match flow {
        Flow::Terminate => {}
        Flow::Continue(next) => warrior.push(next),
        Flow::Split(next, child) => {
            warrior.push(next);
            warrior.push(child);
        }
    }

    Some(Step { pc, instruction, flow, fault })
}

fn invalid(opcode: Opcode, slot: Slot) -> InvalidOperand {
    InvalidOperand { opcode, slot }
}

/// Resolve both operands, A first.
fn operands(core: &mut Core, pc: usize, instr: Instruction) -> (Operand, Operand) {
    let a = operand::resolve(core, pc, instr.a_mode, instr.a_field);
    let b = operand::resolve(core, pc, instr.b_mode, instr.b_field);
    (a, b)
}

/// The cell a B-operand writes to.
fn destination(opcode: Opcode, b: Operand) -> Result<usize, InvalidOperand> {
    b.address().ok_or(invalid(opcode, Slot::B))
}

/// The numeric value an operand contributes to a test: the raw field for
/// an immediate, otherwise the B-field of the addressed cell.
fn b_value(core: &Core, operand: Operand) -> i64 {
    match operand {
        Operand::Immediate(value) => value,
        Operand::Address(addr) => core.read(addr).b_field,
    }
}

fn run(core: &mut Core, pc: usize, instr: Instruction) -> Result<Flow, InvalidOperand> {
    let next = core.offset(pc, 1);
    let skip = core.offset(pc, 2);
    let op = instr.opcode;

    match op {
        Opcode::Dat => Ok(Flow::Terminate),

        // ==================== Data Movement ====================

        Opcode::Mov => {
            let (a, b) = operands(core, pc, instr);
            match (a, b) {
                (Operand::Address(src), Operand::Address(dst)) => {
                    let copied = core.read(src);
                    core.write(dst, copied);
                }
                // An immediate B names the executing cell itself.
                (_, b) => {
                    let dst = b.address().unwrap_or(pc);
                    core.cell_mut(dst).b_field = instr.a_field;
                }
            }
            Ok(Flow::Continue(next))
        }

        // ==================== Arithmetic ====================

        Opcode::Add | Opcode::Sub => {
            if instr.b_mode.is_immediate() {
                return Err(invalid(op, Slot::B));
            }
            let apply = |lhs: i64, rhs: i64| {
                if op == Opcode::Add {
                    lhs.wrapping_add(rhs)
                } else {
                    lhs.wrapping_sub(rhs)
                }
            };
            let (a, b) = operands(core, pc, instr);
            let dst = destination(op, b)?;
            match a {
                Operand::Immediate(value) => {
                    let cell = core.cell_mut(dst);
                    cell.b_field = apply(cell.b_field, value);
                }
                Operand::Address(src) => {
                    let source = core.read(src);
                    let cell = core.cell_mut(dst);
                    cell.a_field = apply(cell.a_field, source.a_field);
                    cell.b_field = apply(cell.b_field, source.b_field);
                }
            }
            Ok(Flow::Continue(next))
        }

        // ==================== Control Flow ====================

        Opcode::Jmp => {
            if instr.a_mode.is_immediate() {
                return Err(invalid(op, Slot::A));
            }
            let (a, _) = operands(core, pc, instr);
            Ok(a.address().map_or(Flow::Continue(next), Flow::Continue))
        }

        Opcode::Jmz | Opcode::Jmn => {
            if instr.a_mode.is_immediate() {
                return Err(invalid(op, Slot::A));
            }
            let (a, b) = operands(core, pc, instr);
            let is_zero = b_value(core, b) == 0;
            let taken = match op {
                Opcode::Jmz => is_zero,
                _ => !is_zero,
            };
            match a.address() {
                Some(target) if taken => Ok(Flow::Continue(target)),
                _ => Ok(Flow::Continue(next)),
            }
        }

        Opcode::Djn => {
            if instr.b_mode.is_immediate() {
                return Err(invalid(op, Slot::B));
            }
            let (a, b) = operands(core, pc, instr);
            let cell = core.cell_mut(destination(op, b)?);
            cell.b_field = cell.b_field.wrapping_sub(1);
            let counter = cell.b_field;
            // The target is the resolved A address, as JMP/JMZ/JMN use it.
            match a.address() {
                Some(target) if counter == 0 => Ok(Flow::Continue(target)),
                _ => Ok(Flow::Continue(next)),
            }
        }

        // ==================== Comparison ====================

        Opcode::Cmp => {
            let equal = match operands(core, pc, instr) {
                (Operand::Immediate(value), b) => value == b_value(core, b),
                (Operand::Address(src), Operand::Immediate(value)) => {
                    core.read(src).b_field == value
                }
                (Operand::Address(src), Operand::Address(dst)) => {
                    let (lhs, rhs) = (core.read(src), core.read(dst));
                    lhs.a_field == rhs.a_field && lhs.b_field == rhs.b_field
                }
            };
            Ok(Flow::Continue(if equal { skip } else { next }))
        }

        Opcode::Slt => {
            if instr.b_mode.is_immediate() {
                return Err(invalid(op, Slot::B));
            }
            let (a, b) = operands(core, pc, instr);
            let lhs = match a {
                Operand::Immediate(value) => value,
                Operand::Address(src) => core.read(src).a_field,
            };
            let less = lhs < b_value(core, b);
            Ok(Flow::Continue(if less { skip } else { next }))
        }

        // ==================== Processes ====================

        Opcode::Spl => {
            if instr.a_mode.is_immediate() {
                return Err(invalid(op, Slot::A));
            }
            let (a, _) = operands(core, pc, instr);
            Ok(a.address().map_or(Flow::Continue(next), |child| Flow::Split(next, child)))
        }
    }
}
