//! Operand evaluation.
//!
//! Turns an addressing mode plus a resolved field into either an immediate
//! value or an absolute core address. Indirection is single-level and always
//! goes through the B-field of the intermediate cell, whichever operand is
//! being resolved.

use crate::vm::{AddrMode, Core};

/// A resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The raw field of an immediate operand.
    Immediate(i64),
    /// An absolute address in `[0, core size)`.
    Address(usize),
}

impl Operand {
    /// The address, or `None` for an immediate operand.
    pub fn address(self) -> Option<usize> {
        match self {
            Operand::Address(addr) => Some(addr),
            Operand::Immediate(_) => None,
        }
    }
}

/// Resolve one operand of the instruction at `pc`.
///
/// Autodecrement mutates the intermediate cell's B-field before it is read.
pub fn resolve(core: &mut Core, pc: usize, mode: AddrMode, field: i64) -> Operand {
    match mode {
        AddrMode::Immediate => Operand::Immediate(field),
        AddrMode::Direct => Operand::Address(core.offset(pc, field)),
        AddrMode::Indirect => {
            let pointer = core.offset(pc, field);
            let step = core.read(pointer).b_field;
            Operand::Address(core.offset(pointer, step))
        }
        AddrMode::Autodecrement => {
            let pointer = core.offset(pc, field);
            let cell = core.cell_mut(pointer);
            cell.b_field = cell.b_field.wrapping_sub(1);
            let step = cell.b_field;
            Operand::Address(core.offset(pointer, step))
        }
    }
}
