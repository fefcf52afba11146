//! Instruction model for the core.
//!
//! Every memory cell holds one fully resolved [`Instruction`]: an opcode
//! plus two operands, each an addressing mode and a signed integer field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The eleven executable opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Opcode {
    /// Data. Executing it terminates the process.
    Dat,
    /// Copy A to B.
    Mov,
    /// Add A to B.
    Add,
    /// Subtract A from B.
    Sub,
    /// Unconditional jump to A.
    Jmp,
    /// Jump to A if B is zero.
    Jmz,
    /// Jump to A if B is non-zero.
    Jmn,
    /// Decrement B, then jump to A when it reaches zero.
    Djn,
    /// Skip the next instruction if A equals B.
    Cmp,
    /// Skip the next instruction if A is less than B.
    Slt,
    /// Split off a new process at A.
    Spl,
}

impl Opcode {
    /// All opcodes, in declaration order.
    pub const ALL: [Opcode; 11] = [
        Opcode::Dat,
        Opcode::Mov,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Jmp,
        Opcode::Jmz,
        Opcode::Jmn,
        Opcode::Djn,
        Opcode::Cmp,
        Opcode::Slt,
        Opcode::Spl,
    ];

    /// The assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Dat => "DAT",
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Jmp => "JMP",
            Opcode::Jmz => "JMZ",
            Opcode::Jmn => "JMN",
            Opcode::Djn => "DJN",
            Opcode::Cmp => "CMP",
            Opcode::Slt => "SLT",
            Opcode::Spl => "SPL",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// How an operand field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddrMode {
    /// Offset from the executing instruction (`$` or no sigil).
    #[default]
    Direct,
    /// Literal value (`#`).
    Immediate,
    /// One-level dereference through the target's B-field (`@`).
    Indirect,
    /// Like indirect, but decrements the target's B-field first (`<`).
    Autodecrement,
}

impl AddrMode {
    /// The Redcode sigil for this mode. Direct mode prints without one.
    pub fn sigil(self) -> &'static str {
        match self {
            AddrMode::Direct => "",
            AddrMode::Immediate => "#",
            AddrMode::Indirect => "@",
            AddrMode::Autodecrement => "<",
        }
    }

    /// Is this the immediate mode?
    #[inline]
    pub fn is_immediate(self) -> bool {
        self == AddrMode::Immediate
    }
}

impl fmt::Display for AddrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sigil())
    }
}

/// A resolved instruction, as stored in a core cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub a_mode: AddrMode,
    pub a_field: i64,
    pub b_mode: AddrMode,
    pub b_field: i64,
}

impl Instruction {
    /// Build an instruction from its parts.
    pub const fn new(
        opcode: Opcode,
        a_mode: AddrMode,
        a_field: i64,
        b_mode: AddrMode,
        b_field: i64,
    ) -> Self {
        Self { opcode, a_mode, a_field, b_mode, b_field }
    }

    /// The neutral cell content: `DAT #0, #0`.
    pub const fn dat() -> Self {
        Self::new(Opcode::Dat, AddrMode::Immediate, 0, AddrMode::Immediate, 0)
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::dat()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}, {}{}",
            self.opcode, self.a_mode, self.a_field, self.b_mode, self.b_field
        )
    }
}
