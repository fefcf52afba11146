//! The Redcode virtual machine.
//!
//! - a circular core of resolved instructions
//! - four addressing modes with single-level indirection
//! - an eleven-opcode instruction set
//! - a round-robin scheduler over per-warrior FIFO process queues

pub mod memory;
pub mod instruction;
pub mod operand;
pub mod warrior;
pub mod execute;
pub mod mars;

pub use memory::{Core, DEFAULT_CORE_SIZE};
pub use instruction::{AddrMode, Instruction, Opcode};
pub use operand::Operand;
pub use warrior::Warrior;
pub use execute::{InvalidOperand, Slot, Step};
pub use mars::{Diagnostic, Event, Mars, Outcome, Snapshot, WarriorState};
