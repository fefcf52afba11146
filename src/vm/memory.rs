//! The core: a fixed-size circular array of instructions.
//!
//! There is no out-of-range address. Every integer maps onto exactly one
//! cell by wrapping modulo the core size.

use crate::vm::Instruction;
use serde::{Deserialize, Serialize};

/// Default number of cells in the core.
pub const DEFAULT_CORE_SIZE: usize = 8000;

/// Shared circular memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Core {
    cells: Vec<Instruction>,
}

impl Core {
    /// Create a core of `size` cells, all holding `DAT #0, #0`.
    ///
    /// # Panics
    /// Panics if `size` is zero. The loader rejects a zero-sized core
    /// before it ever gets here.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "core size must be non-zero");
        Self {
            cells: vec![Instruction::dat(); size],
        }
    }

    /// Number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Map any integer onto `[0, size)`.
    #[inline]
    pub fn normalize(&self, addr: i64) -> usize {
        addr.rem_euclid(self.size() as i64) as usize
    }

    /// The address `delta` cells away from `base`, wrapped.
    #[inline]
    pub fn offset(&self, base: usize, delta: i64) -> usize {
        self.normalize((base as i64).wrapping_add(delta))
    }

    /// Read a cell. The address is wrapped.
    #[inline]
    pub fn read(&self, addr: usize) -> Instruction {
        self.cells[addr % self.size()]
    }

    /// Write a cell. The address is wrapped.
    #[inline]
    pub fn write(&mut self, addr: usize, value: Instruction) {
        let index = addr % self.size();
        self.cells[index] = value;
    }

    /// Mutable access to a cell. The address is wrapped.
    #[inline]
    pub fn cell_mut(&mut self, addr: usize) -> &mut Instruction {
        let index = addr % self.size();
        &mut self.cells[index]
    }

    /// All cells, in address order.
    pub fn cells(&self) -> &[Instruction] {
        &self.cells
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new(DEFAULT_CORE_SIZE)
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let occupied = self
            .cells
            .iter()
            .filter(|cell| **cell != Instruction::dat())
            .count();

        f.debug_struct("Core")
            .field("occupied_cells", &occupied)
            .field("total_cells", &self.size())
            .finish()
    }
}
