//! Loader and linker.
//!
//! Places every program into a fresh core without overlap, resolves labels
//! and `EQU` constants, and gives each warrior its single starting process.
//!
//! Linking is two-pass per program: the first pass assigns addresses to
//! labels and collects constants, the second evaluates operand fields. A
//! field may therefore name a label defined further down the program.

use crate::asm::program::{Expr, Mnemonic, Program, Statement};
use crate::asm::symbols::{SymbolError, SymbolTable};
use crate::config::MatchConfig;
use crate::vm::{Core, Instruction, Opcode, Warrior};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};

/// A populated core and the warriors that will run in it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub core: Core,
    pub warriors: Vec<Warrior>,
}

/// Load `programs` (one per warrior, in warrior order) per `config`.
pub fn load(programs: &[Program], config: &MatchConfig) -> Result<Loaded, LoadError> {
    if programs.is_empty() {
        return Err(PlacementError::NoPrograms.into());
    }
    if config.core_size == 0 {
        return Err(PlacementError::EmptyCore.into());
    }

    let lengths = programs
        .iter()
        .enumerate()
        .map(|(warrior, program)| match footprint(program) {
            0 => Err(LoadError::EmptyProgram { warrior }),
            cells => Ok(cells),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let positions = place(&lengths, config)?;
    let mut core = Core::new(config.core_size);
    let mut warriors = Vec::with_capacity(programs.len());

    for (id, (program, &origin)) in programs.iter().zip(&positions).enumerate() {
        let start = link(&mut core, id, program, origin)?;
        info!(warrior = id, origin, start, cells = lengths[id], "loaded warrior");
        warriors.push(Warrior::new(id, start));
    }

    Ok(Loaded { core, warriors })
}

/// Number of cells a program occupies: real instructions before any `END`.
pub fn footprint(program: &[Statement]) -> usize {
    program
        .iter()
        .take_while(|stmt| stmt.opcode != Mnemonic::End)
        .filter(|stmt| stmt.occupies_cell())
        .count()
}

/// Choose a load address for each program.
///
/// Explicit positions are wrapped and checked for overlap. Otherwise
/// programs are laid end to end from a base offset, separated by an equal
/// share of the free cells.
pub fn place(lengths: &[usize], config: &MatchConfig) -> Result<Vec<usize>, PlacementError> {
    let size = config.core_size;
    if size == 0 {
        return Err(PlacementError::EmptyCore);
    }
    if lengths.is_empty() {
        return Err(PlacementError::NoPrograms);
    }

    let needed: usize = lengths.iter().sum();
    if needed > size {
        return Err(PlacementError::TooLarge { needed, available: size });
    }

    if let Some(explicit) = &config.start_positions {
        if explicit.len() != lengths.len() {
            return Err(PlacementError::PositionCount {
                expected: lengths.len(),
                actual: explicit.len(),
            });
        }
        let positions: Vec<usize> = explicit.iter().map(|p| p % size).collect();
        check_overlap(&positions, lengths, size)?;
        return Ok(positions);
    }

    let gap = (size - needed) / lengths.len();
    let base = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed).gen_range(0..size),
        None => config.base_offset % size,
    };

    let mut cursor = base;
    let positions = lengths
        .iter()
        .map(|&len| {
            let origin = cursor % size;
            cursor = origin + len + gap;
            origin
        })
        .collect();
    Ok(positions)
}

fn check_overlap(positions: &[usize], lengths: &[usize], size: usize) -> Result<(), PlacementError> {
    for first in 0..positions.len() {
        for second in first + 1..positions.len() {
            let ahead = (positions[second] + size - positions[first]) % size;
            let behind = (positions[first] + size - positions[second]) % size;
            if ahead < lengths[first] || behind < lengths[second] {
                return Err(PlacementError::Overlap { first, second });
            }
        }
    }
    Ok(())
}

/// An instruction waiting for its fields to be evaluated.
struct Pending<'a> {
    index: usize,
    addr: usize,
    opcode: Opcode,
    stmt: &'a Statement,
}

/// Link one program into `core` at `origin`. Returns its start address.
fn link(core: &mut Core, warrior: usize, program: &[Statement], origin: usize) -> Result<usize, LoadError> {
    let err = |index: usize| move |e: SymbolError| LoadError::from_symbol(warrior, index, e);

    let mut symbols = SymbolTable::new();
    let mut pending = Vec::new();
    let mut constants = Vec::new();
    let mut entry = None;
    let mut addr = origin;

    // Pass 1: addresses and constants
    for (index, stmt) in program.iter().enumerate() {
        match stmt.opcode.opcode() {
            Some(opcode) => {
                if let Some(label) = &stmt.label {
                    symbols.define_label(label, addr).map_err(err(index))?;
                }
                pending.push(Pending { index, addr, opcode, stmt });
                addr = core.offset(addr, 1);
            }
            None if stmt.opcode == Mnemonic::Equ => {
                let name = stmt
                    .label
                    .as_deref()
                    .ok_or(LoadError::UnlabeledConstant { warrior, index })?;
                constants.push((index, name, &stmt.a_field, addr));
            }
            None => {
                if let Expr::Symbol(name) = &stmt.a_field {
                    entry = Some(name.as_str());
                }
                break;
            }
        }
    }

    for (index, name, expr, at) in constants {
        let value = symbols.evaluate(expr, at).map_err(err(index))?;
        symbols.define_constant(name, value).map_err(err(index))?;
    }

    // Pass 2: operand fields
    for Pending { index, addr, opcode, stmt } in pending {
        let a_field = symbols.evaluate(&stmt.a_field, addr).map_err(err(index))?;
        let b_field = symbols.evaluate(&stmt.b_field, addr).map_err(err(index))?;
        core.write(addr, Instruction::new(opcode, stmt.a_mode, a_field, stmt.b_mode, b_field));
    }

    let start = match entry {
        Some(name) => symbols.label(name).unwrap_or_else(|| {
            warn!(warrior, label = name, "END names an unknown label; starting at first cell");
            origin
        }),
        None => origin,
    };
    Ok(start)
}

/// Errors that prevent a program set from being placed in the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("core size must be non-zero")]
    EmptyCore,

    #[error("no programs to load")]
    NoPrograms,

    #[error("programs need {needed} cells but the core has {available}")]
    TooLarge { needed: usize, available: usize },

    #[error("expected {expected} start positions, got {actual}")]
    PositionCount { expected: usize, actual: usize },

    #[error("warriors {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
}

/// Errors that abort loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("placement failed: {0}")]
    Placement(#[from] PlacementError),

    #[error("warrior {warrior}, statement {index}: unresolved symbol `{name}`")]
    UnresolvedSymbol { warrior: usize, index: usize, name: String },

    #[error("warrior {warrior}, statement {index}: division by zero")]
    Division { warrior: usize, index: usize },

    #[error("warrior {warrior}, statement {index}: symbol `{name}` defined twice")]
    DuplicateSymbol { warrior: usize, index: usize, name: String },

    #[error("warrior {warrior}, statement {index}: EQU without a label")]
    UnlabeledConstant { warrior: usize, index: usize },

    #[error("warrior {warrior} has no instructions")]
    EmptyProgram { warrior: usize },
}

impl LoadError {
    fn from_symbol(warrior: usize, index: usize, err: SymbolError) -> Self {
        match err {
            SymbolError::Unresolved(name) => LoadError::UnresolvedSymbol { warrior, index, name },
            SymbolError::DivisionByZero => LoadError::Division { warrior, index },
            SymbolError::Duplicate(name) => LoadError::DuplicateSymbol { warrior, index, name },
        }
    }
}
