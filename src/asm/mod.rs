//! Load phase: program records, symbol resolution and placement.
//!
//! Source text parsing is left to a front end; this module starts from
//! structured [`Statement`]s.

pub mod program;
pub mod symbols;
pub mod loader;

pub use program::{BinOp, Expr, Mnemonic, Program, Statement};
pub use symbols::{SymbolError, SymbolTable};
pub use loader::{footprint, load, place, LoadError, Loaded, PlacementError};
