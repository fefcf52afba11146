//! # MARS
//!
//! A deterministic Memory Array Redcode Simulator.
//!
//! Several warriors run inside one shared circular core, each instruction
//! free to read and overwrite any cell, opponents' code included. The last
//! warrior with a live process wins.
//!
//! ```
//! use mars::{Mars, MatchConfig, Outcome, Statement, Opcode, AddrMode};
//!
//! let imp = vec![Statement::new(Opcode::Mov, AddrMode::Direct, 0, AddrMode::Direct, 1)];
//! let config = MatchConfig::default().with_cycle_limit(Some(100));
//! let mut mars = Mars::new(&[imp], &config).unwrap();
//! assert_eq!(mars.run(), Outcome::Draw { survivors: vec![0] });
//! ```

pub mod config;
pub mod vm;
pub mod asm;

// Re-export commonly used types
pub use config::{ConfigError, MatchConfig};
pub use vm::{AddrMode, Core, Instruction, Mars, Opcode, Outcome, Snapshot, Warrior};
pub use asm::{load, Expr, LoadError, PlacementError, Program, Statement};
