//! Per-program symbol table and field expression evaluation.
//!
//! A table lives only for the duration of one program's load. Labels hold
//! absolute core addresses; `EQU` constants hold plain integers.

use crate::asm::program::{BinOp, Expr};
use std::collections::HashMap;
use thiserror::Error;

/// Errors evaluating a field expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("unresolved symbol: {0}")]
    Unresolved(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("symbol defined twice: {0}")]
    Duplicate(String),
}

/// Labels and constants of one program.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    labels: HashMap<String, usize>,
    constants: HashMap<String, i64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to an absolute address.
    pub fn define_label(&mut self, name: &str, addr: usize) -> Result<(), SymbolError> {
        self.ensure_free(name)?;
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }

    /// Bind `name` to a constant value.
    pub fn define_constant(&mut self, name: &str, value: i64) -> Result<(), SymbolError> {
        self.ensure_free(name)?;
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    fn ensure_free(&self, name: &str) -> Result<(), SymbolError> {
        if self.labels.contains_key(name) || self.constants.contains_key(name) {
            return Err(SymbolError::Duplicate(name.to_string()));
        }
        Ok(())
    }

    /// Absolute address of a label.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Value of a constant.
    pub fn constant(&self, name: &str) -> Option<i64> {
        self.constants.get(name).copied()
    }

    /// Value of `name` as seen from the cell at `at`.
    ///
    /// Constants first; a label yields its signed displacement from `at`, so
    /// a direct-mode operand holding it lands back on the label.
    pub fn resolve(&self, name: &str, at: usize) -> Option<i64> {
        self.constant(name)
            .or_else(|| self.label(name).map(|addr| addr as i64 - at as i64))
    }

    /// Evaluate `expr` as a field of the cell at `at`.
    pub fn evaluate(&self, expr: &Expr, at: usize) -> Result<i64, SymbolError> {
        match expr {
            Expr::Literal(value) => Ok(*value),
            Expr::Symbol(name) => self
                .resolve(name, at)
                .ok_or_else(|| SymbolError::Unresolved(name.clone())),
            Expr::Binary { operator, left, right } => {
                let lhs = self.evaluate(left, at)?;
                let rhs = self.evaluate(right, at)?;
                match operator {
                    BinOp::Add => Ok(lhs.wrapping_add(rhs)),
                    BinOp::Subtract => Ok(lhs.wrapping_sub(rhs)),
                    BinOp::Multiply => Ok(lhs.wrapping_mul(rhs)),
                    BinOp::Divide if rhs == 0 => Err(SymbolError::DivisionByZero),
                    BinOp::Divide => Ok(lhs.wrapping_div(rhs)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::Core;
    use proptest::prelude::*;

    fn table() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        symbols.define_label("top", 100).unwrap();
        symbols.define_constant("step", 4).unwrap();
        symbols
    }

    #[test]
    fn test_label_is_displacement() {
        let symbols = table();
        assert_eq!(symbols.resolve("top", 100), Some(0));
        assert_eq!(symbols.resolve("top", 103), Some(-3));
        assert_eq!(symbols.resolve("top", 90), Some(10));
    }

    #[test]
    fn test_constant_is_value_everywhere() {
        let symbols = table();
        assert_eq!(symbols.resolve("step", 0), Some(4));
        assert_eq!(symbols.resolve("step", 5000), Some(4));
    }

    #[test]
    fn test_expression_tree() {
        let symbols = table();
        // (top + step * 2) / 2 seen from 98: (2 + 8) / 2
        let expr = Expr::binary(
            BinOp::Divide,
            Expr::binary(
                BinOp::Add,
                Expr::symbol("top"),
                Expr::binary(BinOp::Multiply, Expr::symbol("step"), Expr::Literal(2)),
            ),
            Expr::Literal(2),
        );
        assert_eq!(symbols.evaluate(&expr, 98), Ok(5));

        let diff = Expr::binary(BinOp::Subtract, Expr::Literal(1), Expr::symbol("step"));
        assert_eq!(symbols.evaluate(&diff, 0), Ok(-3));
    }

    #[test]
    fn test_unresolved_and_division_errors() {
        let symbols = table();
        assert_eq!(
            symbols.evaluate(&Expr::symbol("nowhere"), 0),
            Err(SymbolError::Unresolved("nowhere".into()))
        );
        let div = Expr::binary(
            BinOp::Divide,
            Expr::Literal(8),
            Expr::binary(BinOp::Subtract, Expr::symbol("step"), Expr::Literal(4)),
        );
        assert_eq!(symbols.evaluate(&div, 0), Err(SymbolError::DivisionByZero));
    }

    #[test]
    fn test_duplicate_definitions() {
        let mut symbols = table();
        assert_eq!(
            symbols.define_label("step", 3),
            Err(SymbolError::Duplicate("step".into()))
        );
        assert_eq!(
            symbols.define_constant("top", 3),
            Err(SymbolError::Duplicate("top".into()))
        );
    }

    proptest! {
        #[test]
        fn prop_label_displacement_round_trips(
            size in 1usize..10_000,
            label in 0usize..10_000,
            at in 0usize..10_000,
        ) {
            let core = Core::new(size);
            let (label, at) = (label % size, at % size);
            let mut symbols = SymbolTable::new();
            symbols.define_label("target", label).unwrap();

            let field = symbols.evaluate(&Expr::symbol("target"), at).unwrap();
            prop_assert_eq!(core.offset(at, field), label);
        }
    }
}
