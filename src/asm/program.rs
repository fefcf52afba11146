//! Unresolved program records.
//!
//! A [`Program`] is what a source-text front end hands to the loader: an
//! ordered list of [`Statement`]s whose fields may still name labels and
//! constants or combine them arithmetically.

use crate::vm::{AddrMode, Opcode};
use serde::{Deserialize, Serialize};

/// One warrior's source, in authored order.
pub type Program = Vec<Statement>;

/// Statement opcode: a real instruction or a load-time pseudo-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mnemonic {
    Dat,
    Mov,
    Add,
    Sub,
    Jmp,
    Jmz,
    Jmn,
    Djn,
    Cmp,
    Slt,
    Spl,
    /// Defines the statement's label as a constant. Occupies no cell.
    Equ,
    /// Stops loading; the A-field may name the entry label.
    End,
}

impl Mnemonic {
    /// The executable opcode, or `None` for a pseudo-op.
    pub fn opcode(self) -> Option<Opcode> {
        match self {
            Mnemonic::Dat => Some(Opcode::Dat),
            Mnemonic::Mov => Some(Opcode::Mov),
            Mnemonic::Add => Some(Opcode::Add),
            Mnemonic::Sub => Some(Opcode::Sub),
            Mnemonic::Jmp => Some(Opcode::Jmp),
            Mnemonic::Jmz => Some(Opcode::Jmz),
            Mnemonic::Jmn => Some(Opcode::Jmn),
            Mnemonic::Djn => Some(Opcode::Djn),
            Mnemonic::Cmp => Some(Opcode::Cmp),
            Mnemonic::Slt => Some(Opcode::Slt),
            Mnemonic::Spl => Some(Opcode::Spl),
            Mnemonic::Equ | Mnemonic::End => None,
        }
    }
}

impl From<Opcode> for Mnemonic {
    fn from(op: Opcode) -> Self {
        match op {
            Opcode::Dat => Mnemonic::Dat,
            Opcode::Mov => Mnemonic::Mov,
            Opcode::Add => Mnemonic::Add,
            Opcode::Sub => Mnemonic::Sub,
            Opcode::Jmp => Mnemonic::Jmp,
            Opcode::Jmz => Mnemonic::Jmz,
            Opcode::Jmn => Mnemonic::Jmn,
            Opcode::Djn => Mnemonic::Djn,
            Opcode::Cmp => Mnemonic::Cmp,
            Opcode::Slt => Mnemonic::Slt,
            Opcode::Spl => Mnemonic::Spl,
        }
    }
}

/// Arithmetic operator in a field expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// An operand field before symbol resolution.
///
/// Serialized untagged: `4`, `"step"`, or
/// `{ "operator": "add", "left": "step", "right": 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expr {
    Literal(i64),
    Symbol(String),
    Binary {
        operator: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// A named label or constant.
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// `left <operator> right`.
    pub fn binary(operator: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::Literal(0)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }
}

/// One authored line of a program.
///
/// Omitted operands default to `Direct 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub opcode: Mnemonic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub a_mode: AddrMode,
    #[serde(default)]
    pub a_field: Expr,
    #[serde(default)]
    pub b_mode: AddrMode,
    #[serde(default)]
    pub b_field: Expr,
}

impl Statement {
    /// A statement with both operands given.
    pub fn new(
        opcode: impl Into<Mnemonic>,
        a_mode: AddrMode,
        a_field: impl Into<Expr>,
        b_mode: AddrMode,
        b_field: impl Into<Expr>,
    ) -> Self {
        Self {
            opcode: opcode.into(),
            label: None,
            comment: None,
            a_mode,
            a_field: a_field.into(),
            b_mode,
            b_field: b_field.into(),
        }
    }

    /// `<name> EQU <value>`.
    pub fn equ(name: &str, value: impl Into<Expr>) -> Self {
        Self::new(Mnemonic::Equ, AddrMode::Direct, value, AddrMode::Direct, 0).labeled(name)
    }

    /// `END`, optionally naming the entry label.
    pub fn end(entry: Option<&str>) -> Self {
        let a_field = entry.map_or(Expr::Literal(0), Expr::symbol);
        Self::new(Mnemonic::End, AddrMode::Direct, a_field, AddrMode::Direct, 0)
    }

    /// Attach a label.
    pub fn labeled(mut self, name: &str) -> Self {
        self.label = Some(name.to_string());
        self
    }

    /// Attach a comment.
    pub fn commented(mut self, text: &str) -> Self {
        self.comment = Some(text.to_string());
        self
    }

    /// Does this statement occupy a core cell?
    pub fn occupies_cell(&self) -> bool {
        self.opcode.opcode().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_ops_have_no_opcode() {
        assert_eq!(Mnemonic::Equ.opcode(), None);
        assert_eq!(Mnemonic::End.opcode(), None);
        for op in Opcode::ALL {
            assert_eq!(Mnemonic::from(op).opcode(), Some(op));
        }
    }

    #[test]
    fn test_statement_from_json() {
        let json = r#"[
            { "opcode": "EQU", "label": "step", "a_field": 4 },
            { "opcode": "ADD", "label": "top", "a_mode": "Immediate", "a_field": "step",
              "b_field": { "operator": "add", "left": "bomb", "right": 1 } },
            { "opcode": "JMP", "a_field": "top", "comment": "loop" },
            { "opcode": "END", "a_field": "top" }
        ]"#;
        let program: Program = serde_json::from_str(json).unwrap();

        assert_eq!(program[0], Statement::equ("step", 4));
        assert_eq!(program[1].a_mode, AddrMode::Immediate);
        assert_eq!(program[1].a_field, Expr::symbol("step"));
        assert_eq!(
            program[1].b_field,
            Expr::binary(BinOp::Add, Expr::symbol("bomb"), Expr::Literal(1))
        );
        assert_eq!(program[2].b_mode, AddrMode::Direct);
        assert_eq!(program[2].b_field, Expr::Literal(0));
        assert_eq!(program[2].comment.as_deref(), Some("loop"));
        assert_eq!(program[3], Statement::end(Some("top")));
        assert!(!program[0].occupies_cell());
        assert!(program[1].occupies_cell());
    }
}
