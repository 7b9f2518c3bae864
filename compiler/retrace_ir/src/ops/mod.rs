//! Operator algebra recorded by the tracer.
//!
//! Each operator knows its display symbol, the dunder method a traced object
//! overloads it with, and its precedence class. Renderers use the precedence
//! table to decide where parentheses are needed; evaluators only need the
//! variant.

use std::fmt;

use crate::Name;

/// Precedence classes, lower binds tighter.
pub mod precedence {
    pub const CALL: u8 = 1;
    pub const ACCESS: u8 = 2;
    pub const POWER: u8 = 4;
    pub const UNARY: u8 = 5;
    pub const MULTIPLICATIVE: u8 = 6;
    pub const ADDITIVE: u8 = 7;
    pub const SHIFT: u8 = 8;
    pub const BIT_AND: u8 = 9;
    pub const BIT_XOR: u8 = 10;
    pub const BIT_OR: u8 = 11;
    pub const COMPARISON: u8 = 12;
    /// Outermost context: never needs parentheses.
    pub const LIMIT: u8 = 13;
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Associativity {
    LeftToRight,
    RightToLeft,
}

/// Single-operand operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Abs,
    /// Attribute read `operand.name`.
    GetAttr(Name),
    /// Attribute assignment event `self.name = operand`; evaluates to the
    /// assigned value.
    SetAttr(Name),
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Abs => "abs",
            UnaryOp::GetAttr(_) | UnaryOp::SetAttr(_) => ".",
        }
    }

    /// Overload hook name, `None` for attribute operators.
    pub fn dunder(self) -> Option<&'static str> {
        match self {
            UnaryOp::Neg => Some("__neg__"),
            UnaryOp::Pos => Some("__pos__"),
            UnaryOp::Invert => Some("__invert__"),
            UnaryOp::Abs => Some("__abs__"),
            UnaryOp::GetAttr(_) | UnaryOp::SetAttr(_) => None,
        }
    }

    pub fn from_dunder(name: &str) -> Option<UnaryOp> {
        Some(match name {
            "__neg__" => UnaryOp::Neg,
            "__pos__" => UnaryOp::Pos,
            "__invert__" => UnaryOp::Invert,
            "__abs__" => UnaryOp::Abs,
            _ => return None,
        })
    }

    pub fn precedence(self) -> u8 {
        match self {
            UnaryOp::Abs => precedence::CALL,
            UnaryOp::GetAttr(_) | UnaryOp::SetAttr(_) => precedence::ACCESS,
            UnaryOp::Neg | UnaryOp::Pos | UnaryOp::Invert => precedence::UNARY,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::GetAttr(name) => write!(f, ".{name}"),
            UnaryOp::SetAttr(name) => write!(f, ".{name} ="),
            other => f.write_str(other.symbol()),
        }
    }
}

/// Two-operand operators, including item access.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    MatMul,
    TrueDiv,
    FloorDiv,
    Mod,
    DivMod,
    Pow,
    LShift,
    RShift,
    BitAnd,
    BitXor,
    BitOr,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
    /// Item read `left[right]`.
    GetItem,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 21] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::MatMul,
        BinaryOp::TrueDiv,
        BinaryOp::FloorDiv,
        BinaryOp::Mod,
        BinaryOp::DivMod,
        BinaryOp::Pow,
        BinaryOp::LShift,
        BinaryOp::RShift,
        BinaryOp::BitAnd,
        BinaryOp::BitXor,
        BinaryOp::BitOr,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Gt,
        BinaryOp::Ge,
        BinaryOp::GetItem,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::MatMul => "@",
            BinaryOp::TrueDiv => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::DivMod => "divmod",
            BinaryOp::Pow => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::GetItem => "[]",
        }
    }

    /// Overload hook name on the left operand.
    pub fn dunder(self) -> &'static str {
        match self {
            BinaryOp::Add => "__add__",
            BinaryOp::Sub => "__sub__",
            BinaryOp::Mul => "__mul__",
            BinaryOp::MatMul => "__matmul__",
            BinaryOp::TrueDiv => "__truediv__",
            BinaryOp::FloorDiv => "__floordiv__",
            BinaryOp::Mod => "__mod__",
            BinaryOp::DivMod => "__divmod__",
            BinaryOp::Pow => "__pow__",
            BinaryOp::LShift => "__lshift__",
            BinaryOp::RShift => "__rshift__",
            BinaryOp::BitAnd => "__and__",
            BinaryOp::BitXor => "__xor__",
            BinaryOp::BitOr => "__or__",
            BinaryOp::Lt => "__lt__",
            BinaryOp::Le => "__le__",
            BinaryOp::Eq => "__eq__",
            BinaryOp::Ne => "__ne__",
            BinaryOp::Gt => "__gt__",
            BinaryOp::Ge => "__ge__",
            BinaryOp::GetItem => "__getitem__",
        }
    }

    /// Overload hook name on the right operand, for arithmetic operators.
    pub fn reflected_dunder(self) -> Option<&'static str> {
        Some(match self {
            BinaryOp::Add => "__radd__",
            BinaryOp::Sub => "__rsub__",
            BinaryOp::Mul => "__rmul__",
            BinaryOp::MatMul => "__rmatmul__",
            BinaryOp::TrueDiv => "__rtruediv__",
            BinaryOp::FloorDiv => "__rfloordiv__",
            BinaryOp::Mod => "__rmod__",
            BinaryOp::DivMod => "__rdivmod__",
            BinaryOp::Pow => "__rpow__",
            BinaryOp::LShift => "__rlshift__",
            BinaryOp::RShift => "__rrshift__",
            BinaryOp::BitAnd => "__rand__",
            BinaryOp::BitXor => "__rxor__",
            BinaryOp::BitOr => "__ror__",
            _ => return None,
        })
    }

    pub fn from_dunder(name: &str) -> Option<BinaryOp> {
        BinaryOp::ALL.into_iter().find(|op| op.dunder() == name)
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::GetItem => precedence::ACCESS,
            BinaryOp::Pow => precedence::POWER,
            BinaryOp::Mul
            | BinaryOp::MatMul
            | BinaryOp::TrueDiv
            | BinaryOp::FloorDiv
            | BinaryOp::Mod
            | BinaryOp::DivMod => precedence::MULTIPLICATIVE,
            BinaryOp::Add | BinaryOp::Sub => precedence::ADDITIVE,
            BinaryOp::LShift | BinaryOp::RShift => precedence::SHIFT,
            BinaryOp::BitAnd => precedence::BIT_AND,
            BinaryOp::BitXor => precedence::BIT_XOR,
            BinaryOp::BitOr => precedence::BIT_OR,
            BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Gt
            | BinaryOp::Ge => precedence::COMPARISON,
        }
    }

    pub fn associativity(self) -> Associativity {
        if self == BinaryOp::Pow {
            Associativity::RightToLeft
        } else {
            Associativity::LeftToRight
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == precedence::COMPARISON
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
