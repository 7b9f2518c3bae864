//! Error types for trace evaluation.
//!
//! `EvalErrorKind` separates two families:
//!
//! - **Internal errors** (`BindingNotFound`, `NotImplemented`, `UnknownNode`,
//!   `FrameMismatch`): the graph or a back-end is malformed. These never
//!   correspond to an error the traced program could have raised.
//! - **Operation errors** (`TypeError`, `ZeroDivision`, ...): a raw operation
//!   failed the same way it would have failed when the program ran untraced.
//!
//! Factory functions (e.g. `division_by_zero()`) are the public constructors;
//! they keep the message formats in one place.

use std::fmt;

use retrace_ir::NodeId;
use thiserror::Error;

use crate::Value;

/// Result of evaluating a node or applying an operation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvalErrorKind {
    #[error("no binding for {binding} in the current frame")]
    BindingNotFound { binding: String },

    #[error("{operation} is not implemented for {variant}")]
    NotImplemented { operation: String, variant: String },

    #[error("node {node} does not belong to this graph")]
    UnknownNode { node: NodeId },

    #[error("compiled access ({depth}, {index}) does not match the runtime stack")]
    FrameMismatch { depth: usize, index: usize },

    #[error("maximum traversal depth exceeded (limit: {limit})")]
    RecursionLimitExceeded { limit: usize },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ZeroDivisionError: {message}")]
    ZeroDivision { message: String },

    #[error("IndexError: {message}")]
    IndexError { message: String },

    #[error("KeyError: {key}")]
    KeyError { key: String },

    #[error("AttributeError: '{type_name}' object has no attribute '{attribute}'")]
    AttributeError { type_name: String, attribute: String },

    #[error("ValueError: {message}")]
    ValueError { message: String },

    #[error("OverflowError: integer overflow in {operation}")]
    Overflow { operation: String },

    /// Raised by a native function.
    #[error("{message}")]
    Raised { message: String },
}

/// Evaluation error, optionally pinned to the node where it surfaced.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Innermost node whose evaluation failed.
    pub node: Option<NodeId>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError { kind, node: None }
    }

    /// Record `id` as the failing node unless an inner node already was.
    #[must_use]
    pub fn at_node(mut self, id: NodeId) -> Self {
        if self.node.is_none() {
            self.node = Some(id);
        }
        self
    }

    /// Internal errors indicate a malformed graph rather than a failing
    /// operation of the traced program.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            EvalErrorKind::BindingNotFound { .. }
                | EvalErrorKind::NotImplemented { .. }
                | EvalErrorKind::UnknownNode { .. }
                | EvalErrorKind::FrameMismatch { .. }
        )
    }
}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::new(kind)
    }
}

// Internal errors

#[cold]
pub fn binding_not_found(binding: impl fmt::Display) -> EvalError {
    EvalErrorKind::BindingNotFound {
        binding: binding.to_string(),
    }
    .into()
}

#[cold]
pub fn not_implemented(operation: impl Into<String>, variant: impl Into<String>) -> EvalError {
    EvalErrorKind::NotImplemented {
        operation: operation.into(),
        variant: variant.into(),
    }
    .into()
}

#[cold]
pub fn unsealed_shell(id: NodeId) -> EvalError {
    not_implemented("evaluation", format!("open shell {id}")).at_node(id)
}

#[cold]
pub fn unknown_node(node: NodeId) -> EvalError {
    EvalErrorKind::UnknownNode { node }.into()
}

#[cold]
pub fn frame_mismatch(depth: usize, index: usize) -> EvalError {
    EvalErrorKind::FrameMismatch { depth, index }.into()
}

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalErrorKind::RecursionLimitExceeded { limit }.into()
}

// Operation errors

fn type_error(message: String) -> EvalError {
    EvalErrorKind::TypeError { message }.into()
}

#[cold]
pub fn unsupported_operands(symbol: &str, left: &str, right: &str) -> EvalError {
    type_error(format!(
        "unsupported operand type(s) for {symbol}: '{left}' and '{right}'"
    ))
}

#[cold]
pub fn bad_unary_operand(symbol: &str, operand: &str) -> EvalError {
    type_error(format!("bad operand type for unary {symbol}: '{operand}'"))
}

#[cold]
pub fn unorderable(symbol: &str, left: &str, right: &str) -> EvalError {
    type_error(format!(
        "'{symbol}' not supported between instances of '{left}' and '{right}'"
    ))
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    type_error(format!("'{type_name}' object is not callable"))
}

#[cold]
pub fn not_subscriptable(type_name: &str) -> EvalError {
    type_error(format!("'{type_name}' object is not subscriptable"))
}

#[cold]
pub fn invalid_index_type(container: &str, index: &str) -> EvalError {
    type_error(format!(
        "{container} indices must be integers or slices, not {index}"
    ))
}

#[cold]
pub fn unhashable(type_name: &str) -> EvalError {
    type_error(format!("unhashable type: '{type_name}'"))
}

#[cold]
pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> EvalError {
    let word = if expected == 1 { "argument" } else { "arguments" };
    type_error(format!("{name}() takes {expected} positional {word} but {got} were given"))
}

#[cold]
pub fn bad_argument(message: impl Into<String>) -> EvalError {
    type_error(message.into())
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalErrorKind::ZeroDivision {
        message: "division by zero".to_owned(),
    }
    .into()
}

#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalErrorKind::ZeroDivision {
        message: "integer modulo by zero".to_owned(),
    }
    .into()
}

#[cold]
pub fn index_out_of_range(type_name: &str) -> EvalError {
    EvalErrorKind::IndexError {
        message: format!("{type_name} index out of range"),
    }
    .into()
}

#[cold]
pub fn key_not_found(key: &Value) -> EvalError {
    EvalErrorKind::KeyError {
        key: key.to_string(),
    }
    .into()
}

#[cold]
pub fn attribute_not_found(type_name: &str, attribute: &str) -> EvalError {
    EvalErrorKind::AttributeError {
        type_name: type_name.to_owned(),
        attribute: attribute.to_owned(),
    }
    .into()
}

#[cold]
pub fn negative_shift_count() -> EvalError {
    EvalErrorKind::ValueError {
        message: "negative shift count".to_owned(),
    }
    .into()
}

#[cold]
pub fn slice_step_zero() -> EvalError {
    EvalErrorKind::ValueError {
        message: "slice step cannot be zero".to_owned(),
    }
    .into()
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalErrorKind::Overflow {
        operation: operation.to_owned(),
    }
    .into()
}

#[cold]
pub fn raised(message: impl Into<String>) -> EvalError {
    EvalErrorKind::Raised {
        message: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests;
