//! Retrace values - the concrete data a trace graph computes over.
//!
//! - [`Value`]: runtime values with the host language's equality, hashing
//!   and repr rules
//! - [`ObjectRef`], [`ClassRef`], [`FunctionRef`]: reference types compared
//!   by identity
//! - [`evaluate_binary`] / [`evaluate_unary`]: raw operator semantics
//! - [`get_attribute`], [`get_item`], [`call_value`]: access and invocation
//! - [`EvalError`]: the error taxonomy shared by every back-end
//!
//! Every back-end applies operators through this crate, so the evaluator,
//! the compiled closures and the graph builder's snapshots agree by
//! construction.

mod access;
mod errors;
mod object;
mod operators;
mod value;

pub use access::{call_value, get_attribute, get_item, install_fields, slice_indices};
pub use errors::{
    arity_mismatch, attribute_not_found, bad_argument, bad_unary_operand, binding_not_found,
    division_by_zero, frame_mismatch, index_out_of_range, integer_overflow, invalid_index_type,
    key_not_found, modulo_by_zero, negative_shift_count, not_callable, not_implemented,
    not_subscriptable, raised, recursion_limit_exceeded, slice_step_zero, unhashable,
    unknown_node, unorderable, unsealed_shell, unsupported_operands, EvalError, EvalErrorKind,
    EvalResult,
};
pub use object::{BoundMethod, Class, ClassRef, FunctionRef, NativeFn, ObjectRef};
pub use operators::{compare, evaluate_binary, evaluate_unary};
pub use value::{Heap, SliceValue, Value, ValueMap, ValueSet};
