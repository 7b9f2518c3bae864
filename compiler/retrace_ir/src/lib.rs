//! Retrace IR - identifiers shared by every retrace crate.
//!
//! - [`Name`]: interned identifier (attribute names, parameter names, classes)
//! - [`NodeId`] / [`NodeRange`]: indices into a trace graph arena
//! - [`ArgTag`] / [`ParamKind`]: lexical identity of a traced argument
//! - [`UnaryOp`] / [`BinaryOp`]: the operator algebra with display metadata
//!
//! Nothing here evaluates anything. Values live in `retrace_value`, nodes in
//! `retrace_graph`.

mod arg_tag;
mod interner;
mod name;
mod node_id;
mod ops;

pub use arg_tag::{ArgTag, ParamKind};
pub use interner::StringInterner;
pub use name::Name;
pub use node_id::{NodeId, NodeRange};
pub use ops::{precedence, Associativity, BinaryOp, UnaryOp};
