//! Retrace graph - the recorded computation as an arena of immutable nodes.
//!
//! # Node algebra
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `Literal` | an untraced value |
//! | `Container` | list/tuple/map/set/slice whose elements may be nodes |
//! | `Argument` | a call parameter, plus the node it was bound from |
//! | `Unary` / `Binary` | operator application, attribute and item access |
//! | `Shell` | an allocated instance whose fields are recorded separately |
//! | `Construct` | shell + constructor arguments |
//! | `Call` / `Dispatch` | traced function/method invocation with its return node |
//! | `UntracedCall` / `UntracedDispatch` | invocation of an opaque callable |
//!
//! Every node carries a snapshot of the value it produced while recording.
//! Back-ends never read snapshots; they recompute.
//!
//! Graphs are built with [`GraphBuilder`] and consumed read-only.

mod builder;
mod deep;
mod errors;
mod graph;
mod node;
mod signature;

pub use builder::{GraphBuilder, OpenShell};
pub use deep::Deep;
pub use errors::GraphError;
pub use graph::{Edge, EdgeLabel, TraceGraph};
pub use node::{
    CallKind, CallSite, ConstructSite, KeywordArg, Node, NodeKind, ShellId, ShellRecord,
    ShellState, UntracedSite,
};
pub use signature::{BoundArguments, Param, Signature};
