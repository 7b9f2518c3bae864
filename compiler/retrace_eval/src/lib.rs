//! Retrace eval - back-ends over a recorded trace graph.
//!
//! Every back-end implements [`Traversal`], which owns the node dispatch,
//! frame discipline and memoization. A back-end only supplies one handler
//! per node kind:
//!
//! - [`Evaluator`]: recomputes the concrete value of a node
//! - [`Compiler`]: turns a node into a reusable closure over a runtime stack
//! - [`ConstraintCollector`]: infers typed requirement edges between nodes
//!
//! Traversal recursion is guarded by [`ensure_sufficient_stack`].

mod compiler;
mod config;
mod constraints;
mod environment;
mod evaluator;
mod stack;
mod traversal;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "fixtures are built from known-good traces")]
mod test_helpers;

pub use compiler::{Compiled, CompiledExpr, Compiler, RuntimeStack};
pub use config::{ConstraintConfig, ItemEdgePolicy, TraversalConfig};
pub use constraints::{Constraint, ConstraintCollector, ConstraintKind, ConstraintTable};
pub use environment::{Binder, Environment, LexicalShape};
pub use evaluator::{Evaluator, EvaluatorBuilder};
pub use stack::ensure_sufficient_stack;
pub use traversal::{FrameGuard, ObjectMemo, Traversal, TraversalState};
