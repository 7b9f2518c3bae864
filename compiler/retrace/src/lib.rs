//! Retrace - record a computation as a graph, then re-run it three ways.
//!
//! A tracing front-end drives [`GraphBuilder`] to record nodes; the sealed
//! [`TraceGraph`] is then consumed by the back-ends in `retrace_eval`:
//!
//! ```text
//! GraphBuilder ──finish──> TraceGraph ──┬── Evaluator            -> Value
//!                                       ├── Compiler             -> CompiledExpr
//!                                       └── ConstraintCollector  -> ConstraintTable
//! ```
//!
//! The [`demo`] module builds the reference traces used by the `retrace`
//! binary and the integration tests.

use std::sync::Once;

pub mod demo;

pub use retrace_eval::{
    ensure_sufficient_stack, Binder, Compiled, CompiledExpr, Compiler, Constraint,
    ConstraintCollector, ConstraintConfig, ConstraintKind, ConstraintTable, Environment, Evaluator,
    EvaluatorBuilder, FrameGuard, ItemEdgePolicy, LexicalShape, ObjectMemo, RuntimeStack,
    Traversal, TraversalConfig, TraversalState,
};
pub use retrace_graph::{
    BoundArguments, CallKind, Deep, Edge, EdgeLabel, GraphBuilder, GraphError, Node, NodeKind,
    OpenShell, Param, Signature, TraceGraph,
};
pub use retrace_ir::{ArgTag, BinaryOp, Name, NodeId, ParamKind, UnaryOp};
pub use retrace_value::{
    Class, ClassRef, EvalError, EvalErrorKind, EvalResult, FunctionRef, ObjectRef, Value,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=retrace_eval=debug` or `RUST_LOG=retrace_graph=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
