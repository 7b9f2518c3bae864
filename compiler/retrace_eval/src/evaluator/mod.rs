//! Concrete re-evaluation of a trace graph.
//!
//! Recomputes every node with the raw operations of `retrace_value`. Node
//! snapshots are never read; a literal's value is its definition, not a
//! snapshot.

use indexmap::IndexMap;
use retrace_graph::{CallKind, CallSite, ConstructSite, Deep, TraceGraph};
use retrace_ir::{ArgTag, BinaryOp, Name, NodeId, UnaryOp};
use retrace_value::{
    call_value, evaluate_binary, evaluate_unary, install_fields, ClassRef, EvalResult, ObjectRef,
    Value,
};

use crate::traversal::check_root;
use crate::{Binder, Environment, Traversal, TraversalConfig, TraversalState};

/// Builder for [`Evaluator`].
pub struct EvaluatorBuilder<'g> {
    graph: &'g TraceGraph,
    config: TraversalConfig,
    bindings: Vec<(ArgTag, Value)>,
}

impl<'g> EvaluatorBuilder<'g> {
    pub fn new(graph: &'g TraceGraph) -> Self {
        EvaluatorBuilder {
            graph,
            config: TraversalConfig::default(),
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: TraversalConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind root parameters. An `Argument` with one of these tags that no
    /// call or constructor frame binds reads this value instead of
    /// evaluating its recorded binding.
    #[must_use]
    pub fn bindings(mut self, bindings: impl IntoIterator<Item = (ArgTag, Value)>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    #[must_use]
    pub fn binding(mut self, tag: ArgTag, value: Value) -> Self {
        self.bindings.push((tag, value));
        self
    }

    pub fn build(self) -> Evaluator<'g> {
        Evaluator {
            graph: self.graph,
            state: TraversalState::with_environment(
                self.config,
                Environment::with_parameters(self.bindings),
            ),
        }
    }
}

/// Tree-walking evaluator.
///
/// Objects are materialized at most once per instance: a `Construct` reached
/// along two paths yields the same [`ObjectRef`].
pub struct Evaluator<'g> {
    graph: &'g TraceGraph,
    state: TraversalState<Value>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g TraceGraph) -> Self {
        EvaluatorBuilder::new(graph).build()
    }

    pub fn builder(graph: &'g TraceGraph) -> EvaluatorBuilder<'g> {
        EvaluatorBuilder::new(graph)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
    pub fn evaluate(&mut self, root: NodeId) -> EvalResult {
        check_root(self.graph, root)?;
        self.eval(root)
    }

    pub fn environment(&self) -> &Environment<Value> {
        self.state.environment()
    }
}

impl<'g> Traversal<'g> for Evaluator<'g> {
    type Output = Value;

    fn graph(&self) -> &'g TraceGraph {
        self.graph
    }

    fn state(&self) -> &TraversalState<Value> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TraversalState<Value> {
        &mut self.state
    }

    fn literal(&mut self, _: NodeId, value: &'g Value) -> EvalResult {
        Ok(value.clone())
    }

    fn container(&mut self, _: NodeId, shape: Deep<Value>) -> EvalResult {
        shape.into_value()
    }

    fn argument(&mut self, _: NodeId, binder: Binder, _: NodeId) -> EvalResult {
        self.state.env.lookup(&binder).cloned()
    }

    fn unary(&mut self, _: NodeId, op: UnaryOp, operand: Value) -> EvalResult {
        evaluate_unary(&operand, op)
    }

    fn binary(&mut self, _: NodeId, op: BinaryOp, left: Value, right: Value) -> EvalResult {
        evaluate_binary(&left, &right, op)
    }

    fn shell(
        &mut self,
        id: NodeId,
        class: &'g ClassRef,
        _: &'g IndexMap<Name, NodeId>,
    ) -> EvalResult {
        tracing::trace!(id = %id, class = %class.name(), "allocating instance");
        Ok(Value::Object(ObjectRef::new(class.clone())))
    }

    fn construct(
        &mut self,
        _: NodeId,
        _: &'g ConstructSite,
        shell: Value,
        fields: Vec<(Name, Value)>,
    ) -> EvalResult {
        install_fields(&shell, fields.into_iter().collect())?;
        Ok(shell)
    }

    fn call(
        &mut self,
        _: NodeId,
        _: CallKind,
        _: &'g CallSite,
        _: Value,
        ret: Value,
    ) -> EvalResult {
        Ok(ret)
    }

    fn untraced_call(
        &mut self,
        _: NodeId,
        _: CallKind,
        callable: Value,
        args: Vec<Value>,
        kwargs: Vec<(Name, Value)>,
    ) -> EvalResult {
        call_value(&callable, &args, &kwargs)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
