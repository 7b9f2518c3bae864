//! Constraint inference.
//!
//! Walks a trace graph and records typed requirement edges between nodes:
//! which shell an instance is initialized from, which nodes are read as
//! attributes, items or callables, and what each argument stands for.
//! Every handler returns the node's own id, so operand outputs are the
//! operand ids.

mod table;

use indexmap::IndexMap;
use retrace_graph::{CallKind, CallSite, ConstructSite, Deep, NodeKind, TraceGraph};
use retrace_ir::{BinaryOp, Name, NodeId, UnaryOp};
use retrace_value::{ClassRef, EvalResult, Value};

use crate::traversal::check_root;
use crate::{Binder, ConstraintConfig, ItemEdgePolicy, Traversal, TraversalState};

pub use table::{Constraint, ConstraintKind, ConstraintTable};

pub struct ConstraintCollector<'g> {
    graph: &'g TraceGraph,
    state: TraversalState<NodeId>,
    config: ConstraintConfig,
    table: ConstraintTable,
}

impl<'g> ConstraintCollector<'g> {
    pub fn new(graph: &'g TraceGraph) -> Self {
        Self::with_config(graph, ConstraintConfig::default())
    }

    pub fn with_config(graph: &'g TraceGraph, config: ConstraintConfig) -> Self {
        ConstraintCollector {
            graph,
            state: TraversalState::new(config.traversal),
            config,
            table: ConstraintTable::new(),
        }
    }

    /// Traverse from `root`, adding edges to this collector's table. May be
    /// called repeatedly; an edge is never recorded twice.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
    pub fn collect(&mut self, root: NodeId) -> EvalResult<&ConstraintTable> {
        check_root(self.graph, root)?;
        let before = self.table.len();
        self.eval(root)?;
        tracing::debug!(
            added = self.table.len() - before,
            total = self.table.len(),
            "collected constraints"
        );
        Ok(&self.table)
    }

    pub fn table(&self) -> &ConstraintTable {
        &self.table
    }

    pub fn into_table(self) -> ConstraintTable {
        self.table
    }

    fn add(&mut self, kind: ConstraintKind, from: NodeId, to: NodeId) {
        let constraint = Constraint { kind, from, to };
        if self.table.add(constraint) {
            tracing::trace!(%constraint, "new constraint");
        }
    }
}

impl<'g> Traversal<'g> for ConstraintCollector<'g> {
    type Output = NodeId;

    fn graph(&self) -> &'g TraceGraph {
        self.graph
    }

    fn state(&self) -> &TraversalState<NodeId> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TraversalState<NodeId> {
        &mut self.state
    }

    fn literal(&mut self, id: NodeId, _: &'g Value) -> EvalResult<NodeId> {
        Ok(id)
    }

    fn container(&mut self, id: NodeId, _: Deep<NodeId>) -> EvalResult<NodeId> {
        Ok(id)
    }

    fn argument(&mut self, id: NodeId, _: Binder, bound: NodeId) -> EvalResult<NodeId> {
        self.add(ConstraintKind::ArgToContent, id, bound);
        Ok(id)
    }

    fn unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) -> EvalResult<NodeId> {
        if matches!(op, UnaryOp::GetAttr(_)) {
            self.add(ConstraintKind::HasAttr, id, operand);
        }
        Ok(id)
    }

    fn binary(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        _: NodeId,
        index: NodeId,
    ) -> EvalResult<NodeId> {
        if op == BinaryOp::GetItem {
            let traced = !matches!(self.graph.kind(index), NodeKind::Literal);
            if traced || self.config.item_edges == ItemEdgePolicy::Always {
                self.add(ConstraintKind::HasItem, id, index);
            }
        }
        Ok(id)
    }

    fn shell(
        &mut self,
        id: NodeId,
        _: &'g ClassRef,
        fields: &'g IndexMap<Name, NodeId>,
    ) -> EvalResult<NodeId> {
        for field in fields.values() {
            self.add(ConstraintKind::HasAttr, id, *field);
        }
        Ok(id)
    }

    fn construct(
        &mut self,
        id: NodeId,
        site: &'g ConstructSite,
        _: NodeId,
        _: Vec<(Name, NodeId)>,
    ) -> EvalResult<NodeId> {
        self.add(ConstraintKind::HasInit, site.shell, id);
        Ok(id)
    }

    fn call(
        &mut self,
        id: NodeId,
        kind: CallKind,
        _: &'g CallSite,
        callable: NodeId,
        _: NodeId,
    ) -> EvalResult<NodeId> {
        let kind = match kind {
            CallKind::Function => ConstraintKind::IsCallableFunction,
            CallKind::Method => ConstraintKind::HasCallableMethod,
        };
        self.add(kind, id, callable);
        Ok(id)
    }

    fn untraced_call(
        &mut self,
        id: NodeId,
        _: CallKind,
        _: NodeId,
        _: Vec<NodeId>,
        _: Vec<(Name, NodeId)>,
    ) -> EvalResult<NodeId> {
        Ok(id)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
