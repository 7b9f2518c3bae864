//! Recording API for trace graphs.
//!
//! The builder is what a tracing front-end drives: it appends nodes in
//! evaluation order and computes each node's snapshot with the same raw
//! operations the back-ends use. Object construction follows the shell
//! protocol:
//!
//! ```text
//! let shell = builder.open_shell(class);      // allocate, no initializer
//! builder.assign(&shell, "x", x_arg)?;        // one SetAttr node per field
//! let shell_node = builder.seal(shell);       // Open -> Sealed
//! builder.construct(shell_node, &args, &[])?; // tie shell to its arguments
//! ```

use retrace_ir::{ArgTag, BinaryOp, Name, NodeId, UnaryOp};
use retrace_value::{call_value, evaluate_binary, evaluate_unary, ClassRef, ObjectRef, Value};

use crate::node::{
    CallKind, CallSite, ConstructSite, KeywordArg, NodeKind, ShellId, ShellRecord, UntracedSite,
};
use crate::{Deep, GraphError, TraceGraph};

/// A shell whose constructor is still running.
///
/// Consumed by [`GraphBuilder::seal`], so no field can be recorded on a
/// sealed shell.
#[derive(Debug)]
pub struct OpenShell {
    node: NodeId,
    shell: ShellId,
    object: ObjectRef,
}

impl OpenShell {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

#[derive(Default)]
pub struct GraphBuilder {
    graph: TraceGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The graph recorded so far. Shells may still be open.
    pub fn graph(&self) -> &TraceGraph {
        &self.graph
    }

    /// Finish recording.
    pub fn finish(self) -> Result<TraceGraph, GraphError> {
        for id in self.graph.ids() {
            if let NodeKind::Shell(shell) = self.graph.kind(id) {
                if !self.graph.shell(*shell).state.is_sealed() {
                    return Err(GraphError::UnsealedShell(id));
                }
            }
        }
        tracing::debug!(
            nodes = self.graph.len(),
            shells = self.graph.shells().count(),
            "trace graph sealed"
        );
        Ok(self.graph)
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        if self.graph.contains(id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    fn snapshot(&self, id: NodeId) -> Result<Value, GraphError> {
        self.check(id)?;
        Ok(self.graph.value(id).clone())
    }

    fn push(&mut self, kind: NodeKind, value: Value) -> NodeId {
        let id = self.graph.push(kind, value);
        tracing::trace!(id = %id, tag = self.graph.node(id).tag(), "recorded node");
        id
    }

    pub fn literal(&mut self, value: impl Into<Value>) -> NodeId {
        let value = value.into();
        self.push(NodeKind::Literal, value)
    }

    pub fn container(&mut self, shape: Deep<NodeId>) -> Result<NodeId, GraphError> {
        let snapshot = shape
            .try_map(&mut |id| self.snapshot(*id))?
            .into_value()?;
        Ok(self.push(NodeKind::Container(shape), snapshot))
    }

    pub fn argument(&mut self, tag: ArgTag, bound: NodeId) -> Result<NodeId, GraphError> {
        let snapshot = self.snapshot(bound)?;
        Ok(self.push(NodeKind::Argument { tag, bound }, snapshot))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> Result<NodeId, GraphError> {
        let snapshot = evaluate_unary(&self.snapshot(operand)?, op)?;
        Ok(self.push(NodeKind::Unary { op, operand }, snapshot))
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    ) -> Result<NodeId, GraphError> {
        let snapshot = evaluate_binary(&self.snapshot(left)?, &self.snapshot(right)?, op)?;
        Ok(self.push(NodeKind::Binary { op, left, right }, snapshot))
    }

    pub fn get_attr(&mut self, operand: NodeId, name: &str) -> Result<NodeId, GraphError> {
        self.unary(UnaryOp::GetAttr(Name::intern(name)), operand)
    }

    pub fn get_item(&mut self, container: NodeId, index: NodeId) -> Result<NodeId, GraphError> {
        self.binary(BinaryOp::GetItem, container, index)
    }

    /// Allocate an instance of `class` without running an initializer.
    pub fn open_shell(&mut self, class: ClassRef) -> OpenShell {
        let object = ObjectRef::new(class.clone());
        let shell = self.graph.push_shell(ShellRecord::new(class));
        let node = self.push(NodeKind::Shell(shell), Value::Object(object.clone()));
        OpenShell {
            node,
            shell,
            object,
        }
    }

    /// Record `self.<field> = value` during construction.
    pub fn assign(
        &mut self,
        shell: &OpenShell,
        field: &str,
        value: NodeId,
    ) -> Result<NodeId, GraphError> {
        let name = Name::intern(field);
        let snapshot = self.snapshot(value)?;
        let node = self.push(
            NodeKind::Unary {
                op: UnaryOp::SetAttr(name),
                operand: value,
            },
            snapshot.clone(),
        );
        if !self.graph.shell_mut(shell.shell).assign(name, node) {
            return Err(GraphError::SealedShell(shell.node));
        }
        shell.object.set_field(name, snapshot);
        Ok(node)
    }

    /// Close the construction window. Returns the shell node.
    pub fn seal(&mut self, shell: OpenShell) -> NodeId {
        self.graph.shell_mut(shell.shell).seal();
        shell.node
    }

    fn argument_list(&mut self, ids: &[NodeId]) -> Result<retrace_ir::NodeRange, GraphError> {
        for &id in ids {
            self.check(id)?;
            if !matches!(self.graph.kind(id), NodeKind::Argument { .. }) {
                return Err(GraphError::NotAnArgument(id));
            }
        }
        Ok(self.graph.push_list(ids))
    }

    /// Tie a sealed shell to its constructor arguments (`Argument` nodes).
    pub fn construct(
        &mut self,
        shell: NodeId,
        args: &[NodeId],
        kwargs: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        self.check(shell)?;
        let NodeKind::Shell(record) = self.graph.kind(shell) else {
            return Err(GraphError::NotAShell(shell));
        };
        if !self.graph.shell(*record).state.is_sealed() {
            return Err(GraphError::UnsealedShell(shell));
        }
        let snapshot = self.graph.value(shell).clone();
        let args = self.argument_list(args)?;
        let kwargs = self.argument_list(kwargs)?;
        Ok(self.push(
            NodeKind::Construct(ConstructSite {
                shell,
                args,
                kwargs,
            }),
            snapshot,
        ))
    }

    /// Traced function call: `args`/`kwargs` are `Argument` nodes, `ret` the
    /// node the body returned.
    pub fn call(
        &mut self,
        callable: NodeId,
        args: &[NodeId],
        kwargs: &[NodeId],
        ret: NodeId,
    ) -> Result<NodeId, GraphError> {
        self.traced(CallKind::Function, callable, args, kwargs, ret)
    }

    /// Traced method call; the receiver is among `args`.
    pub fn dispatch(
        &mut self,
        callable: NodeId,
        args: &[NodeId],
        kwargs: &[NodeId],
        ret: NodeId,
    ) -> Result<NodeId, GraphError> {
        self.traced(CallKind::Method, callable, args, kwargs, ret)
    }

    fn traced(
        &mut self,
        kind: CallKind,
        callable: NodeId,
        args: &[NodeId],
        kwargs: &[NodeId],
        ret: NodeId,
    ) -> Result<NodeId, GraphError> {
        self.check(callable)?;
        let snapshot = self.snapshot(ret)?;
        let site = CallSite {
            callable,
            args: self.argument_list(args)?,
            kwargs: self.argument_list(kwargs)?,
            ret,
        };
        let node = match kind {
            CallKind::Function => NodeKind::Call(site),
            CallKind::Method => NodeKind::Dispatch(site),
        };
        Ok(self.push(node, snapshot))
    }

    /// Invoke an opaque callable on the snapshots of its arguments.
    pub fn untraced_call(
        &mut self,
        callable: NodeId,
        args: &[NodeId],
        kwargs: &[(&str, NodeId)],
    ) -> Result<NodeId, GraphError> {
        self.untraced(CallKind::Function, callable, args, kwargs)
    }

    pub fn untraced_dispatch(
        &mut self,
        callable: NodeId,
        args: &[NodeId],
        kwargs: &[(&str, NodeId)],
    ) -> Result<NodeId, GraphError> {
        self.untraced(CallKind::Method, callable, args, kwargs)
    }

    fn untraced(
        &mut self,
        kind: CallKind,
        callable: NodeId,
        args: &[NodeId],
        kwargs: &[(&str, NodeId)],
    ) -> Result<NodeId, GraphError> {
        let function = self.snapshot(callable)?;
        let arg_values = args
            .iter()
            .map(|id| self.snapshot(*id))
            .collect::<Result<Vec<_>, _>>()?;
        let keywords: Vec<KeywordArg> = kwargs
            .iter()
            .map(|(name, value)| KeywordArg {
                name: Name::intern(name),
                value: *value,
            })
            .collect();
        let keyword_values = keywords
            .iter()
            .map(|k| Ok((k.name, self.snapshot(k.value)?)))
            .collect::<Result<Vec<_>, GraphError>>()?;
        let snapshot = call_value(&function, &arg_values, &keyword_values)?;

        let site = UntracedSite {
            callable,
            args: self.graph.push_list(args),
            kwargs: self.graph.push_keywords(&keywords),
        };
        let node = match kind {
            CallKind::Function => NodeKind::UntracedCall(site),
            CallKind::Method => NodeKind::UntracedDispatch(site),
        };
        Ok(self.push(node, snapshot))
    }
}
