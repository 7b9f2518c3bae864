//! Generic traversal engine shared by every back-end.
//!
//! [`Traversal::eval`] is the single entry point. It dispatches on the node
//! kind, evaluates operands in a fixed order, manages argument frames and
//! memoizes object nodes, then hands the operand outputs to exactly one
//! handler. A back-end implements the handlers and nothing else.
//!
//! # Frames
//!
//! `Argument`, `Construct` and `Call`/`Dispatch` nodes run their handler
//! inside a frame pushed through [`FrameGuard`]. The guard pops on drop, so
//! the environment is restored on success, on `?` propagation and during
//! unwinding.
//!
//! `Construct` and `Call`/`Dispatch` frames bind the `Argument` nodes of
//! their site by id. Any other `Argument` is resolved in this order: a live
//! frame that binds that very node, a root parameter with the same tag, and
//! finally its own bound node, evaluated in the current frame.
//!
//! # Memoization
//!
//! `Shell` and `Construct` outputs are cached before they are returned,
//! keyed as the back-end's [`ObjectMemo`] asks. A shell is cached before its
//! fields are ever visited, which is what lets field nodes refer back to it
//! through `Argument(self)`.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use retrace_graph::{CallKind, CallSite, ConstructSite, Deep, NodeKind, TraceGraph};
use retrace_ir::{BinaryOp, Name, NodeId, NodeRange, UnaryOp};
use retrace_value::{
    not_implemented, recursion_limit_exceeded, unknown_node, unsealed_shell, ClassRef, EvalResult,
    Value,
};
use rustc_hash::FxHashMap;

use crate::{ensure_sufficient_stack, Binder, Environment, LexicalShape, TraversalConfig};

/// How `Shell`/`Construct` outputs are cached.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ObjectMemo {
    /// One output per node for the lifetime of the traversal.
    #[default]
    PerNode,
    /// One output per node and [`LexicalShape`], for back-ends whose outputs
    /// depend on where in the frame stack a node was reached.
    PerLexicalShape,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct MemoKey {
    node: NodeId,
    shape: Option<LexicalShape>,
}

/// Mutable state owned by one traversal instance.
#[derive(Debug)]
pub struct TraversalState<T> {
    pub(crate) env: Environment<T>,
    memo: FxHashMap<MemoKey, T>,
    depth: usize,
    config: TraversalConfig,
}

impl<T: Clone> TraversalState<T> {
    pub fn new(config: TraversalConfig) -> Self {
        Self::with_environment(config, Environment::new())
    }

    pub fn with_environment(config: TraversalConfig, env: Environment<T>) -> Self {
        TraversalState {
            env,
            memo: FxHashMap::default(),
            depth: 0,
            config,
        }
    }

    pub fn environment(&self) -> &Environment<T> {
        &self.env
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Current nesting of `eval` calls.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Output cached for `id` under [`ObjectMemo::PerNode`].
    pub fn memoized(&self, id: NodeId) -> Option<&T> {
        self.memo.get(&MemoKey {
            node: id,
            shape: None,
        })
    }

    /// Number of cached object outputs.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }
}

/// A back-end over a [`TraceGraph`].
///
/// One required handler per node kind; a back-end that misses one does not
/// compile. Handlers receive the outputs of the node's operands, already
/// evaluated by [`eval`](Traversal::eval).
pub trait Traversal<'g> {
    type Output: Clone;

    fn graph(&self) -> &'g TraceGraph;
    fn state(&self) -> &TraversalState<Self::Output>;
    fn state_mut(&mut self) -> &mut TraversalState<Self::Output>;

    fn object_memo(&self) -> ObjectMemo {
        ObjectMemo::PerNode
    }

    fn literal(&mut self, id: NodeId, value: &'g Value) -> EvalResult<Self::Output>;

    fn container(&mut self, id: NodeId, shape: Deep<Self::Output>) -> EvalResult<Self::Output>;

    /// Runs inside the argument's frame; `binder` is the binding it resolved
    /// to.
    fn argument(&mut self, id: NodeId, binder: Binder, bound: NodeId)
        -> EvalResult<Self::Output>;

    fn unary(&mut self, id: NodeId, op: UnaryOp, operand: Self::Output)
        -> EvalResult<Self::Output>;

    fn binary(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        left: Self::Output,
        right: Self::Output,
    ) -> EvalResult<Self::Output>;

    /// First visit of a sealed shell. `fields` maps each field to its
    /// `SetAttr` node; they are not evaluated here.
    fn shell(
        &mut self,
        id: NodeId,
        class: &'g ClassRef,
        fields: &'g IndexMap<Name, NodeId>,
    ) -> EvalResult<Self::Output>;

    /// Runs inside the constructor frame, after the shell and every field
    /// node have been evaluated there.
    fn construct(
        &mut self,
        id: NodeId,
        site: &'g ConstructSite,
        shell: Self::Output,
        fields: Vec<(Name, Self::Output)>,
    ) -> EvalResult<Self::Output>;

    /// Runs inside the callee frame. `callable` was evaluated outside it.
    fn call(
        &mut self,
        id: NodeId,
        kind: CallKind,
        site: &'g CallSite,
        callable: Self::Output,
        ret: Self::Output,
    ) -> EvalResult<Self::Output>;

    fn untraced_call(
        &mut self,
        id: NodeId,
        kind: CallKind,
        callable: Self::Output,
        args: Vec<Self::Output>,
        kwargs: Vec<(Name, Self::Output)>,
    ) -> EvalResult<Self::Output>;

    /// Evaluate `id`, pinning any error to the innermost failing node.
    fn eval(&mut self, id: NodeId) -> EvalResult<Self::Output> {
        let state = self.state_mut();
        if let Some(limit) = state.config.max_depth {
            if state.depth >= limit {
                return Err(recursion_limit_exceeded(limit).at_node(id));
            }
        }
        state.depth += 1;
        let result = ensure_sufficient_stack(|| self.dispatch(id));
        self.state_mut().depth -= 1;
        result.map_err(|e| e.at_node(id))
    }

    /// Operand evaluation and frame handling for one node. Use
    /// [`eval`](Traversal::eval) instead; it adds the depth limit and error
    /// location.
    fn dispatch(&mut self, id: NodeId) -> EvalResult<Self::Output> {
        let graph = self.graph();
        match graph.kind(id) {
            NodeKind::Literal => self.literal(id, graph.value(id)),
            NodeKind::Container(shape) => {
                let shape = shape.try_map(&mut |element: &NodeId| self.eval(*element))?;
                self.container(id, shape)
            }
            NodeKind::Argument { tag, bound } => {
                let own = Binder::Argument(id);
                let parameter = Binder::Parameter(*tag);
                let (binder, binding) = if self.state().env.is_bound(&own) {
                    (own, None)
                } else if self.state().env.is_bound(&parameter) {
                    (parameter, None)
                } else {
                    (own, Some((own, self.eval(*bound)?)))
                };
                self.with_frame(binding, |frame| frame.argument(id, binder, *bound))
            }
            NodeKind::Unary { op, operand } => {
                let operand = self.eval(*operand)?;
                self.unary(id, *op, operand)
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.eval(*left)?;
                let right = self.eval(*right)?;
                self.binary(id, *op, left, right)
            }
            NodeKind::Shell(shell) => {
                let key = memo_key(self, id);
                if let Some(out) = cached(self, &key) {
                    return Ok(out);
                }
                let record = graph.shell(*shell);
                let fields = record.sealed_fields().ok_or_else(|| unsealed_shell(id))?;
                let out = self.shell(id, &record.class, fields)?;
                remember(self, key, &out);
                Ok(out)
            }
            NodeKind::Construct(site) => {
                let key = memo_key(self, id);
                if let Some(out) = cached(self, &key) {
                    return Ok(out);
                }
                let fields = shell_fields(graph, site.shell)?;
                let bindings = bind_arguments(self, site.args, site.kwargs)?;
                let out = self.with_frame(bindings, |frame| {
                    let shell = frame.eval(site.shell)?;
                    let mut values = Vec::with_capacity(fields.len());
                    for (name, node) in fields {
                        values.push((*name, frame.eval(*node)?));
                    }
                    frame.construct(id, site, shell, values)
                })?;
                remember(self, key, &out);
                Ok(out)
            }
            NodeKind::Call(site) | NodeKind::Dispatch(site) => {
                let kind = match graph.kind(id) {
                    NodeKind::Dispatch(_) => CallKind::Method,
                    _ => CallKind::Function,
                };
                let callable = self.eval(site.callable)?;
                let bindings = bind_arguments(self, site.args, site.kwargs)?;
                self.with_frame(bindings, |frame| {
                    let ret = frame.eval(site.ret)?;
                    frame.call(id, kind, site, callable, ret)
                })
            }
            NodeKind::UntracedCall(site) | NodeKind::UntracedDispatch(site) => {
                let kind = match graph.kind(id) {
                    NodeKind::UntracedDispatch(_) => CallKind::Method,
                    _ => CallKind::Function,
                };
                let callable = self.eval(site.callable)?;
                let mut args = Vec::with_capacity(site.args.len());
                for arg in graph.node_list(site.args) {
                    args.push(self.eval(*arg)?);
                }
                let mut kwargs = Vec::with_capacity(site.kwargs.len());
                for keyword in graph.keyword_list(site.kwargs) {
                    kwargs.push((keyword.name, self.eval(keyword.value)?));
                }
                self.untraced_call(id, kind, callable, args, kwargs)
            }
        }
    }

    /// Push a frame binding `bindings`; it is popped when the guard drops.
    fn push_frame(
        &mut self,
        bindings: impl IntoIterator<Item = (Binder, Self::Output)>,
    ) -> FrameGuard<'_, 'g, Self> {
        self.state_mut().env.push(bindings);
        tracing::trace!(depth = self.state().env.depth(), "frame pushed");
        FrameGuard {
            traversal: self,
            _graph: PhantomData,
        }
    }

    /// Run `f` inside a new frame binding `bindings`.
    fn with_frame<R>(
        &mut self,
        bindings: impl IntoIterator<Item = (Binder, Self::Output)>,
        f: impl FnOnce(&mut FrameGuard<'_, 'g, Self>) -> R,
    ) -> R {
        let mut frame = self.push_frame(bindings);
        f(&mut frame)
    }
}

/// Fail with an internal error unless `root` is a node of `graph`.
pub(crate) fn check_root(graph: &TraceGraph, root: NodeId) -> EvalResult<()> {
    if graph.contains(root) {
        Ok(())
    } else {
        Err(unknown_node(root))
    }
}

fn memo_key<'g, T: Traversal<'g> + ?Sized>(traversal: &T, id: NodeId) -> MemoKey {
    let shape = match traversal.object_memo() {
        ObjectMemo::PerNode => None,
        ObjectMemo::PerLexicalShape => Some(traversal.state().env.shape()),
    };
    MemoKey { node: id, shape }
}

fn cached<'g, T: Traversal<'g> + ?Sized>(traversal: &T, key: &MemoKey) -> Option<T::Output> {
    let hit = traversal.state().memo.get(key).cloned();
    if hit.is_some() {
        tracing::trace!(id = %key.node, "memo hit");
    }
    hit
}

fn remember<'g, T: Traversal<'g> + ?Sized>(traversal: &mut T, key: MemoKey, out: &T::Output) {
    traversal.state_mut().memo.insert(key, out.clone());
}

fn shell_fields(graph: &TraceGraph, shell: NodeId) -> EvalResult<&IndexMap<Name, NodeId>> {
    match graph.kind(shell) {
        NodeKind::Shell(record) => graph
            .shell(*record)
            .sealed_fields()
            .ok_or_else(|| unsealed_shell(shell)),
        _ => Err(not_implemented("construction", graph.node(shell).tag())),
    }
}

/// Evaluate the bound node of every `Argument` in `args` then `kwargs`, in
/// the current frame, and bind it to that `Argument`.
fn bind_arguments<'g, T: Traversal<'g> + ?Sized>(
    traversal: &mut T,
    args: NodeRange,
    kwargs: NodeRange,
) -> EvalResult<Vec<(Binder, T::Output)>> {
    let graph = traversal.graph();
    let nodes = graph.node_list(args).iter().chain(graph.node_list(kwargs));
    let mut bindings = Vec::with_capacity(args.len() + kwargs.len());
    for node in nodes {
        match graph.kind(*node) {
            NodeKind::Argument { bound, .. } => {
                bindings.push((Binder::Argument(*node), traversal.eval(*bound)?));
            }
            _ => return Err(not_implemented("argument binding", graph.node(*node).tag())),
        }
    }
    Ok(bindings)
}

/// RAII guard for one environment frame.
///
/// Access the traversal through the guard; it implements `Deref` and
/// `DerefMut`. Dropping the guard (including during unwinding) pops the frame.
pub struct FrameGuard<'t, 'g, T: Traversal<'g> + ?Sized> {
    traversal: &'t mut T,
    _graph: PhantomData<&'g TraceGraph>,
}

impl<'g, T: Traversal<'g> + ?Sized> Drop for FrameGuard<'_, 'g, T> {
    fn drop(&mut self) {
        self.traversal.state_mut().env.pop();
        tracing::trace!(depth = self.traversal.state().env.depth(), "frame popped");
    }
}

impl<'g, T: Traversal<'g> + ?Sized> Deref for FrameGuard<'_, 'g, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.traversal
    }
}

impl<'g, T: Traversal<'g> + ?Sized> DerefMut for FrameGuard<'_, 'g, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.traversal
    }
}
