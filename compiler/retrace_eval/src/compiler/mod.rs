//! Compilation of a trace graph into reusable closures.
//!
//! Every node becomes a [`Compiled`] closure over a [`RuntimeStack`].
//! Argument reads are resolved to a lexical address `(depth, index)` once,
//! at build time; at run time they walk `depth` frames and project a slot.
//! Each frame that introduces bindings compiles to a push of the tuple of
//! its bound closures, evaluated against the outer stack.
//!
//! Object closures are cached per node and lexical shape at build time, so a
//! node shared by many paths compiles once for each distinct set of
//! enclosing frames. The object itself is materialized once per invocation
//! through the runtime stack's object table.

mod runtime;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use retrace_graph::{CallKind, CallSite, ConstructSite, Deep, TraceGraph};
use retrace_ir::{ArgTag, BinaryOp, Name, NodeId, UnaryOp};
use retrace_value::{
    arity_mismatch, binding_not_found, call_value, evaluate_binary, evaluate_unary,
    install_fields, ClassRef, EvalResult, ObjectRef, Value,
};

use crate::traversal::check_root;
use crate::{Binder, Environment, ObjectMemo, Traversal, TraversalConfig, TraversalState};

pub use runtime::RuntimeStack;

/// A compiled node.
pub type Compiled = Arc<dyn Fn(&RuntimeStack) -> EvalResult + Send + Sync>;

fn compiled(code: impl Fn(&RuntimeStack) -> EvalResult + Send + Sync + 'static) -> Compiled {
    Arc::new(code)
}

/// A compiled root with its declared parameters.
#[derive(Clone)]
pub struct CompiledExpr {
    root: Compiled,
    parameters: Vec<ArgTag>,
}

impl CompiledExpr {
    pub fn parameters(&self) -> &[ArgTag] {
        &self.parameters
    }

    /// Invoke with one value per parameter, in declaration order.
    pub fn call(&self, args: &[Value]) -> EvalResult {
        if args.len() != self.parameters.len() {
            return Err(arity_mismatch(
                "compiled expression",
                self.parameters.len(),
                args.len(),
            ));
        }
        let stack = RuntimeStack::new();
        if self.parameters.is_empty() {
            self.run(&stack)
        } else {
            self.run(&stack.push(args.to_vec()))
        }
    }

    /// Run against an explicit stack, whose top frame must hold the
    /// parameters (or be absent when there are none).
    pub fn run(&self, stack: &RuntimeStack) -> EvalResult {
        (self.root)(stack)
    }
}

impl fmt::Debug for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpr")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

pub struct Compiler<'g> {
    graph: &'g TraceGraph,
    state: TraversalState<Compiled>,
}

impl<'g> Compiler<'g> {
    pub fn new(graph: &'g TraceGraph) -> Self {
        Compiler {
            graph,
            state: TraversalState::new(TraversalConfig::default()),
        }
    }

    #[must_use]
    pub fn with_config(self, config: TraversalConfig) -> Self {
        let env = self.state.env;
        Compiler {
            graph: self.graph,
            state: TraversalState::with_environment(config, env),
        }
    }

    /// Declare root-level parameters. Their base-frame bindings are never
    /// called; reads compile to stack accesses.
    #[must_use]
    pub fn with_parameters(self, tags: impl IntoIterator<Item = ArgTag>) -> Self {
        let env = Environment::with_parameters(tags.into_iter().map(|tag| {
            (tag, compiled(move |_| Err(binding_not_found(Binder::Parameter(tag)))))
        }));
        Compiler {
            graph: self.graph,
            state: TraversalState::with_environment(*self.state.config(), env),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
    pub fn compile(&mut self, root: NodeId) -> EvalResult<CompiledExpr> {
        check_root(self.graph, root)?;
        let code = self.eval(root)?;
        let parameters: Vec<ArgTag> = self
            .state
            .env
            .top_locals()
            .filter_map(|(binder, _)| match binder {
                Binder::Parameter(tag) => Some(tag),
                Binder::Argument(_) => None,
            })
            .collect();
        tracing::debug!(
            parameters = parameters.len(),
            objects = self.state.memo_len(),
            "compiled expression"
        );
        Ok(CompiledExpr {
            root: code,
            parameters,
        })
    }

    /// Closure reading `binder` from the runtime stack.
    fn build_access(&self, binder: Binder) -> EvalResult<Compiled> {
        let (depth, index) = self.state.env.locate(&binder)?;
        tracing::trace!(binder = %binder, depth, index, "resolved argument");
        Ok(compiled(move |stack| stack.get(depth, index)))
    }

    /// Closures bound by the current frame, in slot order.
    fn frame_locals(&self) -> Vec<Compiled> {
        self.state
            .env
            .top_locals()
            .map(|(_, code)| Arc::clone(code))
            .collect()
    }

    /// Wrap `inner` so that it runs on the stack extended with the current
    /// frame's tuple. Frames without locals push nothing.
    fn framed(&self, inner: Compiled) -> Compiled {
        let locals = self.frame_locals();
        if locals.is_empty() {
            return inner;
        }
        compiled(move |stack| inner(&extend(stack, &locals)?))
    }
}

fn extend(stack: &RuntimeStack, locals: &[Compiled]) -> EvalResult<RuntimeStack> {
    if locals.is_empty() {
        return Ok(stack.clone());
    }
    let values = locals
        .iter()
        .map(|code| code(stack))
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(stack.push(values))
}

impl<'g> Traversal<'g> for Compiler<'g> {
    type Output = Compiled;

    fn graph(&self) -> &'g TraceGraph {
        self.graph
    }

    fn state(&self) -> &TraversalState<Compiled> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TraversalState<Compiled> {
        &mut self.state
    }

    fn object_memo(&self) -> ObjectMemo {
        ObjectMemo::PerLexicalShape
    }

    fn literal(&mut self, _: NodeId, value: &'g Value) -> EvalResult<Compiled> {
        let value = value.clone();
        Ok(compiled(move |_| Ok(value.clone())))
    }

    fn container(&mut self, _: NodeId, shape: Deep<Compiled>) -> EvalResult<Compiled> {
        Ok(compiled(move |stack| {
            shape
                .try_map(&mut |code: &Compiled| code(stack))?
                .into_value()
        }))
    }

    fn argument(&mut self, _: NodeId, binder: Binder, _: NodeId) -> EvalResult<Compiled> {
        let access = self.build_access(binder)?;
        Ok(self.framed(access))
    }

    fn unary(&mut self, _: NodeId, op: UnaryOp, operand: Compiled) -> EvalResult<Compiled> {
        Ok(compiled(move |stack| evaluate_unary(&operand(stack)?, op)))
    }

    fn binary(
        &mut self,
        _: NodeId,
        op: BinaryOp,
        left: Compiled,
        right: Compiled,
    ) -> EvalResult<Compiled> {
        Ok(compiled(move |stack| {
            let left = left(stack)?;
            evaluate_binary(&left, &right(stack)?, op)
        }))
    }

    fn shell(
        &mut self,
        id: NodeId,
        class: &'g ClassRef,
        _: &'g IndexMap<Name, NodeId>,
    ) -> EvalResult<Compiled> {
        let class = class.clone();
        Ok(compiled(move |stack| {
            if let Some(object) = stack.object(id) {
                return Ok(object);
            }
            let object = Value::Object(ObjectRef::new(class.clone()));
            stack.record(id, object.clone());
            Ok(object)
        }))
    }

    fn construct(
        &mut self,
        id: NodeId,
        _: &'g ConstructSite,
        shell: Compiled,
        fields: Vec<(Name, Compiled)>,
    ) -> EvalResult<Compiled> {
        let locals = self.frame_locals();
        Ok(compiled(move |stack| {
            if let Some(object) = stack.object(id) {
                return Ok(object);
            }
            let inner = extend(stack, &locals)?;
            let object = shell(&inner)?;
            let values = fields
                .iter()
                .map(|(name, code)| Ok((*name, code(&inner)?)))
                .collect::<EvalResult<IndexMap<_, _>>>()?;
            install_fields(&object, values)?;
            stack.record(id, object.clone());
            Ok(object)
        }))
    }

    fn call(
        &mut self,
        _: NodeId,
        _: CallKind,
        _: &'g CallSite,
        callable: Compiled,
        ret: Compiled,
    ) -> EvalResult<Compiled> {
        let body = self.framed(ret);
        Ok(compiled(move |stack| {
            callable(stack)?;
            body(stack)
        }))
    }

    fn untraced_call(
        &mut self,
        _: NodeId,
        _: CallKind,
        callable: Compiled,
        args: Vec<Compiled>,
        kwargs: Vec<(Name, Compiled)>,
    ) -> EvalResult<Compiled> {
        Ok(compiled(move |stack| {
            let function = callable(stack)?;
            let args = args
                .iter()
                .map(|code| code(stack))
                .collect::<EvalResult<Vec<_>>>()?;
            let kwargs = kwargs
                .iter()
                .map(|(name, code)| Ok((*name, code(stack)?)))
                .collect::<EvalResult<Vec<_>>>()?;
            call_value(&function, &args, &kwargs)
        }))
    }
}
