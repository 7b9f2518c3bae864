//! Trace fixtures shared by the back-end tests.

use retrace_graph::{Deep, GraphBuilder, Param, Signature, TraceGraph};
use retrace_ir::{ArgTag, BinaryOp, NodeId};
use retrace_value::{arity_mismatch, not_implemented, Class, ClassRef, FunctionRef, Value};

/// `f(x) = x + 2`, traced on `x = 10`.
pub(crate) struct AddTwo {
    pub graph: TraceGraph,
    pub root: NodeId,
    pub x: NodeId,
    pub ten: NodeId,
}

pub(crate) fn x_tag() -> ArgTag {
    ArgTag::positional("x")
}

pub(crate) fn add_two() -> AddTwo {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let x = b.argument(x_tag(), ten).unwrap();
    let two = b.literal(Value::Int(2));
    let root = b.binary(BinaryOp::Add, x, two).unwrap();
    AddTwo {
        graph: b.finish().unwrap(),
        root,
        x,
        ten,
    }
}

/// A class with an `add_to` method that is only ever reached through its
/// traced body. The native version lives with the demo scenarios.
pub(crate) fn traced_class(name: &str) -> ClassRef {
    let add_to = FunctionRef::new("add_to", |_, _| {
        Err(not_implemented("untraced call", "add_to"))
    });
    ClassRef::new(Class::new(name).with_method("add_to", add_to))
}

/// `AddX(10).add_to(5, z=2)`.
pub(crate) struct AddX {
    pub graph: TraceGraph,
    pub root: NodeId,
    pub shell: NodeId,
    pub construct: NodeId,
    pub method: NodeId,
    /// `self.x` read inside `add_to`.
    pub read_x: NodeId,
}

pub(crate) fn add_x() -> AddX {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));

    let shell = b.open_shell(traced_class("AddX"));
    let init = Signature::new(
        "__init__",
        vec![Param::positional("self"), Param::positional("x")],
    );
    let ctor = init.bind(&mut b, &[shell.node(), ten], &[]).unwrap();
    b.assign(&shell, "x", ctor.args[1]).unwrap();
    let shell = b.seal(shell);
    let construct = b.construct(shell, &ctor.args, &ctor.kwargs).unwrap();

    let method = b.get_attr(construct, "add_to").unwrap();
    let five = b.literal(Value::Int(5));
    let two = b.literal(Value::Int(2));
    let sig = Signature::new(
        "add_to",
        vec![
            Param::positional("self"),
            Param::positional("y"),
            Param::positional("z").with_default(Value::Int(0)),
        ],
    );
    let call = sig.bind(&mut b, &[construct, five], &[("z", two)]).unwrap();
    let read_x = b.get_attr(call.args[0], "x").unwrap();
    let partial = b.binary(BinaryOp::Add, read_x, call.args[1]).unwrap();
    let ret = b.binary(BinaryOp::Add, partial, call.args[2]).unwrap();
    let root = b.dispatch(method, &call.args, &call.kwargs, ret).unwrap();

    AddX {
        graph: b.finish().unwrap(),
        root,
        shell,
        construct,
        method,
        read_x,
    }
}

/// `AddX2(10).add_to(5, z=2)` where `AddX2.__init__` stores `AddX(x)` as
/// `self.inner` and `add_to` forwards to `self.inner.add_to(y, z)`.
pub(crate) struct AddXNested {
    pub graph: TraceGraph,
    pub root: NodeId,
    pub outer: NodeId,
    pub inner: NodeId,
}

pub(crate) fn add_x_nested() -> AddXNested {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let init = Signature::new(
        "__init__",
        vec![Param::positional("self"), Param::positional("x")],
    );
    let add_to_sig = Signature::new(
        "add_to",
        vec![
            Param::positional("self"),
            Param::positional("y"),
            Param::positional("z").with_default(Value::Int(0)),
        ],
    );

    let outer_shell = b.open_shell(traced_class("AddX2"));
    let outer_ctor = init.bind(&mut b, &[outer_shell.node(), ten], &[]).unwrap();

    let inner_shell = b.open_shell(traced_class("AddX"));
    let inner_ctor = init
        .bind(&mut b, &[inner_shell.node(), outer_ctor.args[1]], &[])
        .unwrap();
    b.assign(&inner_shell, "x", inner_ctor.args[1]).unwrap();
    let inner_shell = b.seal(inner_shell);
    let inner = b.construct(inner_shell, &inner_ctor.args, &[]).unwrap();

    b.assign(&outer_shell, "inner", inner).unwrap();
    let outer_shell = b.seal(outer_shell);
    let outer = b.construct(outer_shell, &outer_ctor.args, &[]).unwrap();

    let five = b.literal(Value::Int(5));
    let two = b.literal(Value::Int(2));
    let outer_method = b.get_attr(outer, "add_to").unwrap();
    let outer_call = add_to_sig
        .bind(&mut b, &[outer, five], &[("z", two)])
        .unwrap();

    let this_inner = b.get_attr(outer_call.args[0], "inner").unwrap();
    let inner_method = b.get_attr(this_inner, "add_to").unwrap();
    let inner_call = add_to_sig
        .bind(
            &mut b,
            &[this_inner, outer_call.args[1], outer_call.args[2]],
            &[],
        )
        .unwrap();
    let read_x = b.get_attr(inner_call.args[0], "x").unwrap();
    let partial = b.binary(BinaryOp::Add, read_x, inner_call.args[1]).unwrap();
    let inner_ret = b.binary(BinaryOp::Add, partial, inner_call.args[2]).unwrap();
    let inner_dispatch = b
        .dispatch(inner_method, &inner_call.args, &[], inner_ret)
        .unwrap();

    let root = b
        .dispatch(outer_method, &outer_call.args, &[], inner_dispatch)
        .unwrap();

    AddXNested {
        graph: b.finish().unwrap(),
        root,
        outer,
        inner,
    }
}

/// `(o, identity(o))` for `o = AddX(10)`: one instance reached directly and
/// through a traced call.
pub(crate) fn shared_instance() -> (TraceGraph, NodeId) {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let shell = b.open_shell(traced_class("AddX"));
    let init = Signature::new(
        "__init__",
        vec![Param::positional("self"), Param::positional("x")],
    );
    let ctor = init.bind(&mut b, &[shell.node(), ten], &[]).unwrap();
    b.assign(&shell, "x", ctor.args[1]).unwrap();
    let shell = b.seal(shell);
    let obj = b.construct(shell, &ctor.args, &[]).unwrap();

    let identity = b.literal(Value::Function(FunctionRef::new("identity", |args, _| {
        args.first()
            .cloned()
            .ok_or_else(|| arity_mismatch("identity", 1, 0))
    })));
    let bound = Signature::new("identity", vec![Param::positional("o")])
        .bind(&mut b, &[obj], &[])
        .unwrap();
    let through_call = b.call(identity, &bound.args, &[], bound.args[0]).unwrap();
    let root = b
        .container(Deep::Tuple(vec![Deep::Node(obj), Deep::Node(through_call)]))
        .unwrap();
    (b.finish().unwrap(), root)
}

pub(crate) fn n_tag() -> ArgTag {
    ArgTag::positional("n")
}

/// `main(n)` recorded on `n = 10`:
///
/// ```text
/// o = AddX(n)
/// def g(n): return o.add_to(n)
/// return g(5)
/// ```
///
/// `o` is first reached inside `g`, where a different `n` is live. The
/// recorded result is 15.
pub(crate) fn shadowed_parameter() -> (TraceGraph, NodeId) {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let n = b.argument(n_tag(), ten).unwrap();

    let shell = b.open_shell(traced_class("AddX"));
    let ctor = Signature::new(
        "__init__",
        vec![Param::positional("self"), Param::positional("x")],
    )
    .bind(&mut b, &[shell.node(), n], &[])
    .unwrap();
    b.assign(&shell, "x", ctor.args[1]).unwrap();
    let shell = b.seal(shell);
    let o = b.construct(shell, &ctor.args, &[]).unwrap();

    let g = b.literal(Value::Function(FunctionRef::new("g", |_, _| {
        Err(not_implemented("untraced call", "g"))
    })));
    let five = b.literal(Value::Int(5));
    let g_call = Signature::new("g", vec![Param::positional("n")])
        .bind(&mut b, &[five], &[])
        .unwrap();

    let method = b.get_attr(o, "add_to").unwrap();
    let add_to = Signature::new(
        "add_to",
        vec![Param::positional("self"), Param::positional("y")],
    )
    .bind(&mut b, &[o, g_call.args[0]], &[])
    .unwrap();
    let read_x = b.get_attr(add_to.args[0], "x").unwrap();
    let sum = b.binary(BinaryOp::Add, read_x, add_to.args[1]).unwrap();
    let body = b.dispatch(method, &add_to.args, &[], sum).unwrap();

    let root = b.call(g, &g_call.args, &[], body).unwrap();
    (b.finish().unwrap(), root)
}

/// `Pair(a, b)` nested `depth` times, each level storing the previous
/// instance in both fields: `p0 = Pair(0, 0)`, `p{k} = Pair(p{k-1}, p{k-1})`.
/// Returns the graph and the outermost construct.
pub(crate) fn shared_pair_chain(depth: usize) -> (TraceGraph, NodeId) {
    let init = Signature::new(
        "__init__",
        vec![
            Param::positional("self"),
            Param::positional("a"),
            Param::positional("b"),
        ],
    );
    let class = ClassRef::new(Class::new("Pair"));
    let mut b = GraphBuilder::new();
    let zero = b.literal(Value::Int(0));
    let mut previous = zero;
    for _ in 0..=depth {
        let shell = b.open_shell(class.clone());
        let ctor = init
            .bind(&mut b, &[shell.node(), previous, previous], &[])
            .unwrap();
        b.assign(&shell, "a", ctor.args[1]).unwrap();
        b.assign(&shell, "b", ctor.args[2]).unwrap();
        let shell = b.seal(shell);
        previous = b.construct(shell, &ctor.args, &[]).unwrap();
    }
    (b.finish().unwrap(), previous)
}
