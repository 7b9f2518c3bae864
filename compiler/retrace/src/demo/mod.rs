//! Reference traces.
//!
//! Each [`Scenario`] is what a tracing front-end would record for a small
//! program, with the program's inputs exposed as root parameters so the
//! compiled form can be re-run on other values.

use std::fmt::Write;

use retrace_graph::{GraphBuilder, GraphError, Param, Signature, TraceGraph};
use retrace_ir::{ArgTag, BinaryOp, Name, NodeId};
use retrace_value::{
    arity_mismatch, call_value, evaluate_binary, get_attribute, Class, ClassRef, EvalResult,
    FunctionRef, Value,
};

/// A recorded program plus the inputs to re-run it with.
#[derive(Debug)]
pub struct Scenario {
    pub name: &'static str,
    /// The program, as source text.
    pub source: &'static str,
    pub graph: TraceGraph,
    pub root: NodeId,
    pub parameters: Vec<ArgTag>,
    pub runs: Vec<Vec<Value>>,
}

pub fn all() -> Result<Vec<Scenario>, GraphError> {
    Ok(vec![add_two()?, add_x()?, add_x_nested()?])
}

/// `f(x) = x + 2`, recorded on `x = 10`.
pub fn add_two() -> Result<Scenario, GraphError> {
    let x = ArgTag::positional("x");
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let arg = b.argument(x, ten)?;
    let two = b.literal(Value::Int(2));
    let root = b.binary(BinaryOp::Add, arg, two)?;
    Ok(Scenario {
        name: "add-two",
        source: "def f(x): return x + 2\nf(10)",
        graph: b.finish()?,
        root,
        parameters: vec![x],
        runs: vec![
            vec![Value::Int(10)],
            vec![Value::Int(-4)],
            vec![Value::Float(0.5)],
        ],
    })
}

fn add_to(args: &[Value], kwargs: &[(Name, Value)]) -> EvalResult {
    let [this, y, rest @ ..] = args else {
        return Err(arity_mismatch("add_to", 2, args.len()));
    };
    let z = match rest.first() {
        Some(z) => z.clone(),
        None => kwargs
            .iter()
            .find(|(name, _)| name.as_str() == "z")
            .map_or(Value::Int(0), |(_, z)| z.clone()),
    };
    let x = get_attribute(this, Name::intern("x"))?;
    evaluate_binary(&evaluate_binary(&x, y, BinaryOp::Add)?, &z, BinaryOp::Add)
}

fn forward_add_to(args: &[Value], kwargs: &[(Name, Value)]) -> EvalResult {
    let [this, rest @ ..] = args else {
        return Err(arity_mismatch("add_to", 1, 0));
    };
    let inner = get_attribute(this, Name::intern("inner"))?;
    call_value(&get_attribute(&inner, Name::intern("add_to"))?, rest, kwargs)
}

pub fn add_x_class() -> ClassRef {
    ClassRef::new(Class::new("AddX").with_method("add_to", FunctionRef::new("add_to", add_to)))
}

pub fn add_x2_class() -> ClassRef {
    ClassRef::new(
        Class::new("AddX2").with_method("add_to", FunctionRef::new("add_to", forward_add_to)),
    )
}

fn init_signature() -> Signature {
    Signature::new(
        "__init__",
        vec![Param::positional("self"), Param::positional("x")],
    )
}

fn add_to_signature() -> Signature {
    Signature::new(
        "add_to",
        vec![
            Param::positional("self"),
            Param::positional("y"),
            Param::positional("z").with_default(Value::Int(0)),
        ],
    )
}

/// `AddX(x)`: record the constructor body `self.x = x`.
fn construct_add_x(b: &mut GraphBuilder, x: NodeId) -> Result<NodeId, GraphError> {
    let shell = b.open_shell(add_x_class());
    let ctor = init_signature().bind(b, &[shell.node(), x], &[])?;
    b.assign(&shell, "x", ctor.args[1])?;
    let shell = b.seal(shell);
    b.construct(shell, &ctor.args, &ctor.kwargs)
}

/// `obj.add_to(5, z=2)` where `add_to` returns `self.x + y + z`.
fn dispatch_add_to(b: &mut GraphBuilder, obj: NodeId) -> Result<NodeId, GraphError> {
    let method = b.get_attr(obj, "add_to")?;
    let five = b.literal(Value::Int(5));
    let two = b.literal(Value::Int(2));
    let call = add_to_signature().bind(b, &[obj, five], &[("z", two)])?;
    let x = b.get_attr(call.args[0], "x")?;
    let partial = b.binary(BinaryOp::Add, x, call.args[1])?;
    let ret = b.binary(BinaryOp::Add, partial, call.args[2])?;
    b.dispatch(method, &call.args, &call.kwargs, ret)
}

/// `AddX(n).add_to(5, z=2)`, recorded on `n = 10`.
pub fn add_x() -> Result<Scenario, GraphError> {
    let n = ArgTag::positional("n");
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let arg = b.argument(n, ten)?;
    let obj = construct_add_x(&mut b, arg)?;
    let root = dispatch_add_to(&mut b, obj)?;
    Ok(Scenario {
        name: "add-x",
        source: "class AddX:\n    def __init__(self, x): self.x = x\n    \
                 def add_to(self, y, z=0): return self.x + y + z\n\
                 def main(n): return AddX(n).add_to(5, z=2)\nmain(10)",
        graph: b.finish()?,
        root,
        parameters: vec![n],
        runs: vec![vec![Value::Int(10)], vec![Value::Int(1)]],
    })
}

/// `AddX2(n).add_to(5, z=2)` where `AddX2` wraps an `AddX` and forwards
/// `add_to` to it.
pub fn add_x_nested() -> Result<Scenario, GraphError> {
    let n = ArgTag::positional("n");
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let arg = b.argument(n, ten)?;

    let shell = b.open_shell(add_x2_class());
    let ctor = init_signature().bind(&mut b, &[shell.node(), arg], &[])?;
    let inner = construct_add_x(&mut b, ctor.args[1])?;
    b.assign(&shell, "inner", inner)?;
    let shell = b.seal(shell);
    let obj = b.construct(shell, &ctor.args, &ctor.kwargs)?;

    let method = b.get_attr(obj, "add_to")?;
    let five = b.literal(Value::Int(5));
    let two = b.literal(Value::Int(2));
    let call = add_to_signature().bind(&mut b, &[obj, five], &[("z", two)])?;
    let this_inner = b.get_attr(call.args[0], "inner")?;
    let inner_method = b.get_attr(this_inner, "add_to")?;
    let forwarded = add_to_signature().bind(
        &mut b,
        &[this_inner, call.args[1], call.args[2]],
        &[],
    )?;
    let x = b.get_attr(forwarded.args[0], "x")?;
    let partial = b.binary(BinaryOp::Add, x, forwarded.args[1])?;
    let inner_ret = b.binary(BinaryOp::Add, partial, forwarded.args[2])?;
    let inner_call = b.dispatch(inner_method, &forwarded.args, &[], inner_ret)?;
    let root = b.dispatch(method, &call.args, &call.kwargs, inner_call)?;

    Ok(Scenario {
        name: "nested",
        source: "class AddX2:\n    def __init__(self, x): self.inner = AddX(x)\n    \
                 def add_to(self, y, z=0): return self.inner.add_to(y, z)\n\
                 def main(n): return AddX2(n).add_to(5, z=2)\nmain(10)",
        graph: b.finish()?,
        root,
        parameters: vec![n],
        runs: vec![vec![Value::Int(10)], vec![Value::Int(-5)]],
    })
}

/// One line per node reachable from `root`: id, kind, snapshot and
/// labelled operand edges.
pub fn render(graph: &TraceGraph, root: NodeId) -> String {
    let mut out = String::new();
    for id in graph.walk(root) {
        let node = graph.node(id);
        let edges: Vec<String> = graph
            .edges(id)
            .iter()
            .map(|edge| format!("{}: {}", edge.label, edge.target))
            .collect();
        let _ = write!(out, "{id} {} = {}", node.tag(), node.value());
        if !edges.is_empty() {
            let _ = write!(out, " [{}]", edges.join(", "));
        }
        out.push('\n');
    }
    out
}
