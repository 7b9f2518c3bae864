use super::*;
use crate::test_helpers::{add_two, add_x, add_x_nested, x_tag};
use crate::{ConstraintConfig, ItemEdgePolicy};
use pretty_assertions::assert_eq;
use retrace_graph::{GraphBuilder, Param, Signature};
use retrace_value::{EvalErrorKind, FunctionRef};

fn edge(kind: ConstraintKind, from: NodeId, to: NodeId) -> Constraint {
    Constraint { kind, from, to }
}

fn collect(graph: &TraceGraph, root: NodeId) -> ConstraintTable {
    let mut collector = ConstraintCollector::new(graph);
    collector.collect(root).unwrap();
    collector.into_table()
}

#[test]
fn test_add_two_single_argument_edge() {
    let trace = add_two();
    let table = collect(&trace.graph, trace.root);
    let edges: Vec<Constraint> = table.iter().copied().collect();
    assert_eq!(
        edges,
        vec![edge(ConstraintKind::ArgToContent, trace.x, trace.ten)]
    );
}

#[test]
fn test_add_x_edges() {
    let trace = add_x();
    let table = collect(&trace.graph, trace.root);
    let NodeKind::Shell(record) = trace.graph.kind(trace.shell) else {
        panic!("expected a shell");
    };
    let set_x = trace.graph.shell(*record).state.fields()[&Name::intern("x")];

    for expected in [
        edge(ConstraintKind::HasInit, trace.shell, trace.construct),
        edge(ConstraintKind::HasAttr, trace.shell, set_x),
        edge(ConstraintKind::HasCallableMethod, trace.root, trace.method),
        edge(ConstraintKind::HasAttr, trace.method, trace.construct),
    ] {
        assert!(table.contains(&expected), "missing {expected}");
    }

    // `self.x` inside the method reads from the `self` argument, which
    // stands for the constructed instance.
    let NodeKind::Unary { operand: this, .. } = trace.graph.kind(trace.read_x) else {
        panic!("expected an attribute read");
    };
    assert!(table.contains(&edge(ConstraintKind::HasAttr, trace.read_x, *this)));
    assert!(table.contains(&edge(ConstraintKind::ArgToContent, *this, trace.construct)));

    assert_eq!(table.of_kind(ConstraintKind::HasInit).count(), 1);
    assert_eq!(table.of_kind(ConstraintKind::IsCallableFunction).count(), 0);
}

#[test]
fn test_nested_construction_edges() {
    let trace = add_x_nested();
    let table = collect(&trace.graph, trace.root);
    assert_eq!(table.of_kind(ConstraintKind::HasInit).count(), 2);
    assert_eq!(table.of_kind(ConstraintKind::HasCallableMethod).count(), 2);
    assert!(table
        .of_kind(ConstraintKind::HasInit)
        .any(|c| c.to == trace.inner));
}

#[test]
fn test_collect_is_idempotent() {
    let trace = add_x();
    let mut collector = ConstraintCollector::new(&trace.graph);
    let first = collector.collect(trace.root).unwrap().clone();
    let again = collector.collect(trace.root).unwrap().clone();
    assert_eq!(first, again);
    assert_eq!(first, collect(&trace.graph, trace.root));
}

#[test]
fn test_add_reports_new_edges_only() {
    let mut table = ConstraintTable::new();
    let a = NodeId::new(1);
    let b = NodeId::new(0);
    assert!(table.add(edge(ConstraintKind::HasAttr, a, b)));
    assert!(!table.add(edge(ConstraintKind::HasAttr, a, b)));
    assert!(table.add(edge(ConstraintKind::HasItem, a, b)));
    assert_eq!(table.len(), 2);
    let kinds: Vec<ConstraintKind> = table.outgoing(a).map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ConstraintKind::HasAttr, ConstraintKind::HasItem]);
    assert_eq!(table.outgoing(b).count(), 0);
}

#[test]
fn test_item_edge_policy() {
    let mut b = GraphBuilder::new();
    let items = b.literal(Value::list(vec![Value::Int(5), Value::Int(6)]));
    let zero = b.literal(Value::Int(0));
    let literal_index = b.get_item(items, zero).unwrap();
    let one = b.literal(Value::Int(1));
    let i = b.argument(x_tag(), one).unwrap();
    let traced_index = b.get_item(items, i).unwrap();
    let root = b
        .container(Deep::Tuple(vec![
            Deep::Node(literal_index),
            Deep::Node(traced_index),
        ]))
        .unwrap();
    let graph = b.finish().unwrap();

    let default = collect(&graph, root);
    let has_item: Vec<Constraint> = default.of_kind(ConstraintKind::HasItem).copied().collect();
    assert_eq!(has_item, vec![edge(ConstraintKind::HasItem, traced_index, i)]);

    let mut always = ConstraintCollector::with_config(
        &graph,
        ConstraintConfig::new().with_item_edges(ItemEdgePolicy::Always),
    );
    always.collect(root).unwrap();
    assert!(always
        .table()
        .contains(&edge(ConstraintKind::HasItem, literal_index, zero)));
    assert_eq!(always.table().of_kind(ConstraintKind::HasItem).count(), 2);
}

#[test]
fn test_function_call_and_untraced_call() {
    let double = FunctionRef::new("double", |args, _| {
        retrace_value::evaluate_binary(&args[0], &args[0], BinaryOp::Add)
    });
    let mut b = GraphBuilder::new();
    let callee = b.literal(Value::Function(double));
    let three = b.literal(Value::Int(3));
    let x = b.argument(x_tag(), three).unwrap();
    let untraced = b.untraced_call(callee, &[x], &[]).unwrap();

    let f = b.literal("f");
    let bound = Signature::new("f", vec![Param::positional("v")])
        .bind(&mut b, &[untraced], &[])
        .unwrap();
    let root = b.call(f, &bound.args, &[], bound.args[0]).unwrap();
    let graph = b.finish().unwrap();

    let table = collect(&graph, root);
    let edges: Vec<String> = table.iter().map(ToString::to_string).collect();
    assert_eq!(
        edges,
        vec![
            format!("ArgToContent {x} -> {three}"),
            format!("ArgToContent {} -> {untraced}", bound.args[0]),
            format!("IsCallableFunction {root} -> {f}"),
        ]
    );
}

#[test]
fn test_foreign_root_is_internal_error() {
    let trace = add_two();
    let mut collector = ConstraintCollector::new(&trace.graph);
    let err = collector.collect(NodeId::new(999)).unwrap_err();
    assert!(err.is_internal());
    assert_eq!(err.kind, EvalErrorKind::UnknownNode { node: NodeId::new(999) });
    assert!(collector.into_table().is_empty());
}
