use super::*;
use crate::{Deep, GraphBuilder, Signature, Param};
use pretty_assertions::assert_eq;
use retrace_ir::{ArgTag, BinaryOp, UnaryOp};
use retrace_value::{Class, ClassRef};

#[test]
fn test_binary_edges() {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let x = b.argument(ArgTag::positional("x"), ten).unwrap_or_default();
    let two = b.literal(Value::Int(2));
    let sum = b.binary(BinaryOp::Add, x, two).unwrap_or_default();
    let graph = b.finish().unwrap_or_default();

    assert_eq!(
        graph.edges(sum),
        vec![
            Edge { label: EdgeLabel::Left, target: x },
            Edge { label: EdgeLabel::Right, target: two },
        ]
    );
    assert_eq!(
        graph.edges(x),
        vec![Edge { label: EdgeLabel::Bound, target: ten }]
    );
    assert!(graph.edges(ten).is_empty());
    assert_eq!(graph.node(sum).tag(), "Binary");
    assert_eq!(graph.walk(sum), vec![sum, x, ten, two]);
}

#[test]
fn test_container_edges_skip_raw_values() {
    let mut b = GraphBuilder::new();
    let a = b.literal(Value::Int(1));
    let c = b.literal(Value::Int(2));
    let list = b
        .container(Deep::List(vec![
            Deep::Node(a),
            Deep::Raw(Value::Int(9)),
            Deep::Tuple(vec![Deep::Node(c)]),
        ]))
        .unwrap_or_default();
    let graph = b.finish().unwrap_or_default();
    let labels: Vec<String> = graph
        .edges(list)
        .iter()
        .map(|e| format!("{}->{}", e.label, e.target))
        .collect();
    assert_eq!(labels, vec![format!("items:0->{a}"), format!("items:1->{c}")]);
}

#[test]
fn test_walk_terminates_on_self_reference() {
    // self.double = self.x * 2 recorded while `self` is bound to the shell.
    let mut b = GraphBuilder::new();
    let class = ClassRef::new(Class::new("Doubler"));
    let three = b.literal(Value::Int(3));
    let shell = b.open_shell(class);
    let sig = Signature::new("__init__", vec![Param::positional("self"), Param::positional("x")]);
    let bound = sig.bind(&mut b, &[shell.node(), three], &[]).unwrap_or_default();
    let this = bound.args[0];
    let x = bound.args[1];
    b.assign(&shell, "x", x).unwrap_or_default();
    let read_x = b.get_attr(this, "x").unwrap_or_default();
    let two = b.literal(Value::Int(2));
    let doubled = b.binary(BinaryOp::Mul, read_x, two).unwrap_or_default();
    b.assign(&shell, "double", doubled).unwrap_or_default();
    let shell_id = b.seal(shell);
    let obj = b.construct(shell_id, &bound.args, &[]).unwrap_or_default();
    let graph = b.finish().unwrap_or_default();

    let reached = graph.walk(obj);
    assert_eq!(reached[0], obj);
    assert!(reached.contains(&shell_id));
    assert!(reached.contains(&doubled));
    let mut deduped = reached.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), reached.len());

    let shell_labels: Vec<String> = graph
        .edges(shell_id)
        .iter()
        .map(|e| e.label.to_string())
        .collect();
    assert_eq!(shell_labels, vec!["attributes:x", "attributes:double"]);
    assert_eq!(graph.node(read_x).tag(), "GetAttr");
    assert!(matches!(
        graph.kind(read_x),
        NodeKind::Unary { op: UnaryOp::GetAttr(_), .. }
    ));
}

#[test]
fn test_call_edges() {
    let mut b = GraphBuilder::new();
    let f = b.literal(Value::string("f"));
    let one = b.literal(Value::Int(1));
    let y = b.argument(ArgTag::keyword_only("y"), one).unwrap_or_default();
    let ret = b.unary(UnaryOp::Neg, y).unwrap_or_default();
    let call = b.call(f, &[], &[y], ret).unwrap_or_default();
    let graph = b.finish().unwrap_or_default();
    let labels: Vec<String> = graph
        .edges(call)
        .iter()
        .map(|e| e.label.to_string())
        .collect();
    assert_eq!(labels, vec!["callable", "kwargs:y", "return"]);
}
