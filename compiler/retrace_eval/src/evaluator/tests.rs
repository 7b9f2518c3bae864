use super::*;
use crate::test_helpers::{
    add_two, add_x, add_x_nested, n_tag, shadowed_parameter, shared_instance, x_tag,
};
use pretty_assertions::assert_eq;
use retrace_graph::{GraphBuilder, Param, Signature};
use retrace_value::{raised, EvalErrorKind, FunctionRef};

fn kind(result: EvalResult) -> Option<EvalErrorKind> {
    result.err().map(|e| e.kind)
}

#[test]
fn test_add_two() {
    let trace = add_two();
    let mut evaluator = Evaluator::new(&trace.graph);
    assert_eq!(evaluator.evaluate(trace.root), Ok(Value::Int(12)));
    assert_eq!(evaluator.environment().depth(), 1);
}

#[test]
fn test_root_binding_overrides_recorded_argument() {
    let trace = add_two();
    let mut evaluator = Evaluator::builder(&trace.graph)
        .binding(x_tag(), Value::Int(40))
        .build();
    assert_eq!(evaluator.evaluate(trace.root), Ok(Value::Int(42)));
    // The recorded binding is untouched.
    assert_eq!(trace.graph.value(trace.x), &Value::Int(10));
}

#[test]
fn test_add_x_dispatch() {
    let trace = add_x();
    let mut evaluator = Evaluator::new(&trace.graph);
    assert_eq!(evaluator.evaluate(trace.root), Ok(Value::Int(17)));
    assert_eq!(trace.graph.value(trace.root), &Value::Int(17));

    let first = evaluator.evaluate(trace.construct).unwrap();
    let second = evaluator.evaluate(trace.construct).unwrap();
    assert!(first.is_same(&second));
    let object = first.as_object().unwrap();
    assert_eq!(object.class().name().as_str(), "AddX");
    assert_eq!(object.field(Name::intern("x")), Some(Value::Int(10)));
}

#[test]
fn test_fresh_instance_per_evaluator() {
    let trace = add_x();
    let a = Evaluator::new(&trace.graph).evaluate(trace.construct).unwrap();
    let b = Evaluator::new(&trace.graph).evaluate(trace.construct).unwrap();
    assert!(!a.is_same(&b));
    // Nor is it the recording-time object.
    assert!(!a.is_same(trace.graph.value(trace.construct)));
    assert_eq!(a.as_object().unwrap().fields(), b.as_object().unwrap().fields());
}

#[test]
fn test_nested_construction() {
    let trace = add_x_nested();
    let mut evaluator = Evaluator::new(&trace.graph);
    assert_eq!(evaluator.evaluate(trace.root), Ok(Value::Int(17)));

    let outer = evaluator.evaluate(trace.outer).unwrap();
    let inner = evaluator.evaluate(trace.inner).unwrap();
    let stored = outer.as_object().unwrap().field(Name::intern("inner")).unwrap();
    assert!(stored.is_same(&inner));
    assert_eq!(evaluator.environment().depth(), 1);
}

#[test]
fn test_construct_reached_along_two_paths() {
    let (graph, root) = shared_instance();
    let result = Evaluator::new(&graph).evaluate(root).unwrap();
    let Value::Tuple(items) = &result else {
        panic!("expected a tuple, got {result}");
    };
    assert!(items[0].is_same(&items[1]));
    assert!(items[0].as_object().is_some());
}

#[test]
fn test_container_preserves_order_and_resolves_arguments() {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let x = b.argument(x_tag(), ten).unwrap();
    let key = b.literal("b");
    let root = b
        .container(Deep::Map(vec![
            (Deep::Raw(Value::string("z")), Deep::Node(x)),
            (Deep::Node(key), Deep::Raw(Value::Int(2))),
            (
                Deep::Raw(Value::string("a")),
                Deep::List(vec![Deep::Node(x), Deep::Raw(Value::None)]),
            ),
        ]))
        .unwrap();
    let graph = b.finish().unwrap();

    let value = Evaluator::builder(&graph)
        .binding(x_tag(), Value::Int(7))
        .build()
        .evaluate(root)
        .unwrap();
    let Value::Map(map) = &value else {
        panic!("expected a map, got {value}");
    };
    let keys: Vec<String> = map.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["'z'", "'b'", "'a'"]);
    assert_eq!(map.get(&Value::string("z")), Some(&Value::Int(7)));
    assert_eq!(
        map.get(&Value::string("a")),
        Some(&Value::list(vec![Value::Int(7), Value::None]))
    );
}

#[test]
fn test_unhashable_key_at_evaluation() {
    let mut b = GraphBuilder::new();
    let one = b.literal(Value::Int(1));
    let x = b.argument(x_tag(), one).unwrap();
    let root = b.container(Deep::Set(vec![Deep::Node(x)])).unwrap();
    let graph = b.finish().unwrap();

    let mut evaluator = Evaluator::builder(&graph)
        .binding(x_tag(), Value::list(vec![]))
        .build();
    assert!(matches!(
        kind(evaluator.evaluate(root)),
        Some(EvalErrorKind::TypeError { .. })
    ));
}

#[test]
fn test_operation_error_is_pinned_to_node() {
    let mut b = GraphBuilder::new();
    let ten = b.literal(Value::Int(10));
    let two = b.literal(Value::Int(2));
    let x = b.argument(x_tag(), two).unwrap();
    let root = b.binary(BinaryOp::FloorDiv, ten, x).unwrap();
    let graph = b.finish().unwrap();

    let err = Evaluator::builder(&graph)
        .binding(x_tag(), Value::Int(0))
        .build()
        .evaluate(root)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ZeroDivision { .. }));
    assert_eq!(err.node, Some(root));
    assert!(!err.is_internal());
}

#[test]
fn test_error_inside_call_restores_frames() {
    let flaky = FunctionRef::new("flaky", |args, _| {
        if args[0] == Value::Int(0) {
            Err(raised("RuntimeError: flaky"))
        } else {
            Ok(args[0].clone())
        }
    });
    let mut b = GraphBuilder::new();
    let callee = b.literal(Value::Function(flaky));
    let f = b.literal("outer");
    let one = b.literal(Value::Int(1));
    let x = b.argument(x_tag(), one).unwrap();
    let bound = Signature::new("outer", vec![Param::positional("v")])
        .bind(&mut b, &[x], &[])
        .unwrap();
    let failing = b.untraced_call(callee, &[bound.args[0]], &[]).unwrap();
    let root = b.call(f, &bound.args, &[], failing).unwrap();
    let graph = b.finish().unwrap();

    let mut evaluator = Evaluator::builder(&graph)
        .binding(x_tag(), Value::Int(0))
        .build();
    let err = evaluator.evaluate(root).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::Raised {
            message: "RuntimeError: flaky".to_owned()
        }
    );
    assert_eq!(err.node, Some(failing));
    assert_eq!(evaluator.environment().depth(), 1);
}

#[test]
fn test_untraced_call_with_keywords() {
    let join = FunctionRef::new("join", |args, kwargs| {
        let sep = kwargs
            .iter()
            .find(|(name, _)| name.as_str() == "sep")
            .and_then(|(_, v)| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
        Ok(Value::string(parts.join(&sep)))
    });
    let mut b = GraphBuilder::new();
    let callee = b.literal(Value::Function(join));
    let one = b.literal(Value::Int(1));
    let x = b.argument(x_tag(), one).unwrap();
    let sep = b.literal("+");
    let root = b.untraced_call(callee, &[x, one], &[("sep", sep)]).unwrap();
    let graph = b.finish().unwrap();

    let result = Evaluator::builder(&graph)
        .binding(x_tag(), Value::Int(9))
        .build()
        .evaluate(root);
    assert_eq!(result, Ok(Value::string("9+1")));
}

#[test]
fn test_same_named_parameters_do_not_shadow() {
    let (graph, root) = shadowed_parameter();
    assert_eq!(graph.value(root), &Value::Int(15));
    assert_eq!(Evaluator::new(&graph).evaluate(root), Ok(Value::Int(15)));

    let mut evaluator = Evaluator::builder(&graph)
        .binding(n_tag(), Value::Int(20))
        .build();
    assert_eq!(evaluator.evaluate(root), Ok(Value::Int(25)));
}

#[test]
fn test_foreign_root_is_internal_error() {
    let trace = add_two();
    let err = Evaluator::new(&trace.graph)
        .evaluate(NodeId::new(999))
        .unwrap_err();
    assert!(err.is_internal());
    assert_eq!(err.kind, EvalErrorKind::UnknownNode { node: NodeId::new(999) });
}
