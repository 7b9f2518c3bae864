use super::*;
use crate::NodeKind;
use pretty_assertions::assert_eq;

fn argument_parts(builder: &GraphBuilder, id: NodeId) -> (ArgTag, Value) {
    match builder.graph().kind(id) {
        NodeKind::Argument { tag, .. } => (*tag, builder.graph().value(id).clone()),
        other => panic!("expected an argument, got {other:?}"),
    }
}

fn add_to() -> Signature {
    Signature::new(
        "add_to",
        vec![
            Param::positional("self"),
            Param::positional("y"),
            Param::positional("z").with_default(Value::Int(0)),
        ],
    )
}

#[test]
fn test_bind_positional_and_default() {
    let mut b = GraphBuilder::new();
    let this = b.literal(Value::string("self"));
    let five = b.literal(Value::Int(5));
    let bound = add_to().bind(&mut b, &[this, five], &[]);
    let bound = match bound {
        Ok(bound) => bound,
        Err(e) => panic!("binding failed: {e}"),
    };
    assert_eq!(bound.args.len(), 3);
    assert!(bound.kwargs.is_empty());
    assert_eq!(
        argument_parts(&b, bound.args[2]),
        (ArgTag::positional("z"), Value::Int(0))
    );
}

#[test]
fn test_bind_keyword_for_positional_param() {
    let mut b = GraphBuilder::new();
    let this = b.literal(Value::None);
    let five = b.literal(Value::Int(5));
    let two = b.literal(Value::Int(2));
    let bound = add_to()
        .bind(&mut b, &[this, five], &[("z", two)])
        .unwrap_or_default();
    assert_eq!(
        argument_parts(&b, bound.args[2]),
        (ArgTag::positional("z"), Value::Int(2))
    );
}

#[test]
fn test_bind_packs_var_arguments() {
    let sig = Signature::new(
        "f",
        vec![
            Param::positional("a"),
            Param::new("rest", ParamKind::VarPositional),
            Param::new("flag", ParamKind::KeywordOnly).with_default(false),
            Param::new("options", ParamKind::VarKeyword),
        ],
    );
    let mut b = GraphBuilder::new();
    let one = b.literal(Value::Int(1));
    let two = b.literal(Value::Int(2));
    let three = b.literal(Value::Int(3));
    let bound = sig
        .bind(&mut b, &[one, two, three], &[("color", one)])
        .unwrap_or_default();

    assert_eq!(bound.args.len(), 2);
    assert_eq!(bound.kwargs.len(), 2);
    let (rest_tag, rest) = argument_parts(&b, bound.args[1]);
    assert_eq!(rest_tag.kind, ParamKind::VarPositional);
    assert_eq!(rest, Value::tuple(vec![Value::Int(2), Value::Int(3)]));
    let (_, flag) = argument_parts(&b, bound.kwargs[0]);
    assert_eq!(flag, Value::Bool(false));
    let (_, options) = argument_parts(&b, bound.kwargs[1]);
    assert_eq!(
        Ok(options),
        Value::map([(Value::string("color"), Value::Int(1))])
    );
}

#[test]
fn test_bind_errors() {
    let mut b = GraphBuilder::new();
    let v = b.literal(Value::Int(1));
    let sig = add_to();

    assert_eq!(
        sig.bind(&mut b, &[v], &[]),
        Err(GraphError::Binding(
            "add_to() missing required argument: 'y'".to_owned()
        ))
    );
    assert_eq!(
        sig.bind(&mut b, &[v, v, v, v], &[]),
        Err(GraphError::Binding(
            "add_to() takes 3 positional arguments but 4 were given".to_owned()
        ))
    );
    assert_eq!(
        sig.bind(&mut b, &[v, v], &[("w", v)]),
        Err(GraphError::Binding(
            "add_to() got an unexpected keyword argument 'w'".to_owned()
        ))
    );
    assert_eq!(
        sig.bind(&mut b, &[v, v], &[("y", v)]),
        Err(GraphError::Binding(
            "add_to() got multiple values for argument 'y'".to_owned()
        ))
    );
}

#[test]
fn test_positional_only_rejects_keyword() {
    let sig = Signature::new("f", vec![Param::new("a", ParamKind::PositionalOnly)]);
    let mut b = GraphBuilder::new();
    let v = b.literal(Value::Int(1));
    assert!(matches!(
        sig.bind(&mut b, &[], &[("a", v)]),
        Err(GraphError::Binding(_))
    ));
}
