use super::*;
use pretty_assertions::assert_eq;
use retrace_ir::ArgTag;

#[test]
fn test_messages_follow_host_wording() {
    assert_eq!(
        unsupported_operands("+", "int", "str").to_string(),
        "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
    );
    assert_eq!(
        division_by_zero().to_string(),
        "ZeroDivisionError: division by zero"
    );
    assert_eq!(
        attribute_not_found("AddX", "y").to_string(),
        "AttributeError: 'AddX' object has no attribute 'y'"
    );
    assert_eq!(
        key_not_found(&Value::string("k")).to_string(),
        "KeyError: 'k'"
    );
}

#[test]
fn test_at_node_keeps_innermost() {
    let err = division_by_zero()
        .at_node(NodeId::new(3))
        .at_node(NodeId::new(7));
    assert_eq!(err.node, Some(NodeId::new(3)));
}

#[test]
fn test_internal_classification() {
    assert!(binding_not_found(ArgTag::positional("x")).is_internal());
    assert!(not_implemented("@", "int").is_internal());
    assert!(frame_mismatch(1, 0).is_internal());
    assert!(unknown_node(NodeId::new(9)).is_internal());
    assert!(!division_by_zero().is_internal());
    assert!(!raised("boom").is_internal());
}

#[test]
fn test_unsealed_shell_is_pinned() {
    let err = unsealed_shell(NodeId::new(4));
    assert_eq!(err.node, Some(NodeId::new(4)));
    assert!(err.is_internal());
}
