use super::*;
use pretty_assertions::assert_eq;
use retrace_value::EvalErrorKind;

fn param(name: &str) -> Binder {
    Binder::Parameter(ArgTag::positional(name))
}

fn arg(id: u32) -> Binder {
    Binder::Argument(NodeId::new(id))
}

#[test]
fn test_push_overlays_and_pop_restores() {
    let mut env = Environment::new();
    env.push([(arg(1), 1)]);
    env.push([(arg(2), 2)]);

    assert_eq!(env.lookup(&arg(1)), Ok(&1));
    assert_eq!(env.lookup(&arg(2)), Ok(&2));
    assert_eq!(env.depth(), 3);

    env.pop();
    assert!(!env.is_bound(&arg(2)));
    assert_eq!(env.lookup(&arg(1)), Ok(&1));
}

#[test]
fn test_rebinding_the_same_argument() {
    let mut env = Environment::new();
    env.push([(arg(1), 1)]);
    env.push([(arg(1), 2)]);
    assert_eq!(env.lookup(&arg(1)), Ok(&2));
    env.pop();
    assert_eq!(env.lookup(&arg(1)), Ok(&1));
}

#[test]
fn test_same_name_does_not_shadow() {
    // Parameters named `n` of two activations are distinct binders.
    let mut env = Environment::with_parameters([(ArgTag::positional("n"), 10)]);
    env.push([(arg(4), 5)]);
    assert_eq!(env.lookup(&param("n")), Ok(&10));
    assert_eq!(env.lookup(&arg(4)), Ok(&5));
    assert!(!env.is_bound(&arg(1)));
}

#[test]
fn test_missing_binding() {
    let env: Environment<i32> = Environment::new();
    let err = env.lookup(&arg(3)).err().map(|e| e.kind);
    assert_eq!(
        err,
        Some(EvalErrorKind::BindingNotFound {
            binding: "argument #3".to_owned()
        })
    );
    assert!(env.locate(&param("x")).is_err());
}

#[test]
fn test_base_frame_is_never_popped() {
    let mut env = Environment::with_parameters([(ArgTag::positional("x"), 1)]);
    env.pop();
    env.pop();
    assert_eq!(env.depth(), 1);
    assert_eq!(env.lookup(&param("x")), Ok(&1));
}

#[test]
fn test_locate_skips_frames_without_locals() {
    let mut env =
        Environment::with_parameters([(ArgTag::positional("a"), 0), (ArgTag::positional("b"), 0)]);
    env.push([(arg(1), 1), (arg(2), 2)]);
    env.push([]);
    env.push([(arg(3), 3)]);
    env.push([]);

    assert_eq!(env.locate(&arg(3)), Ok((0, 0)));
    assert_eq!(env.locate(&arg(2)), Ok((1, 1)));
    assert_eq!(env.locate(&param("b")), Ok((2, 1)));
}

#[test]
fn test_locate_finds_innermost_introduction() {
    let mut env = Environment::new();
    env.push([(arg(1), 1)]);
    env.push([(arg(2), 2), (arg(1), 3)]);
    assert_eq!(env.locate(&arg(1)), Ok((0, 1)));
}

#[test]
fn test_top_locals_in_binding_order() {
    let mut env = Environment::new();
    env.push([(arg(0), 0)]);
    env.push([(arg(2), 2), (arg(1), 1), (arg(2), 3)]);
    let locals: Vec<(Binder, i32)> = env.top_locals().map(|(b, v)| (b, *v)).collect();
    assert_eq!(locals, vec![(arg(2), 3), (arg(1), 1)]);

    env.push([]);
    assert_eq!(env.top_locals().count(), 0);
    assert!(env.is_bound(&arg(0)));
}

#[test]
fn test_shape_ignores_empty_frames() {
    let mut env = Environment::with_parameters([(ArgTag::positional("a"), 0)]);
    env.push([(arg(1), 1)]);
    let before = env.shape();
    env.push([]);
    assert_eq!(env.shape(), before);

    env.push([(arg(2), 2)]);
    assert_ne!(env.shape(), before);
    env.pop();
    env.pop();
    assert_eq!(env.shape(), before);
}
