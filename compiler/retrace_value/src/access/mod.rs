//! Attribute access, item access and invocation.

use indexmap::IndexMap;
use retrace_ir::Name;

use crate::errors::{
    attribute_not_found, bad_argument, index_out_of_range, invalid_index_type, key_not_found,
    not_callable, not_implemented, not_subscriptable, slice_step_zero,
};
use crate::{EvalResult, ObjectRef, SliceValue, Value};

/// `value.name`
///
/// Instance fields shadow class methods; a method found on the class is
/// returned bound to the instance.
pub fn get_attribute(value: &Value, name: Name) -> EvalResult {
    match value {
        Value::Object(object) => {
            if let Some(field) = object.field(name) {
                return Ok(field);
            }
            object
                .class()
                .method(name)
                .map(|method| Value::bound_method(value.clone(), method.clone()))
                .ok_or_else(|| attribute_not_found(value.type_name(), name.as_str()))
        }
        Value::Class(class) => class
            .method(name)
            .map(|method| Value::Function(method.clone()))
            .ok_or_else(|| attribute_not_found(class.name().as_str(), name.as_str())),
        Value::Slice(slice) => match name.as_str() {
            "start" => Ok(slice.start.clone()),
            "stop" => Ok(slice.stop.clone()),
            "step" => Ok(slice.step.clone()),
            other => Err(attribute_not_found("slice", other)),
        },
        Value::BoundMethod(method) if name.as_str() == "__self__" => Ok(method.receiver.clone()),
        _ => Err(attribute_not_found(value.type_name(), name.as_str())),
    }
}

enum Selection {
    One(usize),
    Many(Vec<usize>),
}

fn select(len: usize, index: &Value, type_name: &'static str) -> EvalResult<Selection> {
    if let Some(i) = index.as_int() {
        let out_of_range = || index_out_of_range(type_name);
        let len = i64::try_from(len).map_err(|_| out_of_range())?;
        let position = if i < 0 { i + len } else { i };
        if position < 0 || position >= len {
            return Err(out_of_range());
        }
        return usize::try_from(position)
            .map(Selection::One)
            .map_err(|_| out_of_range());
    }
    match index {
        Value::Slice(slice) => slice_indices(slice, len).map(Selection::Many),
        _ => Err(invalid_index_type(type_name, index.type_name())),
    }
}

fn slice_bound(bound: &Value) -> EvalResult<Option<i64>> {
    match bound {
        Value::None => Ok(None),
        other => other.as_int().map(Some).ok_or_else(|| {
            bad_argument("slice indices must be integers or None or have an __index__ method")
        }),
    }
}

/// Positions selected by `slice` over a sequence of length `len`, with the
/// host language's clamping rules for out-of-range and negative bounds.
pub fn slice_indices(slice: &SliceValue, len: usize) -> EvalResult<Vec<usize>> {
    let len = i64::try_from(len).map_err(|_| index_out_of_range("slice"))?;
    let step = slice_bound(&slice.step)?.unwrap_or(1);
    if step == 0 {
        return Err(slice_step_zero());
    }
    let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
    let clamp = |bound: Option<i64>, default: i64| match bound {
        None => default,
        Some(b) if b < 0 => (b + len).max(lower),
        Some(b) => b.min(upper),
    };
    let start = clamp(
        slice_bound(&slice.start)?,
        if step < 0 { upper } else { lower },
    );
    let stop = clamp(
        slice_bound(&slice.stop)?,
        if step < 0 { lower } else { upper },
    );

    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(position) = usize::try_from(i) {
            positions.push(position);
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(positions)
}

/// `container[index]`
pub fn get_item(container: &Value, index: &Value) -> EvalResult {
    match container {
        Value::List(items) => Ok(match select(items.len(), index, "list")? {
            Selection::One(i) => items[i].clone(),
            Selection::Many(positions) => {
                Value::list(positions.into_iter().map(|i| items[i].clone()).collect())
            }
        }),
        Value::Tuple(items) => Ok(match select(items.len(), index, "tuple")? {
            Selection::One(i) => items[i].clone(),
            Selection::Many(positions) => {
                Value::tuple(positions.into_iter().map(|i| items[i].clone()).collect())
            }
        }),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(match select(chars.len(), index, "string")? {
                Selection::One(i) => Value::string(chars[i].to_string()),
                Selection::Many(positions) => {
                    Value::string(positions.into_iter().map(|i| chars[i]).collect::<String>())
                }
            })
        }
        Value::Map(map) => {
            index.check_hashable()?;
            map.get(index).cloned().ok_or_else(|| key_not_found(index))
        }
        Value::Object(object) => match object.class().method(Name::intern("__getitem__")) {
            Some(method) => method.call(&[container.clone(), index.clone()], &[]),
            None => Err(not_subscriptable(container.type_name())),
        },
        _ => Err(not_subscriptable(container.type_name())),
    }
}

/// Invoke a callable value.
///
/// Calling a class allocates an instance and runs its `__init__` method,
/// if any, with the instance as receiver.
pub fn call_value(callable: &Value, args: &[Value], kwargs: &[(Name, Value)]) -> EvalResult {
    match callable {
        Value::Function(function) => function.call(args, kwargs),
        Value::BoundMethod(method) => {
            method
                .function
                .call(&with_receiver(&method.receiver, args), kwargs)
        }
        Value::Class(class) => {
            let object = Value::Object(ObjectRef::new(class.clone()));
            match class.method(Name::intern("__init__")) {
                Some(init) => {
                    init.call(&with_receiver(&object, args), kwargs)?;
                }
                None if !args.is_empty() || !kwargs.is_empty() => {
                    return Err(bad_argument(format!("{}() takes no arguments", class.name())));
                }
                None => {}
            }
            Ok(object)
        }
        Value::Object(object) => match object.class().method(Name::intern("__call__")) {
            Some(method) => method.call(&with_receiver(callable, args), kwargs),
            None => Err(not_callable(callable.type_name())),
        },
        _ => Err(not_callable(callable.type_name())),
    }
}

fn with_receiver(receiver: &Value, args: &[Value]) -> Vec<Value> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push(receiver.clone());
    full.extend_from_slice(args);
    full
}

/// Replace the field map of an object wholesale.
pub fn install_fields(target: &Value, fields: IndexMap<Name, Value>) -> EvalResult<()> {
    match target {
        Value::Object(object) => {
            object.install_fields(fields);
            Ok(())
        }
        other => Err(not_implemented("field installation", other.type_name())),
    }
}
