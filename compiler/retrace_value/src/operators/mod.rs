//! Raw operator semantics.
//!
//! Numeric tower: `bool` < `int` (checked `i64`) < `float`. Integer overflow
//! is an error rather than a promotion to big integers. Floor division and
//! modulo round toward negative infinity, so `-7 // 2 == -4` and
//! `-7 % 2 == 1`.
//!
//! Objects take part through their class's dunder methods (`__add__`,
//! `__radd__`, `__neg__`, ...), looked up before the builtin rules.

use std::cmp::Ordering;

use indexmap::IndexSet;
use retrace_ir::{BinaryOp, Name, UnaryOp};

use crate::access::{get_attribute, get_item};
use crate::errors::{
    bad_unary_operand, division_by_zero, integer_overflow, modulo_by_zero, negative_shift_count,
    not_implemented, unorderable, unsupported_operands,
};
use crate::value::{Heap, Number};
use crate::{EvalResult, Value, ValueSet};

/// Apply a binary operator to two values.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    if op == BinaryOp::GetItem {
        return get_item(left, right);
    }
    if let Some(result) = dispatch_overload(left, right, op) {
        return result;
    }
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right, op)?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Some(Ordering::Less),
                BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => ordering == Some(Ordering::Greater),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            }))
        }
        _ => arithmetic(left, right, op),
    }
}

fn dispatch_overload(left: &Value, right: &Value, op: BinaryOp) -> Option<EvalResult> {
    if let Value::Object(object) = left {
        if let Some(method) = object.class().method(Name::intern(op.dunder())) {
            return Some(method.call(&[left.clone(), right.clone()], &[]));
        }
    }
    if let (Value::Object(object), Some(reflected)) = (right, op.reflected_dunder()) {
        if let Some(method) = object.class().method(Name::intern(reflected)) {
            return Some(method.call(&[right.clone(), left.clone()], &[]));
        }
    }
    None
}

/// Order two values. `Ok(None)` means unordered (a NaN was involved).
pub fn compare(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<Option<Ordering>> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(compare_numbers(a, b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some((**a).cmp(&**b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                if x != y {
                    return compare(x, y, op);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(unorderable(op.symbol(), left.type_name(), right.type_name())),
    }
}

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
        _ => to_f64(a).partial_cmp(&to_f64(b)),
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "int to float promotion follows the host language"
)]
fn to_f64(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
    }
}

fn arithmetic(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let unsupported = || unsupported_operands(op.symbol(), left.type_name(), right.type_name());

    if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
        match op {
            BinaryOp::BitAnd => return Ok(Value::Bool(a & b)),
            BinaryOp::BitOr => return Ok(Value::Bool(a | b)),
            BinaryOp::BitXor => return Ok(Value::Bool(a ^ b)),
            _ => {}
        }
    }
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => {
                int_arithmetic(x, y, op).unwrap_or_else(|| Err(unsupported()))
            }
            _ => float_arithmetic(to_f64(a), to_f64(b), op)
                .unwrap_or_else(|| Err(unsupported())),
        };
    }

    match (left, right, op) {
        (Value::Str(a), Value::Str(b), BinaryOp::Add) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        (Value::List(a), Value::List(b), BinaryOp::Add) => Ok(Value::list(concat(a, b))),
        (Value::Tuple(a), Value::Tuple(b), BinaryOp::Add) => Ok(Value::tuple(concat(a, b))),
        (sequence @ (Value::Str(_) | Value::List(_) | Value::Tuple(_)), count, BinaryOp::Mul)
        | (count, sequence @ (Value::Str(_) | Value::List(_) | Value::Tuple(_)), BinaryOp::Mul) => {
            match count.as_int() {
                Some(times) => repeat(sequence, times),
                None => Err(unsupported()),
            }
        }
        (Value::Set(a), Value::Set(b), _) => set_operation(a, b, op).ok_or_else(unsupported),
        (Value::Map(a), Value::Map(b), BinaryOp::BitOr) => {
            let mut merged = (**a).clone();
            for (key, value) in b.iter() {
                merged.insert(key.clone(), value.clone());
            }
            Ok(Value::Map(Heap::new(merged)))
        }
        (Value::Str(_), _, BinaryOp::Mod) => Err(not_implemented("printf-style formatting", "str")),
        _ => Err(unsupported()),
    }
}

fn concat(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut items = Vec::with_capacity(a.len() + b.len());
    items.extend_from_slice(a);
    items.extend_from_slice(b);
    items
}

fn repeat(sequence: &Value, times: i64) -> EvalResult {
    let times = usize::try_from(times).unwrap_or(0);
    match sequence {
        Value::Str(s) => Ok(Value::string(s.repeat(times))),
        Value::List(items) => Ok(Value::list(repeat_items(items, times))),
        Value::Tuple(items) => Ok(Value::tuple(repeat_items(items, times))),
        other => Err(unsupported_operands("*", other.type_name(), "int")),
    }
}

fn repeat_items(items: &[Value], times: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len().saturating_mul(times));
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    out
}

fn set_operation(a: &ValueSet, b: &ValueSet, op: BinaryOp) -> Option<Value> {
    let result: IndexSet<Value> = match op {
        BinaryOp::BitAnd => a.intersection(b).cloned().collect(),
        BinaryOp::BitOr => a.union(b).cloned().collect(),
        BinaryOp::BitXor => a.symmetric_difference(b).cloned().collect(),
        BinaryOp::Sub => a.difference(b).cloned().collect(),
        _ => return None,
    };
    Some(Value::Set(Heap::new(result)))
}

/// Floor division; `None` on overflow (`i64::MIN // -1`).
fn floor_div(x: i64, y: i64) -> Option<i64> {
    let q = x.checked_div(y)?;
    if x % y != 0 && ((x < 0) != (y < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Modulo with the sign of the divisor.
fn floor_mod(x: i64, y: i64) -> i64 {
    let r = x.wrapping_rem(y);
    if r != 0 && ((r < 0) != (y < 0)) {
        r + y
    } else {
        r
    }
}

// `None` means the operator has no integer meaning.
fn int_arithmetic(x: i64, y: i64, op: BinaryOp) -> Option<EvalResult> {
    let checked = |result: Option<i64>, operation: &str| {
        result
            .map(Value::Int)
            .ok_or_else(|| integer_overflow(operation))
    };
    Some(match op {
        BinaryOp::Add => checked(x.checked_add(y), "addition"),
        BinaryOp::Sub => checked(x.checked_sub(y), "subtraction"),
        BinaryOp::Mul => checked(x.checked_mul(y), "multiplication"),
        BinaryOp::TrueDiv => {
            if y == 0 {
                Err(division_by_zero())
            } else {
                Ok(Value::Float(to_f64(Number::Int(x)) / to_f64(Number::Int(y))))
            }
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                Err(division_by_zero())
            } else {
                checked(floor_div(x, y), "floor division")
            }
        }
        BinaryOp::Mod => {
            if y == 0 {
                Err(modulo_by_zero())
            } else {
                Ok(Value::Int(floor_mod(x, y)))
            }
        }
        BinaryOp::DivMod => {
            if y == 0 {
                Err(division_by_zero())
            } else {
                checked(floor_div(x, y), "divmod")
                    .map(|q| Value::tuple(vec![q, Value::Int(floor_mod(x, y))]))
            }
        }
        BinaryOp::Pow => int_pow(x, y),
        BinaryOp::LShift => shift_left(x, y),
        BinaryOp::RShift => shift_right(x, y),
        BinaryOp::BitAnd => Ok(Value::Int(x & y)),
        BinaryOp::BitXor => Ok(Value::Int(x ^ y)),
        BinaryOp::BitOr => Ok(Value::Int(x | y)),
        _ => return None,
    })
}

fn int_pow(base: i64, exponent: i64) -> EvalResult {
    if exponent >= 0 {
        u32::try_from(exponent)
            .ok()
            .and_then(|e| base.checked_pow(e))
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("exponentiation"))
    } else if base == 0 {
        Err(division_by_zero())
    } else {
        Ok(Value::Float(
            to_f64(Number::Int(base)).powf(to_f64(Number::Int(exponent))),
        ))
    }
}

fn shift_left(x: i64, y: i64) -> EvalResult {
    if y < 0 {
        return Err(negative_shift_count());
    }
    if x == 0 {
        return Ok(Value::Int(0));
    }
    let shifted = u32::try_from(y)
        .ok()
        .and_then(|s| x.checked_shl(s).filter(|r| *r >> s == x));
    shifted
        .map(Value::Int)
        .ok_or_else(|| integer_overflow("left shift"))
}

fn shift_right(x: i64, y: i64) -> EvalResult {
    if y < 0 {
        return Err(negative_shift_count());
    }
    Ok(Value::Int(match u32::try_from(y) {
        Ok(s) if s < 64 => x >> s,
        _ if x < 0 => -1,
        _ => 0,
    }))
}

fn float_arithmetic(x: f64, y: f64, op: BinaryOp) -> Option<EvalResult> {
    Some(match op {
        BinaryOp::Add => Ok(Value::Float(x + y)),
        BinaryOp::Sub => Ok(Value::Float(x - y)),
        BinaryOp::Mul => Ok(Value::Float(x * y)),
        BinaryOp::TrueDiv if y == 0.0 => Err(division_by_zero()),
        BinaryOp::TrueDiv => Ok(Value::Float(x / y)),
        BinaryOp::FloorDiv if y == 0.0 => Err(division_by_zero()),
        BinaryOp::FloorDiv => Ok(Value::Float((x / y).floor())),
        BinaryOp::Mod if y == 0.0 => Err(modulo_by_zero()),
        BinaryOp::Mod => Ok(Value::Float(float_mod(x, y))),
        BinaryOp::DivMod if y == 0.0 => Err(division_by_zero()),
        BinaryOp::DivMod => Ok(Value::tuple(vec![
            Value::Float((x / y).floor()),
            Value::Float(float_mod(x, y)),
        ])),
        BinaryOp::Pow if x == 0.0 && y < 0.0 => Err(division_by_zero()),
        BinaryOp::Pow if x < 0.0 && y.fract() != 0.0 => {
            Err(not_implemented("complex result of **", "float"))
        }
        BinaryOp::Pow => Ok(Value::Float(x.powf(y))),
        _ => return None,
    })
}

fn float_mod(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
        r + y
    } else {
        r
    }
}

/// Apply a unary operator to a value.
pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult {
    match op {
        UnaryOp::GetAttr(name) => return get_attribute(operand, name),
        UnaryOp::SetAttr(_) => return Ok(operand.clone()),
        _ => {}
    }

    if let (Value::Object(object), Some(dunder)) = (operand, op.dunder()) {
        if let Some(method) = object.class().method(Name::intern(dunder)) {
            return method.call(&[operand.clone()], &[]);
        }
    }

    match (op, operand.as_number()) {
        (UnaryOp::Neg, Some(Number::Int(i))) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("negation")),
        (UnaryOp::Neg, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(f))) => Ok(Value::Float(f)),
        (UnaryOp::Invert, Some(Number::Int(i))) => Ok(Value::Int(!i)),
        (UnaryOp::Abs, Some(Number::Int(i))) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("abs")),
        (UnaryOp::Abs, Some(Number::Float(f))) => Ok(Value::Float(f.abs())),
        _ => Err(bad_unary_operand(op.symbol(), operand.type_name())),
    }
}
