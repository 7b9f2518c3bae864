//! Runtime values.
//!
//! Heap payloads go through [`Heap<T>`], an `Arc` wrapper with a crate-private
//! constructor: values are built with the factory methods on [`Value`]
//! (`Value::list`, `Value::map`, ...), which is where hashability of map keys
//! and set elements is enforced.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::errors::{unhashable, EvalResult};
use crate::object::{BoundMethod, ClassRef, FunctionRef, ObjectRef};

/// Insertion-ordered mapping with hashable keys.
pub type ValueMap = IndexMap<Value, Value>;

/// Insertion-ordered set of hashable values.
pub type ValueSet = IndexSet<Value>;

/// Shared, immutable heap payload.
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    pub(crate) fn from_arc(arc: Arc<T>) -> Self {
        Heap(arc)
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// `slice(start, stop, step)`; each bound is `None` or an integer.
#[derive(Clone, PartialEq, Debug)]
pub struct SliceValue {
    pub start: Value,
    pub stop: Value,
    pub step: Value,
}

/// A concrete runtime value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Heap<str>),
    List(Heap<Vec<Value>>),
    Tuple(Heap<Vec<Value>>),
    Map(Heap<ValueMap>),
    Set(Heap<ValueSet>),
    Slice(Heap<SliceValue>),
    Object(ObjectRef),
    Class(ClassRef),
    Function(FunctionRef),
    BoundMethod(Heap<BoundMethod>),
}

/// Numeric view used by arithmetic and comparisons; `bool` counts as `int`.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

// Floats in this range have an exact `i64` counterpart when integral.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

#[allow(
    clippy::cast_possible_truncation,
    reason = "range and integrality are checked before the cast"
)]
pub(crate) fn integral_float(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

impl Value {
    // Factory methods

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Heap::from_arc(Arc::from(s.as_ref())))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Heap::new(items))
    }

    /// Build a mapping; later duplicate keys overwrite earlier ones.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> EvalResult {
        let mut map = ValueMap::new();
        for (key, value) in entries {
            key.check_hashable()?;
            map.insert(key, value);
        }
        Ok(Value::Map(Heap::new(map)))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> EvalResult {
        let mut set = ValueSet::new();
        for item in items {
            item.check_hashable()?;
            set.insert(item);
        }
        Ok(Value::Set(Heap::new(set)))
    }

    pub fn slice(start: Value, stop: Value, step: Value) -> Self {
        Value::Slice(Heap::new(SliceValue { start, stop, step }))
    }

    pub fn bound_method(receiver: Value, function: FunctionRef) -> Self {
        Value::BoundMethod(Heap::new(BoundMethod { receiver, function }))
    }

    // Inspection

    /// Host-language type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "dict",
            Value::Set(_) => "set",
            Value::Slice(_) => "slice",
            Value::Object(object) => object.class().name().as_str(),
            Value::Class(_) => "type",
            Value::Function(_) => "builtin_function_or_method",
            Value::BoundMethod(_) => "method",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Integer view of `int` and `bool`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Whether the value may be used as a mapping key or set element.
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Map(_) | Value::Set(_) | Value::Slice(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            Value::BoundMethod(method) => method.receiver.is_hashable(),
            _ => true,
        }
    }

    pub fn check_hashable(&self) -> EvalResult<()> {
        if self.is_hashable() {
            Ok(())
        } else {
            Err(unhashable(self.unhashable_part().type_name()))
        }
    }

    // The element that makes a tuple unhashable, for the error message.
    fn unhashable_part(&self) -> &Value {
        match self {
            Value::Tuple(items) => items
                .iter()
                .find(|item| !item.is_hashable())
                .map_or(self, Value::unhashable_part),
            _ => self,
        }
    }

    /// Identity comparison for reference types, equality otherwise.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => ObjectRef::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                Heap::ptr_eq(a, b)
            }
            (Value::Map(a), Value::Map(b)) => Heap::ptr_eq(a, b),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return numbers_equal(a, b);
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => **a == **b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && a.iter().all(|k| b.contains(k)),
            (Value::Slice(a), Value::Slice(b)) => **a == **b,
            (Value::Object(a), Value::Object(b)) => ObjectRef::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => ClassRef::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => FunctionRef::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => {
                FunctionRef::ptr_eq(&a.function, &b.function) && a.receiver == b.receiver
            }
            _ => false,
        }
    }
}

// NaN breaks reflexivity exactly as it does in the host language.
impl Eq for Value {}

#[allow(clippy::float_cmp, reason = "host-language float equality")]
fn numbers_equal(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x == y,
        (Number::Float(x), Number::Float(y)) => x == y,
        (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => {
            integral_float(f) == Some(i)
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equal numbers must hash equally across int, float and bool.
        if let Some(number) = self.as_number() {
            match number {
                Number::Int(i) => hash_int(i, state),
                Number::Float(f) => match integral_float(f) {
                    Some(i) => hash_int(i, state),
                    None => {
                        1u8.hash(state);
                        f.to_bits().hash(state);
                    }
                },
            }
            return;
        }
        match self {
            Value::Str(s) => {
                2u8.hash(state);
                (**s).hash(state);
            }
            Value::Tuple(items) | Value::List(items) => {
                3u8.hash(state);
                items.len().hash(state);
                for item in items.iter() {
                    item.hash(state);
                }
            }
            // Order-insensitive equality: only the size is stable.
            Value::Map(map) => {
                4u8.hash(state);
                map.len().hash(state);
            }
            Value::Set(set) => {
                5u8.hash(state);
                set.len().hash(state);
            }
            Value::Slice(slice) => {
                6u8.hash(state);
                slice.start.hash(state);
                slice.stop.hash(state);
                slice.step.hash(state);
            }
            Value::Object(object) => {
                7u8.hash(state);
                object.addr().hash(state);
            }
            Value::Class(class) => {
                8u8.hash(state);
                class.addr().hash(state);
            }
            Value::Function(function) => {
                9u8.hash(state);
                function.addr().hash(state);
            }
            Value::BoundMethod(method) => {
                10u8.hash(state);
                method.function.addr().hash(state);
                method.receiver.hash(state);
            }
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) => 11u8.hash(state),
        }
    }
}

fn hash_int<H: Hasher>(i: i64, state: &mut H) {
    0u8.hash(state);
    i.hash(state);
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Host-language `repr`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => write_str_repr(f, s),
            Value::List(items) => {
                f.write_str("[")?;
                write_seq(f, items.iter())?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_seq(f, items.iter())?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Set(set) if set.is_empty() => f.write_str("set()"),
            Value::Set(set) => {
                f.write_str("{")?;
                write_seq(f, set.iter())?;
                f.write_str("}")
            }
            Value::Slice(slice) => {
                write!(f, "slice({}, {}, {})", slice.start, slice.stop, slice.step)
            }
            Value::Object(object) => write!(f, "<{} object>", object.class().name()),
            Value::Class(class) => write!(f, "<class '{}'>", class.name()),
            Value::Function(function) => write!(f, "<built-in function {}>", function.name()),
            Value::BoundMethod(method) => write!(
                f,
                "<bound method {}.{}>",
                method.receiver.type_name(),
                method.function.name()
            ),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Value::Class(class)
    }
}

impl From<FunctionRef> for Value {
    fn from(function: FunctionRef) -> Self {
        Value::Function(function)
    }
}
