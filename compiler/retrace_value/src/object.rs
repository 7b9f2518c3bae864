//! Reference types: classes, object instances, native functions.
//!
//! All three compare by identity. Objects carry an interior-mutable field
//! map so that an instance allocated as a shell can have its fields installed
//! later, after the constructor arguments are known.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use retrace_ir::Name;
use rustc_hash::FxHashMap;

use crate::{EvalResult, Value};

/// Signature of a native callable: positional arguments, keyword arguments.
pub type NativeFn = dyn Fn(&[Value], &[(Name, Value)]) -> EvalResult + Send + Sync;

struct Function {
    name: Name,
    func: Box<NativeFn>,
}

/// Shared handle to a native function.
#[derive(Clone)]
pub struct FunctionRef(Arc<Function>);

impl FunctionRef {
    pub fn new(
        name: &str,
        func: impl Fn(&[Value], &[(Name, Value)]) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        FunctionRef(Arc::new(Function {
            name: Name::intern(name),
            func: Box::new(func),
        }))
    }

    pub fn name(&self) -> Name {
        self.0.name
    }

    pub fn call(&self, args: &[Value], kwargs: &[(Name, Value)]) -> EvalResult {
        (self.0.func)(args, kwargs)
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionRef({})", self.0.name)
    }
}

/// Class definition: a name plus native methods.
pub struct Class {
    name: Name,
    methods: FxHashMap<Name, FunctionRef>,
}

impl Class {
    pub fn new(name: &str) -> Self {
        Class {
            name: Name::intern(name),
            methods: FxHashMap::default(),
        }
    }

    /// Register a method. The receiver is passed as the first positional
    /// argument.
    #[must_use]
    pub fn with_method(mut self, name: &str, function: FunctionRef) -> Self {
        self.methods.insert(Name::intern(name), function);
        self
    }
}

/// Shared handle to a class.
#[derive(Clone)]
pub struct ClassRef(Arc<Class>);

impl ClassRef {
    pub fn new(class: Class) -> Self {
        ClassRef(Arc::new(class))
    }

    pub fn name(&self) -> Name {
        self.0.name
    }

    pub fn method(&self, name: Name) -> Option<&FunctionRef> {
        self.0.methods.get(&name)
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl From<Class> for ClassRef {
    fn from(class: Class) -> Self {
        ClassRef::new(class)
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.0.name)
    }
}

struct ObjectData {
    class: ClassRef,
    fields: RwLock<IndexMap<Name, Value>>,
}

/// Instance of a [`Class`], compared by identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    /// Allocate an instance with no fields. No initializer runs.
    pub fn new(class: ClassRef) -> Self {
        ObjectRef(Arc::new(ObjectData {
            class,
            fields: RwLock::new(IndexMap::new()),
        }))
    }

    pub fn class(&self) -> &ClassRef {
        &self.0.class
    }

    pub fn field(&self, name: Name) -> Option<Value> {
        self.0.fields.read().get(&name).cloned()
    }

    pub fn set_field(&self, name: Name, value: Value) {
        self.0.fields.write().insert(name, value);
    }

    /// Replace the whole field map.
    pub fn install_fields(&self, fields: IndexMap<Name, Value>) {
        *self.0.fields.write() = fields;
    }

    /// Snapshot of the fields in assignment order.
    pub fn fields(&self) -> IndexMap<Name, Value> {
        self.0.fields.read().clone()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:#x})", self.0.class.name(), self.addr())
    }
}

/// A method looked up on an instance; calling it prepends the receiver.
#[derive(Clone, Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub function: FunctionRef,
}
