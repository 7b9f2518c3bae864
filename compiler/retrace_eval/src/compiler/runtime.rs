//! Runtime stack for compiled closures.
//!
//! A linked list of argument tuples. Pushing shares the parent, so a frame
//! costs one allocation and outer frames are never copied. The stack also
//! carries the invocation's object table, shared by every frame pushed from
//! the same root.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use retrace_ir::NodeId;
use retrace_value::{frame_mismatch, EvalResult, Value};
use rustc_hash::FxHashMap;

struct RuntimeFrame {
    values: Vec<Value>,
    parent: Option<Rc<RuntimeFrame>>,
}

/// Argument tuples of one compiled invocation, innermost first.
#[derive(Clone, Default)]
pub struct RuntimeStack {
    top: Option<Rc<RuntimeFrame>>,
    objects: Rc<RefCell<FxHashMap<NodeId, Value>>>,
}

impl RuntimeStack {
    /// An empty stack with a fresh object table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stack with `values` on top of `self`, sharing its object table.
    #[must_use]
    pub fn push(&self, values: Vec<Value>) -> RuntimeStack {
        RuntimeStack {
            top: Some(Rc::new(RuntimeFrame {
                values,
                parent: self.top.clone(),
            })),
            objects: Rc::clone(&self.objects),
        }
    }

    /// Slot `index` of the frame `depth` levels below the top.
    pub fn get(&self, depth: usize, index: usize) -> EvalResult {
        let mut frame = self.top.as_deref();
        for _ in 0..depth {
            frame = frame.and_then(|f| f.parent.as_deref());
        }
        frame
            .and_then(|f| f.values.get(index))
            .cloned()
            .ok_or_else(|| frame_mismatch(depth, index))
    }

    /// Number of frames.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.top.as_deref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.parent.as_deref();
        }
        depth
    }

    /// Object already materialized for `id` in this invocation.
    pub fn object(&self, id: NodeId) -> Option<Value> {
        self.objects.borrow().get(&id).cloned()
    }

    pub fn record(&self, id: NodeId, object: Value) {
        self.objects.borrow_mut().insert(id, object);
    }
}

impl fmt::Debug for RuntimeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut frames = Vec::new();
        let mut frame = self.top.as_deref();
        while let Some(current) = frame {
            frames.push(&current.values);
            frame = current.parent.as_deref();
        }
        f.debug_struct("RuntimeStack")
            .field("frames", &frames)
            .field("objects", &self.objects.borrow().len())
            .finish()
    }
}
