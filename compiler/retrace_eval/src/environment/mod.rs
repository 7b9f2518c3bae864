//! Frame stack mapping binders to back-end outputs.
//!
//! Each frame is a full copy of the frame below it overlaid with its own
//! bindings, so `lookup` only ever reads the top frame. Frames also remember
//! which binders they introduced themselves (`locals`); those are the frames
//! the compiler materializes as runtime tuples, and `locate` counts only
//! them when computing a lexical address.
//!
//! `Argument` nodes are bound by identity. Two parameters that share a name
//! in different activations never shadow each other; only root parameters
//! are matched by tag.

use std::fmt;

use retrace_ir::{ArgTag, NodeId};
use retrace_value::{binding_not_found, EvalResult};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// What a frame slot is bound to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Binder {
    /// A root parameter, supplied from outside the graph.
    Parameter(ArgTag),
    /// The `Argument` node with this id.
    Argument(NodeId),
}

impl From<ArgTag> for Binder {
    fn from(tag: ArgTag) -> Self {
        Binder::Parameter(tag)
    }
}

impl From<NodeId> for Binder {
    fn from(id: NodeId) -> Self {
        Binder::Argument(id)
    }
}

impl fmt::Display for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binder::Parameter(tag) => write!(f, "parameter {tag}"),
            Binder::Argument(id) => write!(f, "argument {id}"),
        }
    }
}

/// Locals of every frame that has any, innermost first.
///
/// Lexical addresses depend on nothing else, so two points of a traversal
/// with equal shapes resolve every binder to the same `(depth, index)`.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct LexicalShape(Vec<SmallVec<[Binder; 4]>>);

#[derive(Clone, Debug)]
struct Frame<T> {
    bindings: FxHashMap<Binder, T>,
    /// Binders introduced by this frame, in binding order, without duplicates.
    locals: SmallVec<[Binder; 4]>,
}

impl<T> Default for Frame<T> {
    fn default() -> Self {
        Frame {
            bindings: FxHashMap::default(),
            locals: SmallVec::new(),
        }
    }
}

impl<T: Clone> Frame<T> {
    fn overlay(&self, bindings: impl IntoIterator<Item = (Binder, T)>) -> Self {
        let mut frame = Frame {
            bindings: self.bindings.clone(),
            locals: SmallVec::new(),
        };
        frame.bind(bindings);
        frame
    }

    fn bind(&mut self, bindings: impl IntoIterator<Item = (Binder, T)>) {
        for (binder, value) in bindings {
            self.bindings.insert(binder, value);
            if !self.locals.contains(&binder) {
                self.locals.push(binder);
            }
        }
    }
}

/// Stack of argument frames. The base frame is never popped.
#[derive(Clone, Debug)]
pub struct Environment<T> {
    frames: Vec<Frame<T>>,
}

impl<T: Clone> Default for Environment<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Environment<T> {
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame::default()],
        }
    }

    /// An environment whose base frame binds the root parameters.
    pub fn with_parameters(parameters: impl IntoIterator<Item = (ArgTag, T)>) -> Self {
        let mut base = Frame::default();
        base.bind(
            parameters
                .into_iter()
                .map(|(tag, value)| (Binder::Parameter(tag), value)),
        );
        Environment { frames: vec![base] }
    }

    fn top(&self) -> &Frame<T> {
        // `frames` always holds the base frame.
        &self.frames[self.frames.len() - 1]
    }

    pub fn push(&mut self, bindings: impl IntoIterator<Item = (Binder, T)>) {
        let frame = self.top().overlay(bindings);
        self.frames.push(frame);
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        } else {
            tracing::warn!("attempted to pop the base frame");
        }
    }

    pub fn lookup(&self, binder: &Binder) -> EvalResult<&T> {
        self.top()
            .bindings
            .get(binder)
            .ok_or_else(|| binding_not_found(binder))
    }

    pub fn is_bound(&self, binder: &Binder) -> bool {
        self.top().bindings.contains_key(binder)
    }

    /// Lexical address `(depth, index)` of `binder`: `depth` counts the
    /// frames with locals between the top and the frame that introduced it,
    /// `index` is its position among that frame's locals.
    pub fn locate(&self, binder: &Binder) -> EvalResult<(usize, usize)> {
        let mut depth = 0;
        for frame in self.frames.iter().rev() {
            if frame.locals.is_empty() {
                continue;
            }
            if let Some(index) = frame.locals.iter().position(|local| local == binder) {
                return Ok((depth, index));
            }
            depth += 1;
        }
        Err(binding_not_found(binder))
    }

    pub fn shape(&self) -> LexicalShape {
        LexicalShape(
            self.frames
                .iter()
                .rev()
                .filter(|frame| !frame.locals.is_empty())
                .map(|frame| frame.locals.clone())
                .collect(),
        )
    }

    /// Bindings introduced by the top frame, in binding order.
    pub fn top_locals(&self) -> impl Iterator<Item = (Binder, &T)> + '_ {
        let top = self.top();
        top.locals
            .iter()
            .filter_map(move |binder| top.bindings.get(binder).map(|value| (*binder, value)))
    }

    /// Number of frames, base frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests;
