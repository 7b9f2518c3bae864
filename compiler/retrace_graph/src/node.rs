//! Node model.

use indexmap::IndexMap;
use retrace_ir::{ArgTag, BinaryOp, Name, NodeId, NodeRange, UnaryOp};
use retrace_value::{ClassRef, Value};

use crate::Deep;

/// Index of a shell record in a `TraceGraph`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ShellId(u32);

impl ShellId {
    pub(crate) fn from_index(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(raw) => ShellId(raw),
            Err(_) => panic!("trace graph exceeded {} shells", u32::MAX),
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether an invocation targets a free function or a method.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CallKind {
    Function,
    Method,
}

/// Traced invocation. `args`/`kwargs` index `Argument` nodes in the graph's
/// node lists.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CallSite {
    pub callable: NodeId,
    pub args: NodeRange,
    pub kwargs: NodeRange,
    pub ret: NodeId,
}

/// Construction of an instance from its shell.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ConstructSite {
    pub shell: NodeId,
    pub args: NodeRange,
    pub kwargs: NodeRange,
}

/// Invocation of an opaque callable. `args` index the graph's node lists,
/// `kwargs` its keyword lists.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct UntracedSite {
    pub callable: NodeId,
    pub args: NodeRange,
    pub kwargs: NodeRange,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct KeywordArg {
    pub name: Name,
    pub value: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Literal,
    Container(Deep<NodeId>),
    Argument { tag: ArgTag, bound: NodeId },
    Unary { op: UnaryOp, operand: NodeId },
    Binary { op: BinaryOp, left: NodeId, right: NodeId },
    Shell(ShellId),
    Construct(ConstructSite),
    Call(CallSite),
    Dispatch(CallSite),
    UntracedCall(UntracedSite),
    UntracedDispatch(UntracedSite),
}

/// An immutable graph node and the value it produced while recording.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) value: Value,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Snapshot taken while recording.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Short variant name for renderers.
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            NodeKind::Literal => "Literal",
            NodeKind::Container(_) => "Container",
            NodeKind::Argument { .. } => "Argument",
            NodeKind::Unary {
                op: UnaryOp::GetAttr(_),
                ..
            } => "GetAttr",
            NodeKind::Unary {
                op: UnaryOp::SetAttr(_),
                ..
            } => "SetAttr",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Binary {
                op: BinaryOp::GetItem,
                ..
            } => "GetItem",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Shell(_) => "Shell",
            NodeKind::Construct(_) => "Construct",
            NodeKind::Call(_) => "Call",
            NodeKind::Dispatch(_) => "Dispatch",
            NodeKind::UntracedCall(_) => "UntracedCall",
            NodeKind::UntracedDispatch(_) => "UntracedDispatch",
        }
    }
}

/// Field assignments recorded on a shell.
///
/// `Open` while the constructor runs, `Sealed` once it has returned. Only
/// sealed shells can be evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum ShellState {
    Open(IndexMap<Name, NodeId>),
    Sealed(IndexMap<Name, NodeId>),
}

impl ShellState {
    pub fn fields(&self) -> &IndexMap<Name, NodeId> {
        match self {
            ShellState::Open(fields) | ShellState::Sealed(fields) => fields,
        }
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self, ShellState::Sealed(_))
    }
}

#[derive(Clone, Debug)]
pub struct ShellRecord {
    pub class: ClassRef,
    pub state: ShellState,
}

impl ShellRecord {
    pub(crate) fn new(class: ClassRef) -> Self {
        ShellRecord {
            class,
            state: ShellState::Open(IndexMap::new()),
        }
    }

    /// Record `field = node`; a later assignment to the same field wins but
    /// keeps the original position. Returns `false` once sealed.
    pub(crate) fn assign(&mut self, field: Name, node: NodeId) -> bool {
        match &mut self.state {
            ShellState::Open(fields) => {
                fields.insert(field, node);
                true
            }
            ShellState::Sealed(_) => false,
        }
    }

    pub(crate) fn seal(&mut self) {
        let fields = match &mut self.state {
            ShellState::Open(fields) => std::mem::take(fields),
            ShellState::Sealed(_) => return,
        };
        self.state = ShellState::Sealed(fields);
    }

    /// The sealed field map, `None` while still open.
    pub fn sealed_fields(&self) -> Option<&IndexMap<Name, NodeId>> {
        match &self.state {
            ShellState::Sealed(fields) => Some(fields),
            ShellState::Open(_) => None,
        }
    }
}
