//! The trace graph arena.
//!
//! Nodes live in one `Vec` indexed by [`NodeId`]. Variable-length operand
//! lists (call arguments, keyword arguments) are flattened into side vectors
//! and referenced by [`NodeRange`], so `NodeKind` stays small and `Clone`.

use std::fmt;

use retrace_ir::{Name, NodeId, NodeRange};
use retrace_value::Value;
use rustc_hash::FxHashSet;

use crate::node::{KeywordArg, Node, NodeKind, ShellId, ShellRecord};

/// Immutable arena of recorded nodes.
#[derive(Clone, Debug, Default)]
pub struct TraceGraph {
    nodes: Vec<Node>,
    node_lists: Vec<NodeId>,
    keyword_lists: Vec<KeywordArg>,
    shells: Vec<ShellRecord>,
}

impl TraceGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// # Panics
    /// Panics if `id` does not belong to this graph.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Snapshot recorded for `id`.
    #[inline]
    pub fn value(&self, id: NodeId) -> &Value {
        &self.node(id).value
    }

    pub fn node_list(&self, range: NodeRange) -> &[NodeId] {
        &self.node_lists[range.indices()]
    }

    pub fn keyword_list(&self, range: NodeRange) -> &[KeywordArg] {
        &self.keyword_lists[range.indices()]
    }

    pub fn shell(&self, id: ShellId) -> &ShellRecord {
        &self.shells[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    pub(crate) fn push(&mut self, kind: NodeKind, value: Value) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node { kind, value });
        id
    }

    pub(crate) fn push_list(&mut self, ids: &[NodeId]) -> NodeRange {
        let range = NodeRange::new(list_index(self.node_lists.len()), list_index(ids.len()));
        self.node_lists.extend_from_slice(ids);
        range
    }

    pub(crate) fn push_keywords(&mut self, keywords: &[KeywordArg]) -> NodeRange {
        let range = NodeRange::new(
            list_index(self.keyword_lists.len()),
            list_index(keywords.len()),
        );
        self.keyword_lists.extend_from_slice(keywords);
        range
    }

    pub(crate) fn push_shell(&mut self, record: ShellRecord) -> ShellId {
        let id = ShellId::from_index(self.shells.len());
        self.shells.push(record);
        id
    }

    pub(crate) fn shell_mut(&mut self, id: ShellId) -> &mut ShellRecord {
        &mut self.shells[id.index()]
    }

    pub(crate) fn shells(&self) -> impl Iterator<Item = &ShellRecord> {
        self.shells.iter()
    }

    /// Outgoing edges of `id`, in operand order.
    pub fn edges(&self, id: NodeId) -> Vec<Edge> {
        let mut edges = Vec::new();
        let mut add = |label: EdgeLabel, target: NodeId| edges.push(Edge { label, target });
        match self.kind(id) {
            NodeKind::Literal => {}
            NodeKind::Container(shape) => {
                for (i, target) in shape.nodes().into_iter().enumerate() {
                    add(EdgeLabel::Item(i), *target);
                }
            }
            NodeKind::Argument { bound, .. } => add(EdgeLabel::Bound, *bound),
            NodeKind::Unary { operand, .. } => add(EdgeLabel::Operand, *operand),
            NodeKind::Binary { left, right, .. } => {
                add(EdgeLabel::Left, *left);
                add(EdgeLabel::Right, *right);
            }
            NodeKind::Shell(shell) => {
                for (name, target) in self.shell(*shell).state.fields() {
                    add(EdgeLabel::Attribute(*name), *target);
                }
            }
            NodeKind::Construct(site) => {
                add(EdgeLabel::Shell, site.shell);
                self.argument_edges(site.args, site.kwargs, &mut add);
            }
            NodeKind::Call(site) | NodeKind::Dispatch(site) => {
                add(EdgeLabel::Callable, site.callable);
                self.argument_edges(site.args, site.kwargs, &mut add);
                add(EdgeLabel::Return, site.ret);
            }
            NodeKind::UntracedCall(site) | NodeKind::UntracedDispatch(site) => {
                add(EdgeLabel::Callable, site.callable);
                for (i, arg) in self.node_list(site.args).iter().enumerate() {
                    add(EdgeLabel::Arg(i), *arg);
                }
                for keyword in self.keyword_list(site.kwargs) {
                    add(EdgeLabel::Kwarg(keyword.name), keyword.value);
                }
            }
        }
        edges
    }

    fn argument_edges(
        &self,
        args: NodeRange,
        kwargs: NodeRange,
        add: &mut impl FnMut(EdgeLabel, NodeId),
    ) {
        for (i, arg) in self.node_list(args).iter().enumerate() {
            add(EdgeLabel::Arg(i), *arg);
        }
        for kwarg in self.node_list(kwargs) {
            let name = match self.kind(*kwarg) {
                NodeKind::Argument { tag, .. } => tag.name,
                _ => Name::EMPTY,
            };
            add(EdgeLabel::Kwarg(name), *kwarg);
        }
    }

    /// Every node reachable from `root`, each once, depth first in edge
    /// order. Terminates on the shell/self-argument back references.
    pub fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            for edge in self.edges(id).into_iter().rev() {
                if !seen.contains(&edge.target) {
                    stack.push(edge.target);
                }
            }
        }
        order
    }
}

fn list_index(n: usize) -> u32 {
    match u32::try_from(n) {
        Ok(n) => n,
        Err(_) => panic!("trace graph operand lists exceeded {} entries", u32::MAX),
    }
}

/// Labelled operand edge, for renderers.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Edge {
    pub label: EdgeLabel,
    pub target: NodeId,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EdgeLabel {
    Operand,
    Left,
    Right,
    Bound,
    Callable,
    Return,
    Shell,
    Arg(usize),
    Kwarg(Name),
    Attribute(Name),
    Item(usize),
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Operand => f.write_str("operand"),
            EdgeLabel::Left => f.write_str("left"),
            EdgeLabel::Right => f.write_str("right"),
            EdgeLabel::Bound => f.write_str("bound"),
            EdgeLabel::Callable => f.write_str("callable"),
            EdgeLabel::Return => f.write_str("return"),
            EdgeLabel::Shell => f.write_str("shell"),
            EdgeLabel::Arg(i) => write!(f, "args:{i}"),
            EdgeLabel::Kwarg(name) => write!(f, "kwargs:{name}"),
            EdgeLabel::Attribute(name) => write!(f, "attributes:{name}"),
            EdgeLabel::Item(i) => write!(f, "items:{i}"),
        }
    }
}

#[cfg(test)]
mod tests;
