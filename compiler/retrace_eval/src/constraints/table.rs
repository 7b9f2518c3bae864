//! Constraint edges and their table.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use retrace_ir::NodeId;

/// Kind of requirement a constraint edge expresses.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConstraintKind {
    /// The shell is initialized by the construct node.
    HasInit,
    /// The source has (or is assigned) the attribute read by the target.
    HasAttr,
    IsCallableFunction,
    HasCallableMethod,
    HasItem,
    /// An argument node stands for the content it was bound from.
    ArgToContent,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::HasInit => "HasInit",
            ConstraintKind::HasAttr => "HasAttr",
            ConstraintKind::IsCallableFunction => "IsCallableFunction",
            ConstraintKind::HasCallableMethod => "HasCallableMethod",
            ConstraintKind::HasItem => "HasItem",
            ConstraintKind::ArgToContent => "ArgToContent",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed edge between two nodes, identified by all three fields.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub from: NodeId,
    pub to: NodeId,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.kind, self.from, self.to)
    }
}

/// Constraint edges grouped by source node.
///
/// Sources and each source's edges keep insertion order; an edge is stored
/// at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintTable {
    edges: IndexMap<NodeId, IndexSet<Constraint>>,
}

impl ConstraintTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `constraint`. Returns `false` if it was already present.
    pub fn add(&mut self, constraint: Constraint) -> bool {
        self.edges
            .entry(constraint.from)
            .or_default()
            .insert(constraint)
    }

    pub fn contains(&self, constraint: &Constraint) -> bool {
        self.edges
            .get(&constraint.from)
            .is_some_and(|set| set.contains(constraint))
    }

    /// Edges leaving `from`, in insertion order.
    pub fn outgoing(&self, from: NodeId) -> impl Iterator<Item = &Constraint> {
        self.edges.get(&from).into_iter().flatten()
    }

    /// Every edge, grouped by source.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.edges.values().flatten()
    }

    pub fn of_kind(&self, kind: ConstraintKind) -> impl Iterator<Item = &Constraint> {
        self.iter().filter(move |c| c.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.values().all(IndexSet::is_empty)
    }
}

impl<'a> IntoIterator for &'a ConstraintTable {
    type Item = &'a Constraint;
    type IntoIter = Box<dyn Iterator<Item = &'a Constraint> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
