//! Back-end configuration.

/// Limits shared by every traversal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Maximum nesting of `eval` calls. `None` relies on stack growth alone.
    pub max_depth: Option<usize>,
}

impl TraversalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

/// When a `GetItem` node yields a `HasItem` edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ItemEdgePolicy {
    /// Only when the index is itself traced (not a `Literal`).
    #[default]
    TracedOnly,
    /// For every item access, literal indices included.
    Always,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintConfig {
    pub item_edges: ItemEdgePolicy,
    pub traversal: TraversalConfig,
}

impl ConstraintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_item_edges(mut self, policy: ItemEdgePolicy) -> Self {
        self.item_edges = policy;
        self
    }

    #[must_use]
    pub fn with_traversal(mut self, traversal: TraversalConfig) -> Self {
        self.traversal = traversal;
        self
    }
}
