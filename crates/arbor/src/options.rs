//! Tree configuration.

/// What happens when a node that already has a parent is inserted into a
/// different container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReinsertionPolicy {
    /// Reject the insertion with [`Error::IdentityConflict`](crate::Error::IdentityConflict).
    #[default]
    Fail,
    /// Remove the node from its current container first (emitting the
    /// corresponding `remove` patch there), then insert it.
    ///
    /// Nodes held by a model property cannot be moved this way, since model
    /// properties cannot be vacated.
    Reparent,
}

/// Options for [`Tree::with_options`](crate::Tree::with_options).
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub reinsertion: ReinsertionPolicy,
}

impl TreeOptions {
    pub fn reinsertion(mut self, policy: ReinsertionPolicy) -> Self {
        self.reinsertion = policy;
        self
    }
}
