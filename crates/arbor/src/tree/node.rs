//! Node handles and per-node metadata.

use arbor_json_pointer::{parse_array_index, ArrayIndex};
use indexmap::IndexMap;
use serde_json::Value;

use crate::patch::Patch;
use crate::types::Factory;

/// Handle to a node in a [`Tree`](crate::Tree) arena.
///
/// Handles are generation-checked: once a node is disposed its handle stops
/// resolving, even if the arena slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Handle returned by [`Tree::on_patch`](crate::Tree::on_patch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

pub type PatchListener = Box<dyn FnMut(&Patch)>;

/// What a container slot holds: a plain value or a child node.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Value(Value),
    Node(NodeId),
}

impl Child {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Child::Node(id) => Some(*id),
            Child::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Child::Value(v) => Some(v),
            Child::Node(_) => None,
        }
    }

    /// True if `input` would store exactly this slot content again: the same
    /// node handle, or an equal plain value.
    pub(crate) fn is_identical(&self, input: &Input) -> bool {
        match (self, input) {
            (Child::Node(a), Input::Node(b)) => a == b,
            (Child::Value(a), Input::Snapshot(b)) => a == b,
            _ => false,
        }
    }
}

/// What callers hand to a container mutation: a snapshot to instantiate (or
/// store as-is, for primitive slots) or an existing node to adopt.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Snapshot(Value),
    Node(NodeId),
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Snapshot(value)
    }
}

impl From<NodeId> for Input {
    fn from(id: NodeId) -> Self {
        Input::Node(id)
    }
}

impl From<Child> for Input {
    fn from(child: Child) -> Self {
        match child {
            Child::Value(v) => Input::Snapshot(v),
            Child::Node(id) => Input::Node(id),
        }
    }
}

/// The live container a node instruments.
#[derive(Debug, Clone)]
pub(crate) enum Container {
    Array(Vec<Child>),
    Map(IndexMap<String, Child>),
    Model(IndexMap<String, Child>),
}

impl Container {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Container::Array(_) => "an array",
            Container::Map(_) => "a map",
            Container::Model(_) => "a model",
        }
    }

    pub(crate) fn child(&self, key: &str) -> Option<&Child> {
        match self {
            Container::Array(items) => match parse_array_index(key) {
                Ok(ArrayIndex::At(i)) => items.get(i),
                _ => None,
            },
            Container::Map(entries) | Container::Model(entries) => entries.get(key),
        }
    }

    pub(crate) fn child_nodes(&self) -> Vec<(String, NodeId)> {
        match self {
            Container::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.node().map(|id| (i.to_string(), id)))
                .collect(),
            Container::Map(entries) | Container::Model(entries) => entries
                .iter()
                .filter_map(|(k, c)| c.node().map(|id| (k.clone(), id)))
                .collect(),
        }
    }
}

/// Metadata attached to every container in the tree.
pub(crate) struct TreeNode {
    /// Non-owning link used for path computation and patch propagation.
    pub(crate) parent: Option<NodeId>,
    pub(crate) segment: String,
    pub(crate) factory: Factory,
    pub(crate) target: Container,
    pub(crate) listeners: Vec<(ListenerId, PatchListener)>,
    /// Set once the container's interception is armed.
    pub(crate) finalized: bool,
    /// Set when the node was removed from a parent, as opposed to created
    /// as a root.
    pub(crate) orphaned: bool,
}

impl TreeNode {
    pub(crate) fn new(factory: Factory, target: Container) -> Self {
        Self {
            parent: None,
            segment: String::new(),
            factory,
            target,
            listeners: Vec::new(),
            finalized: false,
            orphaned: false,
        }
    }
}

impl std::fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNode")
            .field("parent", &self.parent)
            .field("segment", &self.segment)
            .field("factory", &self.factory.name())
            .field("target", &self.target)
            .field("listeners_count", &self.listeners.len())
            .finish()
    }
}
