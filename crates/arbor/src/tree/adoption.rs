//! Parent links and patch propagation.

use arbor_json_pointer::{parse_array_index, prefix_pointer, ArrayIndex};
use tracing::{trace, warn};

use super::node::{Child, Container, Input, NodeId};
use super::Tree;
use crate::error::{Error, Result};
use crate::options::ReinsertionPolicy;
use crate::patch::Patch;
use crate::types::array::{self, ArrayChange};
use crate::types::keyed::{self, KeyedChange};
use crate::types::Factory;

impl Tree {
    /// Turn `input` into slot content for `segment` of `parent`.
    ///
    /// Snapshots are validated against the child factory and instantiated;
    /// plain values for primitive slots are stored as-is. An existing node
    /// is adopted if it is detached. A node that already has a parent is
    /// handled by the configured [`ReinsertionPolicy`].
    pub(crate) fn prepare_child(
        &mut self,
        parent: NodeId,
        segment: &str,
        input: Input,
    ) -> Result<Child> {
        let factory = self
            .node(parent)?
            .factory
            .get_child_factory(segment)
            .ok_or_else(|| Error::PathNotFound(self.slot_path(parent, segment)))?;
        match input {
            Input::Snapshot(snapshot) => {
                if !factory.is(&snapshot) {
                    return Err(Error::validation(factory.name(), &snapshot));
                }
                let child = self.instantiate(&factory, Some(snapshot))?;
                if let Child::Node(id) = child {
                    self.set_parent(id, Some((parent, segment.to_string())))?;
                }
                Ok(child)
            }
            Input::Node(id) => {
                self.adopt(parent, segment, id, &factory)?;
                Ok(Child::Node(id))
            }
        }
    }

    fn adopt(&mut self, parent: NodeId, segment: &str, child: NodeId, factory: &Factory) -> Result<()> {
        if self.is_ancestor_or_self(child, parent)? {
            return Err(self.identity_conflict(child, parent, segment));
        }
        let snapshot = self.get_snapshot(child)?;
        if !factory.is(&snapshot) {
            return Err(Error::validation(factory.name(), &snapshot));
        }
        if let Some(old_parent) = self.node(child)?.parent {
            let movable = old_parent != parent
                && self.options.reinsertion == ReinsertionPolicy::Reparent
                && !matches!(self.container(old_parent)?, Container::Model(_));
            if !movable {
                return Err(self.identity_conflict(child, parent, segment));
            }
            warn!(
                from = %self.get_path(child)?,
                to = %self.slot_path(parent, segment),
                "moving node to a new parent"
            );
            self.detach_from_parent(child)?;
        }
        self.set_parent(child, Some((parent, segment.to_string())))
    }

    fn identity_conflict(&self, child: NodeId, parent: NodeId, segment: &str) -> Error {
        Error::IdentityConflict {
            node: self.get_path(child).unwrap_or_default(),
            target: self.slot_path(parent, segment),
        }
    }

    fn slot_path(&self, parent: NodeId, segment: &str) -> String {
        let base = self.get_path(parent).unwrap_or_default();
        format!("{base}{}", prefix_pointer(segment, ""))
    }

    /// Remove `child` from the container that holds it, through that
    /// container's mutation pipeline.
    fn detach_from_parent(&mut self, child: NodeId) -> Result<()> {
        let node = self.node(child)?;
        let Some(parent) = node.parent else {
            return Ok(());
        };
        let segment = node.segment.clone();
        match self.container(parent)? {
            Container::Array(_) => {
                let ArrayIndex::At(index) = parse_array_index(&segment)? else {
                    return Err(Error::PathNotFound(self.get_path(child)?));
                };
                array::mutate(
                    self,
                    parent,
                    ArrayChange::Splice {
                        index,
                        removed_count: 1,
                        added: Vec::new(),
                    },
                )?;
            }
            Container::Map(_) => {
                keyed::mutate(self, parent, KeyedChange::Delete { key: segment })?;
            }
            Container::Model(_) => {
                return Err(Error::IdentityConflict {
                    node: self.get_path(child)?,
                    target: String::new(),
                });
            }
        }
        Ok(())
    }

    /// True if `candidate` is `node` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            current = self.node(id)?.parent;
        }
        Ok(false)
    }

    /// Link `id` under `parent` at `segment`, or detach it with `None`.
    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<(NodeId, String)>) -> Result<()> {
        let node = self.node_mut(id)?;
        match parent {
            Some((parent, segment)) => {
                node.parent = Some(parent);
                node.segment = segment;
                node.orphaned = false;
            }
            None => {
                if node.parent.take().is_some() {
                    node.orphaned = true;
                }
                node.segment.clear();
            }
        }
        Ok(())
    }

    /// Deliver `patch` to the listeners of `origin` and of each ancestor,
    /// extending the path by one segment per level.
    pub(crate) fn emit_patch(&mut self, origin: NodeId, patch: Patch) -> Result<()> {
        let mut patch = patch;
        let mut current = Some(origin);
        while let Some(id) = current {
            let node = self.node_mut(id)?;
            for (_, listener) in node.listeners.iter_mut() {
                listener(&patch);
            }
            current = node.parent;
            if current.is_some() {
                patch = patch.prefixed(&node.segment);
            }
        }
        trace!(op = %patch.op, path = %patch.path, "patch emitted");
        Ok(())
    }
}
