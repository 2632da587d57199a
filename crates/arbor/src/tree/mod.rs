//! The node arena.
//!
//! A [`Tree`] owns every node created through it. Nodes refer to their
//! parent and children by [`NodeId`] only, so a tree can hold several
//! independent roots and a node can be detached and re-attached without any
//! shared ownership. Disposed slots are recycled; their generation is bumped
//! so stale handles fail with [`Error::NodeNotFound`].

mod adoption;
mod containers;
pub mod node;

use std::collections::HashMap;

use arbor_json_pointer::{format_json_pointer, parse_json_pointer, split_last};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::TreeOptions;
use crate::patch::{Patch, PatchOp};
use crate::types::Factory;

use node::{Child, Container, ListenerId, NodeId, PatchListener, TreeNode};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<TreeNode>,
}

/// Arena holding observable nodes.
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    options: TreeOptions,
    next_listener: u64,
    listener_owners: HashMap<ListenerId, NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    // ── Arena ──────────────────────────────────────────────────────────────

    fn alloc(&mut self, node: TreeNode) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Release `id` and every node below it. Returns how many slots were
    /// freed.
    pub(crate) fn free_subtree(&mut self, id: NodeId) -> Result<usize> {
        let mut pending = vec![id];
        let mut freed = 0;
        while let Some(id) = pending.pop() {
            let node = self.node(id)?;
            pending.extend(node.target.child_nodes().into_iter().map(|(_, child)| child));
            let slot = &mut self.slots[id.index as usize];
            if let Some(node) = slot.node.take() {
                for (listener, _) in &node.listeners {
                    self.listener_owners.remove(listener);
                }
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            freed += 1;
        }
        Ok(freed)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(Error::NodeNotFound)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(Error::NodeNotFound)
    }

    pub(crate) fn container(&self, id: NodeId) -> Result<&Container> {
        Ok(&self.node(id)?.target)
    }

    pub(crate) fn container_mut(&mut self, id: NodeId) -> Result<&mut Container> {
        Ok(&mut self.node_mut(id)?.target)
    }

    /// Fails unless `finalize_new_instance` has run on `id`. Every container
    /// mutation checks this before intercepting.
    pub(crate) fn ensure_finalized(&self, id: NodeId) -> Result<()> {
        if self.node(id)?.finalized {
            Ok(())
        } else {
            Err(Error::NotFinalized(self.get_path(id)?))
        }
    }

    /// False once the node has been disposed.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    fn complex_factory(&self, id: NodeId) -> Result<Factory> {
        let factory = self.node(id)?.factory.clone();
        match factory.is_complex() {
            true => Ok(factory),
            false => Err(Error::NotComplex(factory.name())),
        }
    }

    // ── Creation ───────────────────────────────────────────────────────────

    /// Create a new root node of a container type.
    pub fn create(&mut self, factory: &Factory, snapshot: Option<Value>) -> Result<NodeId> {
        match self.instantiate(factory, snapshot)? {
            Child::Node(id) => Ok(id),
            Child::Value(_) => Err(Error::NotComplex(factory.name())),
        }
    }

    /// Validate `snapshot` (or the factory's default) and turn it into slot
    /// content: a fresh detached node for container types, the value itself
    /// otherwise.
    pub(crate) fn instantiate(&mut self, factory: &Factory, snapshot: Option<Value>) -> Result<Child> {
        let snapshot = match snapshot.or_else(|| factory.default_snapshot()) {
            Some(snapshot) => snapshot,
            None => return Err(Error::validation(factory.name(), &Value::Null)),
        };
        let concrete = factory
            .dispatch(&snapshot)
            .ok_or_else(|| Error::validation(factory.name(), &snapshot))?;
        let Some(ty) = concrete.complex() else {
            return Ok(Child::Value(snapshot));
        };
        let id = self.alloc(TreeNode::new(concrete.clone(), ty.create_new_instance()));
        let filled = ty
            .finalize_new_instance(self, id)
            .and_then(|()| ty.apply_snapshot(self, id, &snapshot));
        if let Err(err) = filled {
            self.free_subtree(id)?;
            return Err(err);
        }
        trace!(ty = %concrete.name(), index = id.index, "node created");
        Ok(Child::Node(id))
    }

    // ── Snapshots ──────────────────────────────────────────────────────────

    pub fn get_snapshot(&self, id: NodeId) -> Result<Value> {
        let factory = self.complex_factory(id)?;
        match factory.complex() {
            Some(ty) => ty.serialize(self, id),
            None => Err(Error::NotComplex(factory.name())),
        }
    }

    pub(crate) fn value_to_snapshot(&self, child: &Child) -> Result<Value> {
        match child {
            Child::Value(value) => Ok(value.clone()),
            Child::Node(id) => self.get_snapshot(*id),
        }
    }

    /// Bring the subtree at `id` in line with `snapshot`, emitting patches
    /// for every change. Fails without touching the tree if the snapshot
    /// does not match the node's type.
    pub fn apply_snapshot(&mut self, id: NodeId, snapshot: &Value) -> Result<()> {
        let factory = self.complex_factory(id)?;
        if !factory.is(snapshot) {
            return Err(Error::validation(factory.name(), snapshot));
        }
        self.apply_snapshot_unchecked(id, snapshot)
    }

    pub(crate) fn apply_snapshot_unchecked(&mut self, id: NodeId, snapshot: &Value) -> Result<()> {
        let factory = self.complex_factory(id)?;
        match factory.complex() {
            Some(ty) => ty.apply_snapshot(self, id, snapshot),
            None => Err(Error::NotComplex(factory.name())),
        }
    }

    // ── Patches ────────────────────────────────────────────────────────────

    /// Apply one patch whose path is relative to `id`.
    ///
    /// The change runs through the regular mutation pipeline, so listeners
    /// see it as a patch again.
    pub fn apply_patch(&mut self, id: NodeId, patch: &Patch) -> Result<()> {
        let steps = parse_json_pointer(&patch.path)?;
        if steps.is_empty() {
            return match patch.op {
                PatchOp::Add | PatchOp::Replace => self.apply_snapshot(id, patch.required_value()?),
                PatchOp::Remove => Err(Error::InvalidPatch("cannot remove the root".to_string())),
            };
        }
        let (parent_steps, last) = split_last(&steps)?;
        let target = self.resolve_steps(id, parent_steps)?;
        let factory = self.complex_factory(target)?;
        debug!(op = %patch.op, path = %patch.path, "applying patch");
        match factory.complex() {
            Some(ty) => ty.apply_patch_locally(self, target, last, patch),
            None => Err(Error::NotComplex(factory.name())),
        }
    }

    /// Apply patches in order. Stops at the first failure; earlier patches
    /// stay applied.
    pub fn apply_patches<'a>(
        &mut self,
        id: NodeId,
        patches: impl IntoIterator<Item = &'a Patch>,
    ) -> Result<()> {
        for patch in patches {
            self.apply_patch(id, patch)?;
        }
        Ok(())
    }

    /// Subscribe to patches emitted at or below `id`. Paths are relative to
    /// `id`.
    pub fn on_patch(
        &mut self,
        id: NodeId,
        listener: impl FnMut(&Patch) + 'static,
    ) -> Result<ListenerId> {
        let handle = ListenerId(self.next_listener);
        let listener: PatchListener = Box::new(listener);
        self.node_mut(id)?.listeners.push((handle, listener));
        self.next_listener += 1;
        self.listener_owners.insert(handle, id);
        Ok(handle)
    }

    /// Unsubscribe. Returns false if the listener was already gone.
    pub fn off_patch(&mut self, listener: ListenerId) -> bool {
        let Some(owner) = self.listener_owners.remove(&listener) else {
            return false;
        };
        match self.node_mut(owner) {
            Ok(node) => {
                node.listeners.retain(|(id, _)| *id != listener);
                true
            }
            Err(_) => false,
        }
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    /// Pointer from the root of `id`'s tree to `id`. A root has path `""`.
    pub fn get_path(&self, id: NodeId) -> Result<String> {
        let mut segments = Vec::new();
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            segments.push(current.segment.clone());
            current = self.node(parent)?;
        }
        segments.reverse();
        Ok(format_json_pointer(&segments))
    }

    pub fn get_parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn get_root(&self, id: NodeId) -> Result<NodeId> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    pub fn get_factory(&self, id: NodeId) -> Result<Factory> {
        Ok(self.node(id)?.factory.clone())
    }

    pub fn get_child_factory(&self, id: NodeId, key: &str) -> Result<Option<Factory>> {
        Ok(self.node(id)?.factory.get_child_factory(key))
    }

    /// Direct child nodes with their segments, in container order. Plain
    /// values are skipped.
    pub fn get_child_nodes(&self, id: NodeId) -> Result<Vec<(String, NodeId)>> {
        let factory = self.complex_factory(id)?;
        match factory.complex() {
            Some(ty) => ty.get_child_nodes(self, id),
            None => Err(Error::NotComplex(factory.name())),
        }
    }

    pub fn get_child_node(&self, id: NodeId, key: &str) -> Result<Option<NodeId>> {
        let factory = self.complex_factory(id)?;
        match factory.complex() {
            Some(ty) => ty.get_child_node(self, id, key),
            None => Err(Error::NotComplex(factory.name())),
        }
    }

    /// Node at `pointer`, relative to `id`.
    pub fn resolve(&self, id: NodeId, pointer: &str) -> Result<NodeId> {
        let steps = parse_json_pointer(pointer)?;
        self.resolve_steps(id, &steps)
    }

    fn resolve_steps(&self, id: NodeId, steps: &[String]) -> Result<NodeId> {
        let mut current = id;
        for (depth, step) in steps.iter().enumerate() {
            current = self
                .get_child_node(current, step)?
                .ok_or_else(|| Error::PathNotFound(format_json_pointer(&steps[..=depth])))?;
        }
        Ok(current)
    }

    /// Slot content at `pointer`, relative to `id`: a node or a plain value.
    pub fn get(&self, id: NodeId, pointer: &str) -> Result<Child> {
        let steps = parse_json_pointer(pointer)?;
        if steps.is_empty() {
            self.node(id)?;
            return Ok(Child::Node(id));
        }
        let (parent_steps, last) = split_last(&steps)?;
        let parent = self.resolve_steps(id, parent_steps)?;
        self.container(parent)?
            .child(last)
            .cloned()
            .ok_or_else(|| Error::PathNotFound(pointer.to_string()))
    }

    // ── Disposal ───────────────────────────────────────────────────────────

    /// Free a detached node and its subtree. Handles into it go stale.
    pub fn dispose(&mut self, id: NodeId) -> Result<()> {
        if self.node(id)?.parent.is_some() {
            return Err(Error::Attached(self.get_path(id)?));
        }
        let freed = self.free_subtree(id)?;
        debug!(index = id.index, freed, "disposed subtree");
        Ok(())
    }

    /// Free every subtree that was removed from a parent and never
    /// re-attached. Roots created with [`Tree::create`] are kept. Returns the
    /// number of freed nodes.
    pub fn prune_orphans(&mut self) -> Result<usize> {
        let orphans: Vec<NodeId> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let node = slot.node.as_ref()?;
                (node.orphaned && node.parent.is_none()).then_some(NodeId {
                    index: index as u32,
                    generation: slot.generation,
                })
            })
            .collect();
        let mut freed = 0;
        for id in orphans {
            freed += self.free_subtree(id)?;
        }
        debug!(freed, "pruned orphaned subtrees");
        Ok(freed)
    }
}
