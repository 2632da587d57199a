//! Ordered containers.
//!
//! Every mutation runs in two stages around the commit. `will_change`
//! intercepts the proposed change: it detaches the nodes that leave the
//! array and routes every incoming value through
//! [`Tree::prepare_child`], so what gets stored is always a validated plain
//! value or a node parented here. `did_change` then turns the committed
//! change into patches. Rewriting in the first stage never emits anything.

use arbor_json_pointer::{parse_array_index, prefix_pointer, ArrayIndex};
use serde_json::Value;
use tracing::trace;

use super::{reconcile, ComplexType, Factory};
use crate::error::{Error, Result};
use crate::patch::{Patch, PatchOp};
use crate::tree::node::{Child, Container, Input, NodeId};
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct ArrayType {
    sub_type: Factory,
}

impl ArrayType {
    pub(crate) fn new(sub_type: Factory) -> Self {
        Self { sub_type }
    }

    /// Factory of every element.
    pub fn sub_type(&self) -> &Factory {
        &self.sub_type
    }
}

/// A proposed change to an array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayChange {
    /// Overwrite the slot at `index`.
    Update { index: usize, new_value: Input },
    /// Remove `removed_count` slots at `index` and insert `added` there.
    Splice {
        index: usize,
        removed_count: usize,
        added: Vec<Input>,
    },
}

enum PreparedArrayChange {
    Update {
        index: usize,
        new_value: Child,
    },
    Splice {
        index: usize,
        removed_count: usize,
        added: Vec<Child>,
    },
}

/// A committed change, as seen by `did_change`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ArrayChangeRecord {
    Update {
        index: usize,
        old_value: Child,
        new_value: Child,
    },
    Splice {
        index: usize,
        removed: Vec<Child>,
        added: Vec<Child>,
    },
}

impl ArrayChangeRecord {
    /// Slots that left the array.
    pub(crate) fn removed(self) -> Vec<Child> {
        match self {
            ArrayChangeRecord::Update { old_value, .. } => vec![old_value],
            ArrayChangeRecord::Splice { removed, .. } => removed,
        }
    }
}

/// Run `change` through interception, commit and emission. Returns `None`
/// when the change was suppressed as a no-op.
pub(crate) fn mutate(
    tree: &mut Tree,
    node: NodeId,
    change: ArrayChange,
) -> Result<Option<ArrayChangeRecord>> {
    tree.ensure_finalized(node)?;
    let Some(prepared) = will_change(tree, node, change)? else {
        return Ok(None);
    };
    let record = commit(tree, node, prepared)?;
    did_change(tree, node, &record)?;
    Ok(Some(record))
}

pub(crate) fn items(tree: &Tree, node: NodeId) -> Result<&Vec<Child>> {
    match tree.container(node)? {
        Container::Array(items) => Ok(items),
        other => Err(Error::WrongContainer {
            path: tree.get_path(node)?,
            expected: "an array",
            actual: other.kind(),
        }),
    }
}

fn items_mut(tree: &mut Tree, node: NodeId) -> Result<&mut Vec<Child>> {
    let path = tree.get_path(node)?;
    match tree.container_mut(node)? {
        Container::Array(items) => Ok(items),
        other => Err(Error::WrongContainer {
            path,
            expected: "an array",
            actual: other.kind(),
        }),
    }
}

fn will_change(
    tree: &mut Tree,
    node: NodeId,
    change: ArrayChange,
) -> Result<Option<PreparedArrayChange>> {
    match change {
        ArrayChange::Update { index, new_value } => {
            let current = items(tree, node)?;
            let old_value = current
                .get(index)
                .cloned()
                .ok_or(Error::IndexOutOfBounds {
                    index,
                    len: current.len(),
                })?;
            if old_value.is_identical(&new_value) {
                trace!(index, "identical update suppressed");
                return Ok(None);
            }
            let new_value = tree.prepare_child(node, &index.to_string(), new_value)?;
            if let Child::Node(old) = old_value {
                tree.set_parent(old, None)?;
            }
            Ok(Some(PreparedArrayChange::Update { index, new_value }))
        }
        ArrayChange::Splice {
            index,
            removed_count,
            added,
        } => {
            let current = items(tree, node)?;
            let index = index.min(current.len());
            let removed_count = removed_count.min(current.len() - index);
            if removed_count == 0 && added.is_empty() {
                return Ok(None);
            }
            let removed: Vec<(usize, NodeId)> = current[index..index + removed_count]
                .iter()
                .enumerate()
                .filter_map(|(pos, c)| c.node().map(|id| (index + pos, id)))
                .collect();

            let was_orphaned: Vec<bool> = added
                .iter()
                .map(|input| match input {
                    Input::Node(id) => tree.node(*id).is_ok_and(|n| n.orphaned),
                    Input::Snapshot(_) => false,
                })
                .collect();
            // Removed nodes are detached first so that re-adding one of them
            // in the same splice is an ordinary adoption.
            for &(_, id) in &removed {
                tree.set_parent(id, None)?;
            }
            let mut prepared = Vec::with_capacity(added.len());
            for (pos, input) in added.iter().enumerate() {
                match tree.prepare_child(node, &(index + pos).to_string(), input.clone()) {
                    Ok(child) => prepared.push(child),
                    Err(err) => {
                        rollback(tree, node, &added, &was_orphaned, prepared, &removed)?;
                        return Err(err);
                    }
                }
            }
            Ok(Some(PreparedArrayChange::Splice {
                index,
                removed_count,
                added: prepared,
            }))
        }
    }
}

/// Undo the interception of a splice that failed halfway: nodes created
/// from snapshots are freed, adopted ones detached again with their former
/// orphan state, removed ones put back under their old segment.
fn rollback(
    tree: &mut Tree,
    node: NodeId,
    inputs: &[Input],
    was_orphaned: &[bool],
    prepared: Vec<Child>,
    removed: &[(usize, NodeId)],
) -> Result<()> {
    for ((input, &orphaned), child) in inputs.iter().zip(was_orphaned).zip(prepared) {
        if let Child::Node(id) = child {
            match input {
                Input::Snapshot(_) => {
                    tree.free_subtree(id)?;
                }
                Input::Node(_) => {
                    let adopted = tree.node_mut(id)?;
                    adopted.parent = None;
                    adopted.segment.clear();
                    adopted.orphaned = orphaned;
                }
            }
        }
    }
    for &(index, id) in removed {
        tree.set_parent(id, Some((node, index.to_string())))?;
    }
    Ok(())
}

fn commit(tree: &mut Tree, node: NodeId, change: PreparedArrayChange) -> Result<ArrayChangeRecord> {
    let items = items_mut(tree, node)?;
    match change {
        PreparedArrayChange::Update { index, new_value } => {
            let old_value = std::mem::replace(&mut items[index], new_value.clone());
            Ok(ArrayChangeRecord::Update {
                index,
                old_value,
                new_value,
            })
        }
        PreparedArrayChange::Splice {
            index,
            removed_count,
            added,
        } => {
            let removed: Vec<Child> = items
                .splice(index..index + removed_count, added.iter().cloned())
                .collect();
            let shifted: Vec<(usize, NodeId)> = items
                .iter()
                .enumerate()
                .skip(index + added.len())
                .filter_map(|(i, c)| c.node().map(|id| (i, id)))
                .collect();
            if removed_count != added.len() {
                for (i, id) in shifted {
                    tree.node_mut(id)?.segment = i.to_string();
                }
            }
            Ok(ArrayChangeRecord::Splice {
                index,
                removed,
                added,
            })
        }
    }
}

fn did_change(tree: &mut Tree, node: NodeId, record: &ArrayChangeRecord) -> Result<()> {
    match record {
        ArrayChangeRecord::Update {
            index, new_value, ..
        } => {
            let value = tree.value_to_snapshot(new_value)?;
            tree.emit_patch(node, Patch::replace(slot(*index), value))
        }
        ArrayChangeRecord::Splice {
            index,
            removed,
            added,
        } => {
            for i in (*index..*index + removed.len()).rev() {
                tree.emit_patch(node, Patch::remove(slot(i)))?;
            }
            for (pos, child) in added.iter().enumerate() {
                let value = tree.value_to_snapshot(child)?;
                tree.emit_patch(node, Patch::add(slot(index + pos), value))?;
            }
            Ok(())
        }
    }
}

fn slot(index: usize) -> String {
    prefix_pointer(&index.to_string(), "")
}

/// Replace the whole content of the array with `inputs` in one splice.
///
/// Leading and trailing slots that hold the very same node handles as the
/// incoming sequence are left out of the splice, so elements that keep
/// their position are neither detached nor re-emitted.
pub(crate) fn replace(tree: &mut Tree, node: NodeId, inputs: Vec<Input>) -> Result<Vec<Child>> {
    let current = items(tree, node)?;
    let same = |c: &Child, i: &Input| matches!((c, i), (Child::Node(a), Input::Node(b)) if a == b);
    let prefix = current
        .iter()
        .zip(&inputs)
        .take_while(|&(c, i)| same(c, i))
        .count();
    let max_suffix = current.len().min(inputs.len()) - prefix;
    let suffix = current
        .iter()
        .rev()
        .zip(inputs.iter().rev())
        .take(max_suffix)
        .take_while(|&(c, i)| same(c, i))
        .count();
    let removed_count = current.len() - prefix - suffix;
    let end = inputs.len() - suffix;
    let added: Vec<Input> = inputs.into_iter().take(end).skip(prefix).collect();
    let change = ArrayChange::Splice {
        index: prefix,
        removed_count,
        added,
    };
    Ok(mutate(tree, node, change)?
        .map(ArrayChangeRecord::removed)
        .unwrap_or_default())
}

impl ComplexType for ArrayType {
    fn describe(&self) -> String {
        format!("{}[]", self.sub_type.describe())
    }

    fn create_new_instance(&self) -> Container {
        Container::Array(Vec::new())
    }

    fn serialize(&self, tree: &Tree, node: NodeId) -> Result<Value> {
        items(tree, node)?
            .iter()
            .map(|child| tree.value_to_snapshot(child))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn apply_patch_locally(
        &self,
        tree: &mut Tree,
        node: NodeId,
        subpath: &str,
        patch: &Patch,
    ) -> Result<()> {
        let len = items(tree, node)?.len();
        let position = parse_array_index(subpath)?;
        let index = position.resolve(len);
        let change = match patch.op {
            PatchOp::Add => {
                if index > len {
                    return Err(Error::IndexOutOfBounds { index, len });
                }
                ArrayChange::Splice {
                    index,
                    removed_count: 0,
                    added: vec![patch.required_value()?.clone().into()],
                }
            }
            PatchOp::Remove | PatchOp::Replace if position == ArrayIndex::End || index >= len => {
                return Err(Error::IndexOutOfBounds { index, len });
            }
            PatchOp::Remove => ArrayChange::Splice {
                index,
                removed_count: 1,
                added: Vec::new(),
            },
            PatchOp::Replace => ArrayChange::Update {
                index,
                new_value: patch.required_value()?.clone().into(),
            },
        };
        mutate(tree, node, change).map(|_| ())
    }

    fn apply_snapshot(&self, tree: &mut Tree, node: NodeId, snapshot: &Value) -> Result<()> {
        let incoming = snapshot
            .as_array()
            .ok_or_else(|| Error::validation(self.describe(), snapshot))?;
        let inputs = match self.sub_type.identifier_attribute() {
            Some(attr) => reconcile::reconcile_array_items(tree, node, attr, incoming, &self.sub_type)?,
            None => incoming.iter().cloned().map(Input::Snapshot).collect(),
        };
        replace(tree, node, inputs).map(|_| ())
    }

    fn get_child_factory(&self, _key: &str) -> Option<Factory> {
        Some(self.sub_type.clone())
    }

    fn is_valid_snapshot(&self, snapshot: &Value) -> bool {
        snapshot
            .as_array()
            .is_some_and(|items| items.iter().all(|item| self.sub_type.is(item)))
    }
}
