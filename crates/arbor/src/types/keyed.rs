//! Mutation pipeline shared by keyed containers (maps and models).
//!
//! Mirrors the array engine: `will_change` validates and parents the
//! incoming value, `commit` stores it, `did_change` emits `add`, `replace`
//! or `remove` at `/key`.

use arbor_json_pointer::prefix_pointer;
use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::patch::Patch;
use crate::tree::node::{Child, Container, Input, NodeId};
use crate::tree::Tree;

/// A proposed change to a keyed container.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyedChange {
    Set { key: String, value: Input },
    Delete { key: String },
}

/// A change after interception: inputs are resolved to stored children.
pub(crate) enum PreparedKeyedChange {
    Set { key: String, value: Child },
    Delete { key: String },
}

pub(crate) enum KeyedChangeRecord {
    Set {
        key: String,
        old_value: Option<Child>,
        new_value: Child,
    },
    Delete {
        key: String,
        old_value: Child,
    },
}

pub(crate) fn mutate(tree: &mut Tree, node: NodeId, change: KeyedChange) -> Result<Option<Child>> {
    tree.ensure_finalized(node)?;
    let Some(prepared) = will_change(tree, node, change)? else {
        return Ok(None);
    };
    let record = commit(tree, node, prepared)?;
    did_change(tree, node, &record)?;
    Ok(match record {
        KeyedChangeRecord::Set { old_value, .. } => old_value,
        KeyedChangeRecord::Delete { old_value, .. } => Some(old_value),
    })
}

pub(crate) fn entries(tree: &Tree, node: NodeId) -> Result<&IndexMap<String, Child>> {
    match tree.container(node)? {
        Container::Map(entries) | Container::Model(entries) => Ok(entries),
        other => Err(Error::WrongContainer {
            path: tree.get_path(node)?,
            expected: "a keyed container",
            actual: other.kind(),
        }),
    }
}

fn entries_mut(tree: &mut Tree, node: NodeId) -> Result<&mut IndexMap<String, Child>> {
    let path = tree.get_path(node)?;
    match tree.container_mut(node)? {
        Container::Map(entries) | Container::Model(entries) => Ok(entries),
        other => Err(Error::WrongContainer {
            path,
            expected: "a keyed container",
            actual: other.kind(),
        }),
    }
}

fn will_change(
    tree: &mut Tree,
    node: NodeId,
    change: KeyedChange,
) -> Result<Option<PreparedKeyedChange>> {
    match change {
        KeyedChange::Set { key, value } => {
            let old_value = entries(tree, node)?.get(&key).cloned();
            if old_value.as_ref().is_some_and(|old| old.is_identical(&value)) {
                trace!(key = %key, "identical assignment suppressed");
                return Ok(None);
            }
            let value = tree.prepare_child(node, &key, value)?;
            if let Some(Child::Node(old)) = old_value {
                tree.set_parent(old, None)?;
            }
            Ok(Some(PreparedKeyedChange::Set { key, value }))
        }
        KeyedChange::Delete { key } => match entries(tree, node)?.get(&key).cloned() {
            None => Ok(None),
            Some(old_value) => {
                if let Child::Node(old) = old_value {
                    tree.set_parent(old, None)?;
                }
                Ok(Some(PreparedKeyedChange::Delete { key }))
            }
        },
    }
}

fn commit(tree: &mut Tree, node: NodeId, change: PreparedKeyedChange) -> Result<KeyedChangeRecord> {
    let entries = entries_mut(tree, node)?;
    Ok(match change {
        PreparedKeyedChange::Set { key, value } => {
            let old_value = entries.insert(key.clone(), value.clone());
            KeyedChangeRecord::Set {
                key,
                old_value,
                new_value: value,
            }
        }
        PreparedKeyedChange::Delete { key } => {
            let old_value = entries
                .shift_remove(&key)
                .ok_or_else(|| Error::PathNotFound(prefix_pointer(&key, "")))?;
            KeyedChangeRecord::Delete { key, old_value }
        }
    })
}

fn did_change(tree: &mut Tree, node: NodeId, record: &KeyedChangeRecord) -> Result<()> {
    let patch = match record {
        KeyedChangeRecord::Set {
            key,
            old_value,
            new_value,
        } => {
            let path = prefix_pointer(key, "");
            let value = tree.value_to_snapshot(new_value)?;
            match old_value {
                Some(_) => Patch::replace(path, value),
                None => Patch::add(path, value),
            }
        }
        KeyedChangeRecord::Delete { key, .. } => Patch::remove(prefix_pointer(key, "")),
    };
    tree.emit_patch(node, patch)
}

/// Assign `snapshot` under `key`, updating a compatible existing child node
/// in place instead of replacing it.
pub(crate) fn assign_in_place(
    tree: &mut Tree,
    node: NodeId,
    key: &str,
    snapshot: serde_json::Value,
) -> Result<()> {
    if let Some(Child::Node(existing)) = entries(tree, node)?.get(key).cloned() {
        if tree.node(existing)?.factory.is(&snapshot) {
            return tree.apply_snapshot_unchecked(existing, &snapshot);
        }
    }
    mutate(
        tree,
        node,
        KeyedChange::Set {
            key: key.to_string(),
            value: Input::Snapshot(snapshot),
        },
    )
    .map(|_| ())
}
