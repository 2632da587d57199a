//! Replay of patches onto plain snapshots.
//!
//! A consumer mirroring a tree (a remote peer, a history buffer) holds
//! snapshots, not live nodes. Applying the emitted patches in order to the
//! pre-change snapshot reproduces the post-change snapshot.

use arbor_json_pointer::{get_mut, parse_array_index, parse_json_pointer, split_last};
use serde_json::Value;

use super::{Patch, PatchOp};
use crate::error::{Error, Result};

/// Apply one patch to a plain JSON document in place.
pub fn apply_to_snapshot(doc: &mut Value, patch: &Patch) -> Result<()> {
    let path = parse_json_pointer(&patch.path)?;
    if path.is_empty() {
        return match patch.op {
            PatchOp::Add | PatchOp::Replace => {
                *doc = patch.required_value()?.clone();
                Ok(())
            }
            PatchOp::Remove => Err(Error::InvalidPatch("cannot remove the root".into())),
        };
    }
    let (parent_path, key) = split_last(&path)?;
    let parent = get_mut(doc, parent_path)
        .ok_or_else(|| Error::PathNotFound(arbor_json_pointer::format_json_pointer(parent_path)))?;
    match parent {
        Value::Array(arr) => apply_to_array(arr, key, patch),
        Value::Object(map) => match patch.op {
            PatchOp::Add => {
                map.insert(key.to_string(), patch.required_value()?.clone());
                Ok(())
            }
            PatchOp::Replace => match map.get_mut(key) {
                Some(slot) => {
                    *slot = patch.required_value()?.clone();
                    Ok(())
                }
                None => Err(Error::PathNotFound(patch.path.clone())),
            },
            PatchOp::Remove => map
                .shift_remove(key)
                .map(|_| ())
                .ok_or_else(|| Error::PathNotFound(patch.path.clone())),
        },
        _ => Err(Error::InvalidPatch(format!(
            "'{}' does not address a container",
            patch.path
        ))),
    }
}

fn apply_to_array(arr: &mut Vec<Value>, key: &str, patch: &Patch) -> Result<()> {
    let len = arr.len();
    let index = parse_array_index(key)?.resolve(len);
    match patch.op {
        PatchOp::Add => {
            if index > len {
                return Err(Error::IndexOutOfBounds { index, len });
            }
            arr.insert(index, patch.required_value()?.clone());
        }
        PatchOp::Replace => {
            let value = patch.required_value()?.clone();
            let slot = arr.get_mut(index).ok_or(Error::IndexOutOfBounds { index, len })?;
            *slot = value;
        }
        PatchOp::Remove => {
            if index >= len {
                return Err(Error::IndexOutOfBounds { index, len });
            }
            arr.remove(index);
        }
    }
    Ok(())
}

/// Apply a sequence of patches in order, stopping at the first failure.
pub fn apply_patches_to_snapshot<'a>(
    doc: &mut Value,
    patches: impl IntoIterator<Item = &'a Patch>,
) -> Result<()> {
    for patch in patches {
        apply_to_snapshot(doc, patch)?;
    }
    Ok(())
}
