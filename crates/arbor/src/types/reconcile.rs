//! Identity-preserving merge of an incoming array snapshot into a live array.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::primitive::identifier_key;
use super::{array, Factory};
use crate::error::{Error, Result};
use crate::tree::node::{Child, Container, Input, NodeId};
use crate::tree::Tree;

/// Compute the new content of `node` for `incoming`.
///
/// Live elements are indexed by their `attr` value. An incoming item whose
/// identifier matches a live element that its own factory accepts reuses
/// that node, updated in place; anything else becomes a fresh instance of
/// `element`. Duplicate live identifiers fail before anything is touched.
pub(crate) fn reconcile_array_items(
    tree: &mut Tree,
    node: NodeId,
    attr: &str,
    incoming: &[Value],
    element: &Factory,
) -> Result<Vec<Input>> {
    let mut live = index_by_identifier(tree, node, attr)?;

    let mut inputs = Vec::with_capacity(incoming.len());
    let mut created = Vec::new();
    let mut reused = 0usize;
    for item in incoming {
        let claimed = item
            .get(attr)
            .and_then(identifier_key)
            .and_then(|key| live.remove(&key));
        if let Some(existing) = claimed {
            if tree.node(existing)?.factory.is(item) {
                tree.apply_snapshot_unchecked(existing, item)?;
                inputs.push(Input::Node(existing));
                reused += 1;
                continue;
            }
        }
        match element.create(tree, Some(item.clone())) {
            Ok(child) => {
                if let Child::Node(id) = child {
                    created.push(id);
                }
                inputs.push(child.into());
            }
            Err(err) => {
                for id in created {
                    tree.free_subtree(id)?;
                }
                return Err(err);
            }
        }
    }
    debug!(
        path = %tree.get_path(node)?,
        reused,
        created = created.len(),
        dropped = live.len(),
        "reconciled array snapshot"
    );
    Ok(inputs)
}

fn index_by_identifier(tree: &Tree, node: NodeId, attr: &str) -> Result<HashMap<String, NodeId>> {
    let mut live = HashMap::new();
    for child in array::items(tree, node)? {
        let Child::Node(id) = child else { continue };
        let Container::Model(fields) = tree.container(*id)? else {
            continue;
        };
        let Some(key) = fields.get(attr).and_then(Child::value).and_then(identifier_key) else {
            continue;
        };
        if live.insert(key.clone(), *id).is_some() {
            return Err(Error::UniquenessViolation {
                identifier: key,
                path: tree.get_path(*id)?,
            });
        }
    }
    Ok(live)
}
