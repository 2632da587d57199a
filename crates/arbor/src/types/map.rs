//! Keyed containers with a uniform value type.

use serde_json::{Map, Value};

use super::keyed::{self, KeyedChange};
use super::{ComplexType, Factory};
use crate::error::{Error, Result};
use crate::patch::{Patch, PatchOp};
use crate::tree::node::{Container, NodeId};
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct MapType {
    sub_type: Factory,
}

impl MapType {
    pub(crate) fn new(sub_type: Factory) -> Self {
        Self { sub_type }
    }

    pub fn sub_type(&self) -> &Factory {
        &self.sub_type
    }

    pub(crate) fn mutate(
        &self,
        tree: &mut Tree,
        node: NodeId,
        change: KeyedChange,
    ) -> Result<Option<crate::tree::node::Child>> {
        keyed::mutate(tree, node, change)
    }
}

impl ComplexType for MapType {
    fn describe(&self) -> String {
        format!("Map<string, {}>", self.sub_type.describe())
    }

    fn create_new_instance(&self) -> Container {
        Container::Map(Default::default())
    }

    fn serialize(&self, tree: &Tree, node: NodeId) -> Result<Value> {
        let mut out = Map::new();
        for (key, child) in keyed::entries(tree, node)? {
            out.insert(key.clone(), tree.value_to_snapshot(child)?);
        }
        Ok(Value::Object(out))
    }

    fn apply_patch_locally(
        &self,
        tree: &mut Tree,
        node: NodeId,
        subpath: &str,
        patch: &Patch,
    ) -> Result<()> {
        let present = keyed::entries(tree, node)?.contains_key(subpath);
        let change = match patch.op {
            PatchOp::Replace | PatchOp::Remove if !present => {
                return Err(Error::PathNotFound(patch.path.clone()));
            }
            PatchOp::Add | PatchOp::Replace => KeyedChange::Set {
                key: subpath.to_string(),
                value: patch.required_value()?.clone().into(),
            },
            PatchOp::Remove => KeyedChange::Delete {
                key: subpath.to_string(),
            },
        };
        self.mutate(tree, node, change).map(|_| ())
    }

    fn apply_snapshot(&self, tree: &mut Tree, node: NodeId, snapshot: &Value) -> Result<()> {
        let incoming = snapshot
            .as_object()
            .ok_or_else(|| Error::validation(self.describe(), snapshot))?;
        let stale: Vec<String> = keyed::entries(tree, node)?
            .keys()
            .filter(|k| !incoming.contains_key(*k))
            .cloned()
            .collect();
        for key in stale {
            self.mutate(tree, node, KeyedChange::Delete { key })?;
        }
        for (key, value) in incoming {
            keyed::assign_in_place(tree, node, key, value.clone())?;
        }
        Ok(())
    }

    fn get_child_factory(&self, _key: &str) -> Option<Factory> {
        Some(self.sub_type.clone())
    }

    fn is_valid_snapshot(&self, snapshot: &Value) -> bool {
        snapshot
            .as_object()
            .is_some_and(|entries| entries.values().all(|v| self.sub_type.is(v)))
    }
}
