//! Models: keyed containers with a fixed, typed property set.

use serde_json::{Map, Value};

use super::keyed::{self, KeyedChange};
use super::primitive::PrimitiveType;
use super::{ComplexType, Factory, TypeDef};
use crate::error::{Error, Result};
use crate::patch::{Patch, PatchOp};
use crate::tree::node::{Child, Container, Input, NodeId};
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub factory: Factory,
    /// Snapshot used when the property is missing from an incoming snapshot.
    pub default: Option<Value>,
}

impl PropertyDef {
    fn default_snapshot(&self) -> Option<Value> {
        self.default
            .clone()
            .or_else(|| self.factory.default_snapshot())
    }
}

#[derive(Debug, Clone)]
pub struct ModelType {
    name: String,
    properties: Vec<PropertyDef>,
}

impl ModelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn prop(mut self, name: impl Into<String>, factory: Factory) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            factory,
            default: None,
        });
        self
    }

    pub fn prop_default(mut self, name: impl Into<String>, factory: Factory, default: Value) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            factory,
            default: Some(default),
        });
        self
    }

    pub fn into_factory(self) -> Factory {
        self.into()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == key)
    }

    /// The first property typed as an identifier.
    pub fn identifier_attribute(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| matches!(p.factory.def(), TypeDef::Primitive(PrimitiveType::Identifier)))
            .map(|p| p.name.as_str())
    }

    pub(crate) fn default_snapshot(&self) -> Option<Value> {
        let empty = Value::Object(Map::new());
        self.is_valid_snapshot(&empty).then_some(empty)
    }

    /// Set one property through the keyed mutation pipeline.
    pub(crate) fn set(&self, tree: &mut Tree, node: NodeId, key: &str, value: Input) -> Result<()> {
        if self.property(key).is_none() {
            return Err(self.unknown(key));
        }
        keyed::mutate(
            tree,
            node,
            KeyedChange::Set {
                key: key.to_string(),
                value,
            },
        )
        .map(|_| ())
    }

    pub(crate) fn get(&self, tree: &Tree, node: NodeId, key: &str) -> Result<Child> {
        keyed::entries(tree, node)?
            .get(key)
            .cloned()
            .ok_or_else(|| self.unknown(key))
    }

    fn unknown(&self, key: &str) -> Error {
        Error::UnknownProperty {
            model: self.name.clone(),
            key: key.to_string(),
        }
    }
}

impl ComplexType for ModelType {
    fn describe(&self) -> String {
        let fields = self
            .properties
            .iter()
            .map(|p| format!("{}: {}", p.name, p.factory.describe()))
            .collect::<Vec<_>>()
            .join("; ");
        format!("{{ {fields} }}")
    }

    fn create_new_instance(&self) -> Container {
        Container::Model(Default::default())
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
        match patch.op {
            PatchOp::Add | PatchOp::Replace => {
                self.set(tree, node, subpath, patch.required_value()?.clone().into())
            }
            PatchOp::Remove => Err(Error::InvalidPatch(format!(
                "cannot remove property '{subpath}' of model '{}'",
                self.name
            ))),
        }
    }

    fn apply_snapshot(&self, tree: &mut Tree, node: NodeId, snapshot: &Value) -> Result<()> {
        let incoming = snapshot
            .as_object()
            .ok_or_else(|| Error::validation(&self.name, snapshot))?;
        for prop in &self.properties {
            let value = incoming
                .get(&prop.name)
                .cloned()
                .or_else(|| prop.default_snapshot())
                .ok_or_else(|| Error::validation(&self.name, snapshot))?;
            keyed::assign_in_place(tree, node, &prop.name, value)?;
        }
        Ok(())
    }

    fn get_child_factory(&self, key: &str) -> Option<Factory> {
        self.property(key).map(|p| p.factory.clone())
    }

    fn is_valid_snapshot(&self, snapshot: &Value) -> bool {
        let Some(fields) = snapshot.as_object() else {
            return false;
        };
        self.properties.iter().all(|prop| match fields.get(&prop.name) {
            Some(value) => prop.factory.is(value),
            None => prop.default_snapshot().is_some(),
        })
    }
}
