//! Type descriptors and the factories that wrap them.
//!
//! A [`Factory`] is a cheap, clonable handle to one type definition. The set
//! of definitions is closed: primitives, arrays, maps, models and unions.
//! Container definitions (array, map, model) implement [`ComplexType`], the
//! contract the tree calls into to create, serialize, patch and reconcile
//! instances.

pub mod array;
pub(crate) mod keyed;
pub mod map;
pub mod model;
pub mod primitive;
mod reconcile;
pub mod union;

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::patch::Patch;
use crate::tree::node::{Child, Container, NodeId};
use crate::tree::Tree;

pub use array::{ArrayChange, ArrayType};
pub use keyed::KeyedChange;
pub use map::MapType;
pub use model::{ModelType, PropertyDef};
pub use primitive::PrimitiveType;
pub use union::UnionType;

pub(crate) enum TypeDef {
    Primitive(PrimitiveType),
    Array(ArrayType),
    Map(MapType),
    Model(ModelType),
    Union(UnionType),
}

/// Contract implemented by every container type.
///
/// Mutation itself is two-phase and container specific (`will_change`, then
/// commit, then `did_change` on each engine); this trait covers what generic
/// tree code needs without knowing the container kind.
pub(crate) trait ComplexType {
    fn describe(&self) -> String;

    /// An empty container of this type's shape.
    fn create_new_instance(&self) -> Container;

    /// Arms interception on a freshly allocated node. Until then the array
    /// and keyed pipelines refuse to mutate it. Idempotent.
    fn finalize_new_instance(&self, tree: &mut Tree, node: NodeId) -> Result<()> {
        tree.node_mut(node)?.finalized = true;
        Ok(())
    }

    fn serialize(&self, tree: &Tree, node: NodeId) -> Result<Value>;

    /// Apply `patch` whose path ends in `subpath`, a direct child key of
    /// `node`. Runs through the normal mutation pipeline.
    fn apply_patch_locally(
        &self,
        tree: &mut Tree,
        node: NodeId,
        subpath: &str,
        patch: &Patch,
    ) -> Result<()>;

    /// Bring `node` in line with an already validated snapshot.
    fn apply_snapshot(&self, tree: &mut Tree, node: NodeId, snapshot: &Value) -> Result<()>;

    fn get_child_nodes(&self, tree: &Tree, node: NodeId) -> Result<Vec<(String, NodeId)>> {
        Ok(tree.container(node)?.child_nodes())
    }

    fn get_child_node(&self, tree: &Tree, node: NodeId, key: &str) -> Result<Option<NodeId>> {
        Ok(tree.container(node)?.child(key).and_then(Child::node))
    }

    fn get_child_factory(&self, key: &str) -> Option<Factory>;

    fn is_valid_snapshot(&self, snapshot: &Value) -> bool;
}

/// Handle to a type definition.
#[derive(Clone)]
pub struct Factory(Arc<TypeDef>);

impl Factory {
    pub(crate) fn new(def: TypeDef) -> Self {
        Self(Arc::new(def))
    }

    pub(crate) fn def(&self) -> &TypeDef {
        &self.0
    }

    /// Short type name, e.g. `string`, `Todo[]`, `map<Todo>`.
    pub fn name(&self) -> String {
        match self.def() {
            TypeDef::Primitive(p) => p.name().to_string(),
            TypeDef::Array(a) => format!("{}[]", a.sub_type().name()),
            TypeDef::Map(m) => format!("map<{}>", m.sub_type().name()),
            TypeDef::Model(m) => m.name().to_string(),
            TypeDef::Union(u) => u.name(),
        }
    }

    /// Human readable structure of the type.
    pub fn describe(&self) -> String {
        match self.def() {
            TypeDef::Primitive(p) => p.name().to_string(),
            TypeDef::Union(u) => u.describe(),
            _ => match self.complex() {
                Some(ty) => ty.describe(),
                None => self.name(),
            },
        }
    }

    /// Structural check: would `value` be accepted as a snapshot of this type.
    pub fn is(&self, value: &Value) -> bool {
        match self.def() {
            TypeDef::Primitive(p) => p.is(value),
            TypeDef::Union(u) => u.is(value),
            _ => self.complex().is_some_and(|ty| ty.is_valid_snapshot(value)),
        }
    }

    /// True for container types, whose instances become tree nodes.
    pub fn is_complex(&self) -> bool {
        self.complex().is_some()
    }

    pub(crate) fn complex(&self) -> Option<&dyn ComplexType> {
        match self.def() {
            TypeDef::Array(a) => Some(a),
            TypeDef::Map(m) => Some(m),
            TypeDef::Model(m) => Some(m),
            TypeDef::Primitive(_) | TypeDef::Union(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self.def() {
            TypeDef::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapType> {
        match self.def() {
            TypeDef::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelType> {
        match self.def() {
            TypeDef::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Factory of the value stored under `key` in an instance of this type.
    pub fn get_child_factory(&self, key: &str) -> Option<Factory> {
        self.complex().and_then(|ty| ty.get_child_factory(key))
    }

    /// Name of the property that identifies instances of this type, used by
    /// array reconciliation.
    pub fn identifier_attribute(&self) -> Option<&str> {
        match self.def() {
            TypeDef::Model(m) => m.identifier_attribute(),
            TypeDef::Union(u) => u.identifier_attribute(),
            _ => None,
        }
    }

    /// Snapshot used when none is given.
    pub fn default_snapshot(&self) -> Option<Value> {
        match self.def() {
            TypeDef::Primitive(p) => p.default_snapshot(),
            TypeDef::Array(_) => Some(Value::Array(Vec::new())),
            TypeDef::Map(_) => Some(Value::Object(Default::default())),
            TypeDef::Model(m) => m.default_snapshot(),
            TypeDef::Union(u) => u.default_snapshot(),
        }
    }

    /// The concrete factory that will own an instance created from
    /// `snapshot`. Unions resolve to their first accepting member.
    pub fn dispatch(&self, snapshot: &Value) -> Option<Factory> {
        match self.def() {
            TypeDef::Union(u) => u.dispatch(snapshot),
            _ if self.is(snapshot) => Some(self.clone()),
            _ => None,
        }
    }

    /// Instantiate a detached value of this type. Container types yield a
    /// new root node, primitives yield the validated value itself.
    pub fn create(&self, tree: &mut Tree, snapshot: Option<Value>) -> Result<Child> {
        tree.instantiate(self, snapshot)
    }

    pub fn ptr_eq(&self, other: &Factory) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Factory").field(&self.name()).finish()
    }
}

impl From<PrimitiveType> for Factory {
    fn from(p: PrimitiveType) -> Self {
        Factory::new(TypeDef::Primitive(p))
    }
}

impl From<ModelType> for Factory {
    fn from(m: ModelType) -> Self {
        Factory::new(TypeDef::Model(m))
    }
}

pub fn string() -> Factory {
    PrimitiveType::String.into()
}

pub fn number() -> Factory {
    PrimitiveType::Number.into()
}

pub fn integer() -> Factory {
    PrimitiveType::Integer.into()
}

pub fn boolean() -> Factory {
    PrimitiveType::Boolean.into()
}

pub fn null() -> Factory {
    PrimitiveType::Null.into()
}

/// String or integer identifier. A model property of this type becomes the
/// model's identifier attribute.
pub fn identifier() -> Factory {
    PrimitiveType::Identifier.into()
}

/// Any JSON value, stored as-is.
pub fn frozen() -> Factory {
    PrimitiveType::Frozen.into()
}

pub fn array(sub_type: Factory) -> Factory {
    Factory::new(TypeDef::Array(ArrayType::new(sub_type)))
}

pub fn map(sub_type: Factory) -> Factory {
    Factory::new(TypeDef::Map(MapType::new(sub_type)))
}

/// Start a model definition; finish it with [`ModelType::into_factory`].
pub fn model(name: impl Into<String>) -> ModelType {
    ModelType::new(name)
}

pub fn union(members: impl IntoIterator<Item = Factory>) -> Factory {
    Factory::new(TypeDef::Union(UnionType::new(members.into_iter().collect())))
}

/// `null` or an instance of `ty`.
pub fn maybe(ty: Factory) -> Factory {
    union([null(), ty])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn todo() -> Factory {
        model("Todo")
            .prop("id", identifier())
            .prop_default("title", string(), json!(""))
            .into_factory()
    }

    #[test]
    fn names_and_descriptions() {
        assert_eq!(array(string()).name(), "string[]");
        assert_eq!(array(todo()).name(), "Todo[]");
        assert_eq!(array(todo()).describe(), "{ id: identifier; title: string }[]");
        assert_eq!(map(number()).name(), "map<number>");
        assert_eq!(maybe(todo()).name(), "null | Todo");
    }

    #[test]
    fn array_child_factory_is_constant() {
        let todos = array(todo());
        let a = todos.get_child_factory("0").unwrap();
        let b = todos.get_child_factory("17").unwrap();
        assert!(a.ptr_eq(&b));
        assert!(string().get_child_factory("0").is_none());
    }

    #[test]
    fn validation_gate_on_elements() {
        let todos = array(todo());
        assert!(todos.is(&json!([{"id": "a"}, {"id": 2, "title": "x"}])));
        assert!(!todos.is(&json!([{"id": "a"}, {"title": "no id"}])));
        assert!(!todos.is(&json!({"0": {"id": "a"}})));
        assert!(!array(integer()).is(&json!([1, 2.5])));
        assert!(!array(string()).is(&json!(["a", 1])));
    }

    #[test]
    fn identifier_attribute_lookup() {
        assert_eq!(todo().identifier_attribute(), Some("id"));
        assert_eq!(maybe(todo()).identifier_attribute(), Some("id"));
        assert_eq!(array(todo()).identifier_attribute(), None);
        assert_eq!(string().identifier_attribute(), None);
    }

    #[test]
    fn default_snapshots() {
        assert_eq!(array(todo()).default_snapshot(), Some(json!([])));
        assert_eq!(maybe(todo()).default_snapshot(), Some(Value::Null));
        assert_eq!(todo().default_snapshot(), None);
        assert_eq!(string().default_snapshot(), None);
    }

    #[test]
    fn dispatch_picks_first_accepting_member() {
        let u = maybe(todo());
        assert_eq!(u.dispatch(&Value::Null).unwrap().name(), "null");
        assert_eq!(u.dispatch(&json!({"id": "a"})).unwrap().name(), "Todo");
        assert!(u.dispatch(&json!(3)).is_none());
    }

    #[test]
    fn mutation_waits_for_finalize() {
        let list_type = array(string());
        let by_key_type = map(string());
        let mut tree = Tree::new();
        let list = tree.create(&list_type, None).unwrap();
        let by_key = tree.create(&by_key_type, None).unwrap();
        tree.node_mut(list).unwrap().finalized = false;
        tree.node_mut(by_key).unwrap().finalized = false;

        let push = || array::ArrayChange::Splice {
            index: 0,
            removed_count: 0,
            added: vec![json!("a").into()],
        };
        let set = || keyed::KeyedChange::Set {
            key: "k".into(),
            value: json!("v").into(),
        };
        assert_eq!(
            array::mutate(&mut tree, list, push()).unwrap_err(),
            crate::Error::NotFinalized(String::new())
        );
        assert!(matches!(
            keyed::mutate(&mut tree, by_key, set()),
            Err(crate::Error::NotFinalized(_))
        ));
        assert_eq!(tree.get_snapshot(list).unwrap(), json!([]));

        for (ty, id) in [(&list_type, list), (&by_key_type, by_key)] {
            ty.complex().unwrap().finalize_new_instance(&mut tree, id).unwrap();
        }
        array::mutate(&mut tree, list, push()).unwrap();
        keyed::mutate(&mut tree, by_key, set()).unwrap();
        assert_eq!(tree.get_snapshot(list).unwrap(), json!(["a"]));
        assert_eq!(tree.get_snapshot(by_key).unwrap(), json!({"k": "v"}));
    }
}
