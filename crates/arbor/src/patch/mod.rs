//! JSON-Patch operations produced and consumed by a tree.
//!
//! Only the three structural operations of RFC 6902 are used: `add`,
//! `remove` and `replace`. Paths are RFC 6901 pointers relative to the node
//! a listener subscribed on (fully qualified when subscribed on a root).

pub mod apply;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use apply::{apply_patches_to_snapshot, apply_to_snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
        }
    }
}

impl std::fmt::Display for PatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic change at one path.
///
/// Wire format: `{"op": "add"|"remove"|"replace", "path": "/a/0", "value": ...}`.
/// `value` is present for `add` and `replace`, and may be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: PatchOp,
    pub path: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<Value>,
}

// A present `"value": null` is a value, not an absent field.
fn present_value<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

impl Patch {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// The same operation one level further up: `segment` is prepended to
    /// the path.
    pub fn prefixed(&self, segment: &str) -> Self {
        Self {
            op: self.op,
            path: arbor_json_pointer::prefix_pointer(segment, &self.path),
            value: self.value.clone(),
        }
    }

    /// The value carried by an `add`/`replace`.
    pub fn required_value(&self) -> Result<&Value> {
        match (self.op, &self.value) {
            (PatchOp::Remove, _) => Err(Error::InvalidPatch(format!(
                "'remove' at '{}' carries no value",
                self.path
            ))),
            (_, Some(value)) => Ok(value),
            (op, None) => Err(Error::InvalidPatch(format!(
                "'{op}' at '{}' is missing its value",
                self.path
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        // Patch only holds strings and JSON values, serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        Patch::deserialize(value).map_err(|e| Error::InvalidPatch(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format() {
        assert_eq!(
            Patch::add("/0", json!({"id": "a"})).to_json(),
            json!({"op": "add", "path": "/0", "value": {"id": "a"}})
        );
        assert_eq!(
            Patch::remove("/3").to_json(),
            json!({"op": "remove", "path": "/3"})
        );
    }

    #[test]
    fn null_value_survives_decoding() {
        let patch = Patch::from_json(&json!({"op": "replace", "path": "/a", "value": null})).unwrap();
        assert_eq!(patch.value, Some(Value::Null));
        assert_eq!(patch.required_value().unwrap(), &Value::Null);
        let patch = Patch::from_json(&json!({"op": "remove", "path": "/a"})).unwrap();
        assert_eq!(patch.value, None);
    }

    #[test]
    fn unknown_op_is_rejected() {
        let err = Patch::from_json(&json!({"op": "move", "path": "/a", "from": "/b"})).unwrap_err();
        assert!(matches!(err, Error::InvalidPatch(_)));
    }

    #[test]
    fn missing_value_is_reported() {
        let patch = Patch {
            op: PatchOp::Add,
            path: "/0".into(),
            value: None,
        };
        assert!(matches!(patch.required_value(), Err(Error::InvalidPatch(_))));
    }

    #[test]
    fn prefixing_builds_path_bottom_up() {
        let patch = Patch::replace("/title", json!("x")).prefixed("0").prefixed("todos");
        assert_eq!(patch.path, "/todos/0/title");
    }
}
