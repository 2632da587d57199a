//! Error type shared by every tree operation.

use arbor_json_pointer::JsonPointerError;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A snapshot or value does not match the type it is assigned to.
    #[error("value '{snapshot}' is not assignable to type '{type_name}'")]
    Validation { type_name: String, snapshot: Value },

    /// Two live elements share an identifier during reconciliation.
    #[error("identifier '{identifier}' (of {path}) is not unique")]
    UniquenessViolation { identifier: String, path: String },

    /// A node that already has a parent was inserted somewhere else,
    /// or a node was inserted into its own subtree.
    #[error("cannot insert node '{node}' at '{target}': it is already part of the tree at another position")]
    IdentityConflict { node: String, target: String },

    /// The handle refers to a node that was disposed or never existed.
    #[error("stale or unknown node handle")]
    NodeNotFound,

    /// A container operation was requested on a type that is not a container.
    #[error("type '{0}' is not a container type")]
    NotComplex(String),

    /// A container operation does not match the container kind of the node.
    #[error("node at '{path}' is {actual}, expected {expected}")]
    WrongContainer {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("no child node at '{0}'")]
    PathNotFound(String),

    #[error("index {index} is out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("model '{model}' has no property '{key}'")]
    UnknownProperty { model: String, key: String },

    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// Only detached subtrees can be disposed.
    #[error("node at '{0}' is still attached to a parent")]
    Attached(String),

    /// The container was allocated but its interception was never armed.
    #[error("node at '{0}' is not finalized")]
    NotFinalized(String),

    #[error(transparent)]
    Pointer(#[from] JsonPointerError),
}

impl Error {
    pub(crate) fn validation(type_name: impl Into<String>, snapshot: &Value) -> Self {
        Error::Validation {
            type_name: type_name.into(),
            snapshot: snapshot.clone(),
        }
    }
}
