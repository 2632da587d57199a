//! Observable state trees that stay in sync with JSON snapshots and
//! JSON-Patch streams.
//!
//! A [`Tree`] holds nodes created from typed [`Factory`] definitions. Every
//! mutation of a node's container is intercepted before it commits (child
//! values are validated and parented) and turned into patches after it
//! commits. Patches propagate from the changed node up to its root, so a
//! listener on the root sees every change with a fully qualified path.
//!
//! The reverse direction re-enters the same pipeline: [`Tree::apply_patch`]
//! and [`Tree::apply_snapshot`] mutate live containers and emit patches
//! again. Applying a snapshot to an array of identified models reconciles by
//! identifier, so existing nodes keep their identity.
//!
//! # Example
//!
//! ```
//! use arbor::types::{array, identifier, model, string};
//! use arbor::Tree;
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let todo = model("Todo")
//!     .prop("id", identifier())
//!     .prop_default("title", string(), json!(""))
//!     .into_factory();
//! let mut tree = Tree::new();
//! let todos = tree.create(&array(todo), Some(json!([{"id": "a", "title": "milk"}]))).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! tree.on_patch(todos, move |p| sink.borrow_mut().push(p.to_json())).unwrap();
//!
//! tree.apply_snapshot(todos, &json!([{"id": "a", "title": "eggs"}])).unwrap();
//! assert_eq!(
//!     *seen.borrow(),
//!     vec![json!({"op": "replace", "path": "/0/title", "value": "eggs"})]
//! );
//! ```

pub mod error;
pub mod options;
pub mod patch;
pub mod tree;
pub mod types;

pub use error::{Error, Result};
pub use options::{ReinsertionPolicy, TreeOptions};
pub use patch::{Patch, PatchOp};
pub use tree::node::{Child, Input, ListenerId, NodeId};
pub use tree::Tree;
pub use types::Factory;
