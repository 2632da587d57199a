//! JSON Pointer (RFC 6901) paths as used by arbor patch streams.
//!
//! Every patch emitted by an arbor tree addresses its target with a pointer
//! string such as `/todos/3/title`. This crate converts between the string
//! form and the segment form, escapes individual segments, and interprets
//! array index steps (including the `-` end-of-array marker).
//!
//! # Example
//!
//! ```
//! use arbor_json_pointer::{format_json_pointer, parse_json_pointer, prefix_pointer};
//!
//! let path = parse_json_pointer("/todos/0").unwrap();
//! assert_eq!(path, vec!["todos".to_string(), "0".to_string()]);
//! assert_eq!(format_json_pointer(&path), "/todos/0");
//!
//! // A child's patch path gains its parent's segment on the way up.
//! assert_eq!(prefix_pointer("todos", "/0/title"), "/todos/0/title");
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod index;
pub mod validate;

pub use index::{parse_array_index, ArrayIndex};
pub use validate::{validate_json_pointer, validate_path};

/// A step in a pointer path. Array indices are decimal strings.
pub type PathStep = String;

/// A parsed JSON Pointer.
pub type Path = Vec<PathStep>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("pointer '{0}' must be empty or start with '/'")]
    PointerInvalid(String),
    #[error("pointer exceeds {0} characters")]
    PointerTooLong(usize),
    #[error("path exceeds {0} steps")]
    PathTooLong(usize),
    #[error("invalid array index '{0}'")]
    InvalidIndex(String),
    #[error("root path has no parent")]
    NoParent,
}

/// Unescapes a pointer segment: `~1` becomes `/`, `~0` becomes `~`.
///
/// ```
/// use arbor_json_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 before ~0, otherwise "~01" would decode to "/"
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer segment: `~` becomes `~0`, `/` becomes `~1`.
///
/// ```
/// use arbor_json_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a pointer string into its unescaped segments.
///
/// The empty string is the root and yields no segments. Pointers deeper
/// than [`validate::MAX_PATH_LENGTH`] steps are rejected.
///
/// ```
/// use arbor_json_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer("").unwrap(), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/").unwrap(), vec![""]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d").unwrap(), vec!["a~b", "c/d"]);
/// assert!(parse_json_pointer("todos").is_err());
/// ```
pub fn parse_json_pointer(pointer: &str) -> Result<Path, JsonPointerError> {
    validate_json_pointer(pointer)?;
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let path: Path = pointer[1..].split('/').map(unescape_component).collect();
    validate_path(&path)?;
    Ok(path)
}

/// Format segments into a pointer string. The root path formats as `""`.
///
/// ```
/// use arbor_json_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["a/b".to_string(), "0".to_string()]), "/a~1b/0");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Prepend one unescaped segment to an already formatted pointer.
pub fn prefix_pointer(segment: &str, pointer: &str) -> String {
    let segment = escape_component(segment);
    let mut out = String::with_capacity(segment.len() + pointer.len() + 1);
    out.push('/');
    out.push_str(&segment);
    out.push_str(pointer);
    out
}

/// Split a path into its parent path and last segment.
pub fn split_last(path: &[String]) -> Result<(&[String], &str), JsonPointerError> {
    match path.split_last() {
        Some((last, parent)) => Ok((parent, last.as_str())),
        None => Err(JsonPointerError::NoParent),
    }
}

/// Get a mutable value from a plain JSON document by path.
///
/// `-` never resolves, since it names the slot after the last element.
pub fn get_mut<'a>(val: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = val;
    for step in path {
        current = match current {
            Value::Array(arr) => match parse_array_index(step).ok()? {
                ArrayIndex::At(idx) => arr.get_mut(idx)?,
                ArrayIndex::End => return None,
            },
            Value::Object(map) => map.get_mut(step)?,
            _ => return None,
        };
    }
    Some(current)
}
