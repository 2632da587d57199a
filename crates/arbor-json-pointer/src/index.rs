//! Array index steps.

use crate::JsonPointerError;

/// Position named by a pointer step inside an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIndex {
    /// A concrete slot.
    At(usize),
    /// `-`: the slot one past the last element.
    End,
}

impl ArrayIndex {
    /// Resolve against an array of length `len`.
    pub fn resolve(self, len: usize) -> usize {
        match self {
            ArrayIndex::At(idx) => idx,
            ArrayIndex::End => len,
        }
    }
}

/// Parse a pointer step as an array index.
///
/// Leading zeros, signs and non-digits are rejected, as RFC 6901 requires.
///
/// ```
/// use arbor_json_pointer::{parse_array_index, ArrayIndex};
///
/// assert_eq!(parse_array_index("12").unwrap(), ArrayIndex::At(12));
/// assert_eq!(parse_array_index("-").unwrap(), ArrayIndex::End);
/// assert!(parse_array_index("01").is_err());
/// assert!(parse_array_index("-1").is_err());
/// ```
pub fn parse_array_index(step: &str) -> Result<ArrayIndex, JsonPointerError> {
    if step == "-" {
        return Ok(ArrayIndex::End);
    }
    let bytes = step.as_bytes();
    let well_formed = !bytes.is_empty()
        && bytes.iter().all(u8::is_ascii_digit)
        && (bytes.len() == 1 || bytes[0] != b'0');
    if !well_formed {
        return Err(JsonPointerError::InvalidIndex(step.to_string()));
    }
    step.parse()
        .map(ArrayIndex::At)
        .map_err(|_| JsonPointerError::InvalidIndex(step.to_string()))
}
