//! Pointer validation.

use crate::JsonPointerError;

/// Maximum allowed pointer string length.
pub const MAX_POINTER_LENGTH: usize = 1024;

/// Maximum allowed path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Validate a pointer string.
///
/// ```
/// use arbor_json_pointer::validate_json_pointer;
///
/// validate_json_pointer("").unwrap();
/// validate_json_pointer("/todos/0").unwrap();
/// validate_json_pointer("todos").unwrap_err();
/// ```
pub fn validate_json_pointer(pointer: &str) -> Result<(), JsonPointerError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(JsonPointerError::PointerInvalid(pointer.to_string()));
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(JsonPointerError::PointerTooLong(MAX_POINTER_LENGTH));
    }
    Ok(())
}

/// Validate a segment path.
pub fn validate_path(path: &[String]) -> Result<(), JsonPointerError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(JsonPointerError::PathTooLong(MAX_PATH_LENGTH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_long_pointer() {
        let pointer = format!("/{}", "a".repeat(MAX_POINTER_LENGTH));
        assert_eq!(
            validate_json_pointer(&pointer),
            Err(JsonPointerError::PointerTooLong(MAX_POINTER_LENGTH))
        );
    }

    #[test]
    fn too_deep_path() {
        let path = vec!["a".to_string(); MAX_PATH_LENGTH + 1];
        assert!(validate_path(&path).is_err());
        assert!(validate_path(&path[..MAX_PATH_LENGTH]).is_ok());
    }
}
