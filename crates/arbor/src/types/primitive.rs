//! Primitive (non-container) types. Their instances are plain values stored
//! directly in container slots.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// String or integer.
    Identifier,
    /// Any JSON value.
    Frozen,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Null => "null",
            PrimitiveType::Identifier => "identifier",
            PrimitiveType::Frozen => "frozen",
        }
    }

    pub fn is(&self, value: &Value) -> bool {
        match self {
            PrimitiveType::String => value.is_string(),
            PrimitiveType::Number => value.is_number(),
            PrimitiveType::Integer => is_integer(value),
            PrimitiveType::Boolean => value.is_boolean(),
            PrimitiveType::Null => value.is_null(),
            PrimitiveType::Identifier => value.is_string() || is_integer(value),
            PrimitiveType::Frozen => true,
        }
    }

    pub fn default_snapshot(&self) -> Option<Value> {
        match self {
            PrimitiveType::Null => Some(Value::Null),
            _ => None,
        }
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

/// Lookup key for an identifier value. Strings and integers share one key
/// space, so `1`, `1.0` and `"1"` name the same instance.
pub(crate) fn identifier_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if is_integer(value) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                // Whole floats print without a fraction; -0 folds into 0.
                n.as_f64().map(|f| (if f == 0.0 { 0.0 } else { f }).to_string())
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_accepts_whole_floats() {
        assert!(PrimitiveType::Integer.is(&json!(3)));
        assert!(PrimitiveType::Integer.is(&json!(3.0)));
        assert!(!PrimitiveType::Integer.is(&json!(3.5)));
        assert!(!PrimitiveType::Integer.is(&json!("3")));
    }

    #[test]
    fn identifier_accepts_strings_and_integers() {
        assert!(PrimitiveType::Identifier.is(&json!("a")));
        assert!(PrimitiveType::Identifier.is(&json!(7)));
        assert!(!PrimitiveType::Identifier.is(&json!(7.5)));
        assert!(!PrimitiveType::Identifier.is(&json!(null)));
    }

    #[test]
    fn identifier_keys_share_space() {
        assert_eq!(identifier_key(&json!(1)), identifier_key(&json!("1")));
        assert_eq!(identifier_key(&json!(1.0)), Some("1".to_string()));
        assert_eq!(identifier_key(&json!(-0.0)), Some("0".to_string()));
        assert_eq!(identifier_key(&json!(1.5)), None);
        assert_eq!(identifier_key(&json!(true)), None);
    }

    #[test]
    fn frozen_accepts_anything() {
        assert!(PrimitiveType::Frozen.is(&json!({"deep": [1, {"x": null}]})));
    }
}
