//! Tagged value type with lazy, fallible coercion.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors raised when reading a [`Value`] through an incompatible accessor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("cannot convert '{0}' to an integer")]
    NotAnInt(String),

    #[error("cannot convert '{0}' to a boolean")]
    NotABool(String),

    #[error("value is not {0}")]
    TypeMismatch(&'static str),
}

/// The representation a switch expects for its values, derived from its
/// action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Auto,
    Int,
    Bool,
}

/// A single resolved value.
///
/// `Auto` holds uninterpreted text and coerces lazily: `as_int` and `as_bool`
/// parse it on access and fail with a [`ValueError`] when the text does not
/// fit. `Str`, `Int` and `Bool` are fixed representations; reading them
/// through the wrong accessor is also a [`ValueError`], since text from the
/// command line can reach any of these paths.
#[derive(Debug, Clone)]
pub enum Value {
    Auto(String),
    Str(String),
    Int(i64),
    Bool(bool),
}

impl Value {
    /// The unset value: auto-typed empty text.
    pub fn null() -> Value {
        Value::Auto(String::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Auto(text) if text.is_empty())
    }

    /// Read as an integer. `Auto` text parses as an optional sign followed
    /// by digits.
    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Auto(text) => text
                .parse()
                .map_err(|_| ValueError::NotAnInt(text.clone())),
            Value::Int(value) => Ok(*value),
            _ => Err(ValueError::TypeMismatch("an integer")),
        }
    }

    /// Read as a boolean. `Auto` text accepts the case-insensitive literals
    /// no/false/0/off and yes/true/1/on.
    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Auto(text) => {
                parse_bool(text).ok_or_else(|| ValueError::NotABool(text.clone()))
            }
            Value::Bool(value) => Ok(*value),
            _ => Err(ValueError::TypeMismatch("a boolean")),
        }
    }

    /// Read as text. Valid for `Auto` and `Str` values.
    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Value::Auto(text) | Value::Str(text) => Ok(text),
            _ => Err(ValueError::TypeMismatch("a string")),
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::null()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::Auto(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::Auto(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Int(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

// Equality coerces the `Auto` side against the other side's representation,
// so `Value::from(3) == Value::from("3")`. A failed coercion compares
// unequal rather than erroring.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use Value::{Auto, Bool, Int, Str};
        match (self, other) {
            (Auto(a), Auto(b))
            | (Auto(a), Str(b))
            | (Str(a), Auto(b))
            | (Str(a), Str(b)) => a == b,
            (Auto(a), Int(b)) | (Int(b), Auto(a)) => {
                a.parse::<i64>().map(|v| v == *b).unwrap_or(false)
            }
            (Auto(a), Bool(b)) | (Bool(b), Auto(a)) => {
                parse_bool(a).map(|v| v == *b).unwrap_or(false)
            }
            (Int(a), Int(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Auto(text) | Value::Str(text) => f.write_str(text),
            Value::Int(value) => write!(f, "{}", value),
            Value::Bool(value) => f.write_str(if *value { "true" } else { "false" }),
        }
    }
}

// Accepts a bare JSON string, integer or boolean, so switch definitions can
// write `"default": 8080` or `"default": "out.txt"` directly.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, integer or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                i64::try_from(v)
                    .map(Value::Int)
                    .map_err(|_| E::custom(format!("integer {} out of range", v)))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Bool(v))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Parse a boolean literal: no/false/0/off and yes/true/1/on,
/// case-insensitive.
pub fn parse_bool(text: &str) -> Option<bool> {
    for negative in ["no", "false", "0", "off"] {
        if text.eq_ignore_ascii_case(negative) {
            return Some(false);
        }
    }
    for positive in ["yes", "true", "1", "on"] {
        if text.eq_ignore_ascii_case(positive) {
            return Some(true);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_coerces_to_int() {
        assert_eq!(Value::from("42").as_int(), Ok(42));
        assert_eq!(Value::from("-7").as_int(), Ok(-7));
        assert_eq!(Value::from("+3").as_int(), Ok(3));
    }

    #[test]
    fn test_auto_int_coercion_fails() {
        assert_eq!(
            Value::from("nope").as_int(),
            Err(ValueError::NotAnInt("nope".to_string()))
        );
    }

    #[test]
    fn test_auto_coerces_to_bool() {
        for text in ["no", "False", "0", "OFF"] {
            assert_eq!(Value::from(text).as_bool(), Ok(false), "{}", text);
        }
        for text in ["yes", "True", "1", "ON"] {
            assert_eq!(Value::from(text).as_bool(), Ok(true), "{}", text);
        }
    }

    #[test]
    fn test_auto_bool_coercion_fails() {
        assert_eq!(
            Value::from("frob").as_bool(),
            Err(ValueError::NotABool("frob".to_string()))
        );
    }

    #[test]
    fn test_typed_access_mismatch() {
        assert_eq!(
            Value::Int(3).as_bool(),
            Err(ValueError::TypeMismatch("a boolean"))
        );
        assert_eq!(
            Value::Bool(true).as_int(),
            Err(ValueError::TypeMismatch("an integer"))
        );
        assert_eq!(
            Value::Int(3).as_str(),
            Err(ValueError::TypeMismatch("a string"))
        );
    }

    #[test]
    fn test_equality_coerces_auto() {
        assert_eq!(Value::from(3), Value::from("3"));
        assert_eq!(Value::from("3"), Value::from(3));
        assert_eq!(Value::from(true), Value::from("yes"));
        assert_eq!(Value::from("bar"), Value::Str("bar".to_string()));
        assert_ne!(Value::from(3), Value::from("4"));
        assert_ne!(Value::from("frob"), Value::from(true));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn test_null_value() {
        assert!(Value::null().is_null());
        assert!(!Value::from("x").is_null());
        assert_eq!(Value::null(), Value::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("bar").to_string(), "bar");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_deserialize_from_json() {
        assert_eq!(
            serde_json::from_str::<Value>(r#""out.txt""#).unwrap(),
            Value::from("out.txt")
        );
        assert_eq!(serde_json::from_str::<Value>("8080").unwrap(), Value::Int(8080));
        assert_eq!(serde_json::from_str::<Value>("true").unwrap(), Value::Bool(true));
    }
}
