//! Conversions between tree values and bound field types.
//!
//! The tree side is always `serde_json::Value`; the typed side is whatever a
//! binding declares. Matching is strict and exhaustive per value kind: a
//! number never parses out of a string, and integer conversions respect the
//! target's range. A failed conversion yields `None`: field bindings treat
//! that as an absent slot, dictionary bindings treat it as a type mismatch.

use serde_json::Value;

/// Decode direction: build a field value from a tree value.
pub trait FromValue: Sized {
    /// Returns `None` when the value's kind or range does not fit `Self`.
    fn from_value(value: &Value) -> Option<Self>;
}

/// Encode direction: re-emit a field value into a tree value.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Codec for dictionary keys.
///
/// Tree keys are strings on the wire; a typed dictionary key must parse out
/// of one and print back into one. `Ord` is required because dictionary
/// slots are ordered maps.
pub trait TreeKey: Ord + Sized {
    /// Returns `None` when the tree key does not fit `Self`.
    fn from_key(key: &str) -> Option<Self>;

    fn to_key(&self) -> String;
}

/// Kind of a tree value, for error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a tree node",
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl ToValue for i32 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().and_then(|n| u32::try_from(n).ok())
    }
}

impl ToValue for u32 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

/// Identity conversion: keeps the raw tree value, whatever its kind.
///
/// `Value`-typed slots are the only way to bind JSON arrays or to hold an
/// explicit `null` that survives serialization.
impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl TreeKey for String {
    fn from_key(key: &str) -> Option<Self> {
        Some(key.to_owned())
    }

    fn to_key(&self) -> String {
        self.clone()
    }
}

impl TreeKey for i64 {
    fn from_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    fn to_key(&self) -> String {
        self.to_string()
    }
}

impl TreeKey for u64 {
    fn from_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }

    fn to_key(&self) -> String {
        self.to_string()
    }
}
