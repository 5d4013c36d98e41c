//! Shape guards over the loosely structured legacy payloads.
//!
//! The legacy backend answers with `{status, data, error?}` most of the
//! time, but `data` may be a bare array, an object wrapping another `data`
//! array, a paged wrapper, or an object whose values are the items. Every
//! guard here is explicit about which shapes it accepts and never fails on
//! the others.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyPayload(Value);

impl LegacyPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a response body. An empty body is a null payload.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(Self(Value::Null));
        }
        serde_json::from_str(body).map(Self)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Whether the payload reports a logical failure despite HTTP success.
    pub fn signals_error(&self) -> bool {
        self.0.get("status").and_then(Value::as_str) == Some("error")
            || self.0.get("errors").is_some_and(is_truthy)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// The `data` member, or the payload itself when it is a bare array.
    pub fn data(&self) -> Option<&Value> {
        match &self.0 {
            Value::Array(_) => Some(&self.0),
            other => other.get("data").filter(|d| is_truthy(d)),
        }
    }

    /// First truthy value among top-level `key` and `data.key`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0
            .get(key)
            .filter(|v| is_truthy(v))
            .or_else(|| self.0.get("data")?.get(key).filter(|v| is_truthy(v)))
    }
}

/// Truthiness as the legacy contract uses it: null, false, 0, NaN and the
/// empty string are absent; empty arrays and objects are present.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// How an object `data` member with no nested list is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectValues {
    /// Every value is an item, scalars included.
    All,
    /// Values are items only when all of them are objects. For families
    /// whose `data` may be a paged wrapper with scalar fields.
    OnlyObjects,
}

/// Extract the item list from a `data` member.
///
/// Accepted shapes, in order:
/// - a bare array;
/// - an object with a truthy `data` member (or one of `alt_keys`), used
///   when it is an array and otherwise yielding nothing;
/// - an object whose values are the items, as `values` allows.
///
/// Anything else is an empty list.
pub fn unwrap_items(data: Option<&Value>, alt_keys: &[&str], values: ObjectValues) -> Vec<Value> {
    let Some(data) = data else {
        return Vec::new();
    };
    match data {
        Value::Array(items) => items.clone(),
        Value::Object(fields) => {
            let nested = std::iter::once("data")
                .chain(alt_keys.iter().copied())
                .find_map(|key| fields.get(key).filter(|v| is_truthy(v)));
            match nested {
                Some(Value::Array(items)) => items.clone(),
                Some(_) => Vec::new(),
                None => {
                    let all_objects = fields.values().all(Value::is_object);
                    if values == ObjectValues::All || all_objects {
                        fields.values().cloned().collect()
                    } else {
                        Vec::new()
                    }
                }
            }
        }
        _ => Vec::new(),
    }
}

/// Copy only the listed keys of `item` into a new object.
///
/// Keys absent from the item stay absent. Non-object items project to an
/// empty object so list cardinality is preserved.
pub fn project(item: &Value, keys: &[&str]) -> Map<String, Value> {
    let mut projected = Map::new();
    if let Value::Object(fields) = item {
        for key in keys {
            if let Some(value) = fields.get(*key) {
                projected.insert((*key).to_string(), value.clone());
            }
        }
    }
    projected
}

/// Replace a missing or falsy member with `default`.
pub fn default_falsy(fields: &mut Map<String, Value>, key: &str, default: Value) {
    if !fields.get(key).is_some_and(is_truthy) {
        fields.insert(key.to_string(), default);
    }
}

/// Positive integer member of `value`, or `default`.
pub fn count_or(value: &Value, key: &str, default: u64) -> u64 {
    value
        .get(key)
        .and_then(Value::as_u64)
        .filter(|n| *n != 0)
        .unwrap_or(default)
}
