//! Dynamic document value type.

use crate::encoder::to_canonical_bytes;
use std::cmp::Ordering;

/// A node in a definition document.
///
/// Documents are trees: maps carry named fields (their order is never
/// significant), arrays carry ordered lists. Floats are intentionally not
/// supported so that every document has exactly one canonical byte form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (supports full i64 range).
    Integer(i64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string (UTF-8).
    Text(String),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Map of key-value pairs (kept sorted by canonical key order).
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with sorted keys.
    ///
    /// Keys are sorted by their canonical encoding (length-first, then bytewise).
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        Value::Map(pairs)
    }

    /// Create a map value from text keys.
    ///
    /// ```
    /// use typesync_codec::Value;
    ///
    /// let info = Value::object([("Alias", Value::from("home")), ("Name", Value::from("Home"))]);
    /// assert_eq!(info.get("Alias").and_then(Value::as_text), Some("home"));
    /// ```
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::map(
            fields
                .into_iter()
                .map(|(k, v)| (Value::Text(k.into()), v))
                .collect(),
        )
    }

    /// Compare two values by their canonical byte form.
    ///
    /// Shorter encodings sort first; equal lengths compare bytewise.
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let a = to_canonical_bytes(self);
        let b = to_canonical_bytes(other);
        a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for scalar values (anything that is not an array or map).
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Map(_))
    }

    /// Returns true for null, whitespace-only text and empty byte strings.
    ///
    /// Blank leaves carry no information and are skipped by tree walks.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as bytes, if it is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a mutable array, if it is one.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Textual form of a leaf value.
    ///
    /// Text is returned as-is, integers and booleans in their decimal and
    /// `true`/`false` forms, null as the empty string and bytes as lowercase
    /// hex. Containers have no textual form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Bytes(b) => Some(b.iter().map(|b| format!("{:02x}", b)).collect()),
            Value::Array(_) | Value::Map(_) => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_text() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a key in this map value for mutation.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Map(pairs) => pairs
                .iter_mut()
                .find(|(k, _)| k.as_text() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns true if this is a map containing `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a text-keyed entry, keeping canonical key order.
    ///
    /// Returns the previous value for the key. Has no effect on non-maps.
    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        let Value::Map(pairs) = self else {
            return None;
        };
        if let Some((_, slot)) = pairs.iter_mut().find(|(k, _)| k.as_text() == Some(key)) {
            return Some(std::mem::replace(slot, value));
        }
        let key = Value::Text(key.to_string());
        let at = pairs
            .iter()
            .position(|(k, _)| k.cmp_canonical(&key) == Ordering::Greater)
            .unwrap_or(pairs.len());
        pairs.insert(at, (key, value));
        None
    }

    /// Remove a text-keyed entry from a map, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let Value::Map(pairs) = self else {
            return None;
        };
        let at = pairs.iter().position(|(k, _)| k.as_text() == Some(key))?;
        Some(pairs.remove(at).1)
    }

    /// Number of values nested below this one.
    ///
    /// Map keys are not counted; every array item and map value is, along
    /// with everything beneath it.
    pub fn descendant_count(&self) -> usize {
        match self {
            Value::Array(items) => items.iter().map(|v| 1 + v.descendant_count()).sum(),
            Value::Map(pairs) => pairs.iter().map(|(_, v)| 1 + v.descendant_count()).sum(),
            _ => 0,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}
