//! JSON text form of documents.
//!
//! Snapshots are stored on disk as pretty-printed JSON so they diff well in
//! version control. Hashing never uses this form; see [`crate::to_canonical_bytes`].

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use serde_json::Value as Json;

/// Render a document as pretty-printed JSON text.
///
/// # Errors
///
/// Returns an error if the document has non-text map keys or byte strings,
/// neither of which has a JSON representation.
pub fn to_json_string(value: &Value) -> CodecResult<String> {
    let json = to_json(value)?;
    serde_json::to_string_pretty(&json).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Parse JSON text into a document.
///
/// # Errors
///
/// Returns an error for malformed JSON, floats, or integers outside the
/// signed 64-bit range.
pub fn from_json_str(text: &str) -> CodecResult<Value> {
    let json: Json = serde_json::from_str(text)?;
    from_json(&json)
}

fn to_json(value: &Value) -> CodecResult<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(n) => Json::from(*n),
        Value::Text(s) => Json::String(s.clone()),
        Value::Bytes(_) => return Err(CodecError::unsupported_type("bytes")),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect::<CodecResult<_>>()?),
        Value::Map(pairs) => {
            let mut object = serde_json::Map::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = key
                    .as_text()
                    .ok_or_else(|| CodecError::invalid_structure("map keys must be text"))?;
                object.insert(key.to_string(), to_json(value)?);
            }
            Json::Object(object)
        }
    })
}

fn from_json(json: &Json) -> CodecResult<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.is_u64() {
                return Err(CodecError::IntegerOverflow);
            } else {
                return Err(CodecError::FloatForbidden);
            }
        }
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(from_json).collect::<CodecResult<_>>()?),
        Json::Object(object) => Value::map(
            object
                .iter()
                .map(|(k, v)| Ok((Value::Text(k.clone()), from_json(v)?)))
                .collect::<CodecResult<_>>()?,
        ),
    })
}
