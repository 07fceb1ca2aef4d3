//! # TypeSync Codec
//!
//! Document tree and canonical encoding for TypeSync.
//!
//! Definition documents are trees of [`Value`]s. This crate provides:
//! - A deterministic byte form used for hashing ([`to_canonical_bytes`])
//! - A JSON text form used for snapshots on disk ([`to_json_string`], [`from_json_str`])
//!
//! ## Canonical Rules
//!
//! - Map keys are sorted by their encoded form, so field order never matters
//! - Array order is preserved, so list order always matters
//! - Integers use shortest encoding
//! - No floats
//!
//! ## Usage
//!
//! ```
//! use typesync_codec::{from_json_str, to_canonical_bytes, Value};
//!
//! let a = from_json_str(r#"{"Alias": "home", "Name": "Home"}"#).unwrap();
//! let b = from_json_str(r#"{"Name": "Home", "Alias": "home"}"#).unwrap();
//! assert_eq!(to_canonical_bytes(&a), to_canonical_bytes(&b));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod encoder;
mod error;
mod json;
mod value;

pub use encoder::{to_canonical_bytes, ByteSink, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use json::{from_json_str, to_json_string};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::Text),
        ]
    }

    proptest! {
        #[test]
        fn field_order_never_changes_bytes(
            fields in prop::collection::btree_map("[A-Za-z]{1,8}", leaf(), 0..8)
        ) {
            let forward: Vec<(Value, Value)> = fields
                .iter()
                .map(|(k, v)| (Value::from(k.as_str()), v.clone()))
                .collect();
            let mut backward = forward.clone();
            backward.reverse();

            prop_assert_eq!(
                to_canonical_bytes(&Value::Map(forward)),
                to_canonical_bytes(&Value::Map(backward))
            );
        }
    }
}
