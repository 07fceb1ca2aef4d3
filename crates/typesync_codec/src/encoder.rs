//! Canonical byte encoder.
//!
//! Documents are hashed over this byte form, so two documents that differ
//! only in map key order encode to identical bytes. The layout follows the
//! deterministic CBOR rules of RFC 8949 Section 4.2.1:
//! - Map keys are sorted by their encoded form (length-first, then bytewise)
//! - Integers use the shortest possible encoding
//! - No indefinite-length encoding

use crate::value::Value;

/// Destination for canonical bytes.
///
/// Implemented for `Vec<u8>`; hashing code implements it for its digest
/// state so documents can be hashed without an intermediate buffer.
pub trait ByteSink {
    /// Append bytes to the sink.
    fn put(&mut self, bytes: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Encode a value to its canonical bytes.
pub fn to_canonical_bytes(value: &Value) -> Vec<u8> {
    let mut encoder = CanonicalEncoder::new(Vec::new());
    encoder.encode(value);
    encoder.into_inner()
}

/// A canonical encoder writing into any [`ByteSink`].
pub struct CanonicalEncoder<S: ByteSink> {
    sink: S,
}

impl<S: ByteSink> CanonicalEncoder<S> {
    /// Create a new encoder over `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) {
        match value {
            // null is simple value 22, false/true are 20/21
            Value::Null => self.sink.put(&[0xf6]),
            Value::Bool(b) => self.sink.put(&[if *b { 0xf5 } else { 0xf4 }]),
            Value::Integer(n) => self.encode_integer(*n),
            Value::Bytes(b) => {
                self.encode_head(2, b.len() as u64);
                self.sink.put(b);
            }
            Value::Text(s) => {
                self.encode_head(3, s.len() as u64);
                self.sink.put(s.as_bytes());
            }
            Value::Array(items) => {
                self.encode_head(4, items.len() as u64);
                for item in items {
                    self.encode(item);
                }
            }
            Value::Map(pairs) => self.encode_map(pairs),
        }
    }

    /// Consume this encoder and return the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode_integer(&mut self, n: i64) {
        if n >= 0 {
            self.encode_head(0, n as u64);
        } else {
            // -1 encodes as 0, -2 as 1; -(n+1) cannot overflow for n < 0
            self.encode_head(1, (-(n + 1)) as u64);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_head(&mut self, major_type: u8, value: u64) {
        let mt = major_type << 5;

        if value < 24 {
            self.sink.put(&[mt | (value as u8)]);
        } else if let Ok(v) = u8::try_from(value) {
            self.sink.put(&[mt | 24, v]);
        } else if let Ok(v) = u16::try_from(value) {
            self.sink.put(&[mt | 25]);
            self.sink.put(&v.to_be_bytes());
        } else if let Ok(v) = u32::try_from(value) {
            self.sink.put(&[mt | 26]);
            self.sink.put(&v.to_be_bytes());
        } else {
            self.sink.put(&[mt | 27]);
            self.sink.put(&value.to_be_bytes());
        }
    }

    fn encode_map(&mut self, pairs: &[(Value, Value)]) {
        // Maps built by hand may not be sorted, so order by encoded key here
        let mut encoded: Vec<(Vec<u8>, &Value)> = pairs
            .iter()
            .map(|(k, v)| (to_canonical_bytes(k), v))
            .collect();
        encoded.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));

        self.encode_head(5, pairs.len() as u64);
        for (key, value) in encoded {
            self.sink.put(&key);
            self.encode(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_scalars() {
        assert_eq!(to_canonical_bytes(&Value::Null), vec![0xf6]);
        assert_eq!(to_canonical_bytes(&Value::Bool(false)), vec![0xf4]);
        assert_eq!(to_canonical_bytes(&Value::Bool(true)), vec![0xf5]);
        assert_eq!(to_canonical_bytes(&Value::Integer(23)), vec![0x17]);
        assert_eq!(to_canonical_bytes(&Value::Integer(24)), vec![0x18, 24]);
        assert_eq!(
            to_canonical_bytes(&Value::Integer(256)),
            vec![0x19, 0x01, 0x00]
        );
        assert_eq!(
            to_canonical_bytes(&Value::Integer(65536)),
            vec![0x1a, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn encode_negative_integers() {
        assert_eq!(to_canonical_bytes(&Value::Integer(-1)), vec![0x20]);
        assert_eq!(to_canonical_bytes(&Value::Integer(-24)), vec![0x37]);
        assert_eq!(to_canonical_bytes(&Value::Integer(-100)), vec![0x38, 99]);
    }

    #[test]
    fn encode_text_and_array() {
        assert_eq!(
            to_canonical_bytes(&Value::from("hello")),
            vec![0x65, b'h', b'e', b'l', b'l', b'o']
        );
        assert_eq!(
            to_canonical_bytes(&Value::Array(vec![Value::Integer(1), Value::Integer(2)])),
            vec![0x82, 0x01, 0x02]
        );
    }

    #[test]
    fn unsorted_map_encodes_sorted() {
        let map = Value::Map(vec![
            (Value::from("bb"), Value::Integer(2)),
            (Value::from("a"), Value::Integer(1)),
        ]);

        assert_eq!(
            to_canonical_bytes(&map),
            vec![0xa2, 0x61, b'a', 0x01, 0x62, b'b', b'b', 0x02]
        );
    }

    #[test]
    fn key_order_does_not_change_bytes() {
        let first = Value::Map(vec![
            (Value::from("Alias"), Value::from("home")),
            (Value::from("Name"), Value::from("Home")),
        ]);
        let second = Value::Map(vec![
            (Value::from("Name"), Value::from("Home")),
            (Value::from("Alias"), Value::from("home")),
        ]);

        assert_eq!(to_canonical_bytes(&first), to_canonical_bytes(&second));
    }

    #[test]
    fn custom_sink_receives_same_bytes() {
        struct Counter(usize);
        impl ByteSink for Counter {
            fn put(&mut self, bytes: &[u8]) {
                self.0 += bytes.len();
            }
        }

        let doc = Value::object([("Tabs", Value::Array(vec![Value::from("Content")]))]);
        let mut encoder = CanonicalEncoder::new(Counter(0));
        encoder.encode(&doc);

        assert_eq!(encoder.into_inner().0, to_canonical_bytes(&doc).len());
    }
}
