//! Lossy JSON projection of records.
//!
//! For logs and RPC surfaces only; the canonical form is CBOR and this
//! rendering is never hashed.

use serde_json::{Map, Number, Value};

use crate::cbor::CborValue;
use crate::record::Record;
use crate::serializer;

/// Render a record as JSON via its canonical map.
pub fn record_to_json(record: &Record) -> Value {
    value_to_json(&serializer::to_cbor(record))
}

/// Render a CBOR value as JSON.
///
/// Byte strings become lowercase hex, tags are unwrapped, non-finite
/// floats become null, and non-text map keys are dropped.
pub fn value_to_json(value: &CborValue) -> Value {
    match value {
        CborValue::Unsigned(v) => Value::Number(Number::from(*v)),
        CborValue::Signed(v) => Value::Number(Number::from(*v)),
        CborValue::Bytes(bytes) => Value::String(hex::encode(bytes)),
        CborValue::Text(s) => Value::String(s.clone()),
        CborValue::Array(items) => Value::Array(items.iter().map(value_to_json).collect()),
        CborValue::Map(entries) => {
            let mut object = Map::new();
            for (key, val) in entries {
                if let CborValue::Text(key) = key {
                    object.insert(key.clone(), value_to_json(val));
                }
            }
            Value::Object(object)
        }
        CborValue::Tagged(_, inner) => value_to_json(inner),
        CborValue::Bool(b) => Value::Bool(*b),
        CborValue::Null => Value::Null,
        CborValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
    }
}
