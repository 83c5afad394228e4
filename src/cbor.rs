//! CBOR value model and codec.
//!
//! The record layer works over a dynamic value model because records
//! carry open-ended metadata next to their structural fields. Encoding
//! is deterministic (definite lengths, shortest-form integers, entries
//! in caller order); decoding is a single tolerant pass over all
//! top-level items, bounded by [`Limits`].

use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};

use crate::error::{DecodeError, EncodeError};
use crate::limits::Limits;

/// Self-describe tag (RFC 8949 §3.4.6). Tolerated on decode, never
/// emitted.
pub const SELF_DESCRIBE_TAG: u64 = 55799;

/// A CBOR data item.
///
/// Maps are ordered lists of key/value pairs; keys may be any value,
/// though the record layer only ever uses text strings. Half and single
/// precision floats are widened to doubles on decode.
#[derive(Clone, Debug, PartialEq)]
pub enum CborValue {
    Unsigned(u64),
    /// Negative integers. Non-negative values always decode as
    /// [`CborValue::Unsigned`].
    Signed(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<CborValue>),
    Map(Vec<(CborValue, CborValue)>),
    Tagged(u64, Box<CborValue>),
    Bool(bool),
    Null,
    Float(f64),
}

impl CborValue {
    /// Name of the CBOR kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CborValue::Unsigned(_) | CborValue::Signed(_) => "integer",
            CborValue::Bytes(_) => "byte string",
            CborValue::Text(_) => "text string",
            CborValue::Array(_) => "array",
            CborValue::Map(_) => "map",
            CborValue::Tagged(..) => "tag",
            CborValue::Bool(_) => "bool",
            CborValue::Null => "null",
            CborValue::Float(_) => "float",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            CborValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(CborValue, CborValue)]> {
        match self {
            CborValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Encode a single value to bytes.
///
/// Deterministic for a fixed value: definite lengths everywhere and
/// shortest-form integer headers. Map entries are emitted in the order
/// supplied; the serializer is responsible for canonical key order.
pub fn encode_value(value: &CborValue) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    write_value(&mut enc, value)?;
    Ok(buf)
}

fn write_value(enc: &mut Encoder<&mut Vec<u8>>, value: &CborValue) -> Result<(), EncodeError> {
    match value {
        CborValue::Unsigned(v) => {
            enc.u64(*v)?;
        }
        CborValue::Signed(v) => {
            enc.i64(*v)?;
        }
        CborValue::Bytes(b) => {
            enc.bytes(b)?;
        }
        CborValue::Text(s) => {
            enc.str(s)?;
        }
        CborValue::Array(items) => {
            enc.array(items.len() as u64)?;
            for item in items {
                write_value(enc, item)?;
            }
        }
        CborValue::Map(entries) => {
            enc.map(entries.len() as u64)?;
            for (key, val) in entries {
                write_value(enc, key)?;
                write_value(enc, val)?;
            }
        }
        CborValue::Tagged(tag, inner) => {
            enc.tag(Tag::new(*tag))?;
            write_value(enc, inner)?;
        }
        CborValue::Bool(b) => {
            enc.bool(*b)?;
        }
        CborValue::Null => {
            enc.null()?;
        }
        CborValue::Float(f) => {
            if !f.is_finite() {
                return Err(EncodeError::NonFiniteFloat);
            }
            enc.f64(*f)?;
        }
    }
    Ok(())
}

/// Decode every top-level item in `bytes`.
///
/// Returns a possibly-empty list. Truncated or malformed input fails
/// with [`DecodeError::CborDecodingFailed`]; oversized input with
/// [`DecodeError::DecodeLimit`].
pub fn decode_values(bytes: &[u8], limits: &Limits) -> Result<Vec<CborValue>, DecodeError> {
    if bytes.len() > limits.max_record_bytes {
        return Err(DecodeError::DecodeLimit("max_record_bytes"));
    }
    let mut dec = Decoder::new(bytes);
    let mut values = Vec::new();
    while dec.position() < bytes.len() {
        values.push(read_value(&mut dec, limits, 0)?);
    }
    Ok(values)
}

fn read_value(dec: &mut Decoder, limits: &Limits, depth: usize) -> Result<CborValue, DecodeError> {
    if depth > limits.max_cbor_depth {
        return Err(DecodeError::DecodeLimit("max_cbor_depth"));
    }
    match dec.datatype()? {
        Type::Bool => Ok(CborValue::Bool(dec.bool()?)),
        Type::Null => {
            dec.null()?;
            Ok(CborValue::Null)
        }
        Type::Undefined => {
            dec.undefined()?;
            Ok(CborValue::Null)
        }
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => Ok(CborValue::Unsigned(dec.u64()?)),
        Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
            let n = i128::from(dec.int()?);
            let n = i64::try_from(n).map_err(|_| {
                DecodeError::CborDecodingFailed("negative integer out of range".to_string())
            })?;
            Ok(CborValue::Signed(n))
        }
        Type::F16 | Type::F32 | Type::F64 => Ok(CborValue::Float(dec.f64()?)),
        Type::Bytes => {
            let bytes = dec.bytes()?;
            if bytes.len() > limits.max_cbor_bytes_string_len {
                return Err(DecodeError::DecodeLimit("max_cbor_bytes_string_len"));
            }
            Ok(CborValue::Bytes(bytes.to_vec()))
        }
        Type::String => {
            let s = dec.str()?;
            if s.len() > limits.max_cbor_text_string_len {
                return Err(DecodeError::DecodeLimit("max_cbor_text_string_len"));
            }
            Ok(CborValue::Text(s.to_string()))
        }
        Type::Array => {
            let len = definite_len(dec.array()?)?;
            if len > limits.max_cbor_array_entries as u64 {
                return Err(DecodeError::DecodeLimit("max_cbor_array_entries"));
            }
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(read_value(dec, limits, depth + 1)?);
            }
            Ok(CborValue::Array(items))
        }
        Type::Map => {
            let len = definite_len(dec.map()?)?;
            if len > limits.max_cbor_map_entries as u64 {
                return Err(DecodeError::DecodeLimit("max_cbor_map_entries"));
            }
            let mut entries = Vec::with_capacity(len as usize);
            for _ in 0..len {
                let key = read_value(dec, limits, depth + 1)?;
                let val = read_value(dec, limits, depth + 1)?;
                entries.push((key, val));
            }
            Ok(CborValue::Map(entries))
        }
        Type::Tag => {
            let tag = dec.tag()?;
            let inner = read_value(dec, limits, depth + 1)?;
            Ok(CborValue::Tagged(tag.as_u64(), Box::new(inner)))
        }
        Type::Simple => Err(DecodeError::CborDecodingFailed(
            "unsupported simple value".to_string(),
        )),
        Type::BytesIndef | Type::StringIndef | Type::ArrayIndef | Type::MapIndef | Type::Break => {
            Err(DecodeError::CborDecodingFailed(
                "indefinite-length item".to_string(),
            ))
        }
        other => Err(DecodeError::CborDecodingFailed(format!(
            "unknown cbor type {other}"
        ))),
    }
}

fn definite_len(len: Option<u64>) -> Result<u64, DecodeError> {
    len.ok_or_else(|| DecodeError::CborDecodingFailed("indefinite-length item".to_string()))
}
