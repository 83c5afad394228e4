//! Decode and encode error taxonomy.
//!
//! Every fallible operation returns exactly one of these. Errors carry
//! only the field name or type string needed to diagnose, never input
//! bytes, and the first error on a path wins.

use thiserror::Error;

/// Errors surfaced while decoding records from CBOR.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Byte-level malformed CBOR: truncated input, indefinite-length
    /// items, or anything else outside the wire profile.
    #[error("cbor decoding failed: {0}")]
    CborDecodingFailed(String),
    /// Input exceeds a decode guardrail; carries the limit name.
    #[error("decode limit exceeded: {0}")]
    DecodeLimit(&'static str),
    /// A CBOR value was present but of the wrong kind.
    #[error("unexpected cbor type: {0}")]
    UnexpectedCborType(String),
    /// An `@link` value that is not a valid multihash.
    #[error("reference decoding failed: {0}")]
    ReferenceDecodingFailed(String),
    /// The record map has no text-valued `type` field.
    #[error("type name not found")]
    TypeNameNotFound,
    /// The `type` tag is unknown, or not accepted at this call site.
    #[error("unexpected object type `{0}`")]
    UnexpectedObjectType(String),
    /// A required structural field is absent or of the wrong kind.
    #[error("required field `{0}` not found")]
    RequiredFieldNotFound(&'static str),
}

impl From<minicbor::decode::Error> for DecodeError {
    fn from(err: minicbor::decode::Error) -> Self {
        DecodeError::CborDecodingFailed(err.to_string())
    }
}

/// Errors surfaced while encoding values to CBOR.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cbor encode: {0}")]
    Cbor(#[from] minicbor::encode::Error<std::convert::Infallible>),
    #[error("non-finite float values are not allowed")]
    NonFiniteFloat,
}
