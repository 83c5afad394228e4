//! Content-addressed record model and canonical CBOR codec for the
//! mediachain journal.
//!
//! Module hierarchy follows type dependency order:
//! - limits: decode guardrails
//! - error: decode/encode error taxonomy
//! - cbor: value model + deterministic codec
//! - multihash: self-describing hash envelope
//! - reference: content addresses
//! - kind: wire-tag registry
//! - record: the closed record sum
//! - serializer: record -> canonical CBOR
//! - deserializer: CBOR -> typed records, preset-driven dispatch
//! - json: lossy JSON projection
//!
//! Everything here is pure and stateless: encoders and decoders hold no
//! shared mutable state, and canonical bytes are identical across
//! invocations, processes, and hosts. That determinism is what makes
//! content addressing sound.

#![forbid(unsafe_code)]

pub mod cbor;
pub mod deserializer;
pub mod error;
pub mod json;
pub mod kind;
pub mod limits;
pub mod multihash;
pub mod record;
pub mod reference;
pub mod serializer;

pub use cbor::{decode_values, encode_value, CborValue};
pub use deserializer::{from_cbor, from_cbor_bytes, DeserializerMap};
pub use error::{DecodeError, EncodeError};
pub use json::{record_to_json, value_to_json};
pub use kind::RecordKind;
pub use limits::Limits;
pub use multihash::{Multihash, MultihashError};
pub use record::{
    Artefact, ArtefactChainCell, ArtefactCreationCell, ArtefactDerivationCell,
    ArtefactOwnershipCell, ArtefactReferenceCell, ArtefactUpdateCell, CanonicalEntry, ChainEntry,
    Entity, EntityChainCell, EntityLinkCell, EntityUpdateCell, JournalBlock, JournalEntry, Meta,
    Record,
};
pub use reference::Reference;
pub use serializer::{journal_entry_to_cbor, record_reference, to_cbor, to_cbor_bytes};
