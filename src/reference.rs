//! Content-address references.
//!
//! A reference is a multihash pointing at a serialized record, carried
//! on the wire as a single-entry map `{"@link": <byte string>}`. No
//! other reference shape exists.

use std::fmt;

use crate::cbor::CborValue;
use crate::error::DecodeError;
use crate::multihash::Multihash;

/// Wire key holding the raw multihash inside a reference map.
pub const LINK_KEY: &str = "@link";

/// A content address.
///
/// Two records with equal canonical encoding have equal references;
/// references are otherwise opaque identifiers.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    multihash: Multihash,
}

impl Reference {
    pub fn new(multihash: Multihash) -> Self {
        Self { multihash }
    }

    /// Reference of arbitrary bytes: their SHA-256 multihash.
    pub fn for_bytes(data: &[u8]) -> Self {
        Self::new(Multihash::sha2_256(data))
    }

    pub fn multihash(&self) -> &Multihash {
        &self.multihash
    }

    /// The `{"@link": <bytes>}` wire form.
    pub fn to_cbor(&self) -> CborValue {
        CborValue::Map(vec![(
            CborValue::Text(LINK_KEY.to_string()),
            CborValue::Bytes(self.multihash.to_bytes()),
        )])
    }

    /// Decode the wire form.
    pub fn from_cbor(value: &CborValue) -> Result<Self, DecodeError> {
        let entries = value.as_map().ok_or_else(|| {
            DecodeError::UnexpectedCborType(format!(
                "reference must be a map, got {}",
                value.kind_name()
            ))
        })?;
        let link = entries.iter().find_map(|(key, val)| match key {
            CborValue::Text(name) if name == LINK_KEY => Some(val),
            _ => None,
        });
        let Some(CborValue::Bytes(raw)) = link else {
            return Err(DecodeError::RequiredFieldNotFound(LINK_KEY));
        };
        let multihash = Multihash::from_bytes(raw)
            .map_err(|err| DecodeError::ReferenceDecodingFailed(err.to_string()))?;
        Ok(Self::new(multihash))
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.multihash)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.multihash)
    }
}
