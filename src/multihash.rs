//! Multihash: a self-describing hash envelope.
//!
//! Layout is `[algorithm code, digest length, digest…]`. SHA-256 is the
//! only algorithm this system produces; anything else passes through the
//! envelope unvalidated beyond the header.

use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Algorithm code for SHA2-256.
pub const SHA2_256_CODE: u8 = 0x12;

/// Digest length for SHA2-256.
pub const SHA2_256_DIGEST_LEN: usize = 32;

/// Invalid multihash envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MultihashError {
    #[error("multihash is {len} bytes, need at least 2")]
    Truncated { len: usize },
    #[error("multihash digest is {got} bytes, header declares {declared}")]
    LengthMismatch { declared: usize, got: usize },
}

/// A parsed multihash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Multihash {
    code: u8,
    digest: Vec<u8>,
}

impl Multihash {
    /// SHA-256 multihash of arbitrary bytes.
    pub fn sha2_256(data: &[u8]) -> Self {
        Self {
            code: SHA2_256_CODE,
            digest: Sha256::digest(data).to_vec(),
        }
    }

    /// Parse the `[code, length, digest…]` envelope.
    ///
    /// The digest must match the declared length byte exactly; the
    /// algorithm code is carried through without a whitelist.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MultihashError> {
        if bytes.len() < 2 {
            return Err(MultihashError::Truncated { len: bytes.len() });
        }
        let declared = bytes[1] as usize;
        let digest = &bytes[2..];
        if digest.len() != declared {
            return Err(MultihashError::LengthMismatch {
                declared,
                got: digest.len(),
            });
        }
        Ok(Self {
            code: bytes[0],
            digest: digest.to_vec(),
        })
    }

    /// Serialized envelope: header followed by the digest.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.digest.len());
        out.push(self.code);
        out.push(self.digest.len() as u8);
        out.extend_from_slice(&self.digest);
        out
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multihash({})", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha2_256_digest_is_well_known() {
        let hash = Multihash::sha2_256(b"abc");
        assert_eq!(hash.code(), SHA2_256_CODE);
        assert_eq!(
            hex::encode(hash.digest()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash.to_bytes().len(), 2 + SHA2_256_DIGEST_LEN);
    }

    #[test]
    fn envelope_roundtrips() {
        let hash = Multihash::sha2_256(b"mediachain");
        let parsed = Multihash::from_bytes(&hash.to_bytes()).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn rejects_truncated_envelope() {
        assert_eq!(
            Multihash::from_bytes(&[0x12]),
            Err(MultihashError::Truncated { len: 1 })
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        assert_eq!(
            Multihash::from_bytes(&[0x12, 0x20, 0xaa, 0xbb]),
            Err(MultihashError::LengthMismatch {
                declared: 32,
                got: 2
            })
        );
    }

    #[test]
    fn unknown_algorithm_passes_envelope_check() {
        let parsed = Multihash::from_bytes(&[0x13, 0x02, 0xaa, 0xbb]).unwrap();
        assert_eq!(parsed.code(), 0x13);
        assert_eq!(parsed.digest(), [0xaa, 0xbb]);
    }
}
