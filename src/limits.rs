//! Decode guardrails for untrusted CBOR input.

use serde::{Deserialize, Serialize};

/// Maxima enforced while decoding untrusted bytes.
///
/// Values are normative defaults; deployments may override them from
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_record_bytes: usize,
    pub max_cbor_depth: usize,
    pub max_cbor_map_entries: usize,
    pub max_cbor_array_entries: usize,
    pub max_cbor_bytes_string_len: usize,
    pub max_cbor_text_string_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_record_bytes: 16 * 1024 * 1024,
            max_cbor_depth: 32,
            max_cbor_map_entries: 10_000,
            max_cbor_array_entries: 10_000,
            max_cbor_bytes_string_len: 16 * 1024 * 1024,
            max_cbor_text_string_len: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Limits;

    #[test]
    fn defaults_are_normative() {
        let limits = Limits::default();
        assert_eq!(limits.max_record_bytes, 16 * 1024 * 1024);
        assert_eq!(limits.max_cbor_depth, 32);
        assert_eq!(limits.max_cbor_map_entries, 10_000);
        assert_eq!(limits.max_cbor_array_entries, 10_000);
        assert_eq!(limits.max_cbor_bytes_string_len, 16 * 1024 * 1024);
        assert_eq!(limits.max_cbor_text_string_len, 16 * 1024 * 1024);
    }
}
