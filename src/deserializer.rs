//! Typed record decoding.
//!
//! Dispatch is driven by a [`DeserializerMap`]: a request-scoped policy
//! mapping each wire tag to the decoder invoked for it. The transactor
//! preset collapses chain-cell subtypes into their generic parents; the
//! datastore preset (the default) preserves them. Every decoder
//! re-validates the tag against the set it accepts.

use std::collections::BTreeMap;

use crate::cbor::{self, CborValue};
use crate::error::DecodeError;
use crate::kind::RecordKind;
use crate::limits::Limits;
use crate::record::{
    Artefact, ArtefactChainCell, ArtefactCreationCell, ArtefactDerivationCell,
    ArtefactOwnershipCell, ArtefactReferenceCell, ArtefactUpdateCell, CanonicalEntry, ChainEntry,
    Entity, EntityChainCell, EntityLinkCell, EntityUpdateCell, JournalBlock, JournalEntry, Meta,
    Record,
};
use crate::reference::Reference;

type DecodeFn = fn(&RecordMap<'_>) -> Result<Record, DecodeError>;

/// Policy mapping each record kind to its decoder.
///
/// Immutable once built and safely shared across threads.
#[derive(Clone)]
pub struct DeserializerMap {
    decoders: BTreeMap<RecordKind, DecodeFn>,
}

impl DeserializerMap {
    /// Consensus-layer preset: every chain-cell tag decodes to its
    /// generic parent. The transactor treats cells uniformly as links in
    /// a chain; subtype fields stay reachable through `meta`.
    pub fn transactor() -> Self {
        let mut decoders: BTreeMap<RecordKind, DecodeFn> = BTreeMap::new();
        decoders.insert(RecordKind::Entity, decode_entity);
        decoders.insert(RecordKind::Artefact, decode_artefact);
        for kind in RecordKind::ENTITY_CELLS {
            decoders.insert(kind, decode_entity_chain_cell);
        }
        for kind in RecordKind::ARTEFACT_CELLS {
            decoders.insert(kind, decode_artefact_chain_cell);
        }
        decoders.insert(RecordKind::CanonicalEntry, decode_canonical_entry);
        decoders.insert(RecordKind::ChainEntry, decode_chain_entry);
        decoders.insert(RecordKind::JournalBlock, decode_journal_block);
        Self { decoders }
    }

    /// Storage-layer preset: every subtype tag decodes to its specific
    /// variant. Peers and durable stores need the richer typed form.
    pub fn datastore() -> Self {
        let mut map = Self::transactor();
        map.decoders
            .insert(RecordKind::EntityUpdateCell, decode_entity_update_cell);
        map.decoders
            .insert(RecordKind::EntityLinkCell, decode_entity_link_cell);
        map.decoders
            .insert(RecordKind::ArtefactUpdateCell, decode_artefact_update_cell);
        map.decoders.insert(
            RecordKind::ArtefactCreationCell,
            decode_artefact_creation_cell,
        );
        map.decoders.insert(
            RecordKind::ArtefactDerivationCell,
            decode_artefact_derivation_cell,
        );
        map.decoders.insert(
            RecordKind::ArtefactOwnershipCell,
            decode_artefact_ownership_cell,
        );
        map.decoders.insert(
            RecordKind::ArtefactReferenceCell,
            decode_artefact_reference_cell,
        );
        map
    }

    fn decoder_for(&self, kind: RecordKind) -> Option<DecodeFn> {
        self.decoders.get(&kind).copied()
    }
}

impl Default for DeserializerMap {
    fn default() -> Self {
        Self::datastore()
    }
}

/// Decode a single CBOR value into a typed record.
pub fn from_cbor(value: &CborValue, map: &DeserializerMap) -> Result<Record, DecodeError> {
    let record_map = RecordMap::from_value(value)?;
    let tag = record_map.type_tag()?;
    let kind =
        RecordKind::parse(tag).ok_or_else(|| DecodeError::UnexpectedObjectType(tag.to_string()))?;
    let decode = map
        .decoder_for(kind)
        .ok_or_else(|| DecodeError::UnexpectedObjectType(tag.to_string()))?;
    decode(&record_map)
}

/// Decode a CBOR byte stream into a typed record.
///
/// The first top-level value is used; a single tag wrapper (the
/// self-describe tag in practice) is unwrapped before dispatch. An empty
/// stream is a decode failure.
pub fn from_cbor_bytes(
    bytes: &[u8],
    map: &DeserializerMap,
    limits: &Limits,
) -> Result<Record, DecodeError> {
    let values = cbor::decode_values(bytes, limits)?;
    let Some(first) = values.first() else {
        return Err(DecodeError::CborDecodingFailed(
            "empty cbor stream".to_string(),
        ));
    };
    let value = match first {
        CborValue::Tagged(_, inner) => inner.as_ref(),
        other => other,
    };
    from_cbor(value, map)
}

/// View over a CBOR map, with the field extraction shared by all
/// decoders.
struct RecordMap<'a> {
    entries: &'a [(CborValue, CborValue)],
}

impl<'a> RecordMap<'a> {
    fn from_value(value: &'a CborValue) -> Result<Self, DecodeError> {
        match value {
            CborValue::Map(entries) => Ok(Self { entries }),
            other => Err(DecodeError::UnexpectedCborType(format!(
                "record must be a map, got {}",
                other.kind_name()
            ))),
        }
    }

    fn get(&self, key: &str) -> Option<&'a CborValue> {
        self.entries.iter().find_map(|(k, v)| match k {
            CborValue::Text(name) if name == key => Some(v),
            _ => None,
        })
    }

    fn type_tag(&self) -> Result<&'a str, DecodeError> {
        match self.get("type") {
            Some(CborValue::Text(tag)) => Ok(tag),
            _ => Err(DecodeError::TypeNameNotFound),
        }
    }

    fn required_index(&self, key: &'static str) -> Result<u64, DecodeError> {
        match self.get(key) {
            Some(CborValue::Unsigned(value)) => Ok(*value),
            _ => Err(DecodeError::RequiredFieldNotFound(key)),
        }
    }

    fn required_reference(&self, key: &'static str) -> Result<Reference, DecodeError> {
        match self.get(key) {
            Some(value @ CborValue::Map(_)) => Reference::from_cbor(value),
            _ => Err(DecodeError::RequiredFieldNotFound(key)),
        }
    }

    /// Optional chain pointers are speculative: absent and undecodable
    /// values both come back as `None`.
    fn optional_reference(&self, key: &str) -> Option<Reference> {
        self.get(key)
            .and_then(|value| Reference::from_cbor(value).ok())
    }

    fn required_entries(&self) -> Result<&'a [CborValue], DecodeError> {
        match self.get("entries") {
            Some(CborValue::Array(items)) => Ok(items),
            _ => Err(DecodeError::RequiredFieldNotFound("entries")),
        }
    }

    /// The raw meta map: every text-keyed field as decoded.
    fn meta(&self) -> Meta {
        self.entries
            .iter()
            .filter_map(|(key, value)| match key {
                CborValue::Text(name) => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }
}

fn expect_kind(map: &RecordMap<'_>, kind: RecordKind) -> Result<(), DecodeError> {
    let tag = map.type_tag()?;
    if RecordKind::parse(tag) == Some(kind) {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedObjectType(kind.as_str().to_string()))
    }
}

fn expect_kind_in(
    map: &RecordMap<'_>,
    kinds: &[RecordKind],
    accepted: RecordKind,
) -> Result<(), DecodeError> {
    let tag = map.type_tag()?;
    match RecordKind::parse(tag) {
        Some(kind) if kinds.contains(&kind) => Ok(()),
        _ => Err(DecodeError::UnexpectedObjectType(
            accepted.as_str().to_string(),
        )),
    }
}

fn decode_entity(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::Entity)?;
    Ok(Record::Entity(Entity { meta: map.meta() }))
}

fn decode_artefact(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::Artefact)?;
    Ok(Record::Artefact(Artefact { meta: map.meta() }))
}

fn decode_entity_chain_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind_in(map, &RecordKind::ENTITY_CELLS, RecordKind::EntityChainCell)?;
    Ok(Record::EntityChainCell(EntityChainCell {
        entity: map.required_reference("entity")?,
        chain: map.optional_reference("chain"),
        meta: map.meta(),
    }))
}

fn decode_entity_update_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::EntityUpdateCell)?;
    Ok(Record::EntityUpdateCell(EntityUpdateCell {
        entity: map.required_reference("entity")?,
        chain: map.optional_reference("chain"),
        meta: map.meta(),
    }))
}

fn decode_entity_link_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::EntityLinkCell)?;
    Ok(Record::EntityLinkCell(EntityLinkCell {
        entity: map.required_reference("entity")?,
        chain: map.optional_reference("chain"),
        entity_link: map.required_reference("entityLink")?,
        meta: map.meta(),
    }))
}

fn decode_artefact_chain_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind_in(
        map,
        &RecordKind::ARTEFACT_CELLS,
        RecordKind::ArtefactChainCell,
    )?;
    Ok(Record::ArtefactChainCell(ArtefactChainCell {
        artefact: map.required_reference("artefact")?,
        chain: map.optional_reference("chain"),
        meta: map.meta(),
    }))
}

fn decode_artefact_update_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::ArtefactUpdateCell)?;
    Ok(Record::ArtefactUpdateCell(ArtefactUpdateCell {
        artefact: map.required_reference("artefact")?,
        chain: map.optional_reference("chain"),
        meta: map.meta(),
    }))
}

fn decode_artefact_creation_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::ArtefactCreationCell)?;
    Ok(Record::ArtefactCreationCell(ArtefactCreationCell {
        artefact: map.required_reference("artefact")?,
        chain: map.optional_reference("chain"),
        entity: map.required_reference("entity")?,
        meta: map.meta(),
    }))
}

fn decode_artefact_derivation_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::ArtefactDerivationCell)?;
    Ok(Record::ArtefactDerivationCell(ArtefactDerivationCell {
        artefact: map.required_reference("artefact")?,
        chain: map.optional_reference("chain"),
        artefact_origin: map.required_reference("artefactOrigin")?,
        meta: map.meta(),
    }))
}

fn decode_artefact_ownership_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::ArtefactOwnershipCell)?;
    Ok(Record::ArtefactOwnershipCell(ArtefactOwnershipCell {
        artefact: map.required_reference("artefact")?,
        chain: map.optional_reference("chain"),
        entity: map.required_reference("entity")?,
        meta: map.meta(),
    }))
}

fn decode_artefact_reference_cell(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::ArtefactReferenceCell)?;
    Ok(Record::ArtefactReferenceCell(ArtefactReferenceCell {
        artefact: map.required_reference("artefact")?,
        chain: map.optional_reference("chain"),
        entity: map.required_reference("entity")?,
        meta: map.meta(),
    }))
}

fn decode_canonical_entry(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    Ok(Record::CanonicalEntry(canonical_entry_from_map(map)?))
}

fn decode_chain_entry(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    Ok(Record::ChainEntry(chain_entry_from_map(map)?))
}

fn canonical_entry_from_map(map: &RecordMap<'_>) -> Result<CanonicalEntry, DecodeError> {
    expect_kind(map, RecordKind::CanonicalEntry)?;
    Ok(CanonicalEntry {
        index: map.required_index("index")?,
        target: map.required_reference("ref")?,
    })
}

fn chain_entry_from_map(map: &RecordMap<'_>) -> Result<ChainEntry, DecodeError> {
    expect_kind(map, RecordKind::ChainEntry)?;
    Ok(ChainEntry {
        index: map.required_index("index")?,
        target: map.required_reference("ref")?,
        chain: map.required_reference("chain")?,
        chain_previous: map.optional_reference("chainPrevious"),
    })
}

fn journal_entry_from_map(map: &RecordMap<'_>) -> Result<JournalEntry, DecodeError> {
    let tag = map.type_tag()?;
    match RecordKind::parse(tag) {
        Some(RecordKind::CanonicalEntry) => {
            Ok(JournalEntry::Canonical(canonical_entry_from_map(map)?))
        }
        Some(RecordKind::ChainEntry) => Ok(JournalEntry::Chain(chain_entry_from_map(map)?)),
        _ => Err(DecodeError::UnexpectedObjectType(tag.to_string())),
    }
}

fn decode_journal_block(map: &RecordMap<'_>) -> Result<Record, DecodeError> {
    expect_kind(map, RecordKind::JournalBlock)?;
    let index = map.required_index("index")?;
    let chain = map.optional_reference("chain");
    let mut entries = Vec::new();
    for item in map.required_entries()? {
        // Non-map elements are skipped for wire compatibility with the
        // historical encoder. A failing entry aborts the whole block.
        let Ok(entry_map) = RecordMap::from_value(item) else {
            continue;
        };
        entries.push(journal_entry_from_map(&entry_map)?);
    }
    Ok(Record::JournalBlock(JournalBlock {
        index,
        chain,
        entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{to_cbor, to_cbor_bytes};

    fn reference(data: &[u8]) -> Reference {
        Reference::for_bytes(data)
    }

    fn decode(bytes: &[u8], map: &DeserializerMap) -> Result<Record, DecodeError> {
        from_cbor_bytes(bytes, map, &Limits::default())
    }

    fn text(s: &str) -> CborValue {
        CborValue::Text(s.to_string())
    }

    #[test]
    fn canonical_entry_roundtrips_under_default_preset() {
        let target = reference(b"canonical");
        let record = Record::CanonicalEntry(CanonicalEntry::new(7, target.clone()));
        let bytes = to_cbor_bytes(&record).unwrap_or_else(|e| panic!("encode failed: {e}"));
        let decoded = decode(&bytes, &DeserializerMap::default())
            .unwrap_or_else(|e| panic!("decode failed: {e}"));
        let Record::CanonicalEntry(entry) = decoded else {
            panic!("expected a canonical entry");
        };
        assert_eq!(entry.index, 7);
        assert_eq!(entry.target, target);
    }

    #[test]
    fn presets_diverge_on_subtype_cells() {
        let cell = ArtefactCreationCell::new(
            reference(b"artefact"),
            Some(reference(b"chain")),
            reference(b"entity"),
            Meta::new(),
        );
        let bytes = to_cbor_bytes(&Record::ArtefactCreationCell(cell.clone())).unwrap();

        let collapsed = decode(&bytes, &DeserializerMap::transactor()).unwrap();
        let Record::ArtefactChainCell(generic) = collapsed else {
            panic!("transactor preset must collapse to the generic cell");
        };
        assert_eq!(generic.artefact, cell.artefact);
        assert_eq!(generic.chain, cell.chain);
        assert_eq!(generic.meta, cell.meta);

        let preserved = decode(&bytes, &DeserializerMap::datastore()).unwrap();
        let Record::ArtefactCreationCell(specific) = preserved else {
            panic!("datastore preset must preserve the subtype");
        };
        assert_eq!(specific, cell);
    }

    #[test]
    fn empty_map_has_no_type_name() {
        assert_eq!(
            decode(&[0xa0], &DeserializerMap::default()),
            Err(DecodeError::TypeNameNotFound)
        );
    }

    #[test]
    fn non_map_value_is_unexpected_type() {
        let err = decode(&[0x01], &DeserializerMap::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedCborType(_)));
    }

    #[test]
    fn empty_stream_is_a_decode_failure() {
        let err = decode(&[], &DeserializerMap::default()).unwrap_err();
        assert!(matches!(err, DecodeError::CborDecodingFailed(_)));
    }

    #[test]
    fn unknown_tag_is_unexpected_object_type() {
        let value = CborValue::Map(vec![(text("type"), text("journal"))]);
        assert_eq!(
            from_cbor(&value, &DeserializerMap::default()),
            Err(DecodeError::UnexpectedObjectType("journal".to_string()))
        );
    }

    #[test]
    fn self_describe_tag_is_unwrapped() {
        let record = Record::Entity(Entity::new(Meta::new()));
        let mut bytes = vec![0xd9, 0xd9, 0xf7];
        bytes.extend_from_slice(&to_cbor_bytes(&record).unwrap());
        let decoded = decode(&bytes, &DeserializerMap::default()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn entity_decoder_rejects_artefact_maps() {
        let value = to_cbor(&Record::Artefact(Artefact::new(Meta::new())));
        let map = RecordMap::from_value(&value).unwrap();
        assert_eq!(
            decode_entity(&map),
            Err(DecodeError::UnexpectedObjectType("entity".to_string()))
        );
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let value = CborValue::Map(vec![(text("type"), text("insert"))]);
        let map = RecordMap::from_value(&value).unwrap();
        assert_eq!(
            canonical_entry_from_map(&map),
            Err(DecodeError::RequiredFieldNotFound("index"))
        );

        let value = CborValue::Map(vec![
            (text("type"), text("insert")),
            (text("index"), CborValue::Unsigned(1)),
        ]);
        let map = RecordMap::from_value(&value).unwrap();
        assert_eq!(
            canonical_entry_from_map(&map),
            Err(DecodeError::RequiredFieldNotFound("ref"))
        );
    }

    #[test]
    fn malformed_required_reference_fails_decode() {
        let value = CborValue::Map(vec![
            (text("type"), text("entityChainCell")),
            (
                text("entity"),
                CborValue::Map(vec![(
                    text("@link"),
                    CborValue::Bytes(vec![0x12, 0x20, 0x01]),
                )]),
            ),
        ]);
        let err = from_cbor(&value, &DeserializerMap::default()).unwrap_err();
        assert!(matches!(err, DecodeError::ReferenceDecodingFailed(_)));
    }

    #[test]
    fn malformed_optional_reference_decodes_as_absent() {
        let entity = reference(b"entity");
        let value = CborValue::Map(vec![
            (text("type"), text("entityChainCell")),
            (text("entity"), entity.to_cbor()),
            (
                text("chain"),
                CborValue::Map(vec![(text("@link"), CborValue::Bytes(vec![0x12]))]),
            ),
        ]);
        let decoded = from_cbor(&value, &DeserializerMap::default()).unwrap();
        let Record::EntityChainCell(cell) = decoded else {
            panic!("expected an entity chain cell");
        };
        assert_eq!(cell.entity, entity);
        assert_eq!(cell.chain, None);
    }

    #[test]
    fn journal_block_skips_non_map_entries() {
        let entry = JournalEntry::Canonical(CanonicalEntry::new(1, reference(b"r")));
        let value = CborValue::Map(vec![
            (text("type"), text("journalBlock")),
            (text("index"), CborValue::Unsigned(4)),
            (
                text("entries"),
                CborValue::Array(vec![
                    CborValue::Unsigned(9),
                    crate::serializer::journal_entry_to_cbor(&entry),
                    CborValue::Null,
                ]),
            ),
        ]);
        let decoded = from_cbor(&value, &DeserializerMap::default()).unwrap();
        let Record::JournalBlock(block) = decoded else {
            panic!("expected a journal block");
        };
        assert_eq!(block.index, 4);
        assert_eq!(block.entries, vec![entry]);
    }

    #[test]
    fn journal_block_aborts_on_a_bad_entry() {
        let value = CborValue::Map(vec![
            (text("type"), text("journalBlock")),
            (text("index"), CborValue::Unsigned(4)),
            (
                text("entries"),
                CborValue::Array(vec![CborValue::Map(vec![(text("type"), text("entity"))])]),
            ),
        ]);
        assert_eq!(
            from_cbor(&value, &DeserializerMap::default()),
            Err(DecodeError::UnexpectedObjectType("entity".to_string()))
        );
    }

    #[test]
    fn journal_block_requires_an_integer_index() {
        let value = CborValue::Map(vec![
            (text("type"), text("journalBlock")),
            (text("index"), text("4")),
            (text("entries"), CborValue::Array(vec![])),
        ]);
        assert_eq!(
            from_cbor(&value, &DeserializerMap::default()),
            Err(DecodeError::RequiredFieldNotFound("index"))
        );
    }

    #[test]
    fn journal_block_requires_an_entries_array() {
        let value = CborValue::Map(vec![
            (text("type"), text("journalBlock")),
            (text("index"), CborValue::Unsigned(4)),
        ]);
        assert_eq!(
            from_cbor(&value, &DeserializerMap::default()),
            Err(DecodeError::RequiredFieldNotFound("entries"))
        );
    }
}
