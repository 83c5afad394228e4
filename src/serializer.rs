//! Canonical CBOR rendering of records.
//!
//! The record's raw meta map comes first, then the structural fields
//! overlay it (type tag, required fields, present optionals). Keys are
//! emitted in lexicographic UTF-8 byte order with definite lengths and
//! shortest-form integers. Content addresses depend on these bytes being
//! identical across invocations, processes, and hosts.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::cbor::{self, CborValue};
use crate::error::EncodeError;
use crate::kind::RecordKind;
use crate::record::{CanonicalEntry, ChainEntry, JournalEntry, Record};
use crate::reference::Reference;

/// Render a record as a CBOR map with canonically ordered keys.
pub fn to_cbor(record: &Record) -> CborValue {
    map_value(record_map(record))
}

/// Canonical bytes of a record.
pub fn to_cbor_bytes(record: &Record) -> Result<Bytes, EncodeError> {
    Ok(Bytes::from(cbor::encode_value(&to_cbor(record))?))
}

/// Content address of a record: the SHA-256 multihash reference of its
/// canonical bytes.
pub fn record_reference(record: &Record) -> Result<Reference, EncodeError> {
    Ok(Reference::for_bytes(&to_cbor_bytes(record)?))
}

/// Render a journal entry, standalone or inside a block.
pub fn journal_entry_to_cbor(entry: &JournalEntry) -> CborValue {
    match entry {
        JournalEntry::Canonical(entry) => map_value(canonical_entry_map(entry)),
        JournalEntry::Chain(entry) => map_value(chain_entry_map(entry)),
    }
}

fn record_map(record: &Record) -> BTreeMap<String, CborValue> {
    let mut map = match record.meta() {
        Some(meta) => meta.to_map(),
        None => BTreeMap::new(),
    };
    map.insert(
        "type".to_string(),
        CborValue::Text(record.kind().as_str().to_string()),
    );
    match record {
        Record::Entity(_) | Record::Artefact(_) => {}
        Record::EntityChainCell(cell) => {
            insert_reference(&mut map, "entity", &cell.entity);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
        }
        Record::EntityUpdateCell(cell) => {
            insert_reference(&mut map, "entity", &cell.entity);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
        }
        Record::EntityLinkCell(cell) => {
            insert_reference(&mut map, "entity", &cell.entity);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
            insert_reference(&mut map, "entityLink", &cell.entity_link);
        }
        Record::ArtefactChainCell(cell) => {
            insert_reference(&mut map, "artefact", &cell.artefact);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
        }
        Record::ArtefactUpdateCell(cell) => {
            insert_reference(&mut map, "artefact", &cell.artefact);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
        }
        Record::ArtefactCreationCell(cell) => {
            insert_reference(&mut map, "artefact", &cell.artefact);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
            insert_reference(&mut map, "entity", &cell.entity);
        }
        Record::ArtefactDerivationCell(cell) => {
            insert_reference(&mut map, "artefact", &cell.artefact);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
            insert_reference(&mut map, "artefactOrigin", &cell.artefact_origin);
        }
        Record::ArtefactOwnershipCell(cell) => {
            insert_reference(&mut map, "artefact", &cell.artefact);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
            insert_reference(&mut map, "entity", &cell.entity);
        }
        Record::ArtefactReferenceCell(cell) => {
            insert_reference(&mut map, "artefact", &cell.artefact);
            insert_optional_reference(&mut map, "chain", cell.chain.as_ref());
            insert_reference(&mut map, "entity", &cell.entity);
        }
        Record::CanonicalEntry(entry) => {
            map.extend(canonical_entry_map(entry));
        }
        Record::ChainEntry(entry) => {
            map.extend(chain_entry_map(entry));
        }
        Record::JournalBlock(block) => {
            map.insert("index".to_string(), CborValue::Unsigned(block.index));
            insert_optional_reference(&mut map, "chain", block.chain.as_ref());
            map.insert(
                "entries".to_string(),
                CborValue::Array(block.entries.iter().map(journal_entry_to_cbor).collect()),
            );
        }
    }
    map
}

fn canonical_entry_map(entry: &CanonicalEntry) -> BTreeMap<String, CborValue> {
    let mut map = BTreeMap::new();
    map.insert(
        "type".to_string(),
        CborValue::Text(RecordKind::CanonicalEntry.as_str().to_string()),
    );
    map.insert("index".to_string(), CborValue::Unsigned(entry.index));
    insert_reference(&mut map, "ref", &entry.target);
    map
}

fn chain_entry_map(entry: &ChainEntry) -> BTreeMap<String, CborValue> {
    let mut map = BTreeMap::new();
    map.insert(
        "type".to_string(),
        CborValue::Text(RecordKind::ChainEntry.as_str().to_string()),
    );
    map.insert("index".to_string(), CborValue::Unsigned(entry.index));
    insert_reference(&mut map, "ref", &entry.target);
    insert_reference(&mut map, "chain", &entry.chain);
    insert_optional_reference(&mut map, "chainPrevious", entry.chain_previous.as_ref());
    map
}

fn map_value(map: BTreeMap<String, CborValue>) -> CborValue {
    CborValue::Map(
        map.into_iter()
            .map(|(key, value)| (CborValue::Text(key), value))
            .collect(),
    )
}

fn insert_reference(map: &mut BTreeMap<String, CborValue>, key: &str, reference: &Reference) {
    map.insert(key.to_string(), reference.to_cbor());
}

fn insert_optional_reference(
    map: &mut BTreeMap<String, CborValue>,
    key: &str,
    reference: Option<&Reference>,
) {
    if let Some(reference) = reference {
        map.insert(key.to_string(), reference.to_cbor());
    }
}
