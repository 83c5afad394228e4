//! Record model: canonical objects, chain cells, and journal records.
//!
//! Records are immutable plain data. Every metadata-carrying variant
//! holds a [`Meta`] map of its raw top-level fields; `new` constructors
//! keep the structural projection (type tag and reference fields) inside
//! `meta`, so a constructed record equals its decode-of-encode and the
//! raw map stays a faithful pass-through on both paths.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::cbor::CborValue;
use crate::kind::RecordKind;
use crate::reference::Reference;

/// String-keyed map of a record's top-level fields.
///
/// Holds user metadata alongside the raw structural fields. Insertion
/// order is irrelevant; iteration is in canonical (UTF-8 byte) key
/// order. Structural typed fields always overwrite colliding entries on
/// encode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta(BTreeMap<String, CborValue>);

impl Meta {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: CborValue) -> Option<CborValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&CborValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CborValue> {
        self.0.iter()
    }

    pub(crate) fn to_map(&self) -> BTreeMap<String, CborValue> {
        self.0.clone()
    }
}

impl FromIterator<(String, CborValue)> for Meta {
    fn from_iter<I: IntoIterator<Item = (String, CborValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn stamp_type(meta: &mut Meta, kind: RecordKind) {
    meta.insert("type", CborValue::Text(kind.as_str().to_string()));
}

fn stamp_reference(meta: &mut Meta, key: &str, reference: &Reference) {
    meta.insert(key, reference.to_cbor());
}

fn stamp_optional_reference(meta: &mut Meta, key: &str, reference: Option<&Reference>) {
    if let Some(reference) = reference {
        meta.insert(key, reference.to_cbor());
    }
}

/// Top-level identity record for a person or organization.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub meta: Meta,
}

impl Entity {
    pub fn new(mut meta: Meta) -> Self {
        stamp_type(&mut meta, RecordKind::Entity);
        Self { meta }
    }
}

/// Top-level identity record for a creative work.
#[derive(Clone, Debug, PartialEq)]
pub struct Artefact {
    pub meta: Meta,
}

impl Artefact {
    pub fn new(mut meta: Meta) -> Self {
        stamp_type(&mut meta, RecordKind::Artefact);
        Self { meta }
    }
}

/// Generic link in an entity's history chain.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityChainCell {
    pub entity: Reference,
    pub chain: Option<Reference>,
    pub meta: Meta,
}

impl EntityChainCell {
    pub fn new(entity: Reference, chain: Option<Reference>, mut meta: Meta) -> Self {
        stamp_type(&mut meta, RecordKind::EntityChainCell);
        stamp_reference(&mut meta, "entity", &entity);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        Self {
            entity,
            chain,
            meta,
        }
    }
}

/// Metadata update to an entity. Structurally identical to
/// [`EntityChainCell`]; only the type tag differs.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityUpdateCell {
    pub entity: Reference,
    pub chain: Option<Reference>,
    pub meta: Meta,
}

impl EntityUpdateCell {
    pub fn new(entity: Reference, chain: Option<Reference>, mut meta: Meta) -> Self {
        stamp_type(&mut meta, RecordKind::EntityUpdateCell);
        stamp_reference(&mut meta, "entity", &entity);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        Self {
            entity,
            chain,
            meta,
        }
    }
}

/// Assertion that an entity links to another entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityLinkCell {
    pub entity: Reference,
    pub chain: Option<Reference>,
    pub entity_link: Reference,
    pub meta: Meta,
}

impl EntityLinkCell {
    pub fn new(
        entity: Reference,
        chain: Option<Reference>,
        entity_link: Reference,
        mut meta: Meta,
    ) -> Self {
        stamp_type(&mut meta, RecordKind::EntityLinkCell);
        stamp_reference(&mut meta, "entity", &entity);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        stamp_reference(&mut meta, "entityLink", &entity_link);
        Self {
            entity,
            chain,
            entity_link,
            meta,
        }
    }
}

/// Generic link in an artefact's history chain.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtefactChainCell {
    pub artefact: Reference,
    pub chain: Option<Reference>,
    pub meta: Meta,
}

impl ArtefactChainCell {
    pub fn new(artefact: Reference, chain: Option<Reference>, mut meta: Meta) -> Self {
        stamp_type(&mut meta, RecordKind::ArtefactChainCell);
        stamp_reference(&mut meta, "artefact", &artefact);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        Self {
            artefact,
            chain,
            meta,
        }
    }
}

/// Metadata update to an artefact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtefactUpdateCell {
    pub artefact: Reference,
    pub chain: Option<Reference>,
    pub meta: Meta,
}

impl ArtefactUpdateCell {
    pub fn new(artefact: Reference, chain: Option<Reference>, mut meta: Meta) -> Self {
        stamp_type(&mut meta, RecordKind::ArtefactUpdateCell);
        stamp_reference(&mut meta, "artefact", &artefact);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        Self {
            artefact,
            chain,
            meta,
        }
    }
}

/// Assertion that an entity created an artefact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtefactCreationCell {
    pub artefact: Reference,
    pub chain: Option<Reference>,
    pub entity: Reference,
    pub meta: Meta,
}

impl ArtefactCreationCell {
    pub fn new(
        artefact: Reference,
        chain: Option<Reference>,
        entity: Reference,
        mut meta: Meta,
    ) -> Self {
        stamp_type(&mut meta, RecordKind::ArtefactCreationCell);
        stamp_reference(&mut meta, "artefact", &artefact);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        stamp_reference(&mut meta, "entity", &entity);
        Self {
            artefact,
            chain,
            entity,
            meta,
        }
    }
}

/// Assertion that an artefact derives from another artefact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtefactDerivationCell {
    pub artefact: Reference,
    pub chain: Option<Reference>,
    pub artefact_origin: Reference,
    pub meta: Meta,
}

impl ArtefactDerivationCell {
    pub fn new(
        artefact: Reference,
        chain: Option<Reference>,
        artefact_origin: Reference,
        mut meta: Meta,
    ) -> Self {
        stamp_type(&mut meta, RecordKind::ArtefactDerivationCell);
        stamp_reference(&mut meta, "artefact", &artefact);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        stamp_reference(&mut meta, "artefactOrigin", &artefact_origin);
        Self {
            artefact,
            chain,
            artefact_origin,
            meta,
        }
    }
}

/// Assertion that an entity owns rights to an artefact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtefactOwnershipCell {
    pub artefact: Reference,
    pub chain: Option<Reference>,
    pub entity: Reference,
    pub meta: Meta,
}

impl ArtefactOwnershipCell {
    pub fn new(
        artefact: Reference,
        chain: Option<Reference>,
        entity: Reference,
        mut meta: Meta,
    ) -> Self {
        stamp_type(&mut meta, RecordKind::ArtefactOwnershipCell);
        stamp_reference(&mut meta, "artefact", &artefact);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        stamp_reference(&mut meta, "entity", &entity);
        Self {
            artefact,
            chain,
            entity,
            meta,
        }
    }
}

/// Assertion that an entity references an artefact.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtefactReferenceCell {
    pub artefact: Reference,
    pub chain: Option<Reference>,
    pub entity: Reference,
    pub meta: Meta,
}

impl ArtefactReferenceCell {
    pub fn new(
        artefact: Reference,
        chain: Option<Reference>,
        entity: Reference,
        mut meta: Meta,
    ) -> Self {
        stamp_type(&mut meta, RecordKind::ArtefactReferenceCell);
        stamp_reference(&mut meta, "artefact", &artefact);
        stamp_optional_reference(&mut meta, "chain", chain.as_ref());
        stamp_reference(&mut meta, "entity", &entity);
        Self {
            artefact,
            chain,
            entity,
            meta,
        }
    }
}

/// Journal record inserting a new canonical.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalEntry {
    pub index: u64,
    /// Content address of the inserted canonical (wire field `ref`).
    pub target: Reference,
}

impl CanonicalEntry {
    pub fn new(index: u64, target: Reference) -> Self {
        Self { index, target }
    }
}

/// Journal record advancing a canonical's chain head.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainEntry {
    pub index: u64,
    /// Content address of the updated canonical (wire field `ref`).
    pub target: Reference,
    pub chain: Reference,
    pub chain_previous: Option<Reference>,
}

impl ChainEntry {
    pub fn new(
        index: u64,
        target: Reference,
        chain: Reference,
        chain_previous: Option<Reference>,
    ) -> Self {
        Self {
            index,
            target,
            chain,
            chain_previous,
        }
    }
}

/// A single mutation produced by the transactor.
#[derive(Clone, Debug, PartialEq)]
pub enum JournalEntry {
    Canonical(CanonicalEntry),
    Chain(ChainEntry),
}

impl JournalEntry {
    pub fn kind(&self) -> RecordKind {
        match self {
            JournalEntry::Canonical(_) => RecordKind::CanonicalEntry,
            JournalEntry::Chain(_) => RecordKind::ChainEntry,
        }
    }

    pub fn index(&self) -> u64 {
        match self {
            JournalEntry::Canonical(entry) => entry.index,
            JournalEntry::Chain(entry) => entry.index,
        }
    }

    pub fn target(&self) -> &Reference {
        match self {
            JournalEntry::Canonical(entry) => &entry.target,
            JournalEntry::Chain(entry) => &entry.target,
        }
    }
}

/// An ordered batch of journal entries with a monotonic index.
#[derive(Clone, Debug, PartialEq)]
pub struct JournalBlock {
    pub index: u64,
    pub chain: Option<Reference>,
    pub entries: Vec<JournalEntry>,
}

impl JournalBlock {
    pub fn new(index: u64, chain: Option<Reference>, entries: Vec<JournalEntry>) -> Self {
        Self {
            index,
            chain,
            entries,
        }
    }
}

/// The closed sum of all serializable records.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Entity(Entity),
    Artefact(Artefact),
    EntityChainCell(EntityChainCell),
    EntityUpdateCell(EntityUpdateCell),
    EntityLinkCell(EntityLinkCell),
    ArtefactChainCell(ArtefactChainCell),
    ArtefactUpdateCell(ArtefactUpdateCell),
    ArtefactCreationCell(ArtefactCreationCell),
    ArtefactDerivationCell(ArtefactDerivationCell),
    ArtefactOwnershipCell(ArtefactOwnershipCell),
    ArtefactReferenceCell(ArtefactReferenceCell),
    CanonicalEntry(CanonicalEntry),
    ChainEntry(ChainEntry),
    JournalBlock(JournalBlock),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Entity(_) => RecordKind::Entity,
            Record::Artefact(_) => RecordKind::Artefact,
            Record::EntityChainCell(_) => RecordKind::EntityChainCell,
            Record::EntityUpdateCell(_) => RecordKind::EntityUpdateCell,
            Record::EntityLinkCell(_) => RecordKind::EntityLinkCell,
            Record::ArtefactChainCell(_) => RecordKind::ArtefactChainCell,
            Record::ArtefactUpdateCell(_) => RecordKind::ArtefactUpdateCell,
            Record::ArtefactCreationCell(_) => RecordKind::ArtefactCreationCell,
            Record::ArtefactDerivationCell(_) => RecordKind::ArtefactDerivationCell,
            Record::ArtefactOwnershipCell(_) => RecordKind::ArtefactOwnershipCell,
            Record::ArtefactReferenceCell(_) => RecordKind::ArtefactReferenceCell,
            Record::CanonicalEntry(_) => RecordKind::CanonicalEntry,
            Record::ChainEntry(_) => RecordKind::ChainEntry,
            Record::JournalBlock(_) => RecordKind::JournalBlock,
        }
    }

    /// The raw metadata map; journal entries and blocks carry none.
    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Record::Entity(record) => Some(&record.meta),
            Record::Artefact(record) => Some(&record.meta),
            Record::EntityChainCell(cell) => Some(&cell.meta),
            Record::EntityUpdateCell(cell) => Some(&cell.meta),
            Record::EntityLinkCell(cell) => Some(&cell.meta),
            Record::ArtefactChainCell(cell) => Some(&cell.meta),
            Record::ArtefactUpdateCell(cell) => Some(&cell.meta),
            Record::ArtefactCreationCell(cell) => Some(&cell.meta),
            Record::ArtefactDerivationCell(cell) => Some(&cell.meta),
            Record::ArtefactOwnershipCell(cell) => Some(&cell.meta),
            Record::ArtefactReferenceCell(cell) => Some(&cell.meta),
            Record::CanonicalEntry(_) | Record::ChainEntry(_) | Record::JournalBlock(_) => None,
        }
    }
}

impl From<JournalEntry> for Record {
    fn from(entry: JournalEntry) -> Self {
        match entry {
            JournalEntry::Canonical(entry) => Record::CanonicalEntry(entry),
            JournalEntry::Chain(entry) => Record::ChainEntry(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_stamp_the_type_tag() {
        let entity = Entity::new(Meta::new());
        assert_eq!(
            entity.meta.get("type"),
            Some(&CborValue::Text("entity".to_string()))
        );
    }

    #[test]
    fn constructors_stamp_reference_fields() {
        let artefact = Reference::for_bytes(b"artefact");
        let chain = Reference::for_bytes(b"chain");
        let cell = ArtefactUpdateCell::new(artefact.clone(), Some(chain.clone()), Meta::new());
        assert_eq!(cell.meta.get("artefact"), Some(&artefact.to_cbor()));
        assert_eq!(cell.meta.get("chain"), Some(&chain.to_cbor()));
        assert_eq!(
            cell.meta.get("type"),
            Some(&CborValue::Text("artefactUpdate".to_string()))
        );
    }

    #[test]
    fn absent_chain_is_not_stamped() {
        let cell = EntityChainCell::new(Reference::for_bytes(b"e"), None, Meta::new());
        assert!(!cell.meta.contains_key("chain"));
    }

    #[test]
    fn journal_entry_converts_to_record() {
        let entry = JournalEntry::Canonical(CanonicalEntry::new(3, Reference::for_bytes(b"r")));
        assert_eq!(entry.kind(), RecordKind::CanonicalEntry);
        assert_eq!(entry.index(), 3);
        let record = Record::from(entry);
        assert_eq!(record.kind(), RecordKind::CanonicalEntry);
        assert!(record.meta().is_none());
    }
}
