//! Record kind registry.
//!
//! Every record kind has a stable, case-sensitive wire tag carried in
//! the `type` field. The registry is closed: unknown tags never decode,
//! and changing any tag string is a breaking change.

use std::fmt;

/// Discriminator for every serializable record kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Entity,
    Artefact,
    EntityChainCell,
    EntityUpdateCell,
    EntityLinkCell,
    ArtefactChainCell,
    ArtefactUpdateCell,
    ArtefactCreationCell,
    ArtefactDerivationCell,
    ArtefactOwnershipCell,
    ArtefactReferenceCell,
    CanonicalEntry,
    ChainEntry,
    JournalBlock,
}

impl RecordKind {
    /// Every kind, in registry order.
    pub const ALL: [RecordKind; 14] = [
        RecordKind::Entity,
        RecordKind::Artefact,
        RecordKind::EntityChainCell,
        RecordKind::EntityUpdateCell,
        RecordKind::EntityLinkCell,
        RecordKind::ArtefactChainCell,
        RecordKind::ArtefactUpdateCell,
        RecordKind::ArtefactCreationCell,
        RecordKind::ArtefactDerivationCell,
        RecordKind::ArtefactOwnershipCell,
        RecordKind::ArtefactReferenceCell,
        RecordKind::CanonicalEntry,
        RecordKind::ChainEntry,
        RecordKind::JournalBlock,
    ];

    /// The entity chain-cell subset collapsed by the transactor preset.
    pub const ENTITY_CELLS: [RecordKind; 3] = [
        RecordKind::EntityChainCell,
        RecordKind::EntityUpdateCell,
        RecordKind::EntityLinkCell,
    ];

    /// The artefact chain-cell subset collapsed by the transactor preset.
    pub const ARTEFACT_CELLS: [RecordKind; 6] = [
        RecordKind::ArtefactChainCell,
        RecordKind::ArtefactUpdateCell,
        RecordKind::ArtefactCreationCell,
        RecordKind::ArtefactDerivationCell,
        RecordKind::ArtefactOwnershipCell,
        RecordKind::ArtefactReferenceCell,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Entity => "entity",
            RecordKind::Artefact => "artefact",
            RecordKind::EntityChainCell => "entityChainCell",
            RecordKind::EntityUpdateCell => "entityUpdate",
            RecordKind::EntityLinkCell => "entityLink",
            RecordKind::ArtefactChainCell => "artefactChainCell",
            RecordKind::ArtefactUpdateCell => "artefactUpdate",
            RecordKind::ArtefactCreationCell => "artefactCreatedBy",
            RecordKind::ArtefactDerivationCell => "artefactDerivedBy",
            RecordKind::ArtefactOwnershipCell => "artefactRightsOwnedBy",
            RecordKind::ArtefactReferenceCell => "artefactReferencedBy",
            RecordKind::CanonicalEntry => "insert",
            RecordKind::ChainEntry => "update",
            RecordKind::JournalBlock => "journalBlock",
        }
    }

    pub fn parse(raw: &str) -> Option<RecordKind> {
        match raw {
            "entity" => Some(RecordKind::Entity),
            "artefact" => Some(RecordKind::Artefact),
            "entityChainCell" => Some(RecordKind::EntityChainCell),
            "entityUpdate" => Some(RecordKind::EntityUpdateCell),
            "entityLink" => Some(RecordKind::EntityLinkCell),
            "artefactChainCell" => Some(RecordKind::ArtefactChainCell),
            "artefactUpdate" => Some(RecordKind::ArtefactUpdateCell),
            "artefactCreatedBy" => Some(RecordKind::ArtefactCreationCell),
            "artefactDerivedBy" => Some(RecordKind::ArtefactDerivationCell),
            "artefactRightsOwnedBy" => Some(RecordKind::ArtefactOwnershipCell),
            "artefactReferencedBy" => Some(RecordKind::ArtefactReferenceCell),
            "insert" => Some(RecordKind::CanonicalEntry),
            "update" => Some(RecordKind::ChainEntry),
            "journalBlock" => Some(RecordKind::JournalBlock),
            _ => None,
        }
    }

    pub fn is_entity_cell(self) -> bool {
        Self::ENTITY_CELLS.contains(&self)
    }

    pub fn is_artefact_cell(self) -> bool {
        Self::ARTEFACT_CELLS.contains(&self)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::RecordKind;

    #[test]
    fn tags_roundtrip_for_every_kind() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn unknown_tags_do_not_parse() {
        assert_eq!(RecordKind::parse("journal"), None);
        assert_eq!(RecordKind::parse(""), None);
    }

    #[test]
    fn tags_are_case_sensitive() {
        assert_eq!(RecordKind::parse("Entity"), None);
        assert_eq!(RecordKind::parse("artefactcreatedby"), None);
    }

    #[test]
    fn cell_subsets_are_disjoint() {
        for kind in RecordKind::ENTITY_CELLS {
            assert!(kind.is_entity_cell());
            assert!(!kind.is_artefact_cell());
        }
        for kind in RecordKind::ARTEFACT_CELLS {
            assert!(kind.is_artefact_cell());
            assert!(!kind.is_entity_cell());
        }
        assert!(!RecordKind::Entity.is_entity_cell());
        assert!(!RecordKind::JournalBlock.is_artefact_cell());
    }
}
