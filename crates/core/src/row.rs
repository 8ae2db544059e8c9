//! Row identity for the rill view engine.
//!
//! A `RowId` distinguishes a row across its whole lifetime and is never
//! re-derived from document content. Source documents carry a sequence id
//! assigned by the document store; array flattening mints virtual child ids
//! scoped by a generation counter; group stages derive their output identity
//! from the group key itself so that identity is stable across execution
//! strategies.

use crate::value::DocValue;
use alloc::boxed::Box;

/// Sequence identifier assigned to source documents by the store.
pub type SourceId = u64;

/// Stable identity of a row produced anywhere in a pipeline.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowId {
    /// A document in the store.
    Source(SourceId),
    /// A row minted by array flattening: one per array slot.
    ///
    /// `generation` increments whenever the parent's array is replaced, so a
    /// stale slot id can never alias an unrelated element.
    Virtual {
        parent: Box<RowId>,
        slot: u32,
        generation: u32,
    },
    /// A group output row, identified by its structural group key.
    Group(DocValue),
}

impl RowId {
    /// Creates a source row id.
    #[inline]
    pub fn source(id: SourceId) -> Self {
        RowId::Source(id)
    }

    /// Creates a virtual child id under the given parent.
    pub fn virtual_child(parent: &RowId, slot: u32, generation: u32) -> Self {
        RowId::Virtual {
            parent: Box::new(parent.clone()),
            slot,
            generation,
        }
    }

    /// Creates a group row id from its key.
    #[inline]
    pub fn group(key: DocValue) -> Self {
        RowId::Group(key)
    }

    /// Returns true if this id was minted by array flattening.
    #[inline]
    pub fn is_virtual(&self) -> bool {
        matches!(self, RowId::Virtual { .. })
    }
}
