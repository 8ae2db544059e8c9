//! The row type flowing between pipeline stages, and sort keys.

use alloc::vec::Vec;
use core::cmp::Ordering;
use rill_core::{DocValue, Document, RowId};

/// One evaluated sort component: the extracted value plus its direction.
///
/// Ordering is direction-aware, so a descending component reverses the
/// natural value order. A missing sort field is extracted as `Null`, which
/// sorts before every other value ascending.
#[derive(Clone, Debug, Eq)]
pub struct SortKeyPart {
    pub value: DocValue,
    pub descending: bool,
}

impl SortKeyPart {
    pub fn new(value: DocValue, descending: bool) -> Self {
        Self { value, descending }
    }
}

impl Ord for SortKeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        let ord = self.value.cmp(&other.value);
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

impl PartialOrd for SortKeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

/// A multi-component sort key, compared component by component in declared
/// key order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey(pub Vec<SortKeyPart>);

impl SortKey {
    pub fn new(parts: Vec<SortKeyPart>) -> Self {
        Self(parts)
    }

    /// True for the keyless sort key, which compares equal for every row
    /// and leaves ordering to the `RowId` tie-break.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered-stage entry key: the sort key with the row id as the tie-break.
///
/// Rows whose sort keys compare equal are ordered by `RowId`, which is
/// stable and independent of arrival history.
pub type EntryKey = (SortKey, RowId);

/// The unit flowing between stages: a document plus its stable identity.
///
/// `rank` is populated by an ordered stage and carried downstream so the
/// materializer can render rows in the pipeline's declared order; stages
/// that change row identity (group, flatten) clear it.
#[derive(Clone, Debug, PartialEq)]
pub struct DocRow {
    pub id: RowId,
    pub doc: Document,
    pub rank: Option<SortKey>,
}

impl DocRow {
    /// Creates an unranked row.
    pub fn new(id: RowId, doc: Document) -> Self {
        Self {
            id,
            doc,
            rank: None,
        }
    }

    /// Creates a row carrying its position under an ordered stage.
    pub fn ranked(id: RowId, doc: Document, rank: SortKey) -> Self {
        Self {
            id,
            doc,
            rank: Some(rank),
        }
    }
}
