//! The live document collection shared by all attachments.

use alloc::collections::BTreeMap;
use rill_core::{Document, SourceId};

/// Ordered set of live documents, keyed by assigned sequence id.
///
/// The store is the engine's ingress point: its mutation methods return
/// clean histories (no double adds, no removes of unknown ids), so every
/// attachment sees each logical event exactly once.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: BTreeMap<SourceId, Document>,
    next_id: SourceId,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            docs: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Inserts a document under a freshly assigned id.
    pub fn insert(&mut self, doc: Document) -> SourceId {
        let id = self.next_id;
        self.next_id += 1;
        self.docs.insert(id, doc);
        id
    }

    /// Removes a document; `None` if the id is not live.
    pub fn remove(&mut self, id: SourceId) -> Option<Document> {
        self.docs.remove(&id)
    }

    /// Replaces a live document, returning the previous content; `None`
    /// (and no change) if the id is not live.
    pub fn replace(&mut self, id: SourceId, doc: Document) -> Option<Document> {
        match self.docs.get_mut(&id) {
            Some(slot) => Some(core::mem::replace(slot, doc)),
            None => None,
        }
    }

    pub fn get(&self, id: SourceId) -> Option<&Document> {
        self.docs.get(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.docs.contains_key(&id)
    }

    /// Live documents in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &Document)> {
        self.docs.iter().map(|(id, doc)| (*id, doc))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::DocValue;

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = DocumentStore::new();
        let a = store.insert(DocValue::from(1));
        let b = store.insert(DocValue::from(2));
        assert!(a < b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut store = DocumentStore::new();
        assert_eq!(store.remove(99), None);
    }

    #[test]
    fn test_replace_keeps_id() {
        let mut store = DocumentStore::new();
        let id = store.insert(DocValue::from(1));
        assert_eq!(store.replace(id, DocValue::from(2)), Some(DocValue::from(1)));
        assert_eq!(store.get(id), Some(&DocValue::from(2)));

        assert_eq!(store.replace(77, DocValue::from(3)), None);
    }
}
