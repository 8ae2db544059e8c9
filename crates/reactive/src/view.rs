//! One attached pipeline: strategy, materialized result, subscribers.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use hashbrown::HashMap;
use rill_core::{Document, RowId};
use rill_expr::Evaluator;
use rill_ivm::{DeltaBatch, DocRow, ExecutionStrategy, SortKey};

use crate::change_set::ChangeSet;
use crate::subscription::{SubscriptionId, SubscriptionManager};

/// The materialized output of one attachment.
///
/// Rows are kept ordered by `(rank, id)`: the rank carried out of the
/// pipeline's ordered stage when it has one, with the stable row id as the
/// final tie-break. Unranked pipelines therefore materialize in row-id
/// order, which is identical across execution strategies.
pub struct ObservableView {
    strategy: Box<dyn ExecutionStrategy>,
    ordered: BTreeMap<(Option<SortKey>, RowId), Document>,
    ranks: HashMap<RowId, Option<SortKey>>,
    subscriptions: SubscriptionManager,
}

impl ObservableView {
    pub fn new(strategy: Box<dyn ExecutionStrategy>) -> Self {
        Self {
            strategy,
            ordered: BTreeMap::new(),
            ranks: HashMap::new(),
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Applies one atomic batch.
    ///
    /// The terminal deltas update the materialized result, then exactly
    /// one notification with the batch's net effect goes out to
    /// subscribers - none at all if the batch changed nothing.
    pub fn apply(&mut self, batch: DeltaBatch<DocRow>, eval: &dyn Evaluator, notify: bool) {
        let out = self.strategy.apply(batch, eval);

        let mut changes = ChangeSet::new();
        for delta in out {
            if delta.is_insert() {
                self.ranks.insert(delta.data.id.clone(), delta.data.rank.clone());
                self.ordered
                    .insert((delta.data.rank, delta.data.id), delta.data.doc.clone());
                changes.add(delta.data.doc);
            } else if delta.is_delete() {
                if let Some(rank) = self.ranks.remove(&delta.data.id) {
                    if let Some(doc) = self.ordered.remove(&(rank, delta.data.id)) {
                        changes.remove(doc);
                    }
                }
            }
        }

        if notify && !changes.is_empty() && !self.subscriptions.is_empty() {
            changes.current = self.materialize();
            self.subscriptions.notify_all(&changes);
        }
    }

    /// The current result in final order.
    pub fn materialize(&self) -> Vec<Document> {
        self.ordered.values().cloned().collect()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeSet) + 'static,
    {
        self.subscriptions.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
