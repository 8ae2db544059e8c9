//! The engine: document store plus live pipeline attachments.

use alloc::boxed::Box;
use alloc::vec::Vec;
use hashbrown::HashMap;
use rill_core::{CompileResult, DocValue, Document, RowId, SourceId};
use rill_expr::{DefaultEvaluator, Evaluator};
use rill_ivm::{build_strategy, Delta, DeltaBatch, DocRow, ExecutionMode, Pipeline};

use crate::change_set::ChangeSet;
use crate::store::DocumentStore;
use crate::subscription::SubscriptionId;
use crate::view::ObservableView;

/// Identifies one pipeline attachment. All per-attachment state lives in
/// the engine and is released synchronously by [`Engine::detach`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u64);

/// Options recognized at attach time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachOptions {
    pub mode: ExecutionMode,
}

impl AttachOptions {
    pub fn stream() -> Self {
        Self {
            mode: ExecutionMode::Stream,
        }
    }

    pub fn toggle() -> Self {
        Self {
            mode: ExecutionMode::Toggle,
        }
    }

    /// Reads `{mode: "stream" | "toggle"}`; unrecognized or missing values
    /// fall back to stream rather than failing.
    pub fn from_spec(spec: &DocValue) -> Self {
        let mode = spec
            .as_object()
            .and_then(|obj| obj.get("mode"))
            .and_then(DocValue::as_str)
            .map(ExecutionMode::from_name)
            .unwrap_or_default();
        Self { mode }
    }
}

/// One document mutation; a batch of mutations is applied atomically.
#[derive(Clone, Debug)]
pub enum Mutation {
    Insert(Document),
    Remove(SourceId),
    Replace(SourceId, Document),
}

/// A document store with live incrementally-maintained pipeline views.
///
/// Single-threaded and synchronous: every mutation batch runs to
/// completion through all attached views, materialization and
/// notification, before the next is accepted.
pub struct Engine {
    store: DocumentStore,
    eval: Box<dyn Evaluator>,
    views: HashMap<u64, ObservableView>,
    next_handle: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the default expression evaluator.
    pub fn new() -> Self {
        Self::with_evaluator(Box::new(DefaultEvaluator))
    }

    /// Creates an engine with a caller-supplied evaluator.
    pub fn with_evaluator(eval: Box<dyn Evaluator>) -> Self {
        Self {
            store: DocumentStore::new(),
            eval,
            views: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Attaches a compiled pipeline and seeds it from the live store.
    ///
    /// Seeding does not notify; subscribers registered afterwards observe
    /// changes from the next mutation batch on.
    pub fn attach(&mut self, pipeline: &Pipeline, options: AttachOptions) -> Handle {
        let mut view = ObservableView::new(build_strategy(pipeline, options.mode));
        let seed: DeltaBatch<DocRow> = self
            .store
            .iter()
            .map(|(id, doc)| Delta::insert(DocRow::new(RowId::source(id), doc.clone())))
            .collect();
        if !seed.is_empty() {
            view.apply(seed, &*self.eval, false);
        }

        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        self.views.insert(handle.0, view);
        handle
    }

    /// Compiles and attaches a declarative stage list in one step.
    ///
    /// Compilation errors surface here; nothing is partially attached.
    pub fn attach_spec(
        &mut self,
        stages: &[DocValue],
        options: AttachOptions,
    ) -> CompileResult<Handle> {
        let pipeline = Pipeline::compile(stages)?;
        Ok(self.attach(&pipeline, options))
    }

    /// Detaches a view, synchronously releasing all its state.
    pub fn detach(&mut self, handle: Handle) -> bool {
        self.views.remove(&handle.0).is_some()
    }

    /// Inserts one document, updating every attached view.
    pub fn insert(&mut self, doc: Document) -> SourceId {
        let id = self.store.insert(doc.clone());
        self.broadcast(alloc::vec![Delta::insert(DocRow::new(
            RowId::source(id),
            doc
        ))]);
        id
    }

    /// Removes one document. Removing an id that is not live is a no-op.
    pub fn remove(&mut self, id: SourceId) -> bool {
        match self.store.remove(id) {
            Some(doc) => {
                self.broadcast(alloc::vec![Delta::delete(DocRow::new(
                    RowId::source(id),
                    doc
                ))]);
                true
            }
            None => false,
        }
    }

    /// Replaces a live document in place, keeping its identity. The views
    /// see a remove of the old content and an add of the new one in a
    /// single atomic batch.
    pub fn replace(&mut self, id: SourceId, doc: Document) -> bool {
        match self.store.replace(id, doc.clone()) {
            Some(old) => {
                self.broadcast(alloc::vec![
                    Delta::delete(DocRow::new(RowId::source(id), old)),
                    Delta::insert(DocRow::new(RowId::source(id), doc)),
                ]);
                true
            }
            None => false,
        }
    }

    /// Applies a batch of mutations as one atomic unit: one pass through
    /// every view, one notification each. Returns the ids assigned to
    /// inserted documents.
    pub fn apply_batch(&mut self, mutations: Vec<Mutation>) -> Vec<SourceId> {
        let mut deltas = DeltaBatch::new();
        let mut assigned = Vec::new();
        for mutation in mutations {
            match mutation {
                Mutation::Insert(doc) => {
                    let id = self.store.insert(doc.clone());
                    assigned.push(id);
                    deltas.push(Delta::insert(DocRow::new(RowId::source(id), doc)));
                }
                Mutation::Remove(id) => {
                    if let Some(doc) = self.store.remove(id) {
                        deltas.push(Delta::delete(DocRow::new(RowId::source(id), doc)));
                    }
                }
                Mutation::Replace(id, doc) => {
                    if let Some(old) = self.store.replace(id, doc.clone()) {
                        deltas.push(Delta::delete(DocRow::new(RowId::source(id), old)));
                        deltas.push(Delta::insert(DocRow::new(RowId::source(id), doc)));
                    }
                }
            }
        }
        if !deltas.is_empty() {
            self.broadcast(deltas);
        }
        assigned
    }

    /// The current result of an attached view, in final order.
    pub fn materialize(&self, handle: Handle) -> Vec<Document> {
        self.views
            .get(&handle.0)
            .map(ObservableView::materialize)
            .unwrap_or_default()
    }

    /// Subscribes to a view's change notifications.
    pub fn subscribe<F>(&mut self, handle: Handle, callback: F) -> Option<SubscriptionId>
    where
        F: Fn(&ChangeSet) + 'static,
    {
        self.views
            .get_mut(&handle.0)
            .map(|view| view.subscribe(callback))
    }

    pub fn unsubscribe(&mut self, handle: Handle, id: SubscriptionId) -> bool {
        self.views
            .get_mut(&handle.0)
            .is_some_and(|view| view.unsubscribe(id))
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    fn broadcast(&mut self, deltas: DeltaBatch<DocRow>) {
        for view in self.views.values_mut() {
            view.apply(deltas.clone(), &*self.eval, true);
        }
    }
}
