//! Execution strategies: pure delta streaming vs membership toggling.
//!
//! Both strategies drive the same stage implementations and must produce
//! observationally identical output for identical delta histories; the
//! difference is purely how the leading filter prefix is evaluated. The
//! strategy is chosen once at attach time, never per call.

use alloc::boxed::Box;
use alloc::vec::Vec;
use hashbrown::HashMap;
use rill_core::{Document, RowId};
use rill_expr::{Evaluator, Predicate};

use crate::compiler::{Pipeline, PlanStage};
use crate::delta::{Delta, DeltaBatch};
use crate::row::DocRow;
use crate::stage::{build_stages, Stage};

/// How an attachment processes delta batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Walk the stage graph once per batch, propagating only the deltas
    /// the batch caused. Suits append/remove-heavy workloads.
    #[default]
    Stream,
    /// Keep the corpus of seen rows with a membership flag ahead of the
    /// leading filters, so predicate flips are bulk re-evaluations rather
    /// than per-document replay. Suits interactive filtering over a
    /// largely fixed document set.
    Toggle,
}

impl ExecutionMode {
    /// Resolves a mode name; anything unrecognized falls back to stream.
    pub fn from_name(name: &str) -> Self {
        match name {
            "toggle" => ExecutionMode::Toggle,
            _ => ExecutionMode::Stream,
        }
    }
}

/// Applies delta batches against a compiled pipeline.
pub trait ExecutionStrategy {
    fn apply(&mut self, batch: DeltaBatch<DocRow>, eval: &dyn Evaluator) -> DeltaBatch<DocRow>;
}

/// Builds the strategy for a pipeline under the chosen mode.
pub fn build_strategy(pipeline: &Pipeline, mode: ExecutionMode) -> Box<dyn ExecutionStrategy> {
    match mode {
        ExecutionMode::Stream => Box::new(StreamStrategy::new(pipeline)),
        ExecutionMode::Toggle => Box::new(ToggleStrategy::new(pipeline)),
    }
}

/// Pure delta propagation through the full stage list.
pub struct StreamStrategy {
    stages: Vec<Box<dyn Stage>>,
}

impl StreamStrategy {
    pub fn new(pipeline: &Pipeline) -> Self {
        Self {
            stages: build_stages(&pipeline.plan),
        }
    }
}

impl ExecutionStrategy for StreamStrategy {
    fn apply(&mut self, batch: DeltaBatch<DocRow>, eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        let mut current = batch;
        for stage in &mut self.stages {
            if current.is_empty() {
                break;
            }
            current = stage.apply(&current, eval);
        }
        current
    }
}

struct ToggleRow {
    doc: Document,
    alive: bool,
    passes: bool,
}

impl ToggleRow {
    fn visible(&self) -> bool {
        self.alive && self.passes
    }
}

/// Membership-toggle execution.
///
/// The leading run of filter stages is peeled off the plan and evaluated
/// against a retained corpus; only net visibility flips propagate into the
/// remaining stages.
pub struct ToggleStrategy {
    filters: Vec<Predicate>,
    corpus: HashMap<RowId, ToggleRow>,
    suffix: Vec<Box<dyn Stage>>,
}

impl ToggleStrategy {
    pub fn new(pipeline: &Pipeline) -> Self {
        let split = pipeline
            .plan
            .iter()
            .position(|stage| !matches!(stage, PlanStage::Filter(_)))
            .unwrap_or(pipeline.plan.len());
        let filters = pipeline.plan[..split]
            .iter()
            .filter_map(|stage| match stage {
                PlanStage::Filter(predicate) => Some(predicate.clone()),
                _ => None,
            })
            .collect();
        Self {
            filters,
            corpus: HashMap::new(),
            suffix: build_stages(&pipeline.plan[split..]),
        }
    }

    fn passes(&self, doc: &Document, eval: &dyn Evaluator) -> bool {
        self.filters.iter().all(|p| eval.matches(p, doc))
    }
}

impl ExecutionStrategy for ToggleStrategy {
    fn apply(&mut self, batch: DeltaBatch<DocRow>, eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        let mut flips = DeltaBatch::new();
        for d in batch {
            if d.is_insert() {
                let passes = self.passes(&d.data.doc, eval);
                let prev = self.corpus.insert(
                    d.data.id.clone(),
                    ToggleRow {
                        doc: d.data.doc.clone(),
                        alive: true,
                        passes,
                    },
                );
                // Ingress keeps histories clean; a still-visible previous
                // entry for this id means the add is a duplicate.
                let was_visible = prev.is_some_and(|p| p.visible());
                if passes && !was_visible {
                    flips.push(Delta::insert(d.data));
                }
            } else if d.is_delete() {
                if let Some(row) = self.corpus.get_mut(&d.data.id) {
                    if row.visible() {
                        flips.push(Delta::delete(DocRow::new(d.data.id.clone(), row.doc.clone())));
                    }
                    row.alive = false;
                }
            }
        }

        let mut current = flips;
        for stage in &mut self.suffix {
            if current.is_empty() {
                break;
            }
            current = stage.apply(&current, eval);
        }
        current
    }
}
