//! Stateless per-document transform stages: reshape and compute.
//!
//! Both stages are pure functions of the incoming document, so an Add and
//! its matching Remove transform to the same output row and cardinality is
//! preserved.

use alloc::string::String;
use alloc::vec::Vec;
use rill_core::{DocObject, DocValue, Document};
use rill_expr::{Evaluator, Expr};

use crate::compiler::ReshapeSpec;
use crate::delta::{Delta, DeltaBatch};
use crate::row::DocRow;
use crate::stage::Stage;

/// Projects documents down to included fields (or everything minus
/// excluded fields) and merges computed fields.
pub struct ReshapeStage {
    spec: ReshapeSpec,
}

impl ReshapeStage {
    pub fn new(spec: ReshapeSpec) -> Self {
        Self { spec }
    }

    fn project(&self, doc: &Document, eval: &dyn Evaluator) -> Document {
        let mut out = if self.spec.include.is_empty() {
            let mut out = doc.clone();
            for path in &self.spec.exclude {
                out.remove_path(path);
            }
            out
        } else {
            let mut out = DocValue::Object(DocObject::new());
            for path in &self.spec.include {
                if let Some(value) = doc.path(path) {
                    out.set_path(path, value.clone());
                }
            }
            out
        };
        for (field, expr) in &self.spec.computed {
            if let Some(value) = eval.evaluate(expr, doc) {
                out.set_path(field, value);
            }
        }
        out
    }
}

impl Stage for ReshapeStage {
    fn apply(&mut self, batch: &[Delta<DocRow>], eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        batch
            .iter()
            .map(|d| {
                Delta::new(
                    DocRow {
                        id: d.data.id.clone(),
                        doc: self.project(&d.data.doc, eval),
                        rank: d.data.rank.clone(),
                    },
                    d.diff,
                )
            })
            .collect()
    }
}

/// Merges computed fields into each passing document.
pub struct ComputeStage {
    fields: Vec<(String, Expr)>,
}

impl ComputeStage {
    pub fn new(fields: Vec<(String, Expr)>) -> Self {
        Self { fields }
    }

    fn extend(&self, doc: &Document, eval: &dyn Evaluator) -> Document {
        let mut out = doc.clone();
        for (field, expr) in &self.fields {
            // An evaluation failure degrades this field to missing.
            if let Some(value) = eval.evaluate(expr, doc) {
                out.set_path(field, value);
            }
        }
        out
    }
}

impl Stage for ComputeStage {
    fn apply(&mut self, batch: &[Delta<DocRow>], eval: &dyn Evaluator) -> DeltaBatch<DocRow> {
        batch
            .iter()
            .map(|d| {
                Delta::new(
                    DocRow {
                        id: d.data.id.clone(),
                        doc: self.extend(&d.data.doc, eval),
                        rank: d.data.rank.clone(),
                    },
                    d.diff,
                )
            })
            .collect()
    }
}
