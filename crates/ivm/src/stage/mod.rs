//! Pipeline stages: the unit of incremental execution.
//!
//! Every stage consumes a batch of upstream row deltas and emits the
//! downstream deltas caused by it, mutating only its own state. Each
//! logical Add/Remove flows through a stage exactly once; a remove that the
//! stage has no record of is a silent no-op.

mod filter;
mod flatten;
mod group;
mod ordered;
mod transform;

pub use filter::FilterStage;
pub use flatten::FlattenStage;
pub use group::GroupStage;
pub use ordered::OrderedStage;
pub use transform::{ComputeStage, ReshapeStage};

use alloc::boxed::Box;
use alloc::vec::Vec;
use rill_expr::Evaluator;

use crate::compiler::PlanStage;
use crate::delta::{Delta, DeltaBatch};
use crate::row::DocRow;

/// One pipeline operation with its incremental state.
pub trait Stage {
    /// Applies a batch of upstream deltas, returning the downstream deltas.
    fn apply(&mut self, batch: &[Delta<DocRow>], eval: &dyn Evaluator) -> DeltaBatch<DocRow>;
}

/// Instantiates the stage for one plan entry.
pub(crate) fn build_stage(plan: &PlanStage) -> Box<dyn Stage> {
    match plan {
        PlanStage::Filter(predicate) => Box::new(FilterStage::new(predicate.clone())),
        PlanStage::Reshape(spec) => Box::new(ReshapeStage::new(spec.clone())),
        PlanStage::Compute(fields) => Box::new(ComputeStage::new(fields.clone())),
        PlanStage::Group(spec) => Box::new(GroupStage::new(spec.clone())),
        PlanStage::Ordered { keys, limit, skip } => {
            Box::new(OrderedStage::new(keys.clone(), *limit, *skip))
        }
        PlanStage::Flatten(spec) => Box::new(FlattenStage::new(spec.clone())),
    }
}

/// Instantiates the full stage list for a plan.
pub(crate) fn build_stages(plan: &[PlanStage]) -> Vec<Box<dyn Stage>> {
    plan.iter().map(build_stage).collect()
}
