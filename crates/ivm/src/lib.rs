//! Rill IVM - incremental view maintenance for document pipelines.
//!
//! This crate keeps the output of a multi-stage document pipeline
//! (filter, reshape, compute, group, sort/limit/skip, flatten)
//! continuously correct as individual documents are added or removed,
//! without rescanning the collection.
//!
//! # Core Concepts
//!
//! - `Delta<T>`: one Add (+1) or Remove (-1) event; batches are atomic
//! - `DocRow`: a document plus its stable `RowId`, the unit between stages
//! - `Pipeline`: a compiled stage plan; `Pipeline::compile` rejects
//!   malformed or unsupported specs before anything attaches
//! - `AccumulatorState`: invertible aggregates behind the group stage
//! - `VirtualRowSpace`: stable synthetic identities for flattened rows
//! - `TopKSelector`: bounded maintenance of sort-then-limit windows
//! - `ExecutionStrategy`: `Stream` (pure delta propagation) and `Toggle`
//!   (membership flips over a retained corpus), observationally identical
//!
//! # Example
//!
//! ```ignore
//! use rill_ivm::{build_strategy, Delta, DocRow, ExecutionMode, Pipeline};
//! use rill_expr::DefaultEvaluator;
//!
//! let pipeline = Pipeline::compile(&stages)?;
//! let mut strategy = build_strategy(&pipeline, ExecutionMode::Stream);
//! let out = strategy.apply(vec![Delta::insert(row)], &DefaultEvaluator);
//! ```

#![no_std]

extern crate alloc;

pub mod accumulator;
pub mod compiler;
pub mod delta;
pub mod row;
pub mod stage;
pub mod strategy;
pub mod topk;
pub mod vrs;

pub use accumulator::{AccKind, AccumulatorState};
pub use compiler::{
    AccSpec, FlattenSpec, GroupSpec, Pipeline, PipelineBuilder, ReshapeSpec, SortSpec, StageSpec,
};
pub use delta::{Delta, DeltaBatch};
pub use row::{DocRow, EntryKey, SortKey, SortKeyPart};
pub use stage::{
    ComputeStage, FilterStage, FlattenStage, GroupStage, OrderedStage, ReshapeStage, Stage,
};
pub use strategy::{build_strategy, ExecutionMode, ExecutionStrategy, StreamStrategy, ToggleStrategy};
pub use topk::TopKSelector;
pub use vrs::VirtualRowSpace;
