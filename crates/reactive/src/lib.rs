//! Rill Reactive - live pipeline attachments over a document store.
//!
//! This crate is the engine's outer surface: a mutable document store,
//! pipeline attachment via [`Engine::attach`], continuously maintained
//! results, and synchronous change notification. When documents are
//! inserted, removed or replaced, every attached view is updated
//! incrementally and subscribers receive the batch's net changes.
//!
//! # Core Concepts
//!
//! - `Engine` / `Handle`: owns all per-attachment state; `detach` releases
//!   it synchronously, with no process-global registry anywhere
//! - `DocumentStore`: the live ordered document collection and the ingress
//!   point that turns caller mutations into clean delta batches
//! - `ObservableView`: one attachment's materialized, ordered result
//! - `ChangeSet`: the net effect of one applied batch, delivered once per
//!   batch to every subscriber
//!
//! # Example
//!
//! ```ignore
//! use rill_reactive::{AttachOptions, Engine};
//! use rill_ivm::Pipeline;
//!
//! let mut engine = Engine::new();
//! let pipeline = Pipeline::compile(&stages)?;
//! let handle = engine.attach(&pipeline, AttachOptions::stream());
//!
//! engine.subscribe(handle, |changes| {
//!     // net adds/removes plus the full current result
//! });
//! engine.insert(doc);
//! let rows = engine.materialize(handle);
//! ```

#![no_std]

extern crate alloc;

pub mod change_set;
pub mod engine;
pub mod store;
pub mod subscription;
pub mod view;

pub use change_set::ChangeSet;
pub use engine::{AttachOptions, Engine, Handle, Mutation};
pub use store::DocumentStore;
pub use subscription::{ChangeCallback, SubscriptionId, SubscriptionManager};
pub use view::ObservableView;

// Re-export the attachment-facing pipeline types.
pub use rill_ivm::{ExecutionMode, Pipeline};
