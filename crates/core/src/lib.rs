//! Rill Core - document value model and row identity for the rill view engine.
//!
//! This crate defines the types shared by every other rill crate:
//!
//! - `DocValue` / `DocObject`: an opaque nested document value (null / bool /
//!   number / string / array / object) with structural equality, a total
//!   order and hashing, so values can serve as group keys and sort keys.
//! - Dotted-path access (`DocValue::path`) returning a "missing" sentinel
//!   (`None`) instead of an error.
//! - `RowId`: the stable identity of a row across its lifetime, covering
//!   source documents, virtual rows minted by array flattening, and group
//!   output rows.
//! - `CompileError`: attach-time pipeline rejection.

#![no_std]

extern crate alloc;

pub mod error;
pub mod path;
pub mod row;
pub mod value;

pub use error::{CompileError, CompileResult};
pub use row::{RowId, SourceId};
pub use value::{DocObject, DocValue, Document};
