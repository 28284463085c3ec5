//! Collections and the documents they hold.
//!
//! A [Collection] stores [Document]s keyed by [DocumentId] in insertion
//! order. Queries go through [Collection::find], which returns a lazy
//! [crate::common::DocumentCursor]; writes are atomic per call and keep every
//! index in step with the stored documents.

mod document;
mod document_id;
mod find_options;
mod find_plan;
mod folio_collection;
pub(crate) mod operation;
mod projection;
mod update;
mod write_result;

pub use document::*;
pub use document_id::*;
pub use find_options::*;
pub use find_plan::*;
pub use folio_collection::*;
pub use projection::*;
pub use update::*;
pub use write_result::*;
