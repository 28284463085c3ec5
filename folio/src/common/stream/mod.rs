mod counted_stream;
mod document_cursor;
mod filtered_stream;
mod projected_stream;
mod sorted_stream;

pub(crate) use counted_stream::*;
pub use document_cursor::*;
pub(crate) use filtered_stream::*;
pub(crate) use projected_stream::*;
pub(crate) use sorted_stream::*;
