//! Secondary indexes.
//!
//! An index maps the tuple of its fields' values to the set of ids of the
//! documents holding that tuple. Indexes on `(author, published_year)`
//! serve filters on `author` alone or on `author` and `published_year`,
//! never on `published_year` alone.

mod compound_index;
mod descriptor;
mod index_key;
mod index_scanner;
mod options;

pub(crate) use compound_index::*;
pub use descriptor::*;
pub(crate) use index_key::*;
pub use index_scanner::IndexScanBounds;
pub(crate) use index_scanner::RangeBound;
pub use options::*;
