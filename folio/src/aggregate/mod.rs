//! Aggregation pipelines.
//!
//! A [Pipeline] is an ordered list of [Stage]s (`$match`, `$addFields`,
//! `$group`, `$sort`, `$skip`, `$limit`, `$project`) built with the typed
//! API or parsed with [Pipeline::from_documents]. Expressions and
//! accumulators are parsed into typed trees before anything runs, so a
//! malformed pipeline fails with a validation error up front.
//!
//! ```rust,ignore
//! let pipeline = Pipeline::from_documents(&[doc! {
//!     "$group": {
//!         "_id": "$genre",
//!         averagePrice: { "$avg": "$price" },
//!         count: { "$sum": 1 },
//!     }
//! }])?;
//! let per_genre = books.aggregate(pipeline)?.to_vec()?;
//! ```

mod accumulator;
mod aggregate_cursor;
mod expression;
mod pipeline;
mod stage;

pub use accumulator::*;
pub use aggregate_cursor::*;
pub use expression::*;
pub use pipeline::*;
pub use stage::*;
