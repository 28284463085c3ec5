//! Query filters for selecting documents.
//!
//! Filters are typed predicate trees built with the fluent API or parsed
//! from filter documents:
//!
//! ```rust,ignore
//! use folio::filter::{field, and, Filter};
//! use folio::doc;
//!
//! let fluent = and(vec![field("in_stock").eq(true), field("published_year").gt(2010)]);
//! let parsed = Filter::from_document(&doc! {
//!     in_stock: true,
//!     published_year: { "$gt": 2010 }
//! })?;
//! assert_eq!(fluent, parsed);
//! ```
//!
//! # Supported operators
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte` (same type bracket only)
//! - **Membership**: `in`
//! - **Logical**: `and`, `or`, `not`

mod basic_filters;
mod filter;
mod fluent;
mod parse;

pub use basic_filters::*;
pub use filter::*;
pub use fluent::*;
