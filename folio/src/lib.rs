#![allow(dead_code, unused_imports)]

//! # Folio
//!
//! An embedded, in-memory document-query engine: filters, projections,
//! sort and pagination, a compact aggregation pipeline, and secondary
//! indexes with a planner that picks between collection scans and index
//! walks.
//!
//! ```rust,ignore
//! use folio::collection::Projection;
//! use folio::common::SortOrder;
//! use folio::filter::{and, field};
//! use folio::index::non_unique_index;
//! use folio::{doc, Folio};
//!
//! let db = Folio::builder().open()?;
//! let books = db.collection("books")?;
//! books.insert(doc! { title: "1984", author: "George Orwell", published_year: 1949, price: 9.99 })?;
//! books.create_index(vec!["author", "published_year"], &non_unique_index())?;
//!
//! let orwell = books
//!     .find(and(vec![field("author").eq("George Orwell"), field("published_year").gt(1940)]))?
//!     .sort("price", SortOrder::Descending)
//!     .project(Projection::include(vec!["title", "price"]).exclude_id())?
//!     .to_vec()?;
//! ```
//!
//! Every handle (`Folio`, `Collection`, cursors) is `Send + Sync` and cheap to
//! clone. Reads run on O(1) snapshots of a collection; writes are atomic per
//! call and keep all indexes in step with the documents.

pub mod aggregate;
pub mod collection;
pub mod common;
pub mod errors;
pub mod explain;
pub mod filter;
pub mod folio;
pub mod folio_builder;
pub mod folio_config;
pub mod index;

pub use crate::folio::Folio;
pub use crate::folio_builder::FolioBuilder;
pub use crate::folio_config::FolioConfig;
