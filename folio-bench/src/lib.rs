//! Folio benchmark library
//!
//! Data generators and database setup shared by the criterion benches.

pub mod data_gen;

use folio::collection::Collection;
use folio::errors::FolioResult;
use folio::Folio;

/// Opens a fresh database; honours `RUST_LOG` for engine logs.
pub fn create_db() -> FolioResult<Folio> {
    let _ = env_logger::builder().is_test(true).try_init();
    Folio::builder().open()
}

/// A collection preloaded with `count` generated books.
pub fn create_book_collection(db: &Folio, name: &str, count: usize) -> FolioResult<Collection> {
    let collection = db.collection(name)?;
    collection.insert_many(data_gen::generate_books(count))?;
    log::debug!("Loaded {} books into {}", count, name);
    Ok(collection)
}
