use crate::collection::{Collection, IdGenerator};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::folio_builder::FolioBuilder;
use crate::folio_config::FolioConfig;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An in-memory document database: a set of named collections sharing one
/// configuration and one id generator.
///
/// ```rust,ignore
/// let db = Folio::builder().open()?;
/// let books = db.collection("books")?;
/// books.insert(doc! { title: "Dune" })?;
/// db.close()?;
/// ```
#[derive(Clone)]
pub struct Folio {
    inner: Arc<FolioInner>,
}

impl std::fmt::Debug for Folio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Folio").finish_non_exhaustive()
    }
}

impl Folio {
    pub fn builder() -> FolioBuilder {
        FolioBuilder::new()
    }

    pub(crate) fn new(config: FolioConfig) -> Self {
        Folio {
            inner: Arc::new(FolioInner {
                config,
                collections: DashMap::new(),
                id_generator: Arc::new(IdGenerator::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the named collection, creating it empty on first use.
    pub fn collection(&self, name: &str) -> FolioResult<Collection> {
        self.inner.collection(name)
    }

    pub fn has_collection(&self, name: &str) -> FolioResult<bool> {
        self.inner.check_opened()?;
        Ok(self.inner.collections.contains_key(name))
    }

    /// Collection names in lexical order.
    pub fn list_collection_names(&self) -> FolioResult<Vec<String>> {
        self.inner.check_opened()?;
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Removes a collection with its documents and indexes. Existing
    /// handles to it fail from then on.
    pub fn drop_collection(&self, name: &str) -> FolioResult<()> {
        self.inner.check_opened()?;
        if let Some((_, collection)) = self.inner.collections.remove(name) {
            collection.invalidate(true);
            log::info!("Dropped collection {}", name);
        }
        Ok(())
    }

    /// Releases every collection. All handles fail afterwards.
    pub fn close(&self) -> FolioResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for entry in self.inner.collections.iter() {
            entry.value().invalidate(false);
        }
        self.inner.collections.clear();
        log::info!("Database closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> FolioConfig {
        self.inner.config.clone()
    }
}

struct FolioInner {
    config: FolioConfig,
    collections: DashMap<String, Collection>,
    id_generator: Arc<IdGenerator>,
    closed: AtomicBool,
}

impl FolioInner {
    fn check_opened(&self) -> FolioResult<()> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("Database is closed");
            return Err(FolioError::new("Database is closed", ErrorKind::DatabaseClosed));
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> FolioResult<Collection> {
        self.check_opened()?;
        if name.trim().is_empty() {
            log::error!("Empty collection name");
            return Err(FolioError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::info!("Created collection {}", name);
                Collection::new(name, self.config.clone(), self.id_generator.clone())
            })
            .clone();
        Ok(collection)
    }
}
