use crate::collection::{Document, DocumentId};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::index::{CompoundIndex, IndexDescriptor};
use im::OrdMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CollectionStatus {
    Open,
    Dropped,
    Closed,
}

/// Documents and index entries of one collection.
///
/// Every method that changes documents keeps all indexes in step, failing
/// before anything is kept when an index rejects the change. Callers mutate a
/// clone and publish it with one assignment, so a failed mutation leaves
/// the published state untouched.
#[derive(Clone, Debug)]
pub(crate) struct CollectionState {
    name: String,
    records: OrdMap<DocumentId, Document>,
    indexes: Vec<CompoundIndex>,
    catalog_version: u64,
    status: CollectionStatus,
}

impl CollectionState {
    pub(crate) fn new(name: &str) -> Self {
        CollectionState {
            name: name.to_string(),
            records: OrdMap::new(),
            indexes: Vec::new(),
            catalog_version: 0,
            status: CollectionStatus::Open,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ensure_open(&self) -> FolioResult<()> {
        match self.status {
            CollectionStatus::Open => Ok(()),
            CollectionStatus::Dropped => {
                log::error!("Collection {} has been dropped", self.name);
                Err(FolioError::new(
                    &format!("Collection {} has been dropped", self.name),
                    ErrorKind::CollectionDropped,
                ))
            }
            CollectionStatus::Closed => {
                log::error!("Database of collection {} is closed", self.name);
                Err(FolioError::new(
                    "Database is closed",
                    ErrorKind::DatabaseClosed,
                ))
            }
        }
    }

    /// Releases all data and refuses further operations.
    pub(crate) fn invalidate(&mut self, status: CollectionStatus) {
        self.records = OrdMap::new();
        self.indexes.clear();
        self.status = status;
    }

    pub(crate) fn records(&self) -> &OrdMap<DocumentId, Document> {
        &self.records
    }

    pub(crate) fn size(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.records.get(id)
    }

    pub(crate) fn contains(&self, id: &DocumentId) -> bool {
        self.records.contains_key(id)
    }

    /// Bumped whenever an index is created or dropped.
    pub(crate) fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    pub(crate) fn indexes(&self) -> &[CompoundIndex] {
        &self.indexes
    }

    pub(crate) fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes.iter().map(|i| i.descriptor().clone()).collect()
    }

    pub(crate) fn find_index(&self, name: &str) -> Option<&CompoundIndex> {
        self.indexes.iter().find(|i| i.descriptor().name() == name)
    }

    pub(crate) fn insert_document(&mut self, id: DocumentId, document: Document) -> FolioResult<()> {
        if self.records.contains_key(&id) {
            log::error!("Document with id {} already exists in {}", id, self.name);
            return Err(FolioError::new(
                &format!("Duplicate document id {} in collection {}", id, self.name),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        for index in self.indexes.iter_mut() {
            index.write(&document, id)?;
        }
        self.records.insert(id, document);
        Ok(())
    }

    /// Replaces a stored document; returns `false` when the id is absent.
    pub(crate) fn replace_document(&mut self, id: DocumentId, document: Document) -> FolioResult<bool> {
        let old = match self.records.get(&id) {
            Some(old) => old.clone(),
            None => return Ok(false),
        };
        for index in self.indexes.iter_mut() {
            index.update(&old, &document, id)?;
        }
        self.records.insert(id, document);
        Ok(true)
    }

    pub(crate) fn remove_document(&mut self, id: &DocumentId) -> FolioResult<Option<Document>> {
        let removed = match self.records.remove(id) {
            Some(removed) => removed,
            None => return Ok(None),
        };
        for index in self.indexes.iter_mut() {
            index.remove(&removed, *id)?;
        }
        Ok(Some(removed))
    }

    /// Builds a new index over the current documents.
    pub(crate) fn add_index(&mut self, descriptor: IndexDescriptor) -> FolioResult<()> {
        let mut index = CompoundIndex::new(descriptor);
        for (id, document) in self.records.iter() {
            index.write(document, *id)?;
        }
        self.indexes.push(index);
        self.catalog_version += 1;
        Ok(())
    }

    pub(crate) fn remove_index(&mut self, name: &str) -> Option<IndexDescriptor> {
        let position = self
            .indexes
            .iter()
            .position(|i| i.descriptor().name() == name)?;
        let removed = self.indexes.remove(position);
        self.catalog_version += 1;
        Some(removed.descriptor().clone())
    }
}
