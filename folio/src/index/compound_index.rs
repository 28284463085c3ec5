use crate::collection::{Document, DocumentId};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::index::{IndexDescriptor, IndexKey, IndexScanBounds};
use im::{OrdMap, OrdSet};
use std::ops::Bound;

/// Ids found by an index scan, with the number of keys visited.
#[derive(Debug, Default, Clone)]
pub(crate) struct IndexScanResult {
    pub(crate) ids: Vec<DocumentId>,
    pub(crate) keys_examined: u64,
}

/// Ordered entries of one index: composite key to the ids sharing it.
///
/// Backed by persistent maps, so cloning an index for a read snapshot or a
/// pending mutation is O(1).
#[derive(Clone, Debug)]
pub(crate) struct CompoundIndex {
    descriptor: IndexDescriptor,
    entries: OrdMap<IndexKey, OrdSet<DocumentId>>,
}

impl CompoundIndex {
    pub(crate) fn new(descriptor: IndexDescriptor) -> Self {
        CompoundIndex {
            descriptor,
            entries: OrdMap::new(),
        }
    }

    pub(crate) fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// Number of distinct keys.
    pub(crate) fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn key_of(&self, document: &Document) -> FolioResult<IndexKey> {
        IndexKey::from_document(document, self.descriptor.index_fields())
    }

    pub(crate) fn write(&mut self, document: &Document, id: DocumentId) -> FolioResult<()> {
        let key = self.key_of(document)?;
        self.add_entry(key, id)
    }

    pub(crate) fn remove(&mut self, document: &Document, id: DocumentId) -> FolioResult<()> {
        let key = self.key_of(document)?;
        self.remove_entry(&key, id);
        Ok(())
    }

    /// Moves `id` from the old document's key to the new one's. Untouched
    /// when the indexed fields did not change.
    pub(crate) fn update(&mut self, old: &Document, new: &Document, id: DocumentId) -> FolioResult<()> {
        let old_key = self.key_of(old)?;
        let new_key = self.key_of(new)?;
        if old_key == new_key {
            return Ok(());
        }
        self.remove_entry(&old_key, id);
        self.add_entry(new_key, id)
    }

    fn add_entry(&mut self, key: IndexKey, id: DocumentId) -> FolioResult<()> {
        match self.entries.get_mut(&key) {
            Some(ids) => {
                if self.descriptor.is_unique() && !ids.contains(&id) {
                    log::error!(
                        "Unique index {} already holds key {}",
                        self.descriptor.name(),
                        key
                    );
                    return Err(FolioError::new(
                        &format!(
                            "Unique constraint violated for key {} in index {}",
                            key,
                            self.descriptor.name()
                        ),
                        ErrorKind::UniqueConstraintViolation,
                    ));
                }
                ids.insert(id);
            }
            None => {
                self.entries.insert(key, OrdSet::unit(id));
            }
        }
        Ok(())
    }

    fn remove_entry(&mut self, key: &IndexKey, id: DocumentId) {
        let now_empty = match self.entries.get_mut(key) {
            Some(ids) => {
                ids.remove(&id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.entries.remove(key);
        }
    }

    /// Collects the ids whose keys satisfy `bounds`, in key order (or
    /// reversed key order). Ids sharing a key stay in ascending id order
    /// either way.
    pub(crate) fn scan(&self, bounds: &IndexScanBounds, reverse: bool) -> IndexScanResult {
        let mut result = IndexScanResult::default();
        if bounds.is_empty_range() {
            return result;
        }

        let fields = self.descriptor.index_fields().sorting_order();
        let seek = bounds.seek_key(fields);
        let mut groups: Vec<&OrdSet<DocumentId>> = Vec::new();

        for (key, ids) in self.entries.range((Bound::Included(seek), Bound::Unbounded)) {
            result.keys_examined += 1;
            match bounds.classify(key, fields) {
                Some(true) => groups.push(ids),
                Some(false) => continue,
                None => break,
            }
        }

        if reverse {
            groups.reverse();
        }
        result.ids = groups.into_iter().flat_map(|ids| ids.iter().copied()).collect();
        result
    }
}
