use crate::collection::DocumentId;

/// Identifiers assigned by an insert, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteResult {
    ids: Vec<DocumentId>,
}

impl WriteResult {
    pub(crate) fn new(ids: Vec<DocumentId>) -> WriteResult {
        WriteResult { ids }
    }

    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    pub fn affected_count(&self) -> usize {
        self.ids.len()
    }
}

impl IntoIterator for WriteResult {
    type Item = DocumentId;
    type IntoIter = std::vec::IntoIter<DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateResult {
    matched_count: u64,
    modified_count: u64,
}

impl UpdateResult {
    pub(crate) fn new(matched_count: u64, modified_count: u64) -> UpdateResult {
        UpdateResult {
            matched_count,
            modified_count,
        }
    }

    /// Documents the filter selected.
    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    /// Documents whose content actually changed.
    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteResult {
    deleted_count: u64,
}

impl DeleteResult {
    pub(crate) fn new(deleted_count: u64) -> DeleteResult {
        DeleteResult { deleted_count }
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted_count
    }
}
