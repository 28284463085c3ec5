use crate::errors::{ErrorKind, FolioError, FolioResult};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique identifier for documents in a collection.
///
/// Ids are issued by the owning database from a monotonically increasing
/// counter, so id order within a collection is insertion order. Documents
/// are scanned in id order and index entries sharing a key list their ids
/// in the same order.
///
/// ```rust,ignore
/// let id = books.insert(doc! { title: "1984" })?;
/// let book = books.get_by_id(&id)?.unwrap();
/// assert_eq!(book.id(), Some(id));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentId {
    id_value: u64,
}

impl DocumentId {
    pub(crate) fn new(id_value: u64) -> Self {
        DocumentId { id_value }
    }

    /// Validates and wraps a raw id value. Zero is reserved.
    pub fn create_id(id_value: u64) -> FolioResult<DocumentId> {
        if id_value == 0 {
            log::error!("Document id value must be positive");
            return Err(FolioError::new(
                "Document id value must be positive",
                ErrorKind::InvalidId,
            ));
        }
        Ok(DocumentId { id_value })
    }

    /// Parses the decimal form produced by `Display`.
    pub fn parse(value: &str) -> FolioResult<DocumentId> {
        let id_value = value.parse::<u64>().map_err(|e| {
            log::error!("Invalid document id {}: {}", value, e);
            FolioError::new(&format!("Invalid document id '{}'", value), ErrorKind::InvalidId)
        })?;
        DocumentId::create_id(id_value)
    }

    #[inline]
    pub fn id_value(&self) -> u64 {
        self.id_value
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_value)
    }
}

/// Issues document ids for every collection of one database.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    last_id: AtomicU64,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        IdGenerator {
            last_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn next_id(&self) -> DocumentId {
        DocumentId::new(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Records an id supplied by a caller so that later ids sort after it.
    pub(crate) fn observe(&self, id: &DocumentId) {
        self.last_id.fetch_max(id.id_value(), Ordering::SeqCst);
    }
}
