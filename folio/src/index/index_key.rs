use crate::collection::Document;
use crate::common::{SortOrder, SortableFields, Value};
use crate::errors::FolioResult;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// One component of an index key, ordered by its field's direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct KeyPart {
    value: Value,
    order: SortOrder,
}

impl KeyPart {
    pub(crate) fn new(value: Value, order: SortOrder) -> Self {
        KeyPart { value, order }
    }

    pub(crate) fn value(&self) -> &Value {
        &self.value
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.apply(self.value.cmp(&other.value))
    }
}

/// Composite index key: the tuple of indexed field values.
///
/// Keys compare component by component, each in its field's direction; a
/// strict prefix sorts before every key it prefixes, which makes a prefix
/// a valid seek position for range scans.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct IndexKey {
    parts: SmallVec<[KeyPart; 2]>,
}

impl IndexKey {
    pub(crate) fn new(parts: SmallVec<[KeyPart; 2]>) -> Self {
        IndexKey { parts }
    }

    /// Reads the indexed fields from a document; missing fields become `Null`.
    pub(crate) fn from_document(document: &Document, fields: &SortableFields) -> FolioResult<Self> {
        let mut parts = SmallVec::with_capacity(fields.len());
        for (field_name, order) in fields.sorting_order() {
            parts.push(KeyPart::new(document.get(field_name)?, *order));
        }
        Ok(IndexKey { parts })
    }

    pub(crate) fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub(crate) fn part(&self, index: usize) -> Option<&KeyPart> {
        self.parts.get(index)
    }

    /// `true` when the leading components equal `values`.
    pub(crate) fn starts_with_values(&self, values: &[Value]) -> bool {
        values.len() <= self.parts.len()
            && self.parts.iter().zip(values).all(|(part, value)| part.value() == value)
    }
}

impl Display for IndexKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.parts.iter().map(|p| p.value.to_string()).collect();
        write!(f, "[{}]", values.join(", "))
    }
}
