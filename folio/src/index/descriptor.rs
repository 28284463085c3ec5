use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::collection::Document;
use crate::common::{SortableFields, Value, NON_UNIQUE_INDEX, UNIQUE_INDEX};

/// Definition of a secondary index: an ordered `(field, direction)`
/// sequence, a uniqueness flag and a name derived from the fields.
///
/// Two descriptors with the same field sequence are the same index; the
/// collection keeps at most one of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    inner: Arc<IndexDescriptorInner>,
}

impl IndexDescriptor {
    pub fn new(index_type: &str, index_fields: SortableFields, collection_name: &str) -> Self {
        let name = index_fields.encoded_name();
        Self {
            inner: Arc::new(IndexDescriptorInner {
                index_type: index_type.to_string(),
                index_fields,
                collection_name: collection_name.to_string(),
                name,
            }),
        }
    }

    /// Deterministic name such as `author_1_published_year_1`.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn index_type(&self) -> &str {
        &self.inner.index_type
    }

    pub fn index_fields(&self) -> &SortableFields {
        &self.inner.index_fields
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection_name
    }

    pub fn is_unique(&self) -> bool {
        self.inner.index_type == UNIQUE_INDEX
    }

    pub fn is_compound_index(&self) -> bool {
        self.inner.index_fields.len() > 1
    }

    /// Listing form: `{name: "title_1", key: {title: 1}, unique: false}`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert_raw("name", Value::from(self.name()));
        document.insert_raw("key", Value::Document(self.inner.index_fields.to_document()));
        document.insert_raw("unique", Value::Bool(self.is_unique()));
        document
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_unique() { UNIQUE_INDEX } else { NON_UNIQUE_INDEX };
        write!(f, "{} ({}) on {}", self.name(), kind, self.collection_name())
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct IndexDescriptorInner {
    index_type: String,
    index_fields: SortableFields,
    collection_name: String,
    name: String,
}
