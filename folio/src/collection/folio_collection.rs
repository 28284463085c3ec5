use crate::aggregate::{AggregateCursor, Pipeline};
use crate::collection::operation::CollectionOperations;
use crate::collection::{
    DeleteResult, Document, DocumentId, FindOptions, IdGenerator, Update, UpdateResult, WriteResult,
};
use crate::common::{DocumentCursor, SortableFields};
use crate::errors::FolioResult;
use crate::filter::Filter;
use crate::folio_config::FolioConfig;
use crate::index::{IndexDescriptor, IndexOptions};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A named set of documents with its indexes.
///
/// Handles are cheap to clone and share the same state; every operation is
/// safe to call from any thread. Reads see a consistent snapshot, writes
/// are atomic per call.
///
/// ```rust,ignore
/// let books = db.collection("books")?;
/// books.insert(doc! { title: "1984", author: "George Orwell", published_year: 1949 })?;
/// books.create_index(vec!["author", "published_year"], &non_unique_index())?;
///
/// let orwell = books
///     .find(and(vec![field("author").eq("George Orwell"), field("published_year").gt(1940)]))?
///     .to_vec()?;
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    name: String,
    operations: CollectionOperations,
}

impl Collection {
    pub(crate) fn new(name: &str, config: FolioConfig, id_generator: Arc<IdGenerator>) -> Self {
        Collection {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                operations: CollectionOperations::new(name, config, id_generator),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Stores `document`, assigning an id unless it carries one.
    pub fn insert(&self, document: Document) -> FolioResult<DocumentId> {
        self.inner.operations.insert(document)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> FolioResult<WriteResult> {
        self.inner.operations.insert_many(documents)
    }

    pub fn find(&self, filter: Filter) -> FolioResult<DocumentCursor> {
        self.inner.operations.find(filter, FindOptions::new())
    }

    pub fn find_with_options(&self, filter: Filter, find_options: &FindOptions) -> FolioResult<DocumentCursor> {
        self.inner.operations.find(filter, find_options.clone())
    }

    /// Applies `update` to the first matching document in collection order.
    pub fn update_one(&self, filter: Filter, update: &Update) -> FolioResult<UpdateResult> {
        self.inner.operations.update(&filter, update, true)
    }

    pub fn update_many(&self, filter: Filter, update: &Update) -> FolioResult<UpdateResult> {
        self.inner.operations.update(&filter, update, false)
    }

    /// Removes the first matching document in collection order.
    pub fn delete_one(&self, filter: Filter) -> FolioResult<DeleteResult> {
        self.inner.operations.delete(&filter, true)
    }

    pub fn delete_many(&self, filter: Filter) -> FolioResult<DeleteResult> {
        self.inner.operations.delete(&filter, false)
    }

    pub fn get_by_id(&self, id: &DocumentId) -> FolioResult<Option<Document>> {
        self.inner.operations.get_by_id(id)
    }

    pub fn size(&self) -> FolioResult<usize> {
        self.inner.operations.size()
    }

    /// Every document in collection order, from a snapshot taken now.
    pub fn scan(&self) -> FolioResult<impl Iterator<Item = Document>> {
        self.inner.operations.scan()
    }

    /// Prepares `pipeline`; nothing runs until the cursor is iterated.
    pub fn aggregate(&self, pipeline: Pipeline) -> FolioResult<AggregateCursor> {
        self.inner.operations.aggregate(pipeline)
    }

    pub fn create_index<F: Into<SortableFields>>(
        &self,
        fields: F,
        options: &IndexOptions,
    ) -> FolioResult<IndexDescriptor> {
        self.inner.operations.create_index(fields.into(), options)
    }

    pub fn list_indexes(&self) -> FolioResult<Vec<IndexDescriptor>> {
        self.inner.operations.list_indexes()
    }

    pub fn has_index<F: Into<SortableFields>>(&self, fields: F) -> FolioResult<bool> {
        self.inner.operations.has_index(&fields.into())
    }

    pub fn drop_index<F: Into<SortableFields>>(&self, fields: F) -> FolioResult<()> {
        self.inner.operations.drop_index(&fields.into())
    }

    /// Ids matching `filter`, answered through an index whose fields start
    /// with `field_sequence`; `None` when no index can serve it.
    pub fn lookup(&self, field_sequence: &[&str], filter: &Filter) -> FolioResult<Option<Vec<DocumentId>>> {
        self.inner.operations.lookup(field_sequence, filter)
    }

    pub(crate) fn invalidate(&self, dropped: bool) {
        self.inner.operations.invalidate(dropped);
    }
}

impl Debug for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.inner.name).finish()
    }
}
