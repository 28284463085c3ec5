use super::collection_state::{CollectionState, CollectionStatus};
use super::find_optimizer::FindOptimizer;
use super::index_manager::IndexManager;
use super::read_operations::ReadOperations;
use super::write_operations::WriteOperations;
use crate::aggregate::{AggregateCursor, Pipeline};
use crate::collection::{
    DeleteResult, Document, DocumentId, FindOptions, IdGenerator, Update, UpdateResult, WriteResult,
};
use crate::common::{atomic, Atomic, DocumentCursor, SortableFields, WriteExecutor};
use crate::errors::FolioResult;
use crate::filter::Filter;
use crate::folio_config::FolioConfig;
use crate::index::{IndexDescriptor, IndexOptions};
use std::sync::Arc;

/// Wires the read, write and index operations of one collection around its
/// shared state.
pub(crate) struct CollectionOperations {
    state: Atomic<CollectionState>,
    config: FolioConfig,
    index_manager: IndexManager,
    read_operations: ReadOperations,
    write_operations: WriteOperations,
}

impl CollectionOperations {
    pub fn new(collection_name: &str, config: FolioConfig, id_generator: Arc<IdGenerator>) -> Self {
        let state = atomic(CollectionState::new(collection_name));
        let find_optimizer = FindOptimizer::new(config.plan_cache_size());

        let index_manager = IndexManager::new(state.clone(), find_optimizer.clone());
        let read_operations = ReadOperations::new(state.clone(), find_optimizer);
        let write_operations =
            WriteOperations::new(state.clone(), id_generator, read_operations.clone());

        CollectionOperations {
            state,
            config,
            index_manager,
            read_operations,
            write_operations,
        }
    }

    pub fn insert(&self, document: Document) -> FolioResult<DocumentId> {
        self.write_operations.insert(document)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> FolioResult<WriteResult> {
        self.write_operations.insert_many(documents)
    }

    pub fn update(&self, filter: &Filter, update: &Update, first_only: bool) -> FolioResult<UpdateResult> {
        self.write_operations.update(filter, update, first_only)
    }

    pub fn delete(&self, filter: &Filter, first_only: bool) -> FolioResult<DeleteResult> {
        self.write_operations.delete(filter, first_only)
    }

    pub fn find(&self, filter: Filter, find_options: FindOptions) -> FolioResult<DocumentCursor> {
        self.read_operations.find(filter, find_options)
    }

    pub fn get_by_id(&self, id: &DocumentId) -> FolioResult<Option<Document>> {
        self.read_operations.get_by_id(id)
    }

    pub fn size(&self) -> FolioResult<usize> {
        self.read_operations.size()
    }

    pub fn scan(&self) -> FolioResult<impl Iterator<Item = Document>> {
        self.read_operations.scan()
    }

    pub fn aggregate(&self, pipeline: Pipeline) -> FolioResult<AggregateCursor> {
        pipeline.validate()?;
        self.read_operations.snapshot()?;
        let pipeline = if self.config.optimize_pipelines() {
            pipeline.optimized()
        } else {
            pipeline
        };
        Ok(AggregateCursor::new(self.read_operations.clone(), pipeline))
    }

    pub fn create_index(&self, fields: SortableFields, options: &IndexOptions) -> FolioResult<IndexDescriptor> {
        self.index_manager.create_index(fields, options)
    }

    pub fn list_indexes(&self) -> FolioResult<Vec<IndexDescriptor>> {
        self.index_manager.list_indexes()
    }

    pub fn has_index(&self, fields: &SortableFields) -> FolioResult<bool> {
        self.index_manager.has_index(fields)
    }

    pub fn drop_index(&self, fields: &SortableFields) -> FolioResult<()> {
        self.index_manager.drop_index(fields)
    }

    pub fn lookup(&self, field_sequence: &[&str], filter: &Filter) -> FolioResult<Option<Vec<DocumentId>>> {
        self.index_manager.lookup(field_sequence, filter)
    }

    /// Marks the collection unusable and releases its data.
    pub fn invalidate(&self, dropped: bool) {
        let status = if dropped {
            CollectionStatus::Dropped
        } else {
            CollectionStatus::Closed
        };
        self.state.write_with(|state| state.invalidate(status));
    }
}
