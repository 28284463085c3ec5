use crate::collection::operation::collection_state::CollectionState;
use crate::collection::operation::find_optimizer::FindOptimizer;
use crate::collection::{Document, DocumentId, FindOptions, FindPlan};
use crate::common::stream::{
    CountedStream, DocumentCursor, DocumentStream, FilteredStream, ProjectedStream, SortedStream,
};
use crate::common::{Atomic, ReadExecutor};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::explain::ExecutionCounters;
use crate::filter::Filter;

#[derive(Clone)]
pub(crate) struct ReadOperations {
    state: Atomic<CollectionState>,
    find_optimizer: FindOptimizer,
}

impl ReadOperations {
    pub fn new(state: Atomic<CollectionState>, find_optimizer: FindOptimizer) -> Self {
        ReadOperations {
            state,
            find_optimizer,
        }
    }

    /// O(1) copy of the published state.
    pub fn snapshot(&self) -> FolioResult<CollectionState> {
        self.state.read_with(|state| {
            state.ensure_open()?;
            Ok(state.clone())
        })
    }

    pub fn find(&self, filter: Filter, find_options: FindOptions) -> FolioResult<DocumentCursor> {
        filter.validate()?;
        if let Some(sort) = &find_options.sort_by {
            sort.validate()?;
        }
        if let Some(projection) = &find_options.projection {
            projection.validate()?;
        }
        self.state.read_with(|state| state.ensure_open())?;
        Ok(DocumentCursor::new(self.clone(), filter, find_options))
    }

    pub fn get_by_id(&self, id: &DocumentId) -> FolioResult<Option<Document>> {
        self.state.read_with(|state| {
            state.ensure_open()?;
            Ok(state.get(id).cloned())
        })
    }

    pub fn size(&self) -> FolioResult<usize> {
        self.state.read_with(|state| {
            state.ensure_open()?;
            Ok(state.size())
        })
    }

    /// Every document of a snapshot, in collection order.
    pub fn scan(&self) -> FolioResult<impl Iterator<Item = Document>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.records().clone().into_iter().map(|(_, doc)| doc))
    }

    pub fn plan(&self, snapshot: &CollectionState, filter: &Filter, find_options: &FindOptions) -> FindPlan {
        self.find_optimizer.create_find_plan(
            filter,
            find_options,
            &snapshot.index_descriptors(),
            snapshot.catalog_version(),
        )
    }

    /// Snapshots, plans and executes in one step.
    pub fn stream(
        &self,
        filter: &Filter,
        find_options: &FindOptions,
        counters: &ExecutionCounters,
    ) -> FolioResult<(FindPlan, DocumentStream)> {
        let snapshot = self.snapshot()?;
        let plan = self.plan(&snapshot, filter, find_options);
        let stream = execute(snapshot, &plan, counters)?;
        Ok((plan, stream))
    }

    /// Ids of documents matching `filter` in collection order, stopping
    /// after the first when `first_only`.
    pub fn matching_ids(
        &self,
        snapshot: &CollectionState,
        filter: &Filter,
        first_only: bool,
    ) -> FolioResult<Vec<DocumentId>> {
        let plan = self.plan(snapshot, filter, &FindOptions::new());
        let residual = plan.full_scan_filter();
        let counters = ExecutionCounters::default();

        let candidates: Vec<DocumentId> = match candidate_ids(snapshot, &plan, &counters)? {
            Some(ids) => ids,
            None => snapshot.records().keys().copied().collect(),
        };

        let mut matched = Vec::new();
        for id in candidates {
            let document = document_of(snapshot, &id)?;
            if residual.apply(document)? {
                matched.push(id);
                if first_only {
                    break;
                }
            }
        }
        Ok(matched)
    }
}

fn document_of<'a>(snapshot: &'a CollectionState, id: &DocumentId) -> FolioResult<&'a Document> {
    snapshot.get(id).ok_or_else(|| {
        log::error!("Index entry refers to missing document {}", id);
        FolioError::new(
            &format!("Index entry without document {}", id),
            ErrorKind::InternalError,
        )
    })
}

/// Walks the plan's index, if any. Ids come back in index order when the
/// index provides the requested sort, in collection order otherwise.
pub(crate) fn candidate_ids(
    snapshot: &CollectionState,
    plan: &FindPlan,
    counters: &ExecutionCounters,
) -> FolioResult<Option<Vec<DocumentId>>> {
    let (descriptor, bounds) = match (plan.index_descriptor(), plan.index_scan_bounds()) {
        (Some(descriptor), Some(bounds)) => (descriptor, bounds),
        _ => return Ok(None),
    };
    let index = snapshot.find_index(descriptor.name()).ok_or_else(|| {
        log::error!("Plan refers to unknown index {}", descriptor.name());
        FolioError::new(
            &format!("Index {} not found", descriptor.name()),
            ErrorKind::IndexNotFound,
        )
    })?;

    let result = index.scan(bounds, plan.is_reverse_scan());
    counters.add_keys_examined(result.keys_examined);
    let mut ids = result.ids;
    if !plan.is_index_sorted() {
        ids.sort();
    }
    Ok(Some(ids))
}

/// Residual filter, projection, blocking sort, skip, limit; in that order.
pub(crate) fn execute(
    snapshot: CollectionState,
    plan: &FindPlan,
    counters: &ExecutionCounters,
) -> FolioResult<DocumentStream> {
    let records = snapshot.records().clone();
    let source: DocumentStream = match candidate_ids(&snapshot, plan, counters)? {
        Some(ids) => DocumentStream::new(ids.into_iter().map(move |id| {
            records.get(&id).cloned().ok_or_else(|| {
                log::error!("Index entry refers to missing document {}", id);
                FolioError::new(
                    &format!("Index entry without document {}", id),
                    ErrorKind::InternalError,
                )
            })
        })),
        None => DocumentStream::new(records.into_iter().map(|(_, doc)| Ok(doc))),
    };

    let mut stream = DocumentStream::new(CountedStream::new(
        source,
        counters.documents_examined_counter(),
    ));
    if !plan.full_scan_filter().is_all() {
        stream = DocumentStream::new(FilteredStream::new(stream, plan.full_scan_filter().clone()));
    }
    if let Some(projection) = plan.projection() {
        stream = DocumentStream::new(ProjectedStream::new(stream, projection.clone()));
    }
    if let Some(sort) = plan.blocking_sort_order() {
        stream = DocumentStream::new(SortedStream::new(stream, sort.sorting_order()));
    }
    if let Some(skip) = plan.skip() {
        stream = DocumentStream::new(stream.skip(usize::try_from(skip).unwrap_or(usize::MAX)));
    }
    if let Some(limit) = plan.limit() {
        stream = DocumentStream::new(stream.take(usize::try_from(limit).unwrap_or(usize::MAX)));
    }
    Ok(DocumentStream::new(CountedStream::new(
        stream,
        counters.returned_counter(),
    )))
}
