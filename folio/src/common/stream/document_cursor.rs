use crate::collection::operation::{candidate_ids, execute, ReadOperations};
use crate::collection::{Document, FindOptions, FindPlan, Projection};
use crate::common::{SortOrder, SortableFields};
use crate::errors::FolioResult;
use crate::explain::{ExecutionCounters, ExplainMode, ExplainReport};
use crate::filter::Filter;

/// Boxed, sendable stream of query results.
pub struct DocumentStream {
    inner: Box<dyn Iterator<Item = FolioResult<Document>> + Send>,
}

impl DocumentStream {
    pub(crate) fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = FolioResult<Document>> + Send + 'static,
    {
        DocumentStream {
            inner: Box::new(iter),
        }
    }

    pub(crate) fn failed(error: crate::errors::FolioError) -> Self {
        DocumentStream::new(std::iter::once(Err(error)))
    }
}

impl Iterator for DocumentStream {
    type Item = FolioResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Lazy description of a find: a filter plus sort, skip, limit and
/// projection.
///
/// A cursor holds no documents. Every call to [DocumentCursor::iter] takes a
/// fresh snapshot of the collection, plans the query and runs it from the
/// start, so a cursor can be iterated any number of times.
///
/// ```rust,ignore
/// let cheapest = books
///     .find(field("genre").eq("Dystopian"))?
///     .sort("price", SortOrder::Ascending)
///     .limit(3)
///     .to_vec()?;
/// ```
#[derive(Clone)]
pub struct DocumentCursor {
    read_operations: ReadOperations,
    filter: Filter,
    find_options: FindOptions,
}

impl std::fmt::Debug for DocumentCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCursor").finish_non_exhaustive()
    }
}

impl DocumentCursor {
    pub(crate) fn new(read_operations: ReadOperations, filter: Filter, find_options: FindOptions) -> Self {
        DocumentCursor {
            read_operations,
            filter,
            find_options,
        }
    }

    /// Adds a sort key after the existing ones.
    pub fn sort(mut self, field_name: &str, sort_order: SortOrder) -> Self {
        self.find_options = self.find_options.sort_by(field_name, sort_order);
        self
    }

    /// Replaces the sort keys.
    pub fn sort_by(mut self, fields: SortableFields) -> FolioResult<Self> {
        if !fields.is_empty() {
            fields.validate()?;
        }
        self.find_options = self.find_options.sort_fields(fields);
        Ok(self)
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.find_options = self.find_options.skip(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.find_options = self.find_options.limit(limit);
        self
    }

    pub fn project(mut self, projection: Projection) -> FolioResult<Self> {
        projection.validate()?;
        self.find_options = self.find_options.projection(projection);
        Ok(self)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn find_options(&self) -> &FindOptions {
        &self.find_options
    }

    /// The plan the next iteration would use.
    pub fn find_plan(&self) -> FolioResult<FindPlan> {
        let snapshot = self.read_operations.snapshot()?;
        Ok(self
            .read_operations
            .plan(&snapshot, &self.filter, &self.find_options))
    }

    /// Runs the query on a fresh snapshot.
    pub fn iter(&self) -> DocumentStream {
        let counters = ExecutionCounters::default();
        match self
            .read_operations
            .stream(&self.filter, &self.find_options, &counters)
        {
            Ok((_, stream)) => stream,
            Err(e) => DocumentStream::failed(e),
        }
    }

    pub fn to_vec(&self) -> FolioResult<Vec<Document>> {
        self.iter().collect()
    }

    pub fn first(&self) -> FolioResult<Option<Document>> {
        self.iter().next().transpose()
    }

    /// Number of results, after skip and limit.
    pub fn size(&self) -> FolioResult<usize> {
        self.iter().try_fold(0, |count, doc| doc.map(|_| count + 1))
    }

    /// Describes how the query runs. Never modifies the collection.
    pub fn explain(&self, mode: ExplainMode) -> FolioResult<ExplainReport> {
        let snapshot = self.read_operations.snapshot()?;
        let plan = self
            .read_operations
            .plan(&snapshot, &self.filter, &self.find_options);
        let counters = ExecutionCounters::default();

        match mode {
            ExplainMode::QueryPlanner => {
                let estimated = match candidate_ids(&snapshot, &plan, &counters)? {
                    Some(ids) => ids.len(),
                    None => snapshot.size(),
                };
                counters.add_documents_examined(estimated as u64);
            }
            ExplainMode::ExecutionStats => {
                for document in execute(snapshot, &plan, &counters)? {
                    document?;
                }
            }
        }
        Ok(ExplainReport::new(mode, &plan, &counters))
    }
}

impl IntoIterator for DocumentCursor {
    type Item = FolioResult<Document>;
    type IntoIter = DocumentStream;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &DocumentCursor {
    type Item = FolioResult<Document>;
    type IntoIter = DocumentStream;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
