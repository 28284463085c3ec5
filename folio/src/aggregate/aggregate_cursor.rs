use crate::aggregate::stage::expand;
use crate::aggregate::{Pipeline, Stage};
use crate::collection::operation::ReadOperations;
use crate::collection::{Document, FindOptions};
use crate::common::DocumentStream;
use crate::errors::FolioResult;
use crate::explain::ExecutionCounters;
use crate::filter::{all, Filter};

/// Lazy result of [crate::collection::Collection::aggregate].
///
/// Nothing runs until the cursor is iterated. Each iteration runs the
/// pipeline on a fresh snapshot and either yields every output document or,
/// when a stage fails, only the error.
#[derive(Clone)]
pub struct AggregateCursor {
    read_operations: ReadOperations,
    pipeline: Pipeline,
}

impl AggregateCursor {
    pub(crate) fn new(read_operations: ReadOperations, pipeline: Pipeline) -> Self {
        AggregateCursor {
            read_operations,
            pipeline,
        }
    }

    /// The pipeline as it will run, after any configured rewrite.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn iter(&self) -> DocumentStream {
        let read_operations = self.read_operations.clone();
        let pipeline = self.pipeline.clone();
        DocumentStream::new(
            std::iter::once_with(move || run(&read_operations, &pipeline)).flat_map(expand),
        )
    }

    pub fn to_vec(&self) -> FolioResult<Vec<Document>> {
        self.iter().collect()
    }

    pub fn first(&self) -> FolioResult<Option<Document>> {
        self.iter().next().transpose()
    }

    pub fn size(&self) -> FolioResult<usize> {
        self.iter().try_fold(0, |count, doc| doc.map(|_| count + 1))
    }
}

fn run(read_operations: &ReadOperations, pipeline: &Pipeline) -> FolioResult<Vec<Document>> {
    // a leading $match goes through the query planner
    let (filter, rest): (Filter, &[Stage]) = match pipeline.stages().split_first() {
        Some((Stage::Match(filter), rest)) => (filter.clone(), rest),
        _ => (all(), pipeline.stages()),
    };

    let counters = ExecutionCounters::default();
    let (plan, mut stream) = read_operations.stream(&filter, &FindOptions::new(), &counters)?;
    log::debug!("Aggregation source plan: {}", plan);

    for stage in rest {
        stream = stage.apply(stream);
    }
    stream.collect()
}

impl IntoIterator for AggregateCursor {
    type Item = FolioResult<Document>;
    type IntoIter = DocumentStream;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &AggregateCursor {
    type Item = FolioResult<Document>;
    type IntoIter = DocumentStream;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
