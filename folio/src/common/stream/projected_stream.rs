use crate::collection::{Document, Projection};
use crate::errors::FolioResult;

pub(crate) struct ProjectedStream<I> {
    raw_stream: I,
    projection: Projection,
}

impl<I> ProjectedStream<I>
where
    I: Iterator<Item = FolioResult<Document>>,
{
    pub fn new(raw_stream: I, projection: Projection) -> Self {
        ProjectedStream {
            raw_stream,
            projection,
        }
    }
}

impl<I> Iterator for ProjectedStream<I>
where
    I: Iterator<Item = FolioResult<Document>>,
{
    type Item = FolioResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.raw_stream.next()?;
        Some(doc.and_then(|doc| self.projection.apply(&doc)))
    }
}
