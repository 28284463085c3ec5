use crate::collection::Document;
use crate::errors::FolioResult;
use crate::filter::Filter;

/// Passes through the documents matching a filter.
pub(crate) struct FilteredStream<I> {
    raw_stream: I,
    filter: Filter,
}

impl<I> FilteredStream<I>
where
    I: Iterator<Item = FolioResult<Document>>,
{
    pub fn new(raw_stream: I, filter: Filter) -> Self {
        FilteredStream { raw_stream, filter }
    }
}

impl<I> Iterator for FilteredStream<I>
where
    I: Iterator<Item = FolioResult<Document>>,
{
    type Item = FolioResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.raw_stream.next()? {
                Ok(doc) => match self.filter.apply(&doc) {
                    Ok(true) => return Some(Ok(doc)),
                    Ok(false) => continue,
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
