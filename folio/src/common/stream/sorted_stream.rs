use crate::collection::Document;
use crate::common::{SortOrder, Value};
use crate::errors::{FolioError, FolioResult};
use std::cmp::Ordering;

/// Blocking sort over a whole stream, performed on the first pull.
///
/// The sort is stable, so documents with equal keys keep their input
/// order. Missing fields read as `Null`, the lowest value. The first error
/// in the input is the only item produced.
pub(crate) struct SortedStream<I> {
    raw_stream: Option<I>,
    sort_order: Vec<(String, SortOrder)>,
    sorted: std::vec::IntoIter<Document>,
    error: Option<FolioError>,
}

impl<I> SortedStream<I>
where
    I: Iterator<Item = FolioResult<Document>>,
{
    pub fn new(raw_stream: I, sort_order: &[(String, SortOrder)]) -> Self {
        SortedStream {
            raw_stream: Some(raw_stream),
            sort_order: sort_order.to_vec(),
            sorted: Vec::new().into_iter(),
            error: None,
        }
    }

    fn load(&mut self, raw_stream: I) {
        let sort_order = &self.sort_order;
        let keyed: FolioResult<Vec<(Vec<Value>, Document)>> = raw_stream
            .map(|doc| {
                let doc = doc?;
                let keys = sort_order
                    .iter()
                    .map(|(field, _)| doc.get(field))
                    .collect::<FolioResult<Vec<_>>>()?;
                Ok((keys, doc))
            })
            .collect();

        match keyed {
            Ok(mut keyed) => {
                keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, sort_order));
                let sorted: Vec<Document> = keyed.into_iter().map(|(_, doc)| doc).collect();
                self.sorted = sorted.into_iter();
            }
            Err(e) => self.error = Some(e),
        }
    }
}

fn compare_keys(a: &[Value], b: &[Value], sort_order: &[(String, SortOrder)]) -> Ordering {
    a.iter()
        .zip(b)
        .zip(sort_order)
        .map(|((a, b), (_, order))| order.apply(a.cmp(b)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl<I> Iterator for SortedStream<I>
where
    I: Iterator<Item = FolioResult<Document>>,
{
    type Item = FolioResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(raw_stream) = self.raw_stream.take() {
            self.load(raw_stream);
        }
        if let Some(error) = self.error.take() {
            return Some(Err(error));
        }
        self.sorted.next().map(Ok)
    }
}
