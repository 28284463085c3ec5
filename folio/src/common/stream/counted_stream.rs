use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counts the items pulled through it into a shared counter.
pub(crate) struct CountedStream<I> {
    raw_stream: I,
    counter: Arc<AtomicU64>,
}

impl<I: Iterator> CountedStream<I> {
    pub fn new(raw_stream: I, counter: Arc<AtomicU64>) -> Self {
        CountedStream {
            raw_stream,
            counter,
        }
    }
}

impl<I: Iterator> Iterator for CountedStream<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.raw_stream.next()?;
        self.counter.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }
}
