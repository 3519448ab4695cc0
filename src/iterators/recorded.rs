use crate::iterators::{Cursor, HistogramIterator};
use crate::Histogram;

/// An iterator that will yield only bins with at least one sample.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Iter {
    count_added: u64,
}

impl Iter {
    /// Construct a new sampled iterator. See `Histogram::iter_recorded` for details.
    pub(crate) fn new(hist: &Histogram) -> HistogramIterator<'_> {
        HistogramIterator::new(hist, Iter { count_added: 0 })
    }

    pub(crate) fn advance(&mut self, cursor: &mut Cursor<'_>) -> bool {
        while cursor.basic_next() {
            if cursor.count() != 0 {
                let to = cursor.highest_equivalent();
                cursor.update_iterated(to);
                self.count_added = cursor.count();
                return true;
            }
        }
        false
    }

    pub(crate) fn count_added(&self) -> u64 {
        self.count_added
    }
}
