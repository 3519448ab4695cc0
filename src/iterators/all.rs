use crate::iterators::{Cursor, HistogramIterator};
use crate::Histogram;

/// An iterator that will yield every bucket, whether or not it has a count.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Iter;

impl Iter {
    /// Construct a new full iterator. See `Histogram::iter_all` for details.
    pub(crate) fn new(hist: &Histogram) -> HistogramIterator<'_> {
        HistogramIterator::new(hist, Iter)
    }

    pub(crate) fn advance(&mut self, cursor: &mut Cursor<'_>) -> bool {
        if !cursor.move_next() {
            return false;
        }
        let to = cursor.highest_equivalent();
        cursor.update_iterated(to);
        true
    }
}
