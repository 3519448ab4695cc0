use crate::iterators::{Cursor, HistogramIterator};
use crate::Histogram;

/// An iterator that will yield at fixed-size steps through the histogram's value range.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Iter {
    value_units_per_bucket: u64,

    // last value of the current window, and the lowest value equivalent to it
    current_step_highest_value_reporting_level: u64,
    current_step_lowest_value_reporting_level: u64,

    count_added: u64,
    levels_exhausted: bool,
}

impl Iter {
    /// Construct a new linear iterator. See `Histogram::iter_linear` for details.
    pub(crate) fn new(hist: &Histogram, value_units_per_bucket: u64) -> HistogramIterator<'_> {
        assert!(value_units_per_bucket > 0, "value_units_per_bucket must be > 0");
        HistogramIterator::new(
            hist,
            Iter {
                value_units_per_bucket,
                current_step_highest_value_reporting_level: value_units_per_bucket - 1,
                current_step_lowest_value_reporting_level: hist
                    .lowest_equivalent(value_units_per_bucket - 1),
                count_added: 0,
                levels_exhausted: false,
            },
        )
    }

    pub(crate) fn advance(&mut self, cursor: &mut Cursor<'_>) -> bool {
        self.count_added = 0;
        if self.levels_exhausted || cursor.exhausted() {
            return false;
        }

        // Keep going while samples remain, and also while the slot holding the last samples
        // still overlaps windows that have not been reported.
        if !cursor.has_next()
            && !cursor.next_value_exceeds(self.current_step_lowest_value_reporting_level)
        {
            return false;
        }

        loop {
            if cursor.started() && cursor.value() >= self.current_step_lowest_value_reporting_level
            {
                self.report(cursor);
                return true;
            }

            if !cursor.move_next() {
                // the counter array ended inside this window
                self.report(cursor);
                return true;
            }
            self.count_added = self.count_added.saturating_add(cursor.count());
        }
    }

    fn report(&mut self, cursor: &mut Cursor<'_>) {
        cursor.update_iterated(self.current_step_highest_value_reporting_level);

        match self
            .current_step_highest_value_reporting_level
            .checked_add(self.value_units_per_bucket)
        {
            Some(highest) => {
                self.current_step_highest_value_reporting_level = highest;
                self.current_step_lowest_value_reporting_level =
                    cursor.hist().lowest_equivalent(highest);
            }
            None => self.levels_exhausted = true,
        }
    }

    pub(crate) fn count_added(&self) -> u64 {
        self.count_added
    }
}
